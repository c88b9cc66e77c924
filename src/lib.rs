pub mod analytics;
pub mod config;
pub mod countries;
pub mod dataset;
pub mod error;
pub mod http_cache;
pub mod http_client;
pub mod loader;
pub mod results;
pub mod round;
pub mod state;
pub mod table;
