use std::env;
use std::time::Duration;

use chrono::Duration as ChronoDuration;

pub const OWID_CONSUMPTION_URL: &str = "https://ourworldindata.org/grapher/energy-consumption-by-source-and-country.csv?v=1&csvType=full&useColumnShortNames=true";
pub const OWID_PRODUCTION_URL: &str = "https://ourworldindata.org/grapher/electricity-prod-source-stacked.csv?v=1&csvType=full&useColumnShortNames=true";
pub const OWID_TRADE_URL: &str = "https://ourworldindata.org/grapher/energy-imports-and-exports-energy-use.csv?v=1&csvType=full&useColumnShortNames=true";
pub const OWID_TIMESERIES_URL: &str = OWID_CONSUMPTION_URL;

pub const DEFAULT_REFERENCE_YEAR: i32 = 2023;
pub const DEFAULT_ROUNDS: usize = 5;
pub const DEFAULT_CACHE_HOURS: i64 = 24;
pub const MAX_CACHE_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetConfig {
    pub consumption_url: String,
    pub production_url: String,
    pub trade_url: String,
    pub timeseries_url: String,
    pub consumption_year: i32,
    pub production_year: i32,
    pub delimiter: char,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            consumption_url: OWID_CONSUMPTION_URL.to_string(),
            production_url: OWID_PRODUCTION_URL.to_string(),
            trade_url: OWID_TRADE_URL.to_string(),
            timeseries_url: OWID_TIMESERIES_URL.to_string(),
            consumption_year: DEFAULT_REFERENCE_YEAR,
            production_year: DEFAULT_REFERENCE_YEAR,
            delimiter: ',',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsMode {
    Off,
    Log,
    Http,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub cache_ttl: ChronoDuration,
    pub rounds: usize,
    pub http_timeout: Duration,
    pub result_pause: Duration,
    pub analytics: AnalyticsMode,
    pub analytics_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            cache_ttl: ChronoDuration::hours(DEFAULT_CACHE_HOURS),
            rounds: DEFAULT_ROUNDS,
            http_timeout: Duration::from_secs(20),
            result_pause: Duration::from_millis(1000),
            analytics: AnalyticsMode::Log,
            analytics_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = DatasetConfig::default();
        let dataset = DatasetConfig {
            consumption_url: string_env("ENERGY_CONSUMPTION_URL")
                .unwrap_or(defaults.consumption_url),
            production_url: string_env("ENERGY_PRODUCTION_URL")
                .unwrap_or(defaults.production_url),
            trade_url: string_env("ENERGY_TRADE_URL").unwrap_or(defaults.trade_url),
            timeseries_url: string_env("ENERGY_TIMESERIES_URL")
                .unwrap_or(defaults.timeseries_url),
            consumption_year: parsed_env("ENERGY_CONSUMPTION_YEAR")
                .unwrap_or(defaults.consumption_year),
            production_year: parsed_env("ENERGY_PRODUCTION_YEAR")
                .unwrap_or(defaults.production_year),
            delimiter: defaults.delimiter,
        };

        let rounds = parsed_env::<usize>("ENERGY_ROUNDS")
            .unwrap_or(DEFAULT_ROUNDS)
            .clamp(1, 20);
        let http_timeout = parsed_env::<u64>("ENERGY_HTTP_TIMEOUT_SECS")
            .unwrap_or(20)
            .max(5);
        let result_pause = parsed_env::<u64>("ENERGY_RESULT_PAUSE_MS")
            .unwrap_or(1000)
            .min(10_000);

        let analytics_url = string_env("ENERGY_ANALYTICS_URL");
        let analytics = match string_env("ENERGY_ANALYTICS")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            Some("off") | Some("0") | Some("false") => AnalyticsMode::Off,
            _ if analytics_url.is_some() => AnalyticsMode::Http,
            _ => AnalyticsMode::Log,
        };

        Self {
            dataset,
            cache_ttl: cache_ttl(parsed_env("ENERGY_CACHE_HOURS")),
            rounds,
            http_timeout: Duration::from_secs(http_timeout),
            result_pause: Duration::from_millis(result_pause),
            analytics,
            analytics_url,
        }
    }
}

/// Dataset TTL from `ENERGY_CACHE_HOURS`, held to one hour..one year.
fn cache_ttl(hours: Option<i64>) -> ChronoDuration {
    ChronoDuration::hours(
        hours
            .unwrap_or(DEFAULT_CACHE_HOURS)
            .clamp(1, MAX_CACHE_HOURS),
    )
}

fn string_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    string_env(key).and_then(|v| v.parse::<T>().ok())
}
