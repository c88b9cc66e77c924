use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

const USER_AGENT: &str = "energy_guessr data fetch/1.0";

static CLIENT: OnceCell<Client> = OnceCell::new();

/// The timeout only applies to the call that first builds the shared client.
pub fn http_client_with_timeout(timeout: Duration) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build http client")
    })
}
