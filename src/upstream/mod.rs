//! Open-Meteo upstream clients.
//!
//! Two collaborators, both plain HTTPS with query-string parameters and
//! JSON responses: the geocoding lookup (name → coordinates) and the
//! weather service (forecast or historical archive).

pub mod geocoding;
pub mod meteo;

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

/// Request timeout for all outbound calls. No retries anywhere — a failed
/// call is terminal for its request.
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!("SkyCast/", env!("CARGO_PKG_VERSION"));

/// Build the shared outbound HTTP client.
pub fn build_http_client() -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build upstream HTTP client")
}
