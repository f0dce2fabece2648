use serde::Deserialize;
use std::{
    fmt,
    time::Duration,
};

/// Settings of the CDN management API client (`api:` section).
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    pub url: url::Url,
    pub auth_urn: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Allow-list of account names. Empty means every active account.
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub token_lifetime: Duration,
    /// Deadline of a single request. Doubles as the token safety margin.
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub max_query_time: Duration,
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub scrape_interval: Duration,
    #[serde(default, deserialize_with = "crate::duration::deserialize")]
    pub scrape_time_offset: Duration,
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub accounts_cache_ttl: Duration,
    /// Budget of a whole scrape cycle, zero falls back to `max_query_time`.
    #[serde(default, deserialize_with = "crate::duration::deserialize")]
    pub scrape_timeout: Duration,
}

impl ClientConfig {
    /// Absolute URL of an API path such as `/app/inventory/v1/accounts/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url.as_str().trim_end_matches('/'), path)
    }

    pub fn auth_endpoint(&self) -> String {
        self.endpoint(&self.auth_urn)
    }

    pub fn safety_margin(&self) -> Duration {
        self.max_query_time
    }

    pub fn cycle_budget(&self) -> Duration {
        if self.scrape_timeout.is_zero() {
            self.max_query_time
        } else {
            self.scrape_timeout
        }
    }

    pub(crate) fn validate(&self) -> eyre::Result<()> {
        if self.username.is_empty() || self.password.is_empty() {
            eyre::bail!("api.username and api.password must be set");
        }
        if self.max_query_time.is_zero() {
            eyre::bail!("api.max_query_time must be greater than zero");
        }
        if self.scrape_interval.is_zero() {
            eyre::bail!("api.scrape_interval must be greater than zero");
        }
        if self.token_lifetime <= self.safety_margin() {
            eyre::bail!(
                "api.token_lifetime ({}) must exceed api.max_query_time ({})",
                humantime::format_duration(self.token_lifetime),
                humantime::format_duration(self.max_query_time),
            );
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url.as_str())
            .field("auth_urn", &self.auth_urn)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("accounts", &self.accounts)
            .field("token_lifetime", &self.token_lifetime)
            .field("max_query_time", &self.max_query_time)
            .field("scrape_interval", &self.scrape_interval)
            .field("scrape_time_offset", &self.scrape_time_offset)
            .field("accounts_cache_ttl", &self.accounts_cache_ttl)
            .field("scrape_timeout", &self.scrape_timeout)
            .finish()
    }
}
