//! Client for the SberCDN management API.
//!
//! - [`AuthSession`]: token exchange and caching, refreshes coalesced across callers
//! - [`AccountDirectory`]: active accounts, cached for a TTL and filtered by an allow-list
//! - [`Transport`]: authenticated GET with a deadline
//! - [`StatFetcher`] and [`CertificateFetcher`]: one logical query each
//!
//! [`CdnApiClient`] bundles all of them around one HTTP connection pool.

#[macro_use]
extern crate tracing;

pub mod accounts;
pub mod auth;
pub mod certificates;
pub mod error;
pub mod statistic;
pub mod transport;

pub use accounts::{
    Account,
    AccountDirectory,
    AccountStatus,
};
pub use auth::{
    AuthSession,
    AuthToken,
};
pub use certificates::{
    CertificateFetcher,
    CertificateRecord,
};
pub use error::{
    ApiError,
    AuthError,
    DiscoveryError,
    NetworkError,
};
pub use statistic::{
    MetricGroup,
    Payload,
    StatFetcher,
    StatQuery,
    TimeWindow,
};
use sbercdn_exporter_config::ClientConfig;
use std::sync::Arc;
pub use transport::Transport;

#[derive(Clone, Debug)]
pub struct CdnApiClient {
    auth: AuthSession,
    accounts: Arc<AccountDirectory>,
    stats: StatFetcher,
    certificates: CertificateFetcher,
}

impl CdnApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;

        let auth = AuthSession::new(http.clone(), config);
        let transport = Transport::new(http, config.url.as_str(), auth.clone());

        Ok(Self {
            accounts: Arc::new(AccountDirectory::new(
                transport.clone(),
                config.accounts.clone(),
                config.accounts_cache_ttl,
                config.max_query_time,
            )),
            stats: StatFetcher::new(transport.clone(), config.max_query_time),
            certificates: CertificateFetcher::new(transport, config.max_query_time),
            auth,
        })
    }

    /// Creates the client and performs the initial authorization.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Self::new(config)?;
        client.auth.token().await?;
        Ok(client)
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    pub fn accounts(&self) -> &AccountDirectory {
        &self.accounts
    }

    pub fn stats(&self) -> &StatFetcher {
        &self.stats
    }

    pub fn certificates(&self) -> &CertificateFetcher {
        &self.certificates
    }
}
