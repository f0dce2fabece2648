use crate::{
    error::DiscoveryError,
    transport::Transport,
};
use serde::Deserialize;
use std::{
    sync::Arc,
    time::{
        Duration,
        Instant,
    },
};
use tokio::sync::Mutex;

pub const ACCOUNTS_PATH: &str = "/app/inventory/v1/accounts/";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum AccountStatus {
    Active,
    Other(String),
}

impl From<String> for AccountStatus {
    fn from(status: String) -> Self {
        if status == "active" {
            Self::Active
        } else {
            Self::Other(status)
        }
    }
}

impl Default for AccountStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

/// An inventory entry. Only `name` and `status` are of interest, everything else is ignored.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub name: String,
    #[serde(default)]
    pub status: AccountStatus,
}

impl Account {
    pub fn new(name: impl ToString, status: AccountStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Active accounts in inventory order, restricted to `allow_list` unless it is empty.
pub fn select_active(accounts: Vec<Account>, allow_list: &[String]) -> Vec<Account> {
    let mut selected: Vec<Account> = Vec::with_capacity(accounts.len());
    for account in accounts {
        if !account.is_active() {
            continue;
        }
        if !allow_list.is_empty() && !allow_list.contains(&account.name) {
            continue;
        }
        if selected.iter().any(|seen| seen.name == account.name) {
            continue;
        }
        selected.push(account);
    }
    selected
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

#[derive(Clone, Debug)]
struct AccountCache {
    accounts: Arc<[Account]>,
    refreshed_at: Instant,
}

/// Discovers the scrapeable accounts and caches them for `ttl`.
///
/// The cached set is replaced wholesale. A failed refresh keeps serving the previous set.
#[derive(Debug)]
pub struct AccountDirectory {
    transport: Transport,
    allow_list: Vec<String>,
    ttl: Duration,
    request_timeout: Duration,
    cache: Mutex<Option<AccountCache>>,
}

impl AccountDirectory {
    pub fn new(transport: Transport, allow_list: Vec<String>, ttl: Duration, request_timeout: Duration) -> Self {
        Self {
            transport,
            allow_list,
            ttl,
            request_timeout,
            cache: Mutex::new(None),
        }
    }

    /// The lock is held across the inventory request, so at most one refresh runs and every other caller gets its
    /// outcome.
    pub async fn active_accounts(&self) -> Result<Arc<[Account]>, DiscoveryError> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref().filter(|cached| cached.refreshed_at.elapsed() < self.ttl) {
            return Ok(cached.accounts.clone());
        }

        match self.discover().await {
            Ok(accounts) => {
                debug!(count = accounts.len(), "refreshed active accounts");
                *cache = Some(AccountCache {
                    accounts: accounts.clone(),
                    refreshed_at: Instant::now(),
                });
                Ok(accounts)
            }
            Err(err) => match cache.as_ref() {
                Some(stale) => {
                    warn!(
                        error = %err,
                        age = ?stale.refreshed_at.elapsed(),
                        "account discovery failed, serving previously discovered accounts"
                    );
                    Ok(stale.accounts.clone())
                }
                None => Err(err),
            },
        }
    }

    async fn discover(&self) -> Result<Arc<[Account]>, DiscoveryError> {
        let body = self
            .transport
            .get(ACCOUNTS_PATH, &[], self.request_timeout)
            .await
            .map_err(|err| DiscoveryError::Request(Box::new(err)))?;
        let accounts: Vec<Account> = serde_json::from_slice(&body).map_err(DiscoveryError::Decode)?;
        if accounts.is_empty() {
            return Err(DiscoveryError::Empty);
        }
        trace!(?accounts, "inventory");
        Ok(select_active(accounts, &self.allow_list).into())
    }
}
