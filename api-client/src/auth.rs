//! Bearer token lifecycle.
//!
//! [`AuthSession`] owns the token used for every API request. A cached token is handed out as long as it stays
//! inside its safety window, otherwise a credential exchange is started. Concurrent callers never start a second
//! exchange: the first one spawns it and everyone else awaits the same shared result.

use crate::error::AuthError;
use futures::{
    future::{
        BoxFuture,
        Shared,
    },
    FutureExt as _,
};
use parking_lot::Mutex;
use reqwest::StatusCode;
use sbercdn_exporter_config::ClientConfig;
use std::{
    fmt,
    sync::Arc,
    time::{
        Duration,
        Instant,
    },
};

/// Header carrying the token on every data request.
pub const AUTH_HEADER: &str = "Cdn-Auth-Token";

/// A token as returned by the auth endpoint. Replaced as a whole on refresh, never modified.
#[derive(Clone)]
pub struct AuthToken {
    value: Arc<str>,
    issued_at: Instant,
    lifetime: Duration,
}

impl AuthToken {
    pub fn new(value: impl Into<Arc<str>>, lifetime: Duration) -> Self {
        Self {
            value: value.into(),
            issued_at: Instant::now(),
            lifetime,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }

    /// Valid while `elapsed < lifetime - safety_margin`.
    pub fn is_valid(&self, safety_margin: Duration) -> bool {
        !self.value.is_empty() && self.issued_at.elapsed() < self.lifetime.saturating_sub(safety_margin)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

type Refresh = Shared<BoxFuture<'static, Result<AuthToken, AuthError>>>;

#[derive(Default)]
struct TokenState {
    token: Option<AuthToken>,
    refresh: Option<Refresh>,
}

struct Credentials {
    endpoint: String,
    username: String,
    password: String,
    lifetime: Duration,
    safety_margin: Duration,
    request_timeout: Duration,
}

struct AuthInner {
    http: reqwest::Client,
    credentials: Credentials,
    state: Mutex<TokenState>,
}

/// Shared owner of the API token. Cheap to clone.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<AuthInner>,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("endpoint", &self.inner.credentials.endpoint)
            .field("username", &self.inner.credentials.username)
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    pub fn new(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            inner: Arc::new(AuthInner {
                http,
                credentials: Credentials {
                    endpoint: config.auth_endpoint(),
                    username: config.username.clone(),
                    password: config.password.clone(),
                    lifetime: config.token_lifetime,
                    safety_margin: config.safety_margin(),
                    request_timeout: config.max_query_time,
                },
                state: Default::default(),
            }),
        }
    }

    /// Returns the cached token or waits for a (possibly already running) refresh.
    pub async fn token(&self) -> Result<AuthToken, AuthError> {
        let refresh = {
            let mut state = self.inner.state.lock();
            if let Some(token) = state
                .token
                .as_ref()
                .filter(|token| token.is_valid(self.inner.credentials.safety_margin))
            {
                return Ok(token.clone());
            }
            state
                .refresh
                .get_or_insert_with(|| AuthInner::start_refresh(self.inner.clone()))
                .clone()
        };
        refresh.await
    }

    /// Drops `rejected` from the cache unless it was already replaced.
    pub fn invalidate(&self, rejected: &AuthToken) {
        let mut state = self.inner.state.lock();
        if state
            .token
            .as_ref()
            .is_some_and(|token| token.value() == rejected.value())
        {
            debug!("invalidating rejected token");
            state.token = None;
        }
    }
}

impl AuthInner {
    /// The exchange runs on its own task so it completes even if every waiter gets cancelled.
    fn start_refresh(inner: Arc<Self>) -> Refresh {
        let task = tokio::spawn(async move {
            let result = inner.exchange().await;
            let mut state = inner.state.lock();
            state.refresh = None;
            match &result {
                Ok(token) => state.token = Some(token.clone()),
                Err(err) => warn!(error = %err, "failed to update auth token"),
            }
            result
        });
        async move {
            task.await
                .unwrap_or_else(|err| Err(AuthError::Interrupted(err.to_string())))
        }
        .boxed()
        .shared()
    }

    #[instrument(level = "debug", skip_all, fields(endpoint = %self.credentials.endpoint))]
    async fn exchange(&self) -> Result<AuthToken, AuthError> {
        let credentials = &self.credentials;
        let response = self
            .http
            .post(&credentials.endpoint)
            .timeout(credentials.request_timeout)
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(|err| AuthError::Network(Arc::new(err)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AuthError::Status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| AuthError::Network(Arc::new(err)))?;
        let payload: serde_json::Value =
            serde_json::from_slice(&body).map_err(|err| AuthError::Malformed(err.to_string()))?;
        let token = payload
            .get("token")
            .and_then(serde_json::Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::Malformed("`token` is missing or not a string".to_string()))?;

        info!("Authorized successfully!");
        Ok(AuthToken::new(token, credentials.lifetime))
    }
}
