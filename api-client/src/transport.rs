use crate::{
    auth::{
        AuthSession,
        AuthToken,
        AUTH_HEADER,
    },
    error::ApiError,
};
use bytes::Bytes;
use reqwest::StatusCode;
use std::time::Duration;

/// Authenticated GET requests against the API.
///
/// Nothing is retried, except a single repeat with a renewed token when the API rejects the one we sent.
#[derive(Clone, Debug)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    auth: AuthSession,
}

impl Transport {
    pub fn new(http: reqwest::Client, base_url: impl AsRef<str>, auth: AuthSession) -> Self {
        Self {
            http,
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)], timeout: Duration) -> Result<Bytes, ApiError> {
        let token = self.auth.token().await?;
        let mut response = self.send(path, query, timeout, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(path, "token rejected, renewing it once");
            self.auth.invalidate(&token);
            let token = self.auth.token().await?;
            response = self.send(path, query, timeout, &token).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::network(path, status));
        }

        response.bytes().await.map_err(|source| ApiError::Read {
            path: path.to_string(),
            source,
        })
    }

    async fn send(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
        token: &AuthToken,
    ) -> Result<reqwest::Response, ApiError> {
        trace!(path, ?query, "GET");
        self.http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .header(AUTH_HEADER, token.value())
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| ApiError::network(path, err))
    }
}
