use crate::{
    error::ApiError,
    transport::Transport,
};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct CertificateList {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: i64,
    #[serde(default)]
    data: Vec<CertificateItem>,
}

#[derive(Debug, Deserialize)]
struct CertificateItem {
    #[serde(default)]
    alt: String,
    cn: String,
    #[serde(default)]
    issuer: String,
    #[serde(default)]
    comment: String,
    start: f64,
    end: f64,
}

/// TLS certificate attached to an account, validity bounds in seconds since epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateRecord {
    pub common_name: String,
    pub alternate_names: Vec<String>,
    pub issuer: String,
    pub comment: String,
    pub not_before: f64,
    pub not_after: f64,
}

impl From<CertificateItem> for CertificateRecord {
    fn from(item: CertificateItem) -> Self {
        Self {
            common_name: item.cn,
            alternate_names: item
                .alt
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            issuer: item.issuer,
            comment: item.comment,
            not_before: item.start,
            not_after: item.end,
        }
    }
}

pub fn certificates_path(account: &str) -> String {
    format!("/app/ssl/v1/account/{account}/certificate/")
}

#[derive(Clone, Debug)]
pub struct CertificateFetcher {
    transport: Transport,
    timeout: Duration,
}

impl CertificateFetcher {
    pub fn new(transport: Transport, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub async fn fetch(&self, account: &str) -> Result<Vec<CertificateRecord>, ApiError> {
        let path = certificates_path(account);
        let body = self.transport.get(&path, &[], self.timeout).await?;
        let list: CertificateList = serde_json::from_slice(&body).map_err(|err| ApiError::decode(&path, err))?;
        trace!(account, status = list.status, message = %list.message, count = list.data.len(), "certificate list");
        Ok(list.data.into_iter().map(CertificateRecord::from).collect())
    }
}
