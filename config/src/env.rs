//! Environment overrides.
//!
//! Every supported variable is listed in [`ENV_KEYS`]; nothing is discovered
//! by walking the configuration structs.

use config::{
    Map,
    Source,
    Value,
};
use std::collections::HashMap;

pub const ENV_PREFIX: &str = "SC";

#[derive(Clone, Copy, Debug, PartialEq)]
enum EnvKind {
    Text,
    /// Comma separated list, empty items dropped.
    List,
}

/// `(variable suffix, config key, kind)`.
const ENV_KEYS: &[(&str, &str, EnvKind)] = &[
    ("API_URL", "api.url", EnvKind::Text),
    ("API_AUTH_URN", "api.auth_urn", EnvKind::Text),
    ("API_USERNAME", "api.username", EnvKind::Text),
    ("API_PASSWORD", "api.password", EnvKind::Text),
    ("API_ACCOUNTS", "api.accounts", EnvKind::List),
    ("API_TOKEN_LIFETIME", "api.token_lifetime", EnvKind::Text),
    ("API_MAX_QUERY_TIME", "api.max_query_time", EnvKind::Text),
    ("API_SCRAPE_INTERVAL", "api.scrape_interval", EnvKind::Text),
    ("API_SCRAPE_TIME_OFFSET", "api.scrape_time_offset", EnvKind::Text),
    ("API_ACCOUNTS_CACHE_TTL", "api.accounts_cache_ttl", EnvKind::Text),
    ("API_SCRAPE_TIMEOUT", "api.scrape_timeout", EnvKind::Text),
    ("LISTEN_ADDRESS", "listen.address", EnvKind::Text),
    ("LISTEN_CERT_FILE", "listen.cert_file", EnvKind::Text),
    ("LISTEN_PRIVKEY_FILE", "listen.privkey_file", EnvKind::Text),
    ("LOG_LEVEL", "log_level", EnvKind::Text),
];

/// Configuration source backed by `SC_*` variables.
#[derive(Clone, Debug, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let prefix = format!("{ENV_PREFIX}_");
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .filter(|(k, _)| k.starts_with(&prefix))
                .collect(),
        }
    }

    fn lookup(&self, suffix: &str) -> Option<&str> {
        self.vars.get(&format!("{ENV_PREFIX}_{suffix}")).map(String::as_str)
    }
}

impl Source for EnvSource {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new((*self).clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
        let mut cache = HashMap::<String, Value>::new();
        for (suffix, key, kind) in ENV_KEYS {
            let Some(raw) = self.lookup(suffix) else {
                continue;
            };
            debug!(variable = %format!("{ENV_PREFIX}_{suffix}"), key, "config override from environment");
            let value = match kind {
                EnvKind::Text => raw.to_string().into(),
                EnvKind::List => raw
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
                    .into(),
            };
            cache.insert(key.to_string(), value);
        }
        Ok(cache)
    }
}
