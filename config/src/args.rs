use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "sbercdn-exporter.yaml";

/// SberCDN Prometheus exporter
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to config file in YAML format [default: sbercdn-exporter.yaml].
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to serve metrics on, e.g. `:9921` or `127.0.0.1:9921`.
    #[clap(long, value_name = "ADDRESS")]
    pub listen_address: Option<String>,

    /// Log level used when `RUST_LOG` is not set.
    #[clap(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    /// The config file to read and whether it has to exist. The default file is optional, an explicitly passed one
    /// is not.
    pub fn config_file(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        }
    }
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(address) = &self.listen_address {
                cache.insert("listen.address".to_string(), address.clone().into());
            }
            if let Some(level) = &self.log_level {
                cache.insert("log_level".to_string(), level.clone().into());
            }
            Ok(cache)
        }
    }
}
