#[macro_use]
extern crate tracing;

mod args;
mod client_config;
pub mod duration;
mod env;
mod listen_config;

pub use args::{
    Args,
    DEFAULT_CONFIG_FILE,
};
pub use client_config::ClientConfig;
use color_eyre::Result;
pub use env::{
    EnvSource,
    ENV_PREFIX,
};
use eyre::Context as _;
pub use listen_config::ListenConfig;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub listen: ListenConfig,
    pub api: ClientConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    /// Loads the configuration from the embedded defaults, the config file, `SC_*` environment variables and the
    /// command line, later sources overriding earlier ones.
    pub fn new(args: &Args) -> Result<Self> {
        Self::load(args, EnvSource::from_env())
    }

    #[instrument(level = "debug", skip(args, env))]
    pub fn load(args: &Args, env: EnvSource) -> Result<Self> {
        let (config_file, required) = args.config_file();
        debug!(?config_file, required, "reading configuration");

        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml))
            .add_source(
                config::File::from(config_file.as_path())
                    .format(config::FileFormat::Yaml)
                    .required(required),
            )
            .add_source(env)
            .add_source(args.clone())
            .build()
            .wrap_err_with(|| format!("could not read config file {config_file:?}"))?
            .try_deserialize()
            .context("invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.listen.socket_addr()?;
        self.api.validate()
    }
}
