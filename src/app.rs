use color_eyre::Result;
use eyre::Context as _;
use sbercdn_api_client::CdnApiClient;
use sbercdn_exporter_collector::{
    CertificateCollector,
    Registry,
    ScrapeCoordinator,
    StatsCollector,
};
use sbercdn_exporter_config::Config;
use sbercdn_exporter_http::{
    cancel_on_signal,
    create_router,
    serve,
};
use tokio_util::sync::CancellationToken;

pub struct App {
    config: Config,
    shutdown: CancellationToken,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Authorizes, then serves `/metrics` until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            api = %self.config.api.url,
            accounts = ?self.config.api.accounts,
            "starting sbercdn-exporter"
        );
        debug!(config = ?self.config, "effective configuration");
        cancel_on_signal(self.shutdown.clone());

        let api = &self.config.api;
        let client = CdnApiClient::connect(api)
            .await
            .wrap_err_with(|| format!("initial authorization against {} failed", api.auth_endpoint()))?;

        let registry = Registry::new(ScrapeCoordinator::new(api.cycle_budget(), self.shutdown.clone()))
            .register(CertificateCollector::new(client.clone()))
            .register(StatsCollector::new(client, api));

        serve(
            &self.config.listen,
            create_router(registry, self.shutdown.clone()),
            self.shutdown,
        )
        .await
    }
}
