use crate::{
    collector::Collector,
    coordinator::{
        Cycle,
        SampleStream,
        Unit,
    },
    error::{
        CycleError,
        UnitError,
    },
    payload,
    sample::MetricSample,
};
use sbercdn_api_client::{
    CdnApiClient,
    MetricGroup,
    StatFetcher,
    StatQuery,
    TimeWindow,
};
use sbercdn_exporter_config::ClientConfig;
use std::{
    future::Future,
    pin::Pin,
    time::Duration,
};
use strum::IntoEnumIterator as _;

/// Traffic and cache statistics, one unit per (account, metric group).
pub struct StatsCollector {
    client: CdnApiClient,
    groups: Vec<MetricGroup>,
    interval: Duration,
    offset: Duration,
}

impl StatsCollector {
    pub fn new(client: CdnApiClient, config: &ClientConfig) -> Self {
        Self {
            client,
            groups: MetricGroup::iter().collect(),
            interval: config.scrape_interval,
            offset: config.scrape_time_offset,
        }
    }

    pub fn with_groups(mut self, groups: impl IntoIterator<Item = MetricGroup>) -> Self {
        self.groups = groups.into_iter().collect();
        self
    }
}

impl Collector for StatsCollector {
    fn collect<'a>(
        &'a self,
        cycle: &'a Cycle,
    ) -> Pin<Box<dyn Future<Output = Result<SampleStream, CycleError>> + Send + 'a>> {
        Box::pin(async move {
            let accounts = cycle.bounded(self.client.accounts().active_accounts()).await??;
            let window = TimeWindow::ending_at(cycle.started(), self.interval, self.offset);
            debug!(accounts = accounts.len(), start = %window.start, end = %window.end, "collecting statistics");

            let mut units = Vec::with_capacity(accounts.len() * self.groups.len());
            for account in accounts.iter() {
                for &group in &self.groups {
                    let query = StatQuery {
                        account: account.name.clone(),
                        group,
                        window,
                    };
                    units.push((
                        Unit::new(&account.name, group),
                        fetch_statistic(self.client.stats().clone(), query),
                    ));
                }
            }
            Ok(cycle.fan_out(units))
        })
    }

    fn name(&self) -> &'static str {
        "stats"
    }
}

#[instrument(level = "debug", skip_all, fields(account = %query.account, group = %query.group))]
async fn fetch_statistic(stats: StatFetcher, query: StatQuery) -> Result<Vec<MetricSample>, UnitError> {
    let payload = stats.fetch(&query).await?;
    Ok(payload::samples(&query, &payload)?)
}
