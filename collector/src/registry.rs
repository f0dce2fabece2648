use crate::{
    catalogue::{
        COLLECTOR_DURATION,
        COLLECTOR_SUCCESS,
    },
    collector::Collector,
    coordinator::{
        Cycle,
        ScrapeCoordinator,
    },
    error::CycleError,
    sample::{
        Family,
        MetricSample,
    },
};
use futures::{
    future::join_all,
    StreamExt as _,
};
use std::{
    sync::Arc,
    time::Instant,
};

pub const COLLECTOR_LABEL: &str = "collector";

/// Collector name, its samples and how long it took in seconds.
type Outcome = (&'static str, Result<Vec<MetricSample>, CycleError>, f64);

/// Every registered collector, scraped together under one cycle.
#[derive(Clone)]
pub struct Registry {
    coordinator: ScrapeCoordinator,
    collectors: Vec<Arc<dyn Collector>>,
}

impl Registry {
    pub fn new(coordinator: ScrapeCoordinator) -> Self {
        Self {
            coordinator,
            collectors: Vec::new(),
        }
    }

    pub fn register(mut self, collector: impl Collector + 'static) -> Self {
        self.collectors.push(Arc::new(collector));
        self
    }

    pub fn collectors(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.collectors.iter().map(|collector| collector.name())
    }

    /// Runs one scrape cycle and returns its samples grouped into families. Never fails: a collector that could not
    /// run is reported through `sbercdn_scrape_collector_success`.
    #[instrument(level = "debug", skip_all)]
    pub async fn gather(&self) -> Vec<Family> {
        let cycle = self.coordinator.begin();
        let outcomes = join_all(
            self.collectors
                .iter()
                .map(|collector| Self::run(collector.as_ref(), &cycle)),
        )
        .await;

        let mut samples = Vec::new();
        let mut status = Vec::with_capacity(outcomes.len() * 2);
        for (name, outcome, elapsed) in outcomes {
            let success = match outcome {
                Ok(collected) => {
                    debug!(collector = name, samples = collected.len(), ?elapsed, "collector finished");
                    samples.extend(collected);
                    1.0
                }
                Err(err) => {
                    error!(collector = name, error = %err, "collector failed");
                    0.0
                }
            };
            status.push(MetricSample::new(COLLECTOR_SUCCESS, success).label(COLLECTOR_LABEL, name));
            status.push(MetricSample::new(COLLECTOR_DURATION, elapsed).label(COLLECTOR_LABEL, name));
        }

        Family::group(samples.into_iter().chain(status))
    }

    async fn run(collector: &dyn Collector, cycle: &Cycle) -> Outcome {
        let started = Instant::now();
        let outcome = match collector.collect(cycle).await {
            Ok(stream) => Ok(stream.collect::<Vec<_>>().await),
            Err(err) => Err(err),
        };
        (collector.name(), outcome, started.elapsed().as_secs_f64())
    }
}
