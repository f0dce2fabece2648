//! Concurrent fan-out of one scrape cycle.
//!
//! A [`Cycle`] is started for every scrape. All of its units share one deadline and one cancellation token, which is
//! a child of the process shutdown token. Units run as separate tasks and push their samples into a bounded channel;
//! the consumer sees them as a stream that ends once every unit has finished or given up.

use crate::{
    error::{
        Interruption,
        UnitError,
    },
    sample::MetricSample,
};
use chrono::{
    DateTime,
    Utc,
};
use futures::{
    stream::{
        self,
        BoxStream,
    },
    StreamExt as _,
};
use std::{
    fmt,
    future::Future,
    time::Duration,
};
use tokio::{
    sync::mpsc,
    time::Instant,
};
use tokio_util::sync::CancellationToken;

pub type SampleStream = BoxStream<'static, MetricSample>;

/// Samples buffered per stream before producers have to wait for the consumer.
const SAMPLE_BUFFER: usize = 256;

#[derive(Clone, Debug)]
pub struct ScrapeCoordinator {
    budget: Duration,
    shutdown: CancellationToken,
}

impl ScrapeCoordinator {
    pub fn new(budget: Duration, shutdown: CancellationToken) -> Self {
        Self { budget, shutdown }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn begin(&self) -> Cycle {
        Cycle {
            started: Utc::now(),
            deadline: Instant::now() + self.budget,
            token: self.shutdown.child_token(),
        }
    }
}

/// Identity of a unit of work, used for logging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    pub account: String,
    pub group: String,
}

impl Unit {
    pub fn new(account: impl Into<String>, group: impl fmt::Display) -> Self {
        Self {
            account: account.into(),
            group: group.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Cycle {
    started: DateTime<Utc>,
    deadline: Instant,
    token: CancellationToken,
}

impl Cycle {
    /// Wall clock time the scrape was triggered at.
    pub fn started(&self) -> DateTime<Utc> {
        self.started
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Runs `work` until it completes, the deadline passes or the cycle is cancelled.
    pub async fn bounded<F: Future>(&self, work: F) -> Result<F::Output, Interruption> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Interruption::Cancelled),
            outcome = tokio::time::timeout_at(self.deadline, work) => outcome.map_err(|_| Interruption::Deadline),
        }
    }

    /// Spawns every unit and streams their samples in completion order.
    ///
    /// A failed unit logs once and contributes nothing. Dropping the stream cancels the units still running.
    pub fn fan_out<I, F>(&self, units: I) -> SampleStream
    where
        I: IntoIterator<Item = (Unit, F)>,
        F: Future<Output = Result<Vec<MetricSample>, UnitError>> + Send + 'static,
    {
        let scope = Cycle {
            token: self.token.child_token(),
            ..self.clone()
        };
        let (tx, rx) = mpsc::channel(SAMPLE_BUFFER);

        let mut spawned = 0usize;
        for (unit, work) in units {
            tokio::spawn(run_unit(scope.clone(), unit, work, tx.clone()));
            spawned += 1;
        }
        debug!(spawned, "scrape units started");
        drop(tx);

        let guard = scope.token.drop_guard();
        stream::unfold((rx, guard), |(mut rx, guard)| async move {
            let sample = rx.recv().await?;
            Some((sample, (rx, guard)))
        })
        .boxed()
    }
}

async fn run_unit<F>(cycle: Cycle, unit: Unit, work: F, samples: mpsc::Sender<MetricSample>)
where
    F: Future<Output = Result<Vec<MetricSample>, UnitError>>,
{
    let produced = match cycle.bounded(work).await.map_err(UnitError::from).and_then(|result| result) {
        Ok(produced) => produced,
        Err(UnitError::Interrupted(Interruption::Cancelled)) => {
            debug!(account = %unit.account, group = %unit.group, "scrape unit cancelled");
            return;
        }
        Err(err) => {
            warn!(
                account = %unit.account,
                group = %unit.group,
                error = %err,
                "scrape unit failed, skipping its samples"
            );
            return;
        }
    };

    trace!(account = %unit.account, group = %unit.group, count = produced.len(), "scrape unit finished");
    for sample in produced {
        match cycle.bounded(samples.send(sample)).await {
            Ok(Ok(())) => {}
            // The consumer is gone, nobody wants the rest.
            Ok(Err(_)) => return,
            Err(interruption) => {
                debug!(account = %unit.account, group = %unit.group, %interruption, "dropping unsent samples");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sbercdn_api_client::{
        ApiError,
        AuthError,
    };

    fn samples(account: &str, count: usize) -> Vec<MetricSample> {
        (0..count)
            .map(|n| MetricSample::new("hits", n as f64).label("account", account))
            .collect()
    }

    fn accounts(collected: &[MetricSample]) -> Vec<&str> {
        let mut accounts = collected
            .iter()
            .filter_map(|sample| sample.label_value("account"))
            .collect::<Vec<_>>();
        accounts.sort();
        accounts
    }

    type Work = futures::future::BoxFuture<'static, Result<Vec<MetricSample>, UnitError>>;

    fn ok(account: &'static str, count: usize, delay: Duration) -> (Unit, Work) {
        let work = async move {
            tokio::time::sleep(delay).await;
            Ok(samples(account, count))
        };
        (Unit::new(account, "summary"), Box::pin(work))
    }

    fn failing(account: &'static str) -> (Unit, Work) {
        let work = async move {
            Err(UnitError::Api(ApiError::Auth(AuthError::Malformed("no token".to_string()))))
        };
        (Unit::new(account, "summary"), Box::pin(work))
    }

    #[tokio::test]
    async fn failed_unit_does_not_affect_siblings() {
        let cycle = ScrapeCoordinator::new(Duration::from_secs(5), CancellationToken::new()).begin();
        let collected = cycle
            .fan_out([ok("a", 2, Duration::ZERO), failing("b"), ok("c", 1, Duration::from_millis(20))])
            .collect::<Vec<_>>()
            .await;
        assert_eq!(accounts(&collected), ["a", "a", "c"]);
    }

    #[tokio::test]
    async fn slow_units_are_abandoned_at_the_deadline() {
        let cycle = ScrapeCoordinator::new(Duration::from_millis(200), CancellationToken::new()).begin();
        let started = Instant::now();
        let collected = cycle
            .fan_out([ok("fast", 1, Duration::ZERO), ok("slow", 1, Duration::from_secs(30))])
            .collect::<Vec<_>>()
            .await;
        assert_eq!(accounts(&collected), ["fast"]);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn shutdown_cancels_running_units() {
        let shutdown = CancellationToken::new();
        let cycle = ScrapeCoordinator::new(Duration::from_secs(60), shutdown.clone()).begin();
        let stream = cycle.fan_out([ok("slow", 1, Duration::from_secs(30))]);
        shutdown.cancel();
        assert!(cycle.is_cancelled());
        assert!(stream.collect::<Vec<_>>().await.is_empty());
    }

    #[tokio::test]
    async fn producers_are_not_limited_by_the_buffer() {
        let cycle = ScrapeCoordinator::new(Duration::from_secs(5), CancellationToken::new()).begin();
        let collected = cycle
            .fan_out([ok("a", SAMPLE_BUFFER * 2, Duration::ZERO), ok("b", SAMPLE_BUFFER, Duration::ZERO)])
            .collect::<Vec<_>>()
            .await;
        assert_eq!(collected.len(), SAMPLE_BUFFER * 3);
    }

    #[tokio::test]
    async fn finished_stream_leaves_cycle_running() {
        let cycle = ScrapeCoordinator::new(Duration::from_secs(5), CancellationToken::new()).begin();
        let first = cycle.fan_out([ok("a", 1, Duration::ZERO)]).collect::<Vec<_>>().await;
        let second = cycle.fan_out([ok("b", 1, Duration::ZERO)]).collect::<Vec<_>>().await;
        assert_eq!(first.len() + second.len(), 2);
        assert!(!cycle.is_cancelled());
    }

    #[tokio::test]
    async fn bounded_reports_the_reason() {
        let cycle = ScrapeCoordinator::new(Duration::from_millis(50), CancellationToken::new()).begin();
        assert_eq!(cycle.bounded(async { 7 }).await, Ok(7));
        assert_eq!(
            cycle.bounded(tokio::time::sleep(Duration::from_secs(10))).await,
            Err(Interruption::Deadline)
        );
        cycle.cancel();
        assert_eq!(cycle.bounded(async { 7 }).await, Err(Interruption::Cancelled));
    }
}
