use crate::{
    error::ApiError,
    transport::Transport,
};
use chrono::{
    DateTime,
    DurationRound as _,
    TimeDelta,
    Utc,
};
use std::time::Duration;
use strum::{
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
};

pub const STATISTIC_PATH: &str = "/app/statistic/v3/";

/// `start`/`end` query parameter format, always UTC.
pub const TIME_RANGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Loosely typed statistic response. Its shape depends on the group and is interpreted by the consumer.
pub type Payload = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MetricGroup {
    /// Totals per account, no grouping label.
    Summary,
    /// Grouped by response code.
    Code,
    /// Grouped by resource name.
    Resource,
}

impl MetricGroup {
    /// `/app/statistic/v3/`, `/app/statistic/v3/codes` or `/app/statistic/v3/resources`.
    pub fn path(self) -> String {
        match self {
            Self::Summary => STATISTIC_PATH.to_string(),
            grouped => format!("{STATISTIC_PATH}{grouped}s"),
        }
    }

    /// Name of the grouping label, `None` for [`MetricGroup::Summary`].
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::Summary => None,
            Self::Code => Some("code"),
            Self::Resource => Some("resource"),
        }
    }
}

/// Query window `[end - interval, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// `end` is the trigger time truncated to the minute and moved back by `offset`. The API ignores anything below
    /// minutes, and the truncation makes queries of the same scrape tick identical.
    pub fn ending_at(trigger: DateTime<Utc>, interval: Duration, offset: Duration) -> Self {
        let end = truncate_to_minute(trigger) - to_delta(offset);
        Self {
            start: end - to_delta(interval),
            end,
        }
    }

    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("start", self.start.format(TIME_RANGE_FORMAT).to_string()),
            ("end", self.end.format(TIME_RANGE_FORMAT).to_string()),
        ]
    }
}

pub fn truncate_to_minute(time: DateTime<Utc>) -> DateTime<Utc> {
    time.duration_trunc(TimeDelta::minutes(1)).unwrap_or(time)
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::zero())
}

/// One unit of statistic work: an account, a metric group and a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatQuery {
    pub account: String,
    pub group: MetricGroup,
    pub window: TimeWindow,
}

impl StatQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("account", self.account.clone())];
        params.extend(self.window.query());
        params
    }
}

#[derive(Clone, Debug)]
pub struct StatFetcher {
    transport: Transport,
    timeout: Duration,
}

impl StatFetcher {
    pub fn new(transport: Transport, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Fetches and decodes the payload without looking at its shape.
    pub async fn fetch(&self, query: &StatQuery) -> Result<Payload, ApiError> {
        let path = query.group.path();
        let body = self.transport.get(&path, &query.params(), self.timeout).await?;
        serde_json::from_slice(&body).map_err(|err| ApiError::decode(&path, err))
    }
}
