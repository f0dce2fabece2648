use sbercdn_api_client::{
    ApiError,
    DiscoveryError,
    MetricGroup,
};

/// Why a cycle or one of its units stopped before finishing.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    #[error("scrape deadline exceeded")]
    Deadline,
    #[error("scrape cancelled")]
    Cancelled,
}

#[derive(thiserror::Error, Debug)]
pub enum PayloadError {
    #[error("{group} payload has no `result` list")]
    MissingResult { group: MetricGroup },
}

/// Failure of one (account, group) unit. Logged and swallowed by the coordinator.
#[derive(thiserror::Error, Debug)]
pub enum UnitError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Interrupted(#[from] Interruption),
}

/// Failure that leaves a whole collector without samples for the cycle.
#[derive(thiserror::Error, Debug)]
pub enum CycleError {
    #[error("account discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Interrupted(#[from] Interruption),
}
