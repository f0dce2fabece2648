use crate::{
    coordinator::{
        Cycle,
        SampleStream,
    },
    error::CycleError,
};
use std::{
    future::Future,
    pin::Pin,
};

/// A source of samples, run once per scrape.
pub trait Collector: Send + Sync {
    /// Starts the collector's share of `cycle`.
    ///
    /// Errors are reserved for failures that leave nothing to collect. Partial failures only shorten the stream.
    fn collect<'a>(
        &'a self,
        cycle: &'a Cycle,
    ) -> Pin<Box<dyn Future<Output = Result<SampleStream, CycleError>> + Send + 'a>>;

    /// Get the name of this collector
    fn name(&self) -> &'static str;
}
