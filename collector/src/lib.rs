//! Scrape side of the exporter.
//!
//! - **`coordinator`**: one [`Cycle`] per scrape, fan-out of units under a shared deadline
//! - **`stats`** and **`certificates`**: the two [`Collector`]s built on the API client
//! - **`payload`**: statistic payload to [`MetricSample`] decoding
//! - **`registry`**: runs every collector and groups samples into [`Family`]s for exposition

#[macro_use]
extern crate tracing;

pub mod catalogue;
pub mod certificates;
pub mod collector;
pub mod coordinator;
pub mod error;
pub mod payload;
pub mod registry;
pub mod sample;
pub mod stats;

pub use certificates::CertificateCollector;
pub use collector::Collector;
pub use coordinator::{
    Cycle,
    SampleStream,
    ScrapeCoordinator,
    Unit,
};
pub use error::{
    CycleError,
    Interruption,
    PayloadError,
    UnitError,
};
pub use registry::Registry;
pub use sample::{
    Family,
    MetricSample,
};
pub use stats::StatsCollector;
