#[macro_use]
extern crate tracing;

pub mod error;
pub mod exposition;
pub mod router;
pub mod server;

pub use router::create_router;
pub use server::{
    cancel_on_signal,
    serve,
    serve_listener,
};
