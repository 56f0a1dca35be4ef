//! Satellite Telemetry
//!
//! Structured logging via `tracing-subscriber`. Request spans come from the
//! `TraceLayer` installed by [`crate::routes::create_router`].

pub mod tracer;

pub use tracer::{init_tracing, LogFormat, TelemetryConfig};
