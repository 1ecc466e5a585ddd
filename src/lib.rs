//! Splunk distribution of OpenTelemetry tracing bootstrap.
//!
//! This crate resolves a final tracing configuration from caller options and
//! process environment variables, builds the matching exporter and
//! propagation stack, and installs both as process-wide state. It is a
//! startup-time wiring layer: span creation, batching, and the OTLP wire
//! protocol stay with the OpenTelemetry SDK.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use splunk_otel::OpenTelemetryOptions;
//!
//! fn main() -> Result<(), splunk_otel::TelemetryError> {
//!     let provider = splunk_otel::init(
//!         OpenTelemetryOptions::new()
//!             .with_service_name("my-service")
//!             .with_service_version("1.0.0"),
//!     )?;
//!
//!     // ... create spans via opentelemetry::global::tracer(...) ...
//!
//!     splunk_otel::shutdown(&provider)?;
//!     Ok(())
//! }
//! ```
//!
//! # Precedence
//!
//! For every configuration field: an explicit option wins; otherwise the
//! environment variable applies; otherwise a built-in default. Malformed or
//! unrecognized values (bad protocol names, unknown propagator tokens,
//! broken attribute pairs) are normalized or dropped silently — tracing
//! configuration never blocks application startup. Only exporter
//! construction can fail.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `OTEL_TRACES_EXPORTER` | `otlp` or `jaeger-thrift-splunk` | `otlp` |
//! | `OTEL_PROPAGATORS` | subset of `tracecontext,b3,b3multi,baggage` | `tracecontext,baggage` |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP target | `localhost:4317` |
//! | `OTEL_EXPORTER_OTLP_PROTOCOL` | `grpc`, `http/json` or `http/protobuf` | `grpc` |
//! | `OTEL_EXPORTER_JAEGER_ENDPOINT` | Jaeger collector target | `http://localhost:9080/v1/trace` |
//! | `OTEL_RESOURCE_ATTRIBUTES` | comma-separated `key=value` attributes | - |
//! | `OTEL_SERVICE_NAME` | fallback `service.name` | - |
//! | `SPLUNK_ACCESS_TOKEN` | token for Jaeger exporter requests | - |
//!
//! Values are read at resolution time, with blank characters stripped and
//! the remainder lower-cased.
//!
//! # Module Structure
//!
//! - [`config`]: options, resolved options, and the resolution function
//! - [`env`]: environment snapshot and value parsing
//! - [`resource`]: resource attribute merging
//! - [`propagation`] / [`b3`]: propagator factory and B3 implementations
//! - [`exporter`] / [`jaeger`]: exporter factory and the Jaeger transport
//! - [`init`](fn@init): the bootstrap entry point
//! - [`subscriber`]: optional `tracing` ecosystem bridge

pub mod b3;
pub mod config;
pub mod env;
pub mod error;
pub mod exporter;
mod init;
pub mod jaeger;
pub mod propagation;
pub mod resource;
pub mod subscriber;

pub use config::{
    ExporterKind, OpenTelemetryOptions, OtlpProtocol, Propagator, PropagatorSet, ResolvedOptions,
    DEFAULT_JAEGER_ENDPOINT, DEFAULT_OTLP_ENDPOINT,
};
pub use env::EnvSnapshot;
pub use error::TelemetryError;
pub use init::{init, init_resolved, shutdown};
