use thiserror::Error;

/// Errors surfaced by [`init`](crate::init).
///
/// Only construction problems are representable: malformed or unrecognized
/// configuration values never error, they normalize to defaults.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build span exporter: {0}")]
    ExporterBuild(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("invalid exporter endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    #[error("failed to build exporter http client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("initialization error: {0}")]
    Init(String),

    #[error("failed to shut down tracer provider: {0}")]
    Shutdown(String),
}
