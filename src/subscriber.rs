//! Optional bridge into the `tracing` ecosystem.
//!
//! Applications that emit spans through `tracing` rather than the
//! OpenTelemetry API can layer a subscriber over the provider returned by
//! [`init`](crate::init) so those spans flow into the configured exporter.

use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Build the OpenTelemetry tracing layer for `provider`.
pub fn build_otel_layer<S>(
    provider: &SdkTracerProvider,
    component: &str,
) -> OpenTelemetryLayer<S, opentelemetry_sdk::trace::Tracer>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let tracer = provider.tracer(component.to_string());
    tracing_opentelemetry::layer().with_tracer(tracer)
}

/// Build the fmt layer for human-readable output.
pub fn build_fmt_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
}

/// Build the env filter: `RUST_LOG` when set, `info` otherwise.
pub fn build_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a global `tracing` subscriber wired to `provider`.
///
/// Call at most once per process, after [`init`](crate::init).
pub fn init_subscriber(provider: &SdkTracerProvider, component: &str) {
    tracing_subscriber::registry()
        .with(build_filter())
        .with(build_otel_layer(provider, component))
        .with(build_fmt_layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::Registry;

    #[test]
    fn build_otel_layer_creates_layer() {
        let provider = SdkTracerProvider::builder().build();
        let _layer = build_otel_layer::<Registry>(&provider, "test-component");
    }

    #[test]
    fn filter_parses() {
        let _filter = build_filter();
    }
}
