use opentelemetry::global;
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::trace::noop::NoopTracerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;

use crate::config::{OpenTelemetryOptions, ResolvedOptions};
use crate::env::EnvSnapshot;
use crate::error::TelemetryError;
use crate::exporter::build_exporter;
use crate::propagation;
use crate::resource::build_resource;

/// Initialize tracing for this process.
///
/// Resolves `options` against the current environment, builds the resource
/// and the selected exporter, wraps the exporter in a batching span
/// processor, and installs the resulting tracer provider together with the
/// composite propagator as process-wide globals. The provider is also
/// returned so the caller can hold a direct reference for flushing and
/// shutdown.
///
/// Calling this again fully replaces both globals (last write wins); it
/// never merges. It is meant to run once, during single-threaded startup —
/// concurrent calls race on the global registrations.
pub fn init(options: OpenTelemetryOptions) -> Result<SdkTracerProvider, TelemetryError> {
    let env = EnvSnapshot::from_process();
    init_resolved(&options.resolve(&env))
}

/// [`init`] for options that were already resolved, e.g. against a custom
/// environment snapshot.
pub fn init_resolved(resolved: &ResolvedOptions) -> Result<SdkTracerProvider, TelemetryError> {
    let resource = build_resource(resolved);
    let exporter = build_exporter(resolved)?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();

    global::set_tracer_provider(provider.clone());
    propagation::install(resolved.propagators);

    Ok(provider)
}

/// Flush and shut down a provider returned by [`init`] and reset both
/// process-wide globals to no-ops.
///
/// Intended for graceful process shutdown, and as the teardown hook tests
/// use between cases.
pub fn shutdown(provider: &SdkTracerProvider) -> Result<(), TelemetryError> {
    let result = provider
        .shutdown()
        .map_err(|e| TelemetryError::Shutdown(e.to_string()));

    global::set_tracer_provider(NoopTracerProvider::new());
    global::set_text_map_propagator(TextMapCompositePropagator::new(Vec::new()));

    result
}
