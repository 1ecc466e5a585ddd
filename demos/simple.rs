//! Minimal demo: initialize tracing, emit one span, flush, shut down.

use opentelemetry::global;
use opentelemetry::trace::{Span, Tracer};
use opentelemetry::KeyValue;
use splunk_otel::OpenTelemetryOptions;

fn main() -> Result<(), splunk_otel::TelemetryError> {
    let provider = splunk_otel::init(
        OpenTelemetryOptions::new()
            .with_service_name("simple-demo")
            .with_service_version("0.1.0")
            .with_deployment_environment("dev"),
    )?;

    let tracer = global::tracer("simple");
    let mut span = tracer.start("demo-operation");
    span.set_attribute(KeyValue::new("work.items", 3));
    span.end();

    splunk_otel::shutdown(&provider)?;
    Ok(())
}
