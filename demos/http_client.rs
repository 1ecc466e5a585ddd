//! HTTP client demo: injects the current trace context into outbound
//! request headers through the carrier seam.

use opentelemetry::global;
use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer};
use opentelemetry::Context;
use opentelemetry_http::HeaderInjector;
use splunk_otel::OpenTelemetryOptions;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let provider = splunk_otel::init(
        OpenTelemetryOptions::new()
            .with_service_name("http-client-demo")
            .with_service_version("0.1.0"),
    )?;
    splunk_otel::subscriber::init_subscriber(&provider, "http-client");

    let tracer = global::tracer("http-client");
    let span = tracer
        .span_builder("GET /hello")
        .with_kind(SpanKind::Client)
        .start(&tracer);
    let cx = Context::current_with_span(span);

    let mut headers = reqwest::header::HeaderMap::new();
    global::get_text_map_propagator(|p| {
        p.inject_context(&cx, &mut HeaderInjector(&mut headers))
    });

    let client = reqwest::blocking::Client::new();
    let response = client
        .get("http://localhost:8080/hello?user=demo")
        .headers(headers)
        .send()?;
    info!(status = %response.status(), "response received");

    cx.span().end();
    splunk_otel::shutdown(&provider)?;
    Ok(())
}
