//! HTTP server demo: reconstructs the inbound trace context from request
//! headers through the carrier seam, then serves under a server span.

use actix_web::{get, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use opentelemetry::global;
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::{Span, SpanKind, Tracer};
use serde::Deserialize;
use splunk_otel::OpenTelemetryOptions;
use std::env;
use tracing::info;
use tracing_actix_web::TracingLogger;

/// Read-side carrier over the incoming request headers.
struct HeaderCarrier<'a>(&'a actix_web::http::header::HeaderMap);

impl Extractor for HeaderCarrier<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

#[derive(Deserialize)]
struct HelloQuery {
    user: Option<String>,
}

#[get("/hello")]
async fn hello(req: HttpRequest, query: web::Query<HelloQuery>) -> impl Responder {
    let parent_cx =
        global::get_text_map_propagator(|p| p.extract(&HeaderCarrier(req.headers())));

    let tracer = global::tracer("http-server");
    let mut span = tracer
        .span_builder("GET /hello")
        .with_kind(SpanKind::Server)
        .start_with_context(&tracer, &parent_cx);

    let user = query.user.as_deref().unwrap_or("anonymous");
    info!(user, "hello endpoint called");
    let body = format!("Hello, {user}!");

    span.end();
    HttpResponse::Ok().body(body)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let provider = splunk_otel::init(
        OpenTelemetryOptions::new()
            .with_service_name("http-server-demo")
            .with_service_version("0.1.0"),
    )
    .expect("failed to initialize tracing");
    splunk_otel::subscriber::init_subscriber(&provider, "http-server");

    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .expect("PORT must be a number");

    info!("starting server on port {}", port);

    HttpServer::new(|| App::new().wrap(TracingLogger::default()).service(hello))
        .bind(("0.0.0.0", port))?
        .run()
        .await
}
