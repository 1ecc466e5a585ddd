//! Jaeger thrift-over-HTTP span exporter.
//!
//! Finished spans are serialized into a `jaeger.thrift` `Batch` (thrift
//! binary protocol) and POSTed to the collector endpoint. When an access
//! token is configured it is sent as the `X-SF-TOKEN` header.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use opentelemetry::trace::{SpanKind, Status};
use opentelemetry::{Key, Value};
use opentelemetry_sdk::error::{OTelSdkError, OTelSdkResult};
use opentelemetry_sdk::trace::{SpanData, SpanExporter};
use opentelemetry_sdk::Resource;
use reqwest::header::CONTENT_TYPE;

use crate::error::TelemetryError;

const ACCESS_TOKEN_HEADER: &str = "X-SF-TOKEN";
const THRIFT_CONTENT_TYPE: &str = "application/x-thrift";
const EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct JaegerThriftHttpExporter {
    client: reqwest::blocking::Client,
    endpoint: reqwest::Url,
    access_token: Option<String>,
    resource: Resource,
}

impl JaegerThriftHttpExporter {
    /// Validate the endpoint and build the exporter. A malformed endpoint is
    /// a fatal construction error.
    pub fn new(endpoint: &str, access_token: Option<String>) -> Result<Self, TelemetryError> {
        let endpoint = reqwest::Url::parse(endpoint).map_err(|e| TelemetryError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        // Built on a helper thread: the blocking client may not be created
        // on a thread that is running an async executor, and init is often
        // called from one.
        let client = std::thread::spawn(|| {
            reqwest::blocking::Client::builder()
                .timeout(EXPORT_TIMEOUT)
                .build()
        })
        .join()
        .map_err(|_| TelemetryError::Init("http client construction panicked".to_string()))??;

        Ok(Self {
            client,
            endpoint,
            access_token: access_token.filter(|token| !token.is_empty()),
            resource: Resource::builder_empty().build(),
        })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }
}

impl SpanExporter for JaegerThriftHttpExporter {
    async fn export(&self, batch: Vec<SpanData>) -> OTelSdkResult {
        let body = encode_batch(&self.resource, &batch);

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, THRIFT_CONTENT_TYPE)
            .body(body);
        if let Some(token) = &self.access_token {
            request = request.header(ACCESS_TOKEN_HEADER, token);
        }

        // The batch processor drives exports from its own worker thread, so
        // a blocking send is fine here.
        let response = request
            .send()
            .map_err(|e| OTelSdkError::InternalFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OTelSdkError::InternalFailure(format!(
                "jaeger collector returned {}",
                response.status()
            )));
        }

        Ok(())
    }

    fn set_resource(&mut self, resource: &Resource) {
        self.resource = resource.clone();
    }
}

// Thrift binary protocol type ids.
const T_BOOL: u8 = 2;
const T_DOUBLE: u8 = 4;
const T_I32: u8 = 8;
const T_I64: u8 = 10;
const T_STRING: u8 = 11;
const T_STRUCT: u8 = 12;
const T_LIST: u8 = 15;
const T_STOP: u8 = 0;

// jaeger.thrift TagType values.
const TAG_STRING: i32 = 0;
const TAG_DOUBLE: i32 = 1;
const TAG_BOOL: i32 = 2;
const TAG_LONG: i32 = 3;

// jaeger.thrift SpanRefType.
const REF_FOLLOWS_FROM: i32 = 1;

struct ThriftWriter {
    buf: Vec<u8>,
}

impl ThriftWriter {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn field(&mut self, type_id: u8, id: i16) {
        self.buf.push(type_id);
        self.buf.extend_from_slice(&id.to_be_bytes());
    }

    fn stop(&mut self) {
        self.buf.push(T_STOP);
    }

    fn bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn double(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_bits().to_be_bytes());
    }

    fn string(&mut self, v: &str) {
        self.i32(v.len() as i32);
        self.buf.extend_from_slice(v.as_bytes());
    }

    fn list(&mut self, elem_type: u8, count: usize) {
        self.buf.push(elem_type);
        self.i32(count as i32);
    }
}

/// Serialize one resource plus its finished spans into a jaeger `Batch`.
fn encode_batch(resource: &Resource, spans: &[SpanData]) -> Vec<u8> {
    let mut w = ThriftWriter::new();

    // Batch.process
    w.field(T_STRUCT, 1);
    write_process(&mut w, resource);

    // Batch.spans
    w.field(T_LIST, 2);
    w.list(T_STRUCT, spans.len());
    for span in spans {
        write_span(&mut w, span);
    }

    w.stop();
    w.buf
}

fn write_process(w: &mut ThriftWriter, resource: &Resource) {
    let service_name = resource
        .iter()
        .find(|(key, _)| key.as_str() == crate::resource::SERVICE_NAME)
        .map(|(_, value)| value.to_string())
        .unwrap_or_else(|| "unknown_service".to_string());

    let tags: Vec<(&Key, &Value)> = resource
        .iter()
        .filter(|(key, _)| key.as_str() != crate::resource::SERVICE_NAME)
        .collect();

    w.field(T_STRING, 1);
    w.string(&service_name);

    w.field(T_LIST, 2);
    w.list(T_STRUCT, tags.len());
    for (key, value) in tags {
        write_tag(w, key.as_str(), value);
    }

    w.stop();
}

fn write_span(w: &mut ThriftWriter, span: &SpanData) {
    let trace_id = u128::from_be_bytes(span.span_context.trace_id().to_bytes());
    let span_id = u64::from_be_bytes(span.span_context.span_id().to_bytes());
    let parent_id = u64::from_be_bytes(span.parent_span_id.to_bytes());

    w.field(T_I64, 1);
    w.i64(trace_id as u64 as i64);
    w.field(T_I64, 2);
    w.i64((trace_id >> 64) as u64 as i64);
    w.field(T_I64, 3);
    w.i64(span_id as i64);
    w.field(T_I64, 4);
    w.i64(parent_id as i64);

    w.field(T_STRING, 5);
    w.string(span.name.as_ref());

    if !span.links.links.is_empty() {
        w.field(T_LIST, 6);
        w.list(T_STRUCT, span.links.links.len());
        for link in span.links.links.iter() {
            let link_trace = u128::from_be_bytes(link.span_context.trace_id().to_bytes());
            let link_span = u64::from_be_bytes(link.span_context.span_id().to_bytes());
            w.field(T_I32, 1);
            w.i32(REF_FOLLOWS_FROM);
            w.field(T_I64, 2);
            w.i64(link_trace as u64 as i64);
            w.field(T_I64, 3);
            w.i64((link_trace >> 64) as u64 as i64);
            w.field(T_I64, 4);
            w.i64(link_span as i64);
            w.stop();
        }
    }

    w.field(T_I32, 7);
    w.i32(i32::from(span.span_context.is_sampled()));

    w.field(T_I64, 8);
    w.i64(micros_since_epoch(span.start_time));
    w.field(T_I64, 9);
    w.i64(duration_micros(span.start_time, span.end_time));

    let mut tags: Vec<(String, Value)> = span
        .attributes
        .iter()
        .map(|kv| (kv.key.to_string(), kv.value.clone()))
        .collect();
    tags.push((
        "span.kind".to_string(),
        Value::from(span_kind_name(&span.span_kind)),
    ));
    match &span.status {
        Status::Unset => {}
        Status::Ok => tags.push(("otel.status_code".to_string(), Value::from("OK"))),
        Status::Error { description } => {
            tags.push(("otel.status_code".to_string(), Value::from("ERROR")));
            if !description.is_empty() {
                tags.push((
                    "otel.status_description".to_string(),
                    Value::from(description.to_string()),
                ));
            }
        }
    }
    tags.push((
        "otel.library.name".to_string(),
        Value::from(span.instrumentation_scope.name().to_string()),
    ));

    w.field(T_LIST, 10);
    w.list(T_STRUCT, tags.len());
    for (key, value) in &tags {
        write_tag(w, key, value);
    }

    if !span.events.events.is_empty() {
        w.field(T_LIST, 11);
        w.list(T_STRUCT, span.events.events.len());
        for event in span.events.events.iter() {
            w.field(T_I64, 1);
            w.i64(micros_since_epoch(event.timestamp));
            w.field(T_LIST, 2);
            w.list(T_STRUCT, event.attributes.len() + 1);
            write_tag(w, "event", &Value::from(event.name.to_string()));
            for attribute in &event.attributes {
                write_tag(w, attribute.key.as_str(), &attribute.value);
            }
            w.stop();
        }
    }

    w.stop();
}

fn write_tag(w: &mut ThriftWriter, key: &str, value: &Value) {
    w.field(T_STRING, 1);
    w.string(key);

    match value {
        Value::String(v) => {
            w.field(T_I32, 2);
            w.i32(TAG_STRING);
            w.field(T_STRING, 3);
            w.string(v.as_str());
        }
        Value::F64(v) => {
            w.field(T_I32, 2);
            w.i32(TAG_DOUBLE);
            w.field(T_DOUBLE, 4);
            w.double(*v);
        }
        Value::Bool(v) => {
            w.field(T_I32, 2);
            w.i32(TAG_BOOL);
            w.field(T_BOOL, 5);
            w.bool(*v);
        }
        Value::I64(v) => {
            w.field(T_I32, 2);
            w.i32(TAG_LONG);
            w.field(T_I64, 6);
            w.i64(*v);
        }
        other => {
            w.field(T_I32, 2);
            w.i32(TAG_STRING);
            w.field(T_STRING, 3);
            w.string(&other.as_str());
        }
    }

    w.stop();
}

fn span_kind_name(kind: &SpanKind) -> &'static str {
    match kind {
        SpanKind::Client => "client",
        SpanKind::Server => "server",
        SpanKind::Producer => "producer",
        SpanKind::Consumer => "consumer",
        SpanKind::Internal => "internal",
    }
}

fn micros_since_epoch(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}

fn duration_micros(start: SystemTime, end: SystemTime) -> i64 {
    end.duration_since(start)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}
