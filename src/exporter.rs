use std::time::Duration;

use opentelemetry_otlp::{Protocol, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{SpanData, SpanExporter};
use opentelemetry_sdk::Resource;
use tonic::transport::ClientTlsConfig;
use tracing::debug;

use crate::config::{ExporterKind, OtlpProtocol, ResolvedOptions};
use crate::error::TelemetryError;
use crate::jaeger::JaegerThriftHttpExporter;

/// The exporter variants this crate can install.
///
/// A closed set dispatched here rather than an open trait object: the
/// selection is fixed and the provider builder wants one concrete type.
#[derive(Debug)]
pub enum TraceExporter {
    Otlp(opentelemetry_otlp::SpanExporter),
    JaegerThriftHttp(JaegerThriftHttpExporter),
}

impl SpanExporter for TraceExporter {
    async fn export(&self, batch: Vec<SpanData>) -> OTelSdkResult {
        match self {
            Self::Otlp(exporter) => exporter.export(batch).await,
            Self::JaegerThriftHttp(exporter) => exporter.export(batch).await,
        }
    }

    fn shutdown_with_timeout(&mut self, timeout: Duration) -> OTelSdkResult {
        match self {
            Self::Otlp(exporter) => exporter.shutdown_with_timeout(timeout),
            Self::JaegerThriftHttp(exporter) => exporter.shutdown_with_timeout(timeout),
        }
    }

    fn force_flush(&mut self) -> OTelSdkResult {
        match self {
            Self::Otlp(exporter) => exporter.force_flush(),
            Self::JaegerThriftHttp(exporter) => exporter.force_flush(),
        }
    }

    fn set_resource(&mut self, resource: &Resource) {
        match self {
            Self::Otlp(exporter) => exporter.set_resource(resource),
            Self::JaegerThriftHttp(exporter) => exporter.set_resource(resource),
        }
    }
}

/// Build the exporter selected by the resolved options.
///
/// Anything that is not the Jaeger kind builds an OTLP exporter: the
/// `http/json` and `http/protobuf` protocols share the HTTP transport and
/// differ only in payload encoding, every other protocol value means gRPC.
/// Endpoint validation failures are fatal and propagate to the caller.
pub fn build_exporter(resolved: &ResolvedOptions) -> Result<TraceExporter, TelemetryError> {
    match resolved.exporter {
        ExporterKind::JaegerThriftHttp => {
            debug!("using jaeger thrift http exporter: {}", resolved.jaeger_endpoint);
            let token = if resolved.access_token.is_empty() {
                None
            } else {
                Some(resolved.access_token.clone())
            };
            let exporter = JaegerThriftHttpExporter::new(&resolved.jaeger_endpoint, token)?;
            Ok(TraceExporter::JaegerThriftHttp(exporter))
        }
        _ => build_otlp(resolved),
    }
}

fn build_otlp(resolved: &ResolvedOptions) -> Result<TraceExporter, TelemetryError> {
    let exporter = match resolved.otlp_protocol {
        OtlpProtocol::HttpJson | OtlpProtocol::HttpProtobuf => {
            debug!(
                "using otlp http exporter ({}): {}",
                resolved.otlp_protocol.as_str(),
                resolved.otlp_endpoint
            );
            let protocol = match resolved.otlp_protocol {
                OtlpProtocol::HttpJson => Protocol::HttpJson,
                _ => Protocol::HttpBinary,
            };
            opentelemetry_otlp::SpanExporter::builder()
                .with_http()
                .with_endpoint(resolved.otlp_endpoint.as_str())
                .with_protocol(protocol)
                .build()?
        }
        OtlpProtocol::Grpc => {
            debug!("using otlp grpc exporter: {}", resolved.otlp_endpoint);
            // gRPC targets are commonly given as bare host:port, but the
            // tonic channel wants a full URI.
            let endpoint = if resolved.otlp_endpoint.contains("://") {
                resolved.otlp_endpoint.clone()
            } else {
                format!("http://{}", resolved.otlp_endpoint)
            };
            let mut builder = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint.as_str());
            if endpoint.starts_with("https://") {
                builder = builder.with_tls_config(ClientTlsConfig::new().with_native_roots());
            }
            builder.build()?
        }
    };

    Ok(TraceExporter::Otlp(exporter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenTelemetryOptions;
    use crate::env::EnvSnapshot;

    fn resolved() -> ResolvedOptions {
        OpenTelemetryOptions::new().resolve(&EnvSnapshot::default())
    }

    #[tokio::test]
    async fn default_selection_is_otlp() {
        let exporter = build_exporter(&resolved()).unwrap();
        assert!(matches!(exporter, TraceExporter::Otlp(_)));
    }

    #[test]
    fn http_protocols_build_otlp_http_exporters() {
        for protocol in [OtlpProtocol::HttpJson, OtlpProtocol::HttpProtobuf] {
            let resolved = ResolvedOptions {
                otlp_endpoint: "http://localhost:4318/v1/traces".to_string(),
                otlp_protocol: protocol,
                ..resolved()
            };
            let exporter = build_exporter(&resolved).unwrap();
            assert!(matches!(exporter, TraceExporter::Otlp(_)));
        }
    }

    #[test]
    fn jaeger_kind_builds_jaeger_exporter() {
        let resolved = ResolvedOptions {
            exporter: ExporterKind::JaegerThriftHttp,
            access_token: "t0ken".to_string(),
            ..resolved()
        };

        match build_exporter(&resolved).unwrap() {
            TraceExporter::JaegerThriftHttp(exporter) => {
                assert_eq!(exporter.endpoint().as_str(), "http://localhost:9080/v1/trace");
                assert!(exporter.has_access_token());
            }
            other => panic!("expected jaeger exporter, got {other:?}"),
        }
    }

    #[test]
    fn jaeger_without_token_sends_no_auth_header() {
        let resolved = ResolvedOptions {
            exporter: ExporterKind::JaegerThriftHttp,
            ..resolved()
        };

        match build_exporter(&resolved).unwrap() {
            TraceExporter::JaegerThriftHttp(exporter) => assert!(!exporter.has_access_token()),
            other => panic!("expected jaeger exporter, got {other:?}"),
        }
    }

    #[test]
    fn malformed_jaeger_endpoint_is_fatal() {
        let resolved = ResolvedOptions {
            exporter: ExporterKind::JaegerThriftHttp,
            jaeger_endpoint: "::not-a-url::".to_string(),
            ..resolved()
        };

        assert!(matches!(
            build_exporter(&resolved),
            Err(TelemetryError::InvalidEndpoint { .. })
        ));
    }

    #[tokio::test]
    async fn unresolved_none_kind_falls_back_to_otlp() {
        let resolved = ResolvedOptions {
            exporter: ExporterKind::None,
            ..resolved()
        };
        let exporter = build_exporter(&resolved).unwrap();
        assert!(matches!(exporter, TraceExporter::Otlp(_)));
    }
}
