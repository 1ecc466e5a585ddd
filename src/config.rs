use std::collections::HashMap;

use crate::env::{
    self, EnvSnapshot, OTEL_EXPORTER_JAEGER_ENDPOINT, OTEL_EXPORTER_OTLP_ENDPOINT,
    OTEL_EXPORTER_OTLP_PROTOCOL, OTEL_PROPAGATORS, OTEL_TRACES_EXPORTER, SPLUNK_ACCESS_TOKEN,
};
use crate::resource;

/// OTLP target used when neither the caller nor the environment provides one.
pub const DEFAULT_OTLP_ENDPOINT: &str = "localhost:4317";

/// Jaeger collector target used when neither the caller nor the environment
/// provides one.
pub const DEFAULT_JAEGER_ENDPOINT: &str = "http://localhost:9080/v1/trace";

const JAEGER_EXPORTER_TOKEN: &str = "jaeger-thrift-splunk";

/// Span exporter selection.
///
/// `None` means "not chosen by the caller" and resolves from
/// `OTEL_TRACES_EXPORTER`; the factory treats it like `Otlp` if it ever
/// reaches construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExporterKind {
    #[default]
    None,
    Otlp,
    JaegerThriftHttp,
}

impl ExporterKind {
    fn parse(token: &str) -> Self {
        if token == JAEGER_EXPORTER_TOKEN {
            Self::JaegerThriftHttp
        } else {
            Self::Otlp
        }
    }
}

/// OTLP transport and payload encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OtlpProtocol {
    #[default]
    Grpc,
    HttpJson,
    HttpProtobuf,
}

impl OtlpProtocol {
    /// Parse a normalized protocol name. Unrecognized names yield `None`;
    /// resolution maps that to [`OtlpProtocol::Grpc`].
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "grpc" => Some(Self::Grpc),
            "http/json" => Some(Self::HttpJson),
            "http/protobuf" => Some(Self::HttpProtobuf),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grpc => "grpc",
            Self::HttpJson => "http/json",
            Self::HttpProtobuf => "http/protobuf",
        }
    }
}

/// A single context propagation format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagator {
    TraceContext,
    B3,
    B3Multi,
    Baggage,
}

impl Propagator {
    /// All variants, in the order the composite propagator applies them.
    pub const ALL: [Propagator; 4] = [
        Propagator::TraceContext,
        Propagator::B3,
        Propagator::B3Multi,
        Propagator::Baggage,
    ];

    fn parse(token: &str) -> Option<Self> {
        match token {
            "tracecontext" => Some(Self::TraceContext),
            "b3" => Some(Self::B3),
            "b3multi" => Some(Self::B3Multi),
            "baggage" => Some(Self::Baggage),
            _ => None,
        }
    }
}

/// A subset of [`Propagator`] variants.
///
/// Iteration order is fixed by declaration order (trace-context, B3,
/// B3-multi, baggage) no matter the order of insertion, so the composite
/// propagator built from a set always applies its members deterministically.
/// The empty set on [`OpenTelemetryOptions`] means "not chosen by the
/// caller".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagatorSet {
    trace_context: bool,
    b3: bool,
    b3_multi: bool,
    baggage: bool,
}

impl PropagatorSet {
    pub const EMPTY: Self = Self {
        trace_context: false,
        b3: false,
        b3_multi: false,
        baggage: false,
    };

    /// The pair installed when neither the caller nor the environment
    /// selects any propagator: trace-context and baggage.
    pub fn standard() -> Self {
        Self::of(&[Propagator::TraceContext, Propagator::Baggage])
    }

    pub fn of(propagators: &[Propagator]) -> Self {
        propagators.iter().copied().collect()
    }

    pub fn insert(&mut self, propagator: Propagator) {
        match propagator {
            Propagator::TraceContext => self.trace_context = true,
            Propagator::B3 => self.b3 = true,
            Propagator::B3Multi => self.b3_multi = true,
            Propagator::Baggage => self.baggage = true,
        }
    }

    pub fn with(mut self, propagator: Propagator) -> Self {
        self.insert(propagator);
        self
    }

    pub fn contains(&self, propagator: Propagator) -> bool {
        match propagator {
            Propagator::TraceContext => self.trace_context,
            Propagator::B3 => self.b3,
            Propagator::B3Multi => self.b3_multi,
            Propagator::Baggage => self.baggage,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Members in fixed declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Propagator> + '_ {
        Propagator::ALL.into_iter().filter(|p| self.contains(*p))
    }

    /// Parse a comma-separated propagator list. Unknown tokens are ignored.
    pub fn parse_list(value: &str) -> Self {
        env::split_list(value).filter_map(Propagator::parse).collect()
    }
}

impl FromIterator<Propagator> for PropagatorSet {
    fn from_iter<I: IntoIterator<Item = Propagator>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for propagator in iter {
            set.insert(propagator);
        }
        set
    }
}

/// Caller-supplied tracing options.
///
/// Every field is optional; anything unset (empty string, empty set,
/// [`ExporterKind::None`]) falls back to the corresponding environment
/// variable and then to a built-in default when [`resolve`] runs — it is
/// never an error.
///
/// ```
/// use splunk_otel::{ExporterKind, OpenTelemetryOptions};
///
/// let options = OpenTelemetryOptions::new()
///     .with_service_name("checkout")
///     .with_service_version("1.4.2")
///     .with_deployment_environment("prod")
///     .with_exporter(ExporterKind::Otlp);
/// ```
///
/// [`resolve`]: OpenTelemetryOptions::resolve
#[derive(Debug, Clone, Default)]
pub struct OpenTelemetryOptions {
    pub resource_attributes: HashMap<String, String>,
    pub exporter: ExporterKind,
    pub propagators: PropagatorSet,
    pub otlp_endpoint: String,
    pub otlp_protocol: Option<OtlpProtocol>,
    pub jaeger_endpoint: String,
    pub access_token: String,
}

impl OpenTelemetryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service_name(self, service_name: impl Into<String>) -> Self {
        self.with_attribute(resource::SERVICE_NAME, service_name)
    }

    pub fn with_service_version(self, service_version: impl Into<String>) -> Self {
        self.with_attribute(resource::SERVICE_VERSION, service_version)
    }

    pub fn with_deployment_environment(self, environment: impl Into<String>) -> Self {
        self.with_attribute(resource::DEPLOYMENT_ENVIRONMENT, environment)
    }

    /// Set one resource attribute. Setting the same key again overwrites the
    /// previous value.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.resource_attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_exporter(mut self, exporter: ExporterKind) -> Self {
        self.exporter = exporter;
        self
    }

    pub fn with_propagators(mut self, propagators: PropagatorSet) -> Self {
        self.propagators = propagators;
        self
    }

    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    pub fn with_otlp_protocol(mut self, protocol: OtlpProtocol) -> Self {
        self.otlp_protocol = Some(protocol);
        self
    }

    pub fn with_jaeger_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.jaeger_endpoint = endpoint.into();
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    /// Resolve these options against an environment snapshot.
    ///
    /// Per field: an explicit value wins; otherwise the environment variable
    /// applies (normalized); otherwise the built-in default. Invalid
    /// environment values degrade to the default instead of failing.
    pub fn resolve(&self, env: &EnvSnapshot) -> ResolvedOptions {
        let exporter = match self.exporter {
            ExporterKind::None => {
                ExporterKind::parse(&env.get_or(OTEL_TRACES_EXPORTER, "otlp"))
            }
            explicit => explicit,
        };

        let propagators = if self.propagators.is_empty() {
            let from_env = PropagatorSet::parse_list(
                &env.get_or(OTEL_PROPAGATORS, "tracecontext,baggage"),
            );
            if from_env.is_empty() {
                PropagatorSet::standard()
            } else {
                from_env
            }
        } else {
            self.propagators
        };

        let otlp_protocol = match self.otlp_protocol {
            Some(protocol) => protocol,
            None => env
                .get(OTEL_EXPORTER_OTLP_PROTOCOL)
                .and_then(OtlpProtocol::parse)
                .unwrap_or_default(),
        };

        ResolvedOptions {
            resource_attributes: resource::merge_env_attributes(&self.resource_attributes, env),
            exporter,
            propagators,
            otlp_endpoint: non_empty_or(&self.otlp_endpoint, || {
                env.get_or(OTEL_EXPORTER_OTLP_ENDPOINT, DEFAULT_OTLP_ENDPOINT)
            }),
            otlp_protocol,
            jaeger_endpoint: non_empty_or(&self.jaeger_endpoint, || {
                env.get_or(OTEL_EXPORTER_JAEGER_ENDPOINT, DEFAULT_JAEGER_ENDPOINT)
            }),
            access_token: non_empty_or(&self.access_token, || {
                env.get_or(SPLUNK_ACCESS_TOKEN, "")
            }),
        }
    }
}

fn non_empty_or(explicit: &str, fallback: impl FnOnce() -> String) -> String {
    if explicit.is_empty() {
        fallback()
    } else {
        explicit.to_string()
    }
}

/// Options after resolution: every field concrete, the protocol one of the
/// three supported values, the propagator set non-empty, and resource
/// attributes fully merged with the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub resource_attributes: HashMap<String, String>,
    pub exporter: ExporterKind,
    pub propagators: PropagatorSet,
    pub otlp_endpoint: String,
    pub otlp_protocol: OtlpProtocol,
    pub jaeger_endpoint: String,
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{
        OTEL_EXPORTER_OTLP_ENDPOINT, OTEL_EXPORTER_OTLP_PROTOCOL, OTEL_PROPAGATORS,
        OTEL_TRACES_EXPORTER, SPLUNK_ACCESS_TOKEN,
    };

    fn empty_env() -> EnvSnapshot {
        EnvSnapshot::default()
    }

    #[test]
    fn all_defaults_resolve_to_otlp_grpc() {
        let resolved = OpenTelemetryOptions::new().resolve(&empty_env());

        assert_eq!(resolved.exporter, ExporterKind::Otlp);
        assert_eq!(resolved.otlp_protocol, OtlpProtocol::Grpc);
        assert_eq!(resolved.otlp_endpoint, DEFAULT_OTLP_ENDPOINT);
        assert_eq!(resolved.jaeger_endpoint, DEFAULT_JAEGER_ENDPOINT);
        assert_eq!(resolved.access_token, "");
        assert_eq!(
            resolved.propagators,
            PropagatorSet::of(&[Propagator::TraceContext, Propagator::Baggage])
        );
    }

    #[test]
    fn explicit_values_win_over_environment() {
        let env = EnvSnapshot::from_pairs([
            (OTEL_TRACES_EXPORTER, "jaeger-thrift-splunk"),
            (OTEL_EXPORTER_OTLP_ENDPOINT, "env-collector:4317"),
            (OTEL_EXPORTER_OTLP_PROTOCOL, "http/json"),
            (OTEL_PROPAGATORS, "b3"),
            (SPLUNK_ACCESS_TOKEN, "env-token"),
        ]);

        let resolved = OpenTelemetryOptions::new()
            .with_exporter(ExporterKind::Otlp)
            .with_otlp_endpoint("explicit:4317")
            .with_otlp_protocol(OtlpProtocol::HttpProtobuf)
            .with_propagators(PropagatorSet::of(&[Propagator::Baggage]))
            .with_access_token("explicit-token")
            .resolve(&env);

        assert_eq!(resolved.exporter, ExporterKind::Otlp);
        assert_eq!(resolved.otlp_endpoint, "explicit:4317");
        assert_eq!(resolved.otlp_protocol, OtlpProtocol::HttpProtobuf);
        assert_eq!(resolved.propagators, PropagatorSet::of(&[Propagator::Baggage]));
        assert_eq!(resolved.access_token, "explicit-token");
    }

    #[test]
    fn environment_fills_unset_fields() {
        let env = EnvSnapshot::from_pairs([
            (OTEL_TRACES_EXPORTER, "jaeger-thrift-splunk"),
            (OTEL_EXPORTER_OTLP_ENDPOINT, "collector:4317"),
            ("OTEL_EXPORTER_JAEGER_ENDPOINT", "http://collector:9080/v1/trace"),
            (SPLUNK_ACCESS_TOKEN, "s3cret"),
        ]);

        let resolved = OpenTelemetryOptions::new().resolve(&env);

        assert_eq!(resolved.exporter, ExporterKind::JaegerThriftHttp);
        assert_eq!(resolved.otlp_endpoint, "collector:4317");
        assert_eq!(resolved.jaeger_endpoint, "http://collector:9080/v1/trace");
        assert_eq!(resolved.access_token, "s3cret");
    }

    #[test]
    fn environment_values_are_normalized() {
        let env = EnvSnapshot::from_pairs([(OTEL_EXPORTER_OTLP_PROTOCOL, " HTTP/JSON ")]);
        let resolved = OpenTelemetryOptions::new().resolve(&env);
        assert_eq!(resolved.otlp_protocol, OtlpProtocol::HttpJson);
    }

    #[test]
    fn invalid_protocol_normalizes_to_grpc() {
        let env = EnvSnapshot::from_pairs([(OTEL_EXPORTER_OTLP_PROTOCOL, "foo")]);
        let resolved = OpenTelemetryOptions::new().resolve(&env);
        assert_eq!(resolved.otlp_protocol, OtlpProtocol::Grpc);
    }

    #[test]
    fn unknown_exporter_name_normalizes_to_otlp() {
        let env = EnvSnapshot::from_pairs([(OTEL_TRACES_EXPORTER, "zipkin")]);
        let resolved = OpenTelemetryOptions::new().resolve(&env);
        assert_eq!(resolved.exporter, ExporterKind::Otlp);
    }

    #[test]
    fn propagators_parse_ignores_unknown_tokens() {
        let env = EnvSnapshot::from_pairs([(OTEL_PROPAGATORS, "b3,bogus,baggage")]);
        let resolved = OpenTelemetryOptions::new().resolve(&env);
        assert_eq!(
            resolved.propagators,
            PropagatorSet::of(&[Propagator::B3, Propagator::Baggage])
        );
    }

    #[test]
    fn propagators_all_unknown_falls_back_to_standard_pair() {
        let env = EnvSnapshot::from_pairs([(OTEL_PROPAGATORS, "bogus,also-bogus")]);
        let resolved = OpenTelemetryOptions::new().resolve(&env);
        assert_eq!(resolved.propagators, PropagatorSet::standard());
    }

    #[test]
    fn explicit_propagators_win_wholesale_over_environment() {
        let env = EnvSnapshot::from_pairs([(OTEL_PROPAGATORS, "tracecontext,baggage")]);
        let resolved = OpenTelemetryOptions::new()
            .with_propagators(PropagatorSet::of(&[Propagator::B3Multi]))
            .resolve(&env);
        assert_eq!(resolved.propagators, PropagatorSet::of(&[Propagator::B3Multi]));
    }

    #[test]
    fn propagator_set_iterates_in_declaration_order() {
        let set = PropagatorSet::of(&[Propagator::Baggage, Propagator::B3, Propagator::TraceContext]);
        let ordered: Vec<Propagator> = set.iter().collect();
        assert_eq!(
            ordered,
            vec![Propagator::TraceContext, Propagator::B3, Propagator::Baggage]
        );
    }

    #[test]
    fn attribute_last_write_wins() {
        let options = OpenTelemetryOptions::new()
            .with_service_name("first")
            .with_service_name("second");
        assert_eq!(options.resource_attributes[resource::SERVICE_NAME], "second");
    }

    #[test]
    fn resolution_is_pure_over_its_inputs() {
        let env = EnvSnapshot::from_pairs([(OTEL_EXPORTER_OTLP_ENDPOINT, "collector:4317")]);
        let options = OpenTelemetryOptions::new().with_service_name("svc");
        assert_eq!(options.resolve(&env), options.resolve(&env));
    }
}
