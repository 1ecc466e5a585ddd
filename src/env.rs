use std::collections::HashMap;
use std::env;

/// Selects the traces exporter: `otlp` or `jaeger-thrift-splunk`.
pub const OTEL_TRACES_EXPORTER: &str = "OTEL_TRACES_EXPORTER";
/// Comma-separated propagator list (`tracecontext,b3,b3multi,baggage`).
pub const OTEL_PROPAGATORS: &str = "OTEL_PROPAGATORS";
/// OTLP collector target.
pub const OTEL_EXPORTER_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
/// OTLP transport: `grpc`, `http/json` or `http/protobuf`.
pub const OTEL_EXPORTER_OTLP_PROTOCOL: &str = "OTEL_EXPORTER_OTLP_PROTOCOL";
/// Jaeger collector target for the thrift-over-HTTP exporter.
pub const OTEL_EXPORTER_JAEGER_ENDPOINT: &str = "OTEL_EXPORTER_JAEGER_ENDPOINT";
/// Comma-separated `key=value` resource attributes.
pub const OTEL_RESOURCE_ATTRIBUTES: &str = "OTEL_RESOURCE_ATTRIBUTES";
/// Fallback for the `service.name` resource attribute.
pub const OTEL_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
/// Token sent as `X-SF-TOKEN` on Jaeger exporter requests.
pub const SPLUNK_ACCESS_TOKEN: &str = "SPLUNK_ACCESS_TOKEN";

const KNOWN_VARS: &[&str] = &[
    OTEL_TRACES_EXPORTER,
    OTEL_PROPAGATORS,
    OTEL_EXPORTER_OTLP_ENDPOINT,
    OTEL_EXPORTER_OTLP_PROTOCOL,
    OTEL_EXPORTER_JAEGER_ENDPOINT,
    OTEL_RESOURCE_ATTRIBUTES,
    OTEL_SERVICE_NAME,
    SPLUNK_ACCESS_TOKEN,
];

/// The environment variables relevant to tracing configuration, captured at
/// one point in time with normalized values.
///
/// A snapshot is taken once per resolution call and never cached, so tests
/// and long-lived processes always observe the current environment. Values
/// are normalized on capture: every blank character is removed and the rest
/// is lower-cased. A variable whose value normalizes to the empty string is
/// treated as unset.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the known variables from the process environment.
    pub fn from_process() -> Self {
        Self::capture(|name| env::var(name).ok())
    }

    /// Build a snapshot from explicit pairs. Unknown names are kept too, so
    /// callers can seed exactly what a test needs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut vars = HashMap::new();
        for (name, value) in pairs {
            let normalized = normalize(value.as_ref());
            if !normalized.is_empty() {
                vars.insert(name.into(), normalized);
            }
        }
        Self { vars }
    }

    fn capture(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut vars = HashMap::new();
        for name in KNOWN_VARS {
            if let Some(raw) = lookup(name) {
                let normalized = normalize(&raw);
                if !normalized.is_empty() {
                    vars.insert((*name).to_string(), normalized);
                }
            }
        }
        Self { vars }
    }

    /// Normalized value of `name`, or `None` when unset (or blank).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Normalized value of `name`, or `default` when unset.
    pub fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or(default).to_string()
    }
}

/// Strip every blank character and lower-case the remainder.
pub(crate) fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != ' ' && *c != '\t')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split a comma-separated list into its raw tokens. Empty tokens are kept;
/// callers discard what they do not recognize.
pub(crate) fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',')
}

/// Parse a comma-separated `key=value` list. Tokens without exactly one `=`
/// (missing, or more than one) are dropped. Later occurrences of a key win.
pub(crate) fn parse_key_value_list(value: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for token in split_list(value) {
        let mut parts = token.split('=');
        if let (Some(key), Some(val), None) = (parts.next(), parts.next(), parts.next()) {
            if !key.is_empty() {
                attributes.insert(key.to_string(), val.to_string());
            }
        }
    }
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_blanks_and_lowercases() {
        assert_eq!(normalize(" HTTP/Json\t"), "http/json");
        assert_eq!(normalize("a b\tc"), "abc");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn snapshot_drops_blank_values() {
        let env = EnvSnapshot::from_pairs([(OTEL_TRACES_EXPORTER, "  \t ")]);
        assert_eq!(env.get(OTEL_TRACES_EXPORTER), None);
    }

    #[test]
    fn snapshot_normalizes_values() {
        let env = EnvSnapshot::from_pairs([(OTEL_EXPORTER_OTLP_PROTOCOL, " HTTP/Protobuf ")]);
        assert_eq!(env.get(OTEL_EXPORTER_OTLP_PROTOCOL), Some("http/protobuf"));
    }

    #[test]
    fn get_or_falls_back_when_unset() {
        let env = EnvSnapshot::default();
        assert_eq!(env.get_or(OTEL_EXPORTER_OTLP_ENDPOINT, "localhost:4317"), "localhost:4317");
    }

    #[test]
    fn from_process_reads_known_vars() {
        env::set_var("OTEL_EXPORTER_JAEGER_ENDPOINT", " http://COLLECTOR:9080/v1/trace ");
        let env_snapshot = EnvSnapshot::from_process();
        assert_eq!(
            env_snapshot.get(OTEL_EXPORTER_JAEGER_ENDPOINT),
            Some("http://collector:9080/v1/trace")
        );
        env::remove_var("OTEL_EXPORTER_JAEGER_ENDPOINT");
    }

    #[test]
    fn parse_key_value_list_drops_malformed_tokens() {
        let attrs = parse_key_value_list("a=1,broken,b=2=3,c=4,=5");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs["a"], "1");
        assert_eq!(attrs["c"], "4");
    }

    #[test]
    fn parse_key_value_list_last_assignment_wins() {
        let attrs = parse_key_value_list("k=1,k=2");
        assert_eq!(attrs["k"], "2");
    }

    #[test]
    fn parse_key_value_list_empty_input_is_empty() {
        assert!(parse_key_value_list("").is_empty());
    }
}
