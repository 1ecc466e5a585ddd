use std::collections::HashMap;

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;

use crate::config::ResolvedOptions;
use crate::env::{self, EnvSnapshot, OTEL_RESOURCE_ATTRIBUTES, OTEL_SERVICE_NAME};

pub use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};

/// Deployment environment attribute key.
///
/// Kept as the classic key rather than the renamed semantic-convention
/// constant so the attribute stays wire-compatible with existing dashboards.
pub const DEPLOYMENT_ENVIRONMENT: &str = "deployment.environment";

/// Resource attributes carried by the environment: `OTEL_RESOURCE_ATTRIBUTES`
/// plus `OTEL_SERVICE_NAME`, which overrides any `service.name` given in the
/// attribute list.
fn env_attributes(env: &EnvSnapshot) -> HashMap<String, String> {
    let mut attributes = env
        .get(OTEL_RESOURCE_ATTRIBUTES)
        .map(env::parse_key_value_list)
        .unwrap_or_default();

    if let Some(service_name) = env.get(OTEL_SERVICE_NAME) {
        attributes.insert(SERVICE_NAME.to_string(), service_name.to_string());
    }

    attributes
}

/// Merge explicit attributes with environment-derived ones.
///
/// Explicit attributes always win; the environment only fills gaps. Keys
/// absent from both stay absent — the SDK resource supplies its own
/// placeholders (`unknown_service`) downstream.
pub(crate) fn merge_env_attributes(
    explicit: &HashMap<String, String>,
    env: &EnvSnapshot,
) -> HashMap<String, String> {
    let mut merged = explicit.clone();
    for (key, value) in env_attributes(env) {
        merged.entry(key).or_insert(value);
    }
    merged
}

/// Build the resource attached to every exported span.
pub fn build_resource(resolved: &ResolvedOptions) -> Resource {
    let attributes: Vec<KeyValue> = resolved
        .resource_attributes
        .iter()
        .map(|(key, value)| KeyValue::new(key.clone(), value.clone()))
        .collect();

    Resource::builder().with_attributes(attributes).build()
}
