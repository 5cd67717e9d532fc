//! MetricsContext: a server-side metrics subscription plus the cached
//! group definitions needed to decode `get_metrics()` bodies.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{HmcError, Result};
use crate::manager::{Manager, ManagerSpec};
use crate::metrics_response::{MetricDefinition, MetricGroupDefinition, MetricType, MetricsResponse};

super::resource_wrapper!(
    /// A metrics context created against `/api/services/metrics/context`.
    MetricsContext
);

pub(crate) const METRICS_CONTEXT_BASE_URI: &str = "/api/services/metrics/context";

pub(crate) fn metrics_context_spec() -> ManagerSpec {
    ManagerSpec {
        class_name: "metrics-context",
        list_uri: String::new(),
        members_key: "",
        base_uri: METRICS_CONTEXT_BASE_URI.to_string(),
        oid_prop: "metrics-context-uri",
        uri_prop: "metrics-context-uri",
        name_prop: "name",
        query_props: &[],
        supports_properties: true,
        case_insensitive_names: false,
    }
}

pub type MetricsContextManager = Manager<MetricsContext>;

#[must_use]
pub fn metrics_context_manager(session: crate::session::Session) -> MetricsContextManager {
    Manager::new(session, None, metrics_context_spec())
}

fn metric_type_from_str(s: &str) -> MetricType {
    match s {
        "integer-metric" | "integer" => MetricType::Integer,
        "boolean-metric" | "boolean" => MetricType::Boolean,
        "double-metric" | "double" => MetricType::Double,
        _ => MetricType::String,
    }
}

/// Parse the `metric-group-infos` array the HMC returns alongside a newly
/// created metrics context into the group-name-keyed map `MetricsResponse`
/// parsing needs.
fn parse_group_infos(value: &Value) -> HashMap<String, MetricGroupDefinition> {
    let mut groups = HashMap::new();
    let Some(infos) = value.as_array() else {
        return groups;
    };
    for info in infos {
        let Some(group_name) = info.get("group-name").and_then(Value::as_str) else {
            continue;
        };
        let metric_definitions = info
            .get("metric-infos")
            .and_then(Value::as_array)
            .map(|infos| {
                infos
                    .iter()
                    .enumerate()
                    .filter_map(|(index, m)| {
                        let name = m.get("metric-name").and_then(Value::as_str)?.to_string();
                        let metric_type = m
                            .get("metric-type")
                            .and_then(Value::as_str)
                            .map(metric_type_from_str)
                            .unwrap_or(MetricType::String);
                        let unit = m.get("unit").and_then(Value::as_str).map(str::to_string);
                        Some(MetricDefinition {
                            name,
                            metric_type,
                            index,
                            unit,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        groups.insert(
            group_name.to_string(),
            MetricGroupDefinition {
                group_name: group_name.to_string(),
                metric_definitions,
            },
        );
    }
    groups
}

impl MetricsContextManager {
    /// `POST /api/services/metrics/context` with
    /// `{anticipated-frequency-seconds, metric-groups}`. Fails client-side if
    /// `anticipated_frequency_seconds` is below the HMC's minimum of 15.
    pub async fn create_context(
        &self,
        anticipated_frequency_seconds: u32,
        metric_groups: Vec<String>,
    ) -> Result<MetricsContext> {
        if anticipated_frequency_seconds < 15 {
            return Err(HmcError::ClientAuthError(
                "anticipated-frequency-seconds must be at least 15".to_string(),
            ));
        }
        let mut properties = crate::properties::Properties::new();
        properties.insert(
            "anticipated-frequency-seconds".to_string(),
            Value::from(anticipated_frequency_seconds),
        );
        properties.insert(
            "metric-groups".to_string(),
            Value::Array(metric_groups.into_iter().map(Value::String).collect()),
        );
        self.create(METRICS_CONTEXT_BASE_URI, properties).await
    }
}

impl MetricsContext {
    /// The group definitions cached from this context's `create` response,
    /// keyed by group name.
    pub async fn metric_group_definitions(&self) -> HashMap<String, MetricGroupDefinition> {
        let props = self.properties().await;
        props
            .get("metric-group-infos")
            .map(parse_group_infos)
            .unwrap_or_default()
    }

    /// `GET <metrics-context-uri>`, parsed against this context's cached
    /// group definitions.
    pub async fn get_metrics(&self) -> Result<MetricsResponse> {
        let body = self.session().get(self.uri(), true, true).await?;
        let text = body
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| HmcError::ConsistencyError("metrics response was not plain text".to_string()))?;
        let group_defs = self.metric_group_definitions().await;
        MetricsResponse::parse(text, &group_defs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_metric_group_infos() {
        let infos = json!([
            {
                "group-name": "partition-usage",
                "metric-infos": [
                    {"metric-name": "processor-usage", "metric-type": "integer-metric"},
                    {"metric-name": "partition-name", "metric-type": "string-metric"},
                ],
            }
        ]);
        let groups = parse_group_infos(&infos);
        let def = groups.get("partition-usage").unwrap();
        assert_eq!(def.metric_definitions.len(), 2);
        assert_eq!(def.metric_definitions[0].index, 0);
        assert_eq!(def.metric_definitions[0].metric_type, MetricType::Integer);
        assert_eq!(def.metric_definitions[1].metric_type, MetricType::String);
    }
}
