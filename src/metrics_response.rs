//! Parsing of `GET <metrics-context-uri>` bodies against cached metric
//! group definitions.
//!
//! The HMC's metrics service returns a compact, line-oriented text format
//! rather than JSON. Groups are separated by a blank line; within a group,
//! the first line is the quoted group name, followed by one
//! `"<object-uri>"` line and one comma-separated values line per object.
//! Values are decoded using the group's [`MetricDefinition`]s, in the
//! order the group definition declares them.

use std::collections::HashMap;

use crate::error::HmcError;

/// The scalar type of one metric value, as declared by the HMC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Integer,
    String,
    Boolean,
    Double,
}

/// One metric's name/type/position within its group.
#[derive(Debug, Clone)]
pub struct MetricDefinition {
    pub name: String,
    pub metric_type: MetricType,
    pub index: usize,
    pub unit: Option<String>,
}

/// The ordered list of metrics reported by one metric group.
#[derive(Debug, Clone, Default)]
pub struct MetricGroupDefinition {
    pub group_name: String,
    pub metric_definitions: Vec<MetricDefinition>,
}

/// A single typed metric value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Integer(i64),
    String(String),
    Boolean(bool),
    Double(f64),
}

/// One object's metric values within a group, in definition order.
#[derive(Debug, Clone)]
pub struct MetricObjectValues {
    pub resource_uri: String,
    pub values: Vec<(String, MetricValue)>,
}

impl MetricObjectValues {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// All object values reported for one metric group.
#[derive(Debug, Clone)]
pub struct MetricGroupValues {
    pub group_name: String,
    pub object_values: Vec<MetricObjectValues>,
}

/// A fully parsed `get_metrics()` response.
#[derive(Debug, Clone, Default)]
pub struct MetricsResponse {
    pub groups: Vec<MetricGroupValues>,
}

impl MetricsResponse {
    /// Parse a raw metrics body against the context's cached group
    /// definitions. Groups whose name isn't in `group_defs` are skipped
    /// (the context only subscribed to the groups it asked for).
    pub fn parse(
        body: &str,
        group_defs: &HashMap<String, MetricGroupDefinition>,
    ) -> Result<Self, HmcError> {
        let mut groups = Vec::new();
        for chunk in body.split("\n\n") {
            let chunk = chunk.trim();
            if chunk.is_empty() {
                continue;
            }
            let mut lines = chunk.lines();
            let name_line = lines.next().unwrap_or_default();
            let group_name = unquote(name_line).ok_or_else(|| {
                HmcError::ParseError {
                    line: 0,
                    column: 0,
                    summary: format!("expected quoted group name, found {name_line:?}"),
                }
            })?;

            let Some(def) = group_defs.get(&group_name) else {
                continue;
            };

            let mut object_values = Vec::new();
            let remaining: Vec<&str> = lines.collect();
            let mut i = 0;
            while i + 1 < remaining.len() {
                let uri_line = remaining[i];
                let values_line = remaining[i + 1];
                i += 2;
                let Some(resource_uri) = unquote(uri_line) else {
                    continue;
                };
                let values = parse_values_line(values_line, def)?;
                object_values.push(MetricObjectValues { resource_uri, values });
            }

            groups.push(MetricGroupValues {
                group_name,
                object_values,
            });
        }
        Ok(Self { groups })
    }

    #[must_use]
    pub fn group(&self, name: &str) -> Option<&MetricGroupValues> {
        self.groups.iter().find(|g| g.group_name == name)
    }
}

fn unquote(line: &str) -> Option<String> {
    let line = line.trim();
    let stripped = line.strip_prefix('"')?.strip_suffix('"')?;
    Some(stripped.to_string())
}

fn parse_values_line(
    line: &str,
    def: &MetricGroupDefinition,
) -> Result<Vec<(String, MetricValue)>, HmcError> {
    let raw_values: Vec<&str> = line.split(',').collect();
    let mut out = Vec::with_capacity(def.metric_definitions.len());
    for metric_def in &def.metric_definitions {
        let Some(raw) = raw_values.get(metric_def.index) else {
            continue;
        };
        let raw = raw.trim();
        let value = match metric_def.metric_type {
            MetricType::Integer => MetricValue::Integer(raw.parse().map_err(|_| parse_err(raw))?),
            MetricType::Double => MetricValue::Double(raw.parse().map_err(|_| parse_err(raw))?),
            MetricType::Boolean => MetricValue::Boolean(raw.eq_ignore_ascii_case("true")),
            MetricType::String => MetricValue::String(unquote(raw).unwrap_or_else(|| raw.to_string())),
        };
        out.push((metric_def.name.clone(), value));
    }
    Ok(out)
}

fn parse_err(raw: &str) -> HmcError {
    HmcError::ParseError {
        line: 0,
        column: 0,
        summary: format!("could not parse metric value {raw:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs() -> HashMap<String, MetricGroupDefinition> {
        let mut m = HashMap::new();
        m.insert(
            "partition-usage".to_string(),
            MetricGroupDefinition {
                group_name: "partition-usage".to_string(),
                metric_definitions: vec![
                    MetricDefinition {
                        name: "processor-usage".to_string(),
                        metric_type: MetricType::Integer,
                        index: 0,
                        unit: Some("percent".to_string()),
                    },
                    MetricDefinition {
                        name: "partition-name".to_string(),
                        metric_type: MetricType::String,
                        index: 1,
                        unit: None,
                    },
                ],
            },
        );
        m
    }

    #[test]
    fn parses_one_group_two_objects() {
        let body = "\"partition-usage\"\n\"/api/partitions/1\"\n42,\"part1\"\n\"/api/partitions/2\"\n7,\"part2\"";
        let response = MetricsResponse::parse(body, &defs()).unwrap();
        assert_eq!(response.groups.len(), 1);
        let group = &response.groups[0];
        assert_eq!(group.group_name, "partition-usage");
        assert_eq!(group.object_values.len(), 2);
        assert_eq!(group.object_values[0].resource_uri, "/api/partitions/1");
        assert_eq!(
            group.object_values[0].get("processor-usage"),
            Some(&MetricValue::Integer(42))
        );
        assert_eq!(
            group.object_values[1].get("partition-name"),
            Some(&MetricValue::String("part2".to_string()))
        );
    }

    #[test]
    fn unknown_group_is_skipped() {
        let body = "\"other-group\"\n\"/api/x\"\n1";
        let response = MetricsResponse::parse(body, &defs()).unwrap();
        assert!(response.groups.is_empty());
    }
}
