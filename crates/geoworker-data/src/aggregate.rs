//! Group-by aggregation.

use geoworker_core::models::{AggregateOp, Calculation, Record};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::number_value;

const KEY_SEPARATOR: &str = "|";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub total_records: usize,
    pub group_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    /// One record per group, in order of first occurrence
    pub groups: Vec<Record>,
    pub summary: AggregateSummary,
}

/// Group items by their `group_by` values and summarise each group.
///
/// Each output record holds the composite `group` key, the group-by field
/// values taken from the first member, the member `count`, and one
/// `{field}_{operation}` entry per calculation. Calculations only see
/// numeric values; average, min and max of no numbers are `null`.
///
/// `group` and `count` always hold the generated values. A group-by field
/// with either name still groups the items but is not echoed in the output.
pub fn aggregate(dataset: &[Record], group_by: &[String], calculations: &[Calculation]) -> AggregateReport {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&Record>)> = Vec::new();

    for record in dataset {
        let key = group_key(record, group_by);
        match index.get(&key) {
            Some(&slot) => groups[slot].1.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![record]));
            }
        }
    }

    let summaries: Vec<Record> = groups
        .into_iter()
        .map(|(key, members)| summarise(key, &members, group_by, calculations))
        .collect();

    tracing::debug!(records = dataset.len(), groups = summaries.len(), "aggregated dataset");

    AggregateReport {
        summary: AggregateSummary { total_records: dataset.len(), group_count: summaries.len() },
        groups: summaries,
    }
}

fn group_key(record: &Record, group_by: &[String]) -> String {
    group_by
        .iter()
        .map(|field| match record.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

fn summarise(key: String, members: &[&Record], group_by: &[String], calculations: &[Calculation]) -> Record {
    let mut summary = Record::new();
    for field in group_by {
        let value = members.first().and_then(|m| m.get(field)).cloned().unwrap_or(Value::Null);
        summary.insert(field.clone(), value);
    }
    // Generated keys go in last so they win over same-named group-by fields
    summary.insert("group".to_string(), Value::String(key));
    summary.insert("count".to_string(), Value::from(members.len()));

    for calculation in calculations {
        let values: Vec<f64> =
            members.iter().filter_map(|m| m.get(&calculation.field).and_then(Value::as_f64)).collect();
        summary.insert(calculation.output_key(), calculate(calculation.operation, &values));
    }

    summary
}

fn calculate(operation: AggregateOp, values: &[f64]) -> Value {
    if values.is_empty() {
        return match operation {
            AggregateOp::Sum => Value::from(0),
            AggregateOp::Count => Value::from(0),
            AggregateOp::Average | AggregateOp::Min | AggregateOp::Max => Value::Null,
        };
    }

    let sum: f64 = values.iter().sum();
    match operation {
        AggregateOp::Sum => number_value(sum),
        AggregateOp::Average => number_value(sum / values.len() as f64),
        AggregateOp::Min => number_value(values.iter().copied().fold(f64::INFINITY, f64::min)),
        AggregateOp::Max => number_value(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        AggregateOp::Count => Value::from(values.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset(values: Value) -> Vec<Record> {
        serde_json::from_value(values).unwrap()
    }

    #[test]
    fn test_single_group_sum() {
        let report = aggregate(
            &dataset(json!([{"g": "x", "v": 1}, {"g": "x", "v": 3}])),
            &["g".to_string()],
            &[Calculation::new("v", AggregateOp::Sum)],
        );
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0]["group"], "x");
        assert_eq!(report.groups[0]["v_sum"], json!(4));
        assert_eq!(report.groups[0]["count"], json!(2));
    }

    #[test]
    fn test_all_operations_ignore_non_numeric() {
        let report = aggregate(
            &dataset(json!([
                {"region": "north", "v": 2},
                {"region": "south", "v": 10},
                {"region": "north", "v": "n/a"},
                {"region": "north", "v": 5}
            ])),
            &["region".to_string()],
            &[
                Calculation::new("v", AggregateOp::Average),
                Calculation::new("v", AggregateOp::Min),
                Calculation::new("v", AggregateOp::Max),
                Calculation::new("v", AggregateOp::Count),
            ],
        );

        assert_eq!(report.summary.group_count, 2);
        let north = &report.groups[0];
        assert_eq!(north["region"], "north");
        assert_eq!(north["count"], json!(3));
        assert_eq!(north["v_average"], json!(3.5));
        assert_eq!(north["v_min"], json!(2));
        assert_eq!(north["v_max"], json!(5));
        assert_eq!(north["v_count"], json!(2));
    }

    #[test]
    fn test_generated_keys_win_over_group_by_fields() {
        let report = aggregate(
            &dataset(json!([
                {"count": 7, "group": "a"},
                {"count": 7, "group": "a"},
                {"count": 9, "group": "b"}
            ])),
            &["count".to_string(), "group".to_string()],
            &[],
        );
        assert_eq!(report.summary.group_count, 2);
        assert_eq!(report.groups[0]["group"], "7|a");
        assert_eq!(report.groups[0]["count"], json!(2));
        assert_eq!(report.groups[1]["group"], "9|b");
        assert_eq!(report.groups[1]["count"], json!(1));
    }

    #[test]
    fn test_composite_keys() {
        let report = aggregate(
            &dataset(json!([
                {"a": "x", "b": 1},
                {"a": "x", "b": 2},
                {"a": "x", "b": 1},
                {"a": "y"}
            ])),
            &["a".to_string(), "b".to_string()],
            &[],
        );
        let keys: Vec<&str> = report.groups.iter().map(|g| g["group"].as_str().unwrap()).collect();
        assert_eq!(keys, vec!["x|1", "x|2", "y|"]);
    }

    #[test]
    fn test_empty_numeric_set() {
        let report = aggregate(
            &dataset(json!([{"g": 1}])),
            &["g".to_string()],
            &[Calculation::new("v", AggregateOp::Average), Calculation::new("v", AggregateOp::Sum)],
        );
        assert_eq!(report.groups[0]["v_average"], Value::Null);
        assert_eq!(report.groups[0]["v_sum"], json!(0));
    }
}
