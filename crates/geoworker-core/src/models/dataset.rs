//! Tabular dataset models for the data engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One dataset item: an open mapping of field name to JSON value
pub type Record = Map<String, Value>;

/// Expected JSON type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    /// Check whether a JSON value has this type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }
}

/// Constraints on one field of a dataset item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Field name to constraints
pub type Schema = BTreeMap<String, FieldSchema>;

/// Cleaning instructions for one field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CleaningRule {
    pub trim: bool,
    pub lowercase: bool,
    /// Strip everything except Unicode letters, digits and whitespace
    pub remove_special_chars: bool,
    /// Round numbers to this many decimal places
    pub round: Option<u32>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Clamp out-of-range numbers instead of dropping the item
    pub clamp: bool,
    /// Replacement for null or missing values
    pub default: Option<Value>,
    /// Drop items whose value is null or missing (after defaults apply)
    pub remove_nulls: bool,
}

/// Field name to cleaning rule
pub type CleaningRules = BTreeMap<String, CleaningRule>;

/// Display format for the `format` transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayFormat {
    Currency,
    Percentage,
    Decimal,
}

/// Comparison used by the `filter` transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    NotEquals,
}

/// One step of a transformation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Transformation {
    /// Move a field to a new name
    Rename { from: String, to: String },
    /// Evaluate an arithmetic expression over the item's numeric fields
    Compute { field: String, expression: String },
    /// Replace a numeric field with a display string
    Format {
        field: String,
        format: DisplayFormat,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        decimals: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        symbol: Option<String>,
    },
    /// Drop the item when the condition holds
    Filter {
        field: String,
        operator: FilterOperator,
        value: Value,
    },
}

/// Aggregate operation over a numeric field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Sum,
    Average,
    Min,
    Max,
    Count,
}

impl AggregateOp {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateOp::Sum => "sum",
            AggregateOp::Average => "average",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Count => "count",
        }
    }
}

/// A requested per-group calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub field: String,
    pub operation: AggregateOp,
}

impl Calculation {
    pub fn new(field: impl Into<String>, operation: AggregateOp) -> Self {
        Self { field: field.into(), operation }
    }

    /// Output key, e.g. `v_sum`
    pub fn output_key(&self) -> String {
        format!("{}_{}", self.field, self.operation.name())
    }
}

/// Payload of `VALIDATE_DATA`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateDataRequest {
    pub dataset: Vec<Record>,
    pub schema: Schema,
}

/// Payload of `CLEAN_DATA`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanDataRequest {
    pub dataset: Vec<Record>,
    pub rules: CleaningRules,
}

/// Payload of `TRANSFORM_DATA`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformDataRequest {
    pub dataset: Vec<Record>,
    pub transformations: Vec<Transformation>,
}

/// Payload of `AGGREGATE_DATA`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateDataRequest {
    pub dataset: Vec<Record>,
    pub group_by: Vec<String>,
    pub calculations: Vec<Calculation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_uses_type_key() {
        let schema: Schema =
            serde_json::from_value(json!({"a": {"required": true, "type": "number"}})).unwrap();
        assert!(schema["a"].required);
        assert_eq!(schema["a"].field_type, Some(FieldType::Number));
    }

    #[test]
    fn test_transformation_pipeline_deserialize() {
        let steps: Vec<Transformation> = serde_json::from_value(json!([
            {"type": "rename", "from": "a", "to": "b"},
            {"type": "compute", "field": "c", "expression": "b * 2"},
            {"type": "format", "field": "c", "format": "currency"},
            {"type": "filter", "field": "status", "operator": "notEquals", "value": "active"}
        ]))
        .unwrap();
        assert_eq!(steps.len(), 4);
        assert!(matches!(steps[3], Transformation::Filter { operator: FilterOperator::NotEquals, .. }));
    }

    #[test]
    fn test_calculation_output_key() {
        assert_eq!(Calculation::new("v", AggregateOp::Sum).output_key(), "v_sum");
    }
}
