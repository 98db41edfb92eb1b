//! Schema validation with partial-failure semantics.

use geoworker_core::config::DEFAULT_PROGRESS_INTERVAL;
use geoworker_core::models::{FieldSchema, Record, Schema};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    MissingField,
    TypeError,
    RangeError,
}

/// One failed check on one item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub index: usize,
    pub kind: ValidationErrorKind,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidRecord {
    pub index: usize,
    pub record: Record,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub missing_fields: usize,
    pub type_errors: usize,
    pub range_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: Vec<Record>,
    pub invalid: Vec<InvalidRecord>,
    pub errors: Vec<ValidationError>,
    pub summary: ValidationSummary,
}

/// Validate every item against the schema
pub fn validate(dataset: &[Record], schema: &Schema) -> ValidationReport {
    validate_with_progress(dataset, schema, DEFAULT_PROGRESS_INTERVAL, |_| {})
}

/// Validate every item, reporting percent complete after each `interval` items.
///
/// Missing or null values fail only `required` fields; a value of the wrong
/// type skips the range check for that field.
pub fn validate_with_progress<F>(
    dataset: &[Record],
    schema: &Schema,
    interval: usize,
    mut on_progress: F,
) -> ValidationReport
where
    F: FnMut(f64),
{
    let interval = interval.max(1);
    let total = dataset.len();
    let mut report = ValidationReport {
        valid: Vec::new(),
        invalid: Vec::new(),
        errors: Vec::new(),
        summary: ValidationSummary { total, ..Default::default() },
    };

    for (index, record) in dataset.iter().enumerate() {
        let before = report.errors.len();
        for (field, rules) in schema {
            check_field(index, record, field, rules, &mut report.errors);
        }

        if report.errors.len() == before {
            report.valid.push(record.clone());
        } else {
            report.invalid.push(InvalidRecord { index, record: record.clone() });
        }

        let processed = index + 1;
        if processed % interval == 0 {
            on_progress(processed as f64 / total as f64 * 100.0);
        }
    }

    for error in &report.errors {
        match error.kind {
            ValidationErrorKind::MissingField => report.summary.missing_fields += 1,
            ValidationErrorKind::TypeError => report.summary.type_errors += 1,
            ValidationErrorKind::RangeError => report.summary.range_errors += 1,
        }
    }
    report.summary.valid = report.valid.len();
    report.summary.invalid = report.invalid.len();

    tracing::debug!(
        total,
        valid = report.summary.valid,
        invalid = report.summary.invalid,
        "validated dataset"
    );
    report
}

fn check_field(
    index: usize,
    record: &Record,
    field: &str,
    rules: &FieldSchema,
    errors: &mut Vec<ValidationError>,
) {
    let mut push = |kind, message: String| {
        errors.push(ValidationError { index, kind, field: field.to_string(), message });
    };

    let value = match record.get(field) {
        None | Some(Value::Null) => {
            if rules.required {
                push(ValidationErrorKind::MissingField, format!("Field '{}' is required", field));
            }
            return;
        }
        Some(value) => value,
    };

    if let Some(expected) = rules.field_type {
        if !expected.matches(value) {
            push(
                ValidationErrorKind::TypeError,
                format!("Field '{}' must be of type {}", field, expected.name()),
            );
            return;
        }
    }

    if let Some(number) = value.as_f64() {
        if let Some(min) = rules.min.filter(|min| number < *min) {
            push(
                ValidationErrorKind::RangeError,
                format!("Field '{}' must be at least {}, got {}", field, min, number),
            );
        }
        if let Some(max) = rules.max.filter(|max| number > *max) {
            push(
                ValidationErrorKind::RangeError,
                format!("Field '{}' must be at most {}, got {}", field, max, number),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Value) -> Vec<Record> {
        serde_json::from_value(values).unwrap()
    }

    fn schema(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_single_valid_item() {
        let report = validate(
            &records(json!([{"a": 1}])),
            &schema(json!({"a": {"required": true, "type": "number"}})),
        );
        assert_eq!(report.summary.valid, 1);
        assert_eq!(report.summary.invalid, 0);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_collects_each_error_kind() {
        let dataset = records(json!([
            {"name": "ok", "age": 30},
            {"age": 30},
            {"name": 5, "age": 30},
            {"name": "old", "age": 200},
            {"name": null, "age": "x"}
        ]));
        let rules = schema(json!({
            "name": {"required": true, "type": "string"},
            "age": {"type": "number", "min": 0, "max": 150}
        }));

        let report = validate(&dataset, &rules);

        assert_eq!(report.summary.total, 5);
        assert_eq!(report.summary.valid, 1);
        assert_eq!(report.summary.invalid, 4);
        assert_eq!(report.summary.missing_fields, 2);
        assert_eq!(report.summary.type_errors, 2);
        assert_eq!(report.summary.range_errors, 1);

        let invalid: Vec<usize> = report.invalid.iter().map(|r| r.index).collect();
        assert_eq!(invalid, vec![1, 2, 3, 4]);
        assert_eq!(report.errors[0].field, "name");
        assert_eq!(report.errors[0].kind, ValidationErrorKind::MissingField);
    }

    #[test]
    fn test_optional_missing_field_is_fine() {
        let report = validate(
            &records(json!([{}])),
            &schema(json!({"note": {"type": "string"}})),
        );
        assert_eq!(report.summary.valid, 1);
    }

    #[test]
    fn test_progress_every_interval() {
        let dataset: Vec<Record> = (0..250).map(|i| records(json!([{"v": i}])).remove(0)).collect();
        let mut seen = Vec::new();
        validate_with_progress(&dataset, &Schema::new(), 100, |p| seen.push(p));
        assert_eq!(seen, vec![40.0, 80.0]);
    }

    #[test]
    fn test_empty_dataset() {
        let mut calls = 0;
        let report = validate_with_progress(&[], &Schema::new(), 10, |_| calls += 1);
        assert_eq!(report.summary.total, 0);
        assert_eq!(calls, 0);
    }
}
