//! Rule-based record cleaning.

use geoworker_core::models::{CleaningRule, CleaningRules, Record};
use serde::Serialize;
use serde_json::Value;

use crate::number_value;

/// An item dropped by a cleaning rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovedRecord {
    pub index: usize,
    pub field: String,
    pub reason: String,
    pub record: Record,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanSummary {
    pub total: usize,
    pub kept: usize,
    pub removed: usize,
    pub fixed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanReport {
    pub cleaned: Vec<Record>,
    /// Indices of kept items whose values changed
    pub fixed: Vec<usize>,
    pub removed: Vec<RemovedRecord>,
    pub summary: CleanSummary,
}

enum Outcome {
    Keep { changed: bool },
    Remove { reason: String },
}

/// Apply the per-field rules to every item.
///
/// Rules run in field-name order. A default fills a missing or null value
/// before `remove_nulls` is considered. An out-of-range number is clamped
/// when the rule allows it, otherwise the whole item is removed.
pub fn clean(dataset: &[Record], rules: &CleaningRules) -> CleanReport {
    let mut report = CleanReport {
        cleaned: Vec::with_capacity(dataset.len()),
        fixed: Vec::new(),
        removed: Vec::new(),
        summary: CleanSummary { total: dataset.len(), ..Default::default() },
    };

    'items: for (index, original) in dataset.iter().enumerate() {
        let mut record = original.clone();
        let mut changed = false;

        for (field, rule) in rules {
            match apply_rule(&mut record, field, rule) {
                Outcome::Keep { changed: field_changed } => changed |= field_changed,
                Outcome::Remove { reason } => {
                    report.removed.push(RemovedRecord {
                        index,
                        field: field.clone(),
                        reason,
                        record: original.clone(),
                    });
                    continue 'items;
                }
            }
        }

        if changed {
            report.fixed.push(index);
        }
        report.cleaned.push(record);
    }

    report.summary.kept = report.cleaned.len();
    report.summary.removed = report.removed.len();
    report.summary.fixed = report.fixed.len();

    tracing::debug!(
        total = report.summary.total,
        removed = report.summary.removed,
        fixed = report.summary.fixed,
        "cleaned dataset"
    );
    report
}

fn apply_rule(record: &mut Record, field: &str, rule: &CleaningRule) -> Outcome {
    let mut changed = false;

    if record.get(field).map_or(true, Value::is_null) {
        match &rule.default {
            Some(default) => {
                record.insert(field.to_string(), default.clone());
                changed = true;
            }
            None if rule.remove_nulls => {
                return Outcome::Remove { reason: format!("Field '{}' is null", field) };
            }
            None => return Outcome::Keep { changed: false },
        }
    }

    let Some(value) = record.get_mut(field) else {
        return Outcome::Keep { changed };
    };

    match value {
        Value::String(text) => {
            let cleaned = clean_text(text, rule);
            if cleaned != *text {
                *text = cleaned;
                changed = true;
            }
        }
        Value::Number(number) => {
            let Some(original) = number.as_f64() else {
                return Outcome::Keep { changed };
            };
            let mut current = original;

            if let Some(decimals) = rule.round {
                current = round_to(current, decimals);
            }

            let below = rule.min.filter(|min| current < *min);
            let above = rule.max.filter(|max| current > *max);
            if let Some(bound) = below.or(above) {
                if !rule.clamp {
                    return Outcome::Remove {
                        reason: format!("Field '{}' value {} is out of range", field, current),
                    };
                }
                current = bound;
            }

            if current != original {
                *value = number_value(current);
                changed = true;
            }
        }
        _ => {}
    }

    Outcome::Keep { changed }
}

fn clean_text(text: &str, rule: &CleaningRule) -> String {
    let mut result = if rule.trim { text.trim().to_string() } else { text.to_string() };
    if rule.lowercase {
        result = result.to_lowercase();
    }
    if rule.remove_special_chars {
        result.retain(|c| c.is_alphanumeric() || c.is_whitespace());
    }
    result
}

/// Beyond this many decimals an f64 carries no further precision
const MAX_ROUND_DECIMALS: u32 = 15;

/// Round to `decimals` places, leaving the value alone when scaling would overflow
fn round_to(value: f64, decimals: u32) -> f64 {
    if decimals > MAX_ROUND_DECIMALS {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset(values: Value) -> Vec<Record> {
        serde_json::from_value(values).unwrap()
    }

    fn rules(values: Value) -> CleaningRules {
        serde_json::from_value(values).unwrap()
    }

    #[test]
    fn test_string_rules() {
        let report = clean(
            &dataset(json!([{"name": "  Hello, World!  "}])),
            &rules(json!({"name": {"trim": true, "lowercase": true, "removeSpecialChars": true}})),
        );
        assert_eq!(report.cleaned[0]["name"], "hello world");
        assert_eq!(report.fixed, vec![0]);
    }

    #[test]
    fn test_special_chars_keep_unicode_letters() {
        let report = clean(
            &dataset(json!([{"city": "Zürich, Café #1!"}])),
            &rules(json!({"city": {"removeSpecialChars": true}})),
        );
        assert_eq!(report.cleaned[0]["city"], "Zürich Café 1");
    }

    #[test]
    fn test_unchanged_item_not_flagged() {
        let report = clean(
            &dataset(json!([{"name": "clean", "v": 2}])),
            &rules(json!({"name": {"trim": true}, "v": {"round": 2, "min": 0, "max": 10}})),
        );
        assert_eq!(report.summary.kept, 1);
        assert!(report.fixed.is_empty());
        assert_eq!(report.cleaned[0]["v"], json!(2));
    }

    #[test]
    fn test_out_of_range_removed_or_clamped() {
        let data = dataset(json!([{"v": 15}, {"v": 5}, {"v": -3}]));

        let strict = clean(&data, &rules(json!({"v": {"min": 0, "max": 10}})));
        assert_eq!(strict.summary.kept, 1);
        assert_eq!(strict.summary.removed, 2);
        assert_eq!(strict.removed[0].index, 0);
        assert_eq!(strict.removed[0].record["v"], json!(15));

        let lenient = clean(&data, &rules(json!({"v": {"min": 0, "max": 10, "clamp": true}})));
        assert_eq!(lenient.summary.kept, 3);
        assert_eq!(lenient.cleaned[0]["v"], json!(10));
        assert_eq!(lenient.cleaned[2]["v"], json!(0));
        assert_eq!(lenient.fixed, vec![0, 2]);
    }

    #[test]
    fn test_rounding() {
        let report = clean(&dataset(json!([{"v": 3.14159}])), &rules(json!({"v": {"round": 2}})));
        assert_eq!(report.cleaned[0]["v"], json!(3.14));
    }

    #[test]
    fn test_rounding_keeps_values_that_cannot_scale() {
        let report = clean(
            &dataset(json!([{"v": 1e307}, {"v": 1.5}])),
            &rules(json!({"v": {"round": 2}})),
        );
        assert_eq!(report.cleaned[0]["v"], json!(1e307));
        assert!(report.fixed.is_empty());

        let precise = clean(&dataset(json!([{"v": 0.123456789}])), &rules(json!({"v": {"round": 400}})));
        assert_eq!(precise.cleaned[0]["v"], json!(0.123456789));
        assert!(precise.fixed.is_empty());
    }

    #[test]
    fn test_nulls_default_and_removal() {
        let data = dataset(json!([{"city": null}, {}, {"city": "Oslo"}]));

        let filled = clean(&data, &rules(json!({"city": {"default": "unknown", "removeNulls": true}})));
        assert_eq!(filled.summary.kept, 3);
        assert_eq!(filled.cleaned[1]["city"], "unknown");
        assert_eq!(filled.fixed, vec![0, 1]);

        let dropped = clean(&data, &rules(json!({"city": {"removeNulls": true}})));
        assert_eq!(dropped.summary.kept, 1);
        assert_eq!(dropped.summary.removed, 2);

        let untouched = clean(&data, &rules(json!({"city": {"trim": true}})));
        assert_eq!(untouched.summary.kept, 3);
        assert!(untouched.fixed.is_empty());
    }

    #[test]
    fn test_default_is_cleaned_too() {
        let report = clean(
            &dataset(json!([{}])),
            &rules(json!({"code": {"default": "  AB-1 ", "trim": true, "lowercase": true}})),
        );
        assert_eq!(report.cleaned[0]["code"], "ab-1");
    }
}
