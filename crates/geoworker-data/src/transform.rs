//! Ordered transformation pipelines over dataset items.

use geoworker_core::models::{DisplayFormat, FilterOperator, Record, Transformation};
use serde::Serialize;
use serde_json::Value;

use crate::expr::{Expr, ExprError};
use crate::number_value;

const DEFAULT_DECIMALS: u32 = 2;
/// Enough digits to round-trip any f64
const MAX_DECIMALS: u32 = 17;
const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// A step that failed on one item. The item itself is kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformError {
    pub index: usize,
    pub step: usize,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransformSummary {
    pub total: usize,
    pub output: usize,
    pub filtered: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformReport {
    pub transformed: Vec<Record>,
    pub errors: Vec<TransformError>,
    pub summary: TransformSummary,
}

/// A pipeline step with its expression parsed once for the whole batch
enum Step<'a> {
    Rename { from: &'a str, to: &'a str },
    Compute { field: &'a str, expr: Result<Expr, ExprError> },
    Format { field: &'a str, format: DisplayFormat, decimals: u32, symbol: &'a str },
    Filter { field: &'a str, operator: FilterOperator, value: &'a Value },
}

impl<'a> Step<'a> {
    fn prepare(transformation: &'a Transformation) -> Self {
        match transformation {
            Transformation::Rename { from, to } => Step::Rename { from, to },
            Transformation::Compute { field, expression } => {
                Step::Compute { field, expr: Expr::parse(expression) }
            }
            Transformation::Format { field, format, decimals, symbol } => Step::Format {
                field,
                format: *format,
                decimals: decimals.unwrap_or(DEFAULT_DECIMALS).min(MAX_DECIMALS),
                symbol: symbol.as_deref().unwrap_or(DEFAULT_CURRENCY_SYMBOL),
            },
            Transformation::Filter { field, operator, value } => {
                Step::Filter { field, operator: *operator, value }
            }
        }
    }
}

/// Outcome of running the pipeline on one item
enum Flow {
    Continue,
    Drop,
}

/// Run the pipeline over every item.
///
/// A matching filter step drops the item and skips its remaining steps.
/// A compute or format failure is recorded and the pipeline continues.
pub fn transform(dataset: &[Record], transformations: &[Transformation]) -> TransformReport {
    let steps: Vec<Step<'_>> = transformations.iter().map(Step::prepare).collect();
    let mut report = TransformReport {
        transformed: Vec::with_capacity(dataset.len()),
        errors: Vec::new(),
        summary: TransformSummary { total: dataset.len(), ..Default::default() },
    };

    'items: for (index, original) in dataset.iter().enumerate() {
        let mut record = original.clone();

        for (step_index, step) in steps.iter().enumerate() {
            let outcome = apply_step(&mut record, step);
            match outcome {
                Ok(Flow::Continue) => {}
                Ok(Flow::Drop) => {
                    report.summary.filtered += 1;
                    continue 'items;
                }
                Err((field, message)) => report.errors.push(TransformError {
                    index,
                    step: step_index,
                    field: field.to_string(),
                    message,
                }),
            }
        }

        report.transformed.push(record);
    }

    report.summary.output = report.transformed.len();
    report.summary.errors = report.errors.len();

    tracing::debug!(
        steps = steps.len(),
        total = report.summary.total,
        filtered = report.summary.filtered,
        errors = report.summary.errors,
        "transformed dataset"
    );
    report
}

fn apply_step<'a>(record: &mut Record, step: &Step<'a>) -> Result<Flow, (&'a str, String)> {
    match step {
        Step::Rename { from, to } => {
            if let Some(value) = record.remove(*from) {
                record.insert(to.to_string(), value);
            }
        }
        Step::Compute { field, expr } => {
            let value = expr
                .as_ref()
                .map_err(|e| e.clone())
                .and_then(|expr| expr.eval(record))
                .map_err(|e| (*field, e.to_string()))?;
            record.insert(field.to_string(), number_value(value));
        }
        Step::Format { field, format, decimals, symbol } => {
            let Some(current) = record.get(*field) else {
                return Ok(Flow::Continue);
            };
            let number = current
                .as_f64()
                .ok_or_else(|| (*field, format!("Field '{}' is not numeric", field)))?;
            let text = format_number(number, *format, *decimals, symbol);
            record.insert(field.to_string(), Value::String(text));
        }
        Step::Filter { field, operator, value } => {
            // A missing field compares as null
            let equal = match record.get(*field) {
                Some(current) => current == *value,
                None => value.is_null(),
            };
            let matches = match operator {
                FilterOperator::Equals => equal,
                FilterOperator::NotEquals => !equal,
            };
            if matches {
                return Ok(Flow::Drop);
            }
        }
    }
    Ok(Flow::Continue)
}

fn format_number(value: f64, format: DisplayFormat, decimals: u32, symbol: &str) -> String {
    let decimals = decimals.min(MAX_DECIMALS) as usize;
    match format {
        DisplayFormat::Currency => {
            let sign = if value < 0.0 { "-" } else { "" };
            format!("{}{}{}", sign, symbol, group_thousands(&format!("{:.*}", decimals, value.abs())))
        }
        DisplayFormat::Percentage => format!("{:.*}%", decimals, value * 100.0),
        DisplayFormat::Decimal => format!("{:.*}", decimals, value),
    }
}

/// Insert commas between thousands in the integer part
fn group_thousands(fixed: &str) -> String {
    let (integer, fraction) = match fixed.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (fixed, None),
    };

    let mut grouped = String::with_capacity(fixed.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}
