//! geoworker Data - Batch dataset processing
//!
//! Schema validation, rule-based cleaning, transformation pipelines and
//! group-by aggregation over JSON records. Every operation completes the
//! whole batch: per-item problems are collected into the report instead of
//! aborting the run.

pub mod aggregate;
pub mod clean;
pub mod expr;
pub mod transform;
pub mod validate;

use serde_json::Value;

pub use aggregate::{aggregate, AggregateReport, AggregateSummary};
pub use clean::{clean, CleanReport, CleanSummary, RemovedRecord};
pub use expr::{Expr, ExprError};
pub use transform::{transform, TransformError, TransformReport, TransformSummary};
pub use validate::{
    validate, validate_with_progress, InvalidRecord, ValidationError, ValidationErrorKind,
    ValidationReport, ValidationSummary,
};

/// Largest integer an f64 represents exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// JSON number for a computed value, integral when exact.
///
/// Non-finite values become `null`.
pub(crate) fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}
