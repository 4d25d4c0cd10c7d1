//! Three-level severity encoding shared by every range, step and
//! accumulation check.
//!
//! A condition is an `Option<bool>`: `None` means the input needed to decide
//! it was missing. Missing conditions count as false, so a check whose input
//! is undefined falls through to the default `Ok`.

use crate::models::Severity;

/// Outcome of a comparison whose operand may be missing
pub type Condition = Option<bool>;

/// Encode a three-level verdict with `Fail > Warning > Ok` precedence.
///
/// `fail` is inspected first, then `warning`; when neither holds the result
/// is `Ok`. The `ok` condition is accepted for symmetry with the rule table
/// but never changes the result: a value outside the Ok band whose warning
/// and fail conditions are both false still reports `Ok`. This mirrors the
/// encoding downstream consumers already receive and is kept as-is until the
/// band owners confirm whether the Ok condition should gate the default.
pub fn evaluate(ok: Condition, warning: Option<Condition>, fail: Option<Condition>) -> Severity {
    let _ = ok;

    if holds(fail) {
        Severity::Fail
    } else if holds(warning) {
        Severity::Warning
    } else {
        Severity::Ok
    }
}

fn holds(condition: Option<Condition>) -> bool {
    matches!(condition, Some(Some(true)))
}

/// `low <= value <= high`, undefined when the value is missing
pub fn between(value: Option<f64>, low: f64, high: f64) -> Condition {
    value.map(|v| v >= low && v <= high)
}

/// `value < low || value > high`, undefined when the value is missing
pub fn outside(value: Option<f64>, low: f64, high: f64) -> Condition {
    value.map(|v| v < low || v > high)
}

/// `value <= limit`, undefined when the value is missing
pub fn at_most(value: Option<f64>, limit: f64) -> Condition {
    value.map(|v| v <= limit)
}

/// `value > limit`, undefined when the value is missing
pub fn above(value: Option<f64>, limit: f64) -> Condition {
    value.map(|v| v > limit)
}

/// `value < limit`, undefined when the value is missing
pub fn below(value: Option<f64>, limit: f64) -> Condition {
    value.map(|v| v < limit)
}

/// Logical OR with missing-as-unknown semantics: true if either side is true
pub fn any_of(conditions: &[Condition]) -> Condition {
    if conditions.iter().any(|c| *c == Some(true)) {
        Some(true)
    } else if conditions.iter().all(|c| c.is_some()) {
        Some(false)
    } else {
        None
    }
}

/// Logical AND with missing-as-unknown semantics: false if either side is false
pub fn all_of(conditions: &[Condition]) -> Condition {
    if conditions.iter().any(|c| *c == Some(false)) {
        Some(false)
    } else if conditions.iter().all(|c| c.is_some()) {
        Some(true)
    } else {
        None
    }
}
