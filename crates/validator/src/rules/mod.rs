//! Rule predicates
//!
//! Every rule is a pure function over a field and, where it needs siblings,
//! a [`FormDirectory`]. A rule whose constraint is not declared passes.
//! Malformed constraint data never panics: an unparseable bound or value
//! simply fails the rule that reads it.

pub mod calendar;
pub mod numeric;

use crate::field::{ControlKind, Field};
use crate::form::FormDirectory;
use crate::patterns::{self, PatternLibrary};

pub use calendar::{is_valid_calendar_date, parse_calendar_date};

// ============================================================================
// MATCH / REQUIRED
// ============================================================================

/// Whether `field` equals its match target by exact string equality.
///
/// A target that cannot be resolved is a mismatch.
#[must_use]
pub fn matches_target(field: &Field, target: Option<&Field>) -> bool {
    target.is_some_and(|target| field.current_value() == target.current_value())
}

/// Whether the field holds content in the sense of the `required` rule.
#[must_use]
pub fn is_filled(field: &Field, directory: &dyn FormDirectory) -> bool {
    match field.kind {
        ControlKind::Select if field.constraints.multiple => field
            .options
            .iter()
            .any(|option| option.selected && !option.value.is_empty()),
        ControlKind::Select => !field.current_value().is_empty(),
        ControlKind::Checkbox => field.checked,
        ControlKind::Radio => {
            field.checked || directory.group(&field.name).iter().any(|member| member.checked)
        }
        _ => !field.current_value().is_empty(),
    }
}

/// Whether the field (or, for a radio, any member of its group) is marked required.
#[must_use]
pub fn is_marked_required(field: &Field, directory: &dyn FormDirectory) -> bool {
    if field.constraints.required {
        return true;
    }
    field.kind == ControlKind::Radio
        && directory
            .group(&field.name)
            .iter()
            .any(|member| member.constraints.required)
}

// ============================================================================
// PATTERN / MAXLENGTH / TYPE
// ============================================================================

/// Whether the value satisfies the declared pattern.
///
/// The pattern `date` additionally requires a real calendar date, and
/// `number` a finite float. Inside `a||b` each alternative carries its own
/// check, so `number||digits` still rejects `1e999`.
#[must_use]
pub fn satisfies_pattern(field: &Field, library: &PatternLibrary) -> bool {
    let Some(pattern) = field.constraints.pattern.as_deref() else {
        return true;
    };
    let value = field.current_value();
    pattern.split("||").any(|alternative| {
        library.is_match(alternative, value) && passes_post_check(alternative, value)
    })
}

fn passes_post_check(pattern: &str, value: &str) -> bool {
    match pattern {
        "date" => is_valid_calendar_date(value),
        "number" => is_finite_float(value),
        _ => true,
    }
}

/// Whether the value fits the declared maximum length, counted in UTF-16 units.
#[must_use]
pub fn within_max_length(field: &Field) -> bool {
    let Some(bound) = field.constraints.max_length.as_deref() else {
        return true;
    };
    bound
        .trim()
        .parse::<usize>()
        .is_ok_and(|bound| field.current_value().encode_utf16().count() <= bound)
}

/// Built-in semantic check for the control kind.
#[must_use]
pub fn satisfies_type(field: &Field) -> bool {
    let value = field.current_value();
    match field.kind {
        ControlKind::Number => is_number(value),
        ControlKind::Email if field.constraints.multiple => {
            value.split(',').map(str::trim).all(is_email)
        }
        ControlKind::Email => is_email(value),
        ControlKind::Date => is_date(value),
        _ => true,
    }
}

fn is_number(value: &str) -> bool {
    patterns::builtin("number").is_some_and(|re| re.is_match(value)) && is_finite_float(value)
}

fn is_finite_float(value: &str) -> bool {
    value.parse::<f64>().is_ok_and(f64::is_finite)
}

fn is_email(value: &str) -> bool {
    patterns::builtin("email").is_some_and(|re| re.is_match(value))
}

fn is_date(value: &str) -> bool {
    patterns::builtin("date").is_some_and(|re| re.is_match(value)) && is_valid_calendar_date(value)
}

// ============================================================================
// MIN / MAX / STEP
// ============================================================================

/// Fields compared as calendar dates rather than numbers.
#[must_use]
pub fn is_calendar(field: &Field) -> bool {
    field.kind == ControlKind::Date || field.constraints.pattern.as_deref() == Some("date")
}

/// Whether the value is at or above the declared minimum.
#[must_use]
pub fn satisfies_min(field: &Field) -> bool {
    field
        .constraints
        .min
        .as_deref()
        .is_none_or(|bound| compare_to_bound(field, bound).is_some_and(|ord| ord.is_ge()))
}

/// Whether the value is at or below the declared maximum.
#[must_use]
pub fn satisfies_max(field: &Field) -> bool {
    field
        .constraints
        .max
        .as_deref()
        .is_none_or(|bound| compare_to_bound(field, bound).is_some_and(|ord| ord.is_le()))
}

fn compare_to_bound(field: &Field, bound: &str) -> Option<std::cmp::Ordering> {
    let value = field.current_value();
    if is_calendar(field) {
        let value = parse_calendar_date(value)?;
        let bound = parse_calendar_date(bound)?;
        return Some(value.cmp(&bound));
    }
    let value = numeric::parse_leading_float(value)?;
    let bound = numeric::parse_leading_float(bound)?;
    value.partial_cmp(&bound)
}

/// Whether the value lies on the declared step.
///
/// `any` always passes. Calendar fields step in whole days counted from the
/// `min` date, or from 1970-01-01 when no usable `min` is declared. Numeric
/// fields must be an exact decimal multiple of the step; literals outside the
/// `Decimal` range are compared as scaled integers instead.
#[must_use]
pub fn satisfies_step(field: &Field) -> bool {
    let Some(step) = field.constraints.step.as_deref().map(str::trim) else {
        return true;
    };
    if step.eq_ignore_ascii_case("any") {
        return true;
    }

    let value = field.current_value();
    if is_calendar(field) {
        let Some(date) = parse_calendar_date(value) else {
            return false;
        };
        let Ok(days) = step.parse::<i64>() else {
            return false;
        };
        let base = field
            .constraints
            .min
            .as_deref()
            .and_then(parse_calendar_date)
            .unwrap_or_default();
        return calendar::is_on_day_step(date, base, days);
    }

    match (numeric::parse_decimal(value), numeric::parse_decimal(step)) {
        (Some(value), Some(step)) => numeric::is_multiple_of(value, step),
        _ => numeric::is_multiple_of_literal(value, step),
    }
}
