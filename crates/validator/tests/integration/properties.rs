//! Property-based tests for the field pipeline.

use std::sync::Arc;

use formcheck::prelude::*;
use formcheck::{FieldValidator, is_valid_calendar_date};
use parking_lot::Mutex;
use proptest::prelude::*;

fn evaluate(field: Field) -> ValidationResult {
    let form = Form::new("p").with_field(field);
    let validator = FieldValidator::new(Arc::new(PatternLibrary::new()), Arc::new(Hooks::new()), false);
    validator.evaluate(&form.fields()[0], &form)
}

fn any_value_kind() -> impl Strategy<Value = ControlKind> {
    prop::sample::select(vec![
        ControlKind::Text,
        ControlKind::Password,
        ControlKind::Email,
        ControlKind::Number,
        ControlKind::Range,
        ControlKind::Date,
        ControlKind::Time,
        ControlKind::Tel,
        ControlKind::Url,
        ControlKind::Search,
        ControlKind::Textarea,
        ControlKind::Select,
        ControlKind::Checkbox,
        ControlKind::Radio,
        ControlKind::File,
    ])
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    match month {
        2 if leap => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

// ============================================================================
// EMPTY OPTIONAL FIELDS ARE VALID
// ============================================================================

proptest! {
    #[test]
    fn empty_optional_field_is_valid(
        kind in any_value_kind(),
        pattern in prop::option::of(prop::sample::select(vec!["digits", "email", "number", "date", "cap"])),
        min in prop::option::of("[0-9]{1,3}"),
        step in prop::option::of("0\\.[0-9]{1,2}"),
    ) {
        let mut field = Field::new("f", kind);
        if let Some(pattern) = pattern {
            field = field.pattern(pattern);
        }
        if let Some(min) = min {
            field = field.min(min);
        }
        if let Some(step) = step {
            field = field.step(step);
        }
        prop_assert!(evaluate(field).is_valid());
    }
}

// ============================================================================
// NUMBER PATTERN: valid iff finite literal
// ============================================================================

proptest! {
    #[test]
    fn number_literal_valid_iff_finite(
        value in "-?[0-9]{1,4}(\\.[0-9]{1,3})?([eE][-+]?[0-9]{1,4})?"
    ) {
        let finite = value.parse::<f64>().is_ok_and(f64::is_finite);
        let field = Field::new("n", ControlKind::Text).with_value(value.as_str()).pattern("number");
        prop_assert_eq!(evaluate(field).is_valid(), finite);
    }

    #[test]
    fn non_literals_fail_number_pattern(
        value in prop_oneof![
            Just("NaN".to_string()),
            Just("Infinity".to_string()),
            Just("-inf".to_string()),
            Just("1.".to_string()),
            Just(".5".to_string()),
            "[a-zA-Z]{1,8}",
        ]
    ) {
        let field = Field::new("n", ControlKind::Text).with_value(value.as_str()).pattern("number");
        let result = evaluate(field);
        prop_assert_eq!(result.error(), Some(&ErrorKind::Pattern));
    }
}

// ============================================================================
// IDEMPOTENCE: validate(x) == validate(x)
// ============================================================================

proptest! {
    #[test]
    fn validation_is_idempotent(value in ".{0,12}") {
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let (valid, invalid) = (outcomes.clone(), outcomes.clone());
        let hooks = Hooks::new()
            .on_valid_field(move |_| valid.lock().push(None))
            .on_invalid_field(move |_, kind| invalid.lock().push(Some(kind.clone())));
        let validator = FieldValidator::new(Arc::new(PatternLibrary::new()), Arc::new(hooks), true);
        let mut form = Form::new("p").with_field(
            Field::new("qty", ControlKind::Number)
                .with_value(value.as_str())
                .required()
                .min("1")
                .max_length("6")
                .step("0.5"),
        );

        let first = validator.validate(&mut form, FieldId(0)).unwrap();
        let second = validator.validate(&mut form, FieldId(0)).unwrap();

        prop_assert_eq!(&first, &second);
        let outcomes = outcomes.lock();
        prop_assert_eq!(outcomes.len(), 2);
        prop_assert_eq!(&outcomes[0], &outcomes[1]);
        prop_assert_eq!(outcomes[0].as_ref(), first.error());
    }
}

// ============================================================================
// CALENDAR DATES
// ============================================================================

proptest! {
    #[test]
    fn calendar_dates_follow_month_lengths(year in 1i32..=9999, month in 1u32..=12, day in 1u32..=31) {
        let value = format!("{year:04}-{month:02}-{day:02}");
        prop_assert_eq!(is_valid_calendar_date(&value), day <= days_in_month(year, month));
    }

    #[test]
    fn date_fields_reject_impossible_days(year in 1i32..=9999, month in 1u32..=12) {
        let day = days_in_month(year, month) + 1;
        prop_assume!(day <= 31);
        let field = Field::new("d", ControlKind::Date).with_value(format!("{year:04}-{month:02}-{day:02}"));
        let result = evaluate(field);
        prop_assert_eq!(result.error(), Some(&ErrorKind::Type));
    }
}

#[test]
fn leap_days() {
    assert!(is_valid_calendar_date("2024-02-29"));
    assert!(!is_valid_calendar_date("2023-02-29"));
    assert!(!is_valid_calendar_date("2024-02-30"));
    assert!(is_valid_calendar_date("2000-02-29"));
    assert!(!is_valid_calendar_date("1900-02-29"));
}

// ============================================================================
// STEP LAW
// ============================================================================

proptest! {
    #[test]
    fn whole_cents_sit_on_a_cent_step(units in 0u32..1_000_000, cents in 0u32..100) {
        let field = Field::new("price", ControlKind::Number)
            .with_value(format!("{units}.{cents:02}"))
            .step("0.01");
        prop_assert!(evaluate(field).is_valid());
    }

    #[test]
    fn fractions_of_a_cent_miss_the_step(units in 0u32..1_000_000, mills in 0u32..100, last in 1u32..10) {
        let field = Field::new("price", ControlKind::Number)
            .with_value(format!("{units}.{mills:02}{last}"))
            .step("0.01");
        let result = evaluate(field);
        prop_assert_eq!(result.error(), Some(&ErrorKind::Step));
    }

    #[test]
    fn whole_numbers_past_decimal_range_sit_on_unit_step(mantissa in 1u32..1000, exponent in 29u32..300) {
        let value = format!("{mantissa}e{exponent}");
        prop_assume!(value.parse::<f64>().is_ok_and(f64::is_finite));
        let field = Field::new("big", ControlKind::Number).with_value(value).step("1");
        prop_assert!(evaluate(field).is_valid());
    }

    #[test]
    fn any_step_accepts_every_number(value in -1.0e6f64..1.0e6) {
        let field = Field::new("x", ControlKind::Number)
            .with_value(value.to_string())
            .step("any");
        prop_assert!(evaluate(field).is_valid());
    }
}
