//! The ordered rule pipeline for a single field
//!
//! Rules run in a fixed order and the first one that decides the outcome
//! stops the pipeline:
//!
//! | step        | runs when                        | stops with                                   |
//! |-------------|----------------------------------|----------------------------------------------|
//! | `match`     | a match target is declared       | invalid `match` on mismatch                  |
//! | `required`  | always                           | valid if empty and optional, invalid `required` if empty and marked |
//! | `pattern`   | a pattern is declared            | invalid `pattern`                            |
//! | `maxlength` | a maximum length is declared     | invalid `maxlength`                          |
//! | `type`      | always (only some kinds check)   | invalid `type`                               |
//! | `min`       | a minimum is declared            | invalid `min`                                |
//! | `max`       | a maximum is declared            | invalid `max`                                |
//! | `step`      | a step is declared               | invalid `step`                               |
//! | `custom`    | a check is registered for the name | the check's own kind                       |
//!
//! A field that runs off the end of the table is valid. `required` is the
//! only step that can stop the pipeline with a valid result.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, ErrorKind, Result};
use crate::field::{Field, FieldId};
use crate::form::{Form, FormDirectory};
use crate::hooks::Hooks;
use crate::patterns::PatternLibrary;
use crate::rules;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

/// Outcome of validating one field.
///
/// An invalid result always carries exactly one [`ErrorKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    valid: bool,
    error: Option<ErrorKind>,
}

impl ValidationResult {
    #[must_use]
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    #[must_use]
    pub fn invalid(kind: ErrorKind) -> Self {
        Self {
            valid: false,
            error: Some(kind),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The reason for an invalid result.
    #[must_use]
    pub fn error(&self) -> Option<&ErrorKind> {
        self.error.as_ref()
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// One row of the short-circuit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Match,
    Required,
    Pattern,
    MaxLength,
    Type,
    Min,
    Max,
    Step,
    Custom,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Match => "match",
            Self::Required => "required",
            Self::Pattern => "pattern",
            Self::MaxLength => "maxlength",
            Self::Type => "type",
            Self::Min => "min",
            Self::Max => "max",
            Self::Step => "step",
            Self::Custom => "custom",
        })
    }
}

/// Steps in evaluation order.
pub const PIPELINE: [Step; 9] = [
    Step::Match,
    Step::Required,
    Step::Pattern,
    Step::MaxLength,
    Step::Type,
    Step::Min,
    Step::Max,
    Step::Step,
    Step::Custom,
];

enum Verdict {
    Continue,
    Stop(ValidationResult),
}

impl Verdict {
    fn fail_unless(passed: bool, kind: ErrorKind) -> Self {
        if passed {
            Self::Continue
        } else {
            Self::Stop(ValidationResult::invalid(kind))
        }
    }
}

// ============================================================================
// FIELD VALIDATOR
// ============================================================================

/// Runs the pipeline and reports each decision to the hooks.
#[derive(Debug, Clone)]
pub struct FieldValidator {
    patterns: Arc<PatternLibrary>,
    hooks: Arc<Hooks>,
    auto_trim: bool,
}

impl FieldValidator {
    pub fn new(patterns: Arc<PatternLibrary>, hooks: Arc<Hooks>, auto_trim: bool) -> Self {
        Self {
            patterns,
            hooks,
            auto_trim,
        }
    }

    #[must_use]
    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    /// Decides the field without side effects.
    pub fn evaluate(&self, field: &Field, directory: &dyn FormDirectory) -> ValidationResult {
        for step in PIPELINE {
            if let Verdict::Stop(result) = self.run(step, field, directory) {
                tracing::trace!(
                    field = %field.name,
                    %step,
                    valid = result.is_valid(),
                    "pipeline stopped"
                );
                return result;
            }
        }
        ValidationResult::valid()
    }

    /// Trims (when enabled), decides the field and fires the field hook.
    pub fn validate(&self, form: &mut Form, id: FieldId) -> Result<ValidationResult> {
        self.validate_in_place(form, id)
            .ok_or(EngineError::UnknownField { id: id.0 })
    }

    pub(crate) fn validate_in_place(&self, form: &mut Form, id: FieldId) -> Option<ValidationResult> {
        if self.auto_trim {
            let field = form.field_mut(id)?;
            if field.kind.is_trimmable() {
                let trimmed = field.value.trim();
                if trimmed.len() != field.value.len() {
                    field.value = trimmed.to_string();
                }
            }
        }

        let form = &*form;
        let field = form.field(id)?;
        let result = self.evaluate(field, form);
        self.notify(field, &result);
        Some(result)
    }

    pub(crate) fn notify(&self, field: &Field, result: &ValidationResult) {
        match result.error() {
            None => self.hooks.valid_field(field),
            Some(kind) => self.hooks.invalid_field(field, kind),
        }
    }

    fn run(&self, step: Step, field: &Field, directory: &dyn FormDirectory) -> Verdict {
        match step {
            Step::Match => {
                let Some(target_name) = field.constraints.match_target.as_deref() else {
                    return Verdict::Continue;
                };
                let target = directory.field_named(target_name);
                if target.is_none() {
                    tracing::warn!(field = %field.name, target = target_name, "match target not found");
                }
                Verdict::fail_unless(rules::matches_target(field, target), ErrorKind::Match)
            }
            Step::Required => {
                if rules::is_filled(field, directory) {
                    Verdict::Continue
                } else if rules::is_marked_required(field, directory) {
                    Verdict::Stop(ValidationResult::invalid(ErrorKind::Required))
                } else {
                    Verdict::Stop(ValidationResult::valid())
                }
            }
            Step::Pattern => Verdict::fail_unless(
                rules::satisfies_pattern(field, &self.patterns),
                ErrorKind::Pattern,
            ),
            Step::MaxLength => {
                Verdict::fail_unless(rules::within_max_length(field), ErrorKind::MaxLength)
            }
            Step::Type => Verdict::fail_unless(rules::satisfies_type(field), ErrorKind::Type),
            Step::Min => Verdict::fail_unless(rules::satisfies_min(field), ErrorKind::Min),
            Step::Max => Verdict::fail_unless(rules::satisfies_max(field), ErrorKind::Max),
            Step::Step => Verdict::fail_unless(rules::satisfies_step(field), ErrorKind::Step),
            Step::Custom => match self.hooks.custom_check_for(&field.name) {
                Some(check) => match check(field) {
                    Ok(()) => Verdict::Continue,
                    Err(kind) => Verdict::Stop(ValidationResult::invalid(kind)),
                },
                None => Verdict::Continue,
            },
        }
    }
}
