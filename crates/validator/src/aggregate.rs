//! Form-level aggregation

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::field::{Field, FieldId};
use crate::form::Form;
use crate::pipeline::FieldValidator;

/// Whether form validation looks at this field at all.
///
/// Unnamed, disabled, read-only and structural or button-like controls are
/// skipped and never reach a hook.
#[must_use]
pub fn is_eligible(field: &Field) -> bool {
    !field.name.is_empty() && !field.disabled && !field.read_only && !field.kind.is_structural()
}

/// A field that failed, with a snapshot of its state at decision time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidField {
    pub id: FieldId,
    pub field: Field,
    pub error: ErrorKind,
}

/// Outcome of validating every eligible field of a form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormValidationResult {
    invalid_fields: Vec<InvalidField>,
}

impl FormValidationResult {
    /// Valid iff no eligible field failed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.invalid_fields.is_empty()
    }

    /// Failing fields in document order.
    #[must_use]
    pub fn invalid_fields(&self) -> &[InvalidField] {
        &self.invalid_fields
    }

    #[must_use]
    pub fn into_invalid_fields(self) -> Vec<InvalidField> {
        self.invalid_fields
    }

    pub(crate) fn from_invalid(invalid_fields: Vec<InvalidField>) -> Self {
        Self { invalid_fields }
    }
}

impl FieldValidator {
    /// Validates every eligible field in document order.
    ///
    /// There is no short-circuit: a failure never stops later fields from
    /// being validated, so every field hook fires.
    pub fn validate_form(&self, form: &mut Form) -> FormValidationResult {
        let mut invalid_fields = Vec::new();
        for index in 0..form.len() {
            let id = FieldId(index);
            if !form.field(id).is_some_and(is_eligible) {
                continue;
            }
            let Some(result) = self.validate_in_place(form, id) else {
                continue;
            };
            if let (Some(error), Some(field)) = (result.error(), form.field(id)) {
                invalid_fields.push(InvalidField {
                    id,
                    field: field.clone(),
                    error: error.clone(),
                });
            }
        }

        tracing::debug!(
            form = %form.name(),
            invalid = invalid_fields.len(),
            "form validated locally"
        );
        FormValidationResult::from_invalid(invalid_fields)
    }
}
