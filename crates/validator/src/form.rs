//! Form definition and the name-lookup capability the rules need

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::field::{ControlKind, Field, FieldId};

/// Native submission of a form, supplied by whoever owns the form.
pub type SubmitAction = Arc<dyn Fn(&Form) + Send + Sync>;

/// A form shared between the engine and its remote-completion tasks.
///
/// The lock is never held across an await point.
pub type SharedForm = Arc<RwLock<Form>>;

// ============================================================================
// FORM DIRECTORY
// ============================================================================

/// Name-based lookup of sibling fields.
///
/// The `match` rule resolves its target and the `required` rule resolves
/// radio groups through this capability instead of reaching for global state.
pub trait FormDirectory {
    /// First field carrying `name`, in document order.
    fn field_named(&self, name: &str) -> Option<&Field>;

    /// Every field carrying `name`, in document order.
    fn group(&self, name: &str) -> Vec<&Field>;
}

// ============================================================================
// SUBMIT CONTROL
// ============================================================================

/// A control that submits the form (`submit` or `image`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitControl {
    /// Control name.
    pub name: String,
    /// `submit` or `image`; any other kind never arms validation.
    #[serde(default = "submit_kind")]
    pub kind: ControlKind,
    /// `formnovalidate`: submitting through this control skips validation.
    #[serde(default)]
    pub skip_validation: bool,
    /// Disabled while a batched remote check is pending.
    #[serde(default)]
    pub disabled: bool,
}

fn submit_kind() -> ControlKind {
    ControlKind::Submit
}

impl SubmitControl {
    /// A plain submit button.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ControlKind::Submit,
            skip_validation: false,
            disabled: false,
        }
    }

    /// Marks the control as bypassing validation.
    #[must_use = "builder methods must be chained or built"]
    pub fn skip_validation(mut self) -> Self {
        self.skip_validation = true;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_kind(mut self, kind: ControlKind) -> Self {
        self.kind = kind;
        self
    }
}

// ============================================================================
// FORM
// ============================================================================

/// An ordered collection of fields plus the form-level declarations.
#[derive(Clone, Default)]
pub struct Form {
    name: String,
    fields: Vec<Field>,
    remote_url: Option<String>,
    submit_controls: Vec<SubmitControl>,
    submit_action: Option<SubmitAction>,
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("remote_url", &self.remote_url)
            .field("submit_controls", &self.submit_controls)
            .finish_non_exhaustive()
    }
}

impl Form {
    /// Creates an empty form.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Appends a field in document order.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Declares the endpoint remote checks are posted to.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_submit_control(mut self, control: SubmitControl) -> Self {
        self.submit_controls.push(control);
        self
    }

    /// Sets the native submission performed by the default `on_valid_form`.
    #[must_use = "builder methods must be chained or built"]
    pub fn on_submit(mut self, action: impl Fn(&Form) + Send + Sync + 'static) -> Self {
        self.submit_action = Some(Arc::new(action));
        self
    }

    /// Wraps the form for sharing with an engine.
    pub fn into_shared(self) -> SharedForm {
        Arc::new(RwLock::new(self))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    /// Fields in document order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(id.0)
    }

    pub fn field_mut(&mut self, id: FieldId) -> Option<&mut Field> {
        self.fields.get_mut(id.0)
    }

    /// Like [`Form::field`], but an unknown id is an error.
    pub fn try_field(&self, id: FieldId) -> Result<&Field> {
        self.field(id).ok_or(EngineError::UnknownField { id: id.0 })
    }

    /// Id of the first field named `name`.
    #[must_use]
    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.fields.iter().position(|f| f.name == name).map(FieldId)
    }

    /// Ids of fields flagged for remote checking, in document order.
    #[must_use]
    pub fn remote_fields(&self) -> Vec<FieldId> {
        self.ids_where(|f| f.constraints.remote)
    }

    /// Name/value pairs of every uid field, in document order.
    #[must_use]
    pub fn uid_pairs(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter(|f| f.constraints.uid)
            .map(|f| (f.name.clone(), f.current_value().to_string()))
            .collect()
    }

    /// Ids of fields that declare `target` as their match target.
    #[must_use]
    pub fn fields_matching(&self, target: &str) -> Vec<FieldId> {
        self.ids_where(|f| f.constraints.match_target.as_deref() == Some(target))
    }

    #[must_use]
    pub fn submit_controls(&self) -> &[SubmitControl] {
        &self.submit_controls
    }

    /// Submit control by name.
    #[must_use]
    pub fn submit_control(&self, name: &str) -> Option<&SubmitControl> {
        self.submit_controls.iter().find(|c| c.name == name)
    }

    /// Disables or re-enables every submit control.
    pub fn set_submit_disabled(&mut self, disabled: bool) {
        for control in &mut self.submit_controls {
            control.disabled = disabled;
        }
    }

    /// Performs the native submission.
    pub fn submit(&self) {
        match &self.submit_action {
            Some(action) => action(self),
            None => tracing::debug!(form = %self.name, "form valid, no submit action attached"),
        }
    }

    fn ids_where(&self, pred: impl Fn(&Field) -> bool) -> Vec<FieldId> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| pred(f))
            .map(|(i, _)| FieldId(i))
            .collect()
    }
}

impl FormDirectory for Form {
    fn field_named(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn group(&self, name: &str) -> Vec<&Field> {
        self.fields.iter().filter(|f| f.name == name).collect()
    }
}
