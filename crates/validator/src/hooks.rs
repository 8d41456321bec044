//! Outcome callbacks and caller-supplied checks
//!
//! Hooks are how the engine reports decisions to the embedding UI. They run
//! synchronously on the thread that made the decision, with the form lock
//! held, so a hook must not call back into the engine.
//!
//! Every hook is optional. An absent `on_valid_form` performs the form's
//! native submission; the others simply do nothing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::aggregate::InvalidField;
use crate::error::ErrorKind;
use crate::field::Field;
use crate::form::Form;
use crate::remote::RemoteFailure;

/// Called with a field that passed.
pub type FieldHook = Arc<dyn Fn(&Field) + Send + Sync>;
/// Called with a field that failed and the reason.
pub type InvalidFieldHook = Arc<dyn Fn(&Field, &ErrorKind) + Send + Sync>;
/// Called with a form that passed.
pub type FormHook = Arc<dyn Fn(&Form) + Send + Sync>;
/// Called with the failing fields of a form, in document order.
pub type InvalidFormHook = Arc<dyn Fn(&[InvalidField]) + Send + Sync>;
/// Called when a remote check produced no answer.
pub type RemoteErrorHook = Arc<dyn Fn(&RemoteFailure) + Send + Sync>;
/// Per-field predicate run after every built-in rule passed.
pub type CustomCheck = Arc<dyn Fn(&Field) -> Result<(), ErrorKind> + Send + Sync>;

/// The set of callbacks an engine reports to.
///
/// # Examples
///
/// ```rust,ignore
/// use formcheck::{ErrorKind, Hooks};
///
/// let hooks = Hooks::new()
///     .on_invalid_field(|field, kind| eprintln!("{}: {kind}", field.name))
///     .custom_check("username", |field| {
///         if field.value.starts_with('_') {
///             Err(ErrorKind::custom("leading-underscore"))
///         } else {
///             Ok(())
///         }
///     });
/// ```
#[derive(Clone, Default)]
pub struct Hooks {
    valid_field: Option<FieldHook>,
    invalid_field: Option<InvalidFieldHook>,
    valid_form: Option<FormHook>,
    invalid_form: Option<InvalidFormHook>,
    remote_error: Option<RemoteErrorHook>,
    custom_checks: HashMap<String, CustomCheck>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut checks: Vec<_> = self.custom_checks.keys().collect();
        checks.sort();
        f.debug_struct("Hooks")
            .field("on_valid_field", &self.valid_field.is_some())
            .field("on_invalid_field", &self.invalid_field.is_some())
            .field("on_valid_form", &self.valid_form.is_some())
            .field("on_invalid_form", &self.invalid_form.is_some())
            .field("on_remote_error", &self.remote_error.is_some())
            .field("custom_checks", &checks)
            .finish()
    }
}

impl Hooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn on_valid_field(mut self, hook: impl Fn(&Field) + Send + Sync + 'static) -> Self {
        self.valid_field = Some(Arc::new(hook));
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn on_invalid_field(
        mut self,
        hook: impl Fn(&Field, &ErrorKind) + Send + Sync + 'static,
    ) -> Self {
        self.invalid_field = Some(Arc::new(hook));
        self
    }

    /// Replaces the default (native submission) for a valid form.
    #[must_use = "builder methods must be chained or built"]
    pub fn on_valid_form(mut self, hook: impl Fn(&Form) + Send + Sync + 'static) -> Self {
        self.valid_form = Some(Arc::new(hook));
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn on_invalid_form(
        mut self,
        hook: impl Fn(&[InvalidField]) + Send + Sync + 'static,
    ) -> Self {
        self.invalid_form = Some(Arc::new(hook));
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn on_remote_error(
        mut self,
        hook: impl Fn(&RemoteFailure) + Send + Sync + 'static,
    ) -> Self {
        self.remote_error = Some(Arc::new(hook));
        self
    }

    /// Registers the custom check for fields named `name`, replacing any previous one.
    #[must_use = "builder methods must be chained or built"]
    pub fn custom_check(
        mut self,
        name: impl Into<String>,
        check: impl Fn(&Field) -> Result<(), ErrorKind> + Send + Sync + 'static,
    ) -> Self {
        self.custom_checks.insert(name.into(), Arc::new(check));
        self
    }

    pub(crate) fn custom_check_for(&self, name: &str) -> Option<&CustomCheck> {
        self.custom_checks.get(name)
    }

    pub(crate) fn valid_field(&self, field: &Field) {
        if let Some(hook) = &self.valid_field {
            hook(field);
        }
    }

    pub(crate) fn invalid_field(&self, field: &Field, kind: &ErrorKind) {
        if let Some(hook) = &self.invalid_field {
            hook(field, kind);
        }
    }

    pub(crate) fn valid_form(&self, form: &Form) {
        match &self.valid_form {
            Some(hook) => hook(form),
            None => form.submit(),
        }
    }

    pub(crate) fn invalid_form(&self, invalid: &[InvalidField]) {
        if let Some(hook) = &self.invalid_form {
            hook(invalid);
        }
    }

    pub(crate) fn remote_error(&self, failure: &RemoteFailure) {
        if let Some(hook) = &self.remote_error {
            hook(failure);
        }
    }
}
