//! The form engine: entry points, signal handling and lifecycle
//!
//! A [`FormEngine`] ties the pipeline, the remote coordinator and the trigger
//! state to one shared form. The host forwards interaction signals through
//! [`FormEngine::dispatch`] (or the dedicated methods) and learns what
//! happened from the return value and the hooks.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::aggregate::FormValidationResult;
use crate::config::{TriggerMode, ValidatorConfig};
use crate::error::{EngineError, Result};
use crate::field::FieldId;
use crate::form::SharedForm;
use crate::hooks::Hooks;
use crate::patterns::PatternLibrary;
use crate::pipeline::{FieldValidator, ValidationResult};
use crate::remote::{
    RemoteCoordinator, RemoteDispatch, RemoteTicket, RemoteTransport, UnconfiguredTransport,
};
use crate::trigger::{ChangeSimulator, TriggerGuard, TriggerState};

// ============================================================================
// OUTCOMES
// ============================================================================

/// What a submission (or a forced [`FormEngine::validate`]) led to.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Validation was bypassed and the form submitted natively.
    Skipped,
    /// Local validation failed; `on_invalid_form` has run.
    Invalid(FormValidationResult),
    /// The form was valid with nothing to check remotely; `on_valid_form` has run.
    Submitted,
    /// The form is valid locally and the remote batch is in flight.
    RemotePending(RemoteTicket),
    /// The remote batch could not be dispatched; the failure has been delivered.
    RemoteFailed,
}

/// Result of revalidating one field after a change.
#[derive(Debug)]
pub struct Revalidation {
    /// The local outcome for the field itself.
    pub result: ValidationResult,
    /// Fields that declare this one as their match target and were revalidated too.
    pub dependents: Vec<(FieldId, ValidationResult)>,
    /// The remote check started for the field, if any.
    pub remote: Option<RemoteTicket>,
}

/// An interaction signal from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Native change of a field's value.
    Change(FieldId),
    /// A field is about to be activated.
    BeforeActivate(FieldId),
    /// A field was clicked.
    Click(FieldId),
    /// A field lost focus.
    FocusOut(FieldId),
    /// The named submit control was clicked.
    SubmitClick(String),
    /// The form is being submitted.
    Submit,
}

/// How the engine handled a [`Signal`].
#[derive(Debug)]
pub enum SignalOutcome {
    /// The signal does not apply to the current mode, or the engine is detached.
    Ignored,
    /// State was recorded; nothing was validated yet.
    Recorded,
    Revalidated(Revalidation),
    Submit(SubmitOutcome),
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builder for [`FormEngine`].
pub struct FormEngineBuilder {
    form: SharedForm,
    config: ValidatorConfig,
    hooks: Hooks,
    patterns: PatternLibrary,
    transport: Option<Arc<dyn RemoteTransport>>,
}

impl fmt::Debug for FormEngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormEngineBuilder")
            .field("form", &self.form.read().name())
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .field("custom_transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

impl FormEngineBuilder {
    #[must_use = "builder methods must be chained or built"]
    pub fn config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replaces the pattern library (to add or override named patterns).
    #[must_use = "builder methods must be chained or built"]
    pub fn patterns(mut self, patterns: PatternLibrary) -> Self {
        self.patterns = patterns;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn transport(mut self, transport: impl RemoteTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn shared_transport(mut self, transport: Arc<dyn RemoteTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds a detached engine. Call [`FormEngine::init`] to honour signals.
    pub fn build(self) -> Result<FormEngine> {
        {
            let form = self.form.read();
            if form.is_empty() {
                return Err(EngineError::EmptyForm {
                    form: form.name().to_string(),
                });
            }
        }

        let hooks = Arc::new(self.hooks);
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(UnconfiguredTransport));
        let validator = FieldValidator::new(
            Arc::new(self.patterns),
            Arc::clone(&hooks),
            self.config.auto_trim,
        );
        let remote = RemoteCoordinator::new(
            transport,
            Arc::clone(&hooks),
            self.config.remote_timeout(),
        );

        Ok(FormEngine {
            form: self.form,
            config: self.config,
            validator,
            remote,
            hooks,
            guard: Mutex::new(TriggerGuard::new()),
            changes: Mutex::new(ChangeSimulator::new()),
            attached: AtomicBool::new(false),
        })
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Validation engine bound to one form.
///
/// # Examples
///
/// ```rust,ignore
/// use formcheck::{ControlKind, Field, Form, FormEngine, Hooks, Signal};
///
/// let form = Form::new("signup")
///     .with_field(Field::new("email", ControlKind::Email).required())
///     .into_shared();
///
/// let engine = FormEngine::builder(form)
///     .hooks(Hooks::new().on_invalid_field(|f, kind| eprintln!("{}: {kind}", f.name)))
///     .build()?;
/// engine.init();
/// engine.dispatch(Signal::Submit)?;
/// ```
#[derive(Debug)]
pub struct FormEngine {
    form: SharedForm,
    config: ValidatorConfig,
    validator: FieldValidator,
    remote: RemoteCoordinator,
    hooks: Arc<Hooks>,
    guard: Mutex<TriggerGuard>,
    changes: Mutex<ChangeSimulator>,
    attached: AtomicBool,
}

impl FormEngine {
    pub fn builder(form: SharedForm) -> FormEngineBuilder {
        FormEngineBuilder {
            form,
            config: ValidatorConfig::default(),
            hooks: Hooks::default(),
            patterns: PatternLibrary::default(),
            transport: None,
        }
    }

    #[must_use]
    pub fn form(&self) -> &SharedForm {
        &self.form
    }

    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    #[must_use]
    pub fn remote(&self) -> &RemoteCoordinator {
        &self.remote
    }

    #[must_use]
    pub fn trigger_state(&self) -> TriggerState {
        self.guard.lock().state()
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Starts honouring interaction signals.
    pub fn init(&self) {
        if !self.attached.swap(true, Ordering::AcqRel) {
            tracing::debug!(form = %self.form.read().name(), trigger = ?self.config.trigger_on, "engine attached");
        }
    }

    /// Stops honouring signals and drops all transient state.
    ///
    /// In-flight remote checks are cancelled and will never reach a hook.
    pub fn reset(&self) {
        self.attached.store(false, Ordering::Release);
        self.remote.cancel_all();
        self.changes.lock().clear();
        self.guard.lock().reset();
        tracing::debug!(form = %self.form.read().name(), "engine detached");
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    // ------------------------------------------------------------------------
    // Validation entry points
    // ------------------------------------------------------------------------

    /// Validates one field locally and fires its field hook.
    pub fn validate_field(&self, id: FieldId) -> Result<ValidationResult> {
        self.validator.validate(&mut self.form.write(), id)
    }

    /// Validates every eligible field locally, without form hooks or remote checks.
    pub fn validate_form_locally(&self) -> FormValidationResult {
        self.validator.validate_form(&mut self.form.write())
    }

    /// Full validation: local fold, then either the invalid-form hook, the
    /// remote batch, or the valid-form hook.
    pub fn validate(&self) -> SubmitOutcome {
        let result = self.validate_form_locally();
        if !result.is_valid() {
            self.hooks.invalid_form(result.invalid_fields());
            return SubmitOutcome::Invalid(result);
        }

        match self.remote.check_form(&self.form) {
            RemoteDispatch::Pending(ticket) => SubmitOutcome::RemotePending(ticket),
            RemoteDispatch::Failed => SubmitOutcome::RemoteFailed,
            RemoteDispatch::NotApplicable => {
                self.hooks.valid_form(&self.form.read());
                SubmitOutcome::Submitted
            }
        }
    }

    /// Revalidates a field after its value changed.
    ///
    /// Fields that declare it as their match target are revalidated too, when
    /// they hold content or both are empty. A valid, non-empty, remote-checked
    /// field then gets a remote check.
    pub fn revalidate(&self, id: FieldId) -> Result<Revalidation> {
        let result = self.validate_field(id)?;

        let (dependents, wants_remote) = {
            let form = self.form.read();
            let field = form.try_field(id)?;
            let empty = field.current_value().is_empty();
            let dependents: Vec<FieldId> = form
                .fields_matching(&field.name)
                .into_iter()
                .filter(|dep| *dep != id)
                .filter(|dep| {
                    form.field(*dep).is_some_and(|dep| {
                        let dep_empty = dep.current_value().is_empty();
                        (empty && dep_empty) || !dep_empty
                    })
                })
                .collect();
            let wants_remote = result.is_valid() && !empty && field.constraints.remote;
            (dependents, wants_remote)
        };

        let mut revalidated = Vec::with_capacity(dependents.len());
        for dep in dependents {
            revalidated.push((dep, self.validate_field(dep)?));
        }

        let remote = if wants_remote {
            self.remote.check_field(&self.form, id).into_ticket()
        } else {
            None
        };

        Ok(Revalidation {
            result,
            dependents: revalidated,
            remote,
        })
    }

    // ------------------------------------------------------------------------
    // Signals
    // ------------------------------------------------------------------------

    /// Records which submit control is about to submit the form.
    pub fn submit_clicked(&self, control: &str) -> SignalOutcome {
        let form = self.form.read();
        let Some(control) = form.submit_control(control) else {
            tracing::warn!(control, "click on unknown submit control");
            return SignalOutcome::Ignored;
        };
        self.guard.lock().inspect_click(control);
        SignalOutcome::Recorded
    }

    /// Handles a submission: validates, unless the guard was suppressed, in
    /// which case the form is submitted natively without validation.
    pub fn submit(&self) -> SubmitOutcome {
        if self.guard.lock().take_submit() {
            return self.validate();
        }
        let form = self.form.read();
        tracing::debug!(form = %form.name(), "validation skipped for this submission");
        form.submit();
        SubmitOutcome::Skipped
    }

    /// Routes an interaction signal according to the trigger mode.
    pub fn dispatch(&self, signal: Signal) -> Result<SignalOutcome> {
        if !self.is_attached() {
            tracing::trace!(?signal, "engine detached, signal ignored");
            return Ok(SignalOutcome::Ignored);
        }

        let live_change = self.config.trigger_on == TriggerMode::Change;
        let simulated = live_change && !self.config.change_bubbles;

        match signal {
            Signal::Submit => Ok(SignalOutcome::Submit(self.submit())),
            Signal::SubmitClick(control) => Ok(self.submit_clicked(&control)),
            Signal::Change(id) if live_change && !simulated => self.revalidated(id),
            Signal::BeforeActivate(id) if simulated => {
                let form = self.form.read();
                self.changes.lock().before_activate(id, form.try_field(id)?);
                Ok(SignalOutcome::Recorded)
            }
            Signal::Click(id) if simulated => {
                let changed = {
                    let form = self.form.read();
                    self.changes.lock().click(form.try_field(id)?)
                };
                if changed {
                    self.revalidated(id)
                } else {
                    Ok(SignalOutcome::Ignored)
                }
            }
            Signal::FocusOut(id) if simulated => {
                let changed = {
                    let form = self.form.read();
                    self.changes.lock().focus_out(id, form.try_field(id)?)
                };
                if changed {
                    self.revalidated(id)
                } else {
                    Ok(SignalOutcome::Ignored)
                }
            }
            Signal::FocusOut(id) if self.config.trigger_on == TriggerMode::Blur => {
                self.revalidated(id)
            }
            Signal::Change(id)
            | Signal::BeforeActivate(id)
            | Signal::Click(id)
            | Signal::FocusOut(id) => {
                self.form.read().try_field(id)?;
                Ok(SignalOutcome::Ignored)
            }
        }
    }

    fn revalidated(&self, id: FieldId) -> Result<SignalOutcome> {
        self.revalidate(id).map(SignalOutcome::Revalidated)
    }
}
