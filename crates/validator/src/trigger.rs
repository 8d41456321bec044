//! Trigger state: the submit guard and the simulated change signal

use std::collections::HashMap;

use crate::field::{Field, FieldId};
use crate::form::SubmitControl;

// ============================================================================
// SUBMIT GUARD
// ============================================================================

/// Where the submit guard stands in the current submission cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerState {
    /// No submit control inspected yet; the next submission validates.
    #[default]
    Idle,
    /// A validating submit control was clicked.
    ArmedForSubmit,
    /// A control marked to skip validation was clicked.
    Suppressed,
}

/// Decides whether the next submission runs validation.
///
/// A click on a submit-capable control arms or suppresses the guard; the
/// submission that follows consumes the decision and the guard returns to
/// [`TriggerState::Idle`], which validates.
#[derive(Debug, Clone, Default)]
pub struct TriggerGuard {
    state: TriggerState,
}

impl TriggerGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Inspects the control about to submit the form.
    ///
    /// Controls that do not submit leave the guard untouched.
    pub fn inspect_click(&mut self, control: &SubmitControl) -> TriggerState {
        if !control.kind.is_submit() {
            return self.state;
        }
        let next = if control.skip_validation {
            TriggerState::Suppressed
        } else {
            TriggerState::ArmedForSubmit
        };
        if next != self.state {
            tracing::debug!(control = %control.name, from = ?self.state, to = ?next, "submit guard");
        }
        self.state = next;
        next
    }

    /// Consumes the decision for one submission: `true` means validate.
    pub fn take_submit(&mut self) -> bool {
        let armed = self.state != TriggerState::Suppressed;
        self.state = TriggerState::Idle;
        armed
    }

    pub fn reset(&mut self) {
        self.state = TriggerState::Idle;
    }
}

// ============================================================================
// SIMULATED CHANGE
// ============================================================================

/// Infers value changes from before-activate / click / focus-out signals.
///
/// Used where the host does not deliver a native change signal for every
/// control kind.
#[derive(Debug, Clone, Default)]
pub struct ChangeSimulator {
    snapshots: HashMap<FieldId, String>,
}

impl ChangeSimulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the value the field holds as it is activated.
    pub fn before_activate(&mut self, id: FieldId, field: &Field) {
        if Self::observes(field) {
            self.snapshots.insert(id, field.current_value().to_string());
        }
    }

    /// A click on a checkbox, radio or select is itself a change.
    #[must_use]
    pub fn click(&self, field: &Field) -> bool {
        Self::observes(field) && field.kind.changes_on_click()
    }

    /// Compares the value with its snapshot and forgets the snapshot.
    ///
    /// A field that was never snapshotted counts as changed.
    pub fn focus_out(&mut self, id: FieldId, field: &Field) -> bool {
        if !Self::observes(field) {
            return false;
        }
        self.snapshots
            .remove(&id)
            .is_none_or(|before| before != field.current_value())
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    fn observes(field: &Field) -> bool {
        field.kind.holds_value() && !field.read_only
    }
}
