//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use formcheck::prelude::*;
//! ```

// ============================================================================
// FORM MODEL
// ============================================================================

pub use crate::field::{ControlKind, Field, FieldId};
pub use crate::form::{Form, FormDirectory, SharedForm, SubmitControl};

// ============================================================================
// ENGINE
// ============================================================================

pub use crate::config::{TriggerMode, ValidatorConfig};
pub use crate::engine::{FormEngine, Signal, SignalOutcome, SubmitOutcome};
pub use crate::hooks::Hooks;
pub use crate::patterns::PatternLibrary;

// ============================================================================
// RESULTS AND ERRORS
// ============================================================================

pub use crate::aggregate::{FormValidationResult, InvalidField};
pub use crate::error::{EngineError, ErrorKind, RemoteError};
pub use crate::pipeline::ValidationResult;

// ============================================================================
// REMOTE
// ============================================================================

pub use crate::remote::{RemoteFailure, RemoteScope, RemoteTicket, RemoteTransport};
