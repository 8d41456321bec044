//! # formcheck
//!
//! A declarative field and form validation engine.
//!
//! Fields carry constraint attributes (required, pattern, bounds, step,
//! cross-field match, remote check). The engine decides per-field and
//! per-form validity through a fixed rule pipeline, coordinates remote checks
//! with cancel-and-replace semantics, and revalidates in response to the
//! host's interaction signals.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use formcheck::prelude::*;
//!
//! let form = Form::new("signup")
//!     .with_field(Field::new("email", ControlKind::Email).required().remote())
//!     .with_field(Field::new("confirm", ControlKind::Email).matches("email"))
//!     .with_field(Field::new("age", ControlKind::Number).min("18").step("1"))
//!     .with_remote_url("/signup/check")
//!     .into_shared();
//!
//! let engine = FormEngine::builder(form)
//!     .hooks(Hooks::new().on_invalid_field(|field, kind| eprintln!("{}: {kind}", field.name)))
//!     .build()?;
//! engine.init();
//!
//! match engine.dispatch(Signal::Submit)? {
//!     SignalOutcome::Submit(SubmitOutcome::RemotePending(ticket)) => ticket.wait().await,
//!     _ => {}
//! }
//! ```
//!
//! ## Layout
//!
//! - [`patterns`]: named and inline patterns, `||` alternation
//! - [`rules`]: pure rule predicates
//! - [`pipeline`]: the ordered, short-circuiting rule pipeline
//! - [`aggregate`]: form-level aggregation
//! - [`remote`]: remote check coordination and transports
//! - [`trigger`]: submit guard and simulated change
//! - [`engine`]: entry points, signals and lifecycle

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod form;
pub mod hooks;
pub mod patterns;
pub mod pipeline;
pub mod prelude;
pub mod remote;
pub mod rules;
pub mod trigger;

pub use aggregate::{FormValidationResult, InvalidField, is_eligible};
pub use config::{TriggerMode, ValidatorConfig};
pub use engine::{FormEngine, FormEngineBuilder, Revalidation, Signal, SignalOutcome, SubmitOutcome};
pub use error::{EngineError, ErrorKind, RemoteError, Result};
pub use field::{Constraints, ControlKind, Field, FieldId, SelectOption};
pub use form::{Form, FormDirectory, SharedForm, SubmitAction, SubmitControl};
pub use hooks::{CustomCheck, Hooks};
pub use patterns::PatternLibrary;
pub use pipeline::{FieldValidator, ValidationResult};
#[cfg(feature = "http")]
pub use remote::HttpTransport;
pub use remote::{
    RemoteCoordinator, RemoteDispatch, RemoteFailure, RemoteResponse, RemoteScope, RemoteTicket,
    RemoteTransport, RequestKey,
};
pub use rules::is_valid_calendar_date;
pub use trigger::{ChangeSimulator, TriggerGuard, TriggerState};
