//! Shared fixtures: a hook recorder and a transport the test answers by hand.

use std::sync::Arc;

use async_trait::async_trait;
use formcheck::prelude::*;
use formcheck::{RemoteResponse, ValidatorConfig};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

pub fn init_logging() {
    let _guard = formcheck_log::init_test();
}

// ============================================================================
// RECORDER
// ============================================================================

/// One hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ValidField(String),
    InvalidField(String, ErrorKind),
    ValidForm,
    InvalidForm(Vec<String>),
    RemoteError(RemoteScope),
}

/// Records every hook invocation in order.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks that record into this recorder. `on_valid_form` does not submit.
    pub fn hooks(&self) -> Hooks {
        let (a, b, c, d, e) = (
            self.events.clone(),
            self.events.clone(),
            self.events.clone(),
            self.events.clone(),
            self.events.clone(),
        );
        Hooks::new()
            .on_valid_field(move |f| a.lock().push(Event::ValidField(f.name.clone())))
            .on_invalid_field(move |f, k| b.lock().push(Event::InvalidField(f.name.clone(), k.clone())))
            .on_valid_form(move |_| c.lock().push(Event::ValidForm))
            .on_invalid_form(move |fields| {
                d.lock().push(Event::InvalidForm(
                    fields.iter().map(|f| f.field.name.clone()).collect(),
                ));
            })
            .on_remote_error(move |failure| e.lock().push(Event::RemoteError(failure.scope.clone())))
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

pub fn valid(name: &str) -> Event {
    Event::ValidField(name.to_string())
}

pub fn invalid(name: &str, kind: ErrorKind) -> Event {
    Event::InvalidField(name.to_string(), kind)
}

// ============================================================================
// SCRIPTED TRANSPORT
// ============================================================================

type Reply = Result<RemoteResponse, RemoteError>;

/// A request the engine made, waiting for the test to answer it.
#[derive(Debug)]
pub struct Call {
    pub url: String,
    pub payload: String,
    reply: oneshot::Sender<Reply>,
}

impl Call {
    /// Answers with a JSON object.
    pub fn respond(self, body: Value) {
        let Value::Object(map) = body else {
            panic!("scripted responses must be JSON objects");
        };
        // the engine may have cancelled the request already
        let _ = self.reply.send(Ok(map));
    }

    pub fn fail(self, error: RemoteError) {
        let _ = self.reply.send(Err(error));
    }
}

/// Forwards every post to the test through a channel.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    calls: mpsc::UnboundedSender<Call>,
}

pub fn scripted() -> (ScriptedTransport, mpsc::UnboundedReceiver<Call>) {
    let (calls, rx) = mpsc::unbounded_channel();
    (ScriptedTransport { calls }, rx)
}

#[async_trait]
impl RemoteTransport for ScriptedTransport {
    async fn post(&self, url: &str, payload: String) -> Result<RemoteResponse, RemoteError> {
        let (reply, answer) = oneshot::channel();
        self.calls
            .send(Call {
                url: url.to_string(),
                payload,
                reply,
            })
            .map_err(|_| RemoteError::Transport("script closed".into()))?;
        answer
            .await
            .map_err(|_| RemoteError::Transport("call dropped unanswered".into()))?
    }
}

// ============================================================================
// FORMS
// ============================================================================

/// Signup form with two remote fields, a uid field and two submit controls.
pub fn signup_form() -> Form {
    Form::new("signup")
        .with_field(Field::new("session", ControlKind::Hidden).with_value("s-1").uid())
        .with_field(
            Field::new("email", ControlKind::Email)
                .with_value("a@x.com")
                .required()
                .remote(),
        )
        .with_field(Field::new("user", ControlKind::Text).with_value("bob").remote())
        .with_field(Field::new("confirm", ControlKind::Email).with_value("a@x.com").matches("email"))
        .with_remote_url("/signup/check")
        .with_submit_control(SubmitControl::new("go"))
        .with_submit_control(SubmitControl::new("draft").skip_validation())
}

pub fn engine_with(
    form: Form,
    recorder: &Recorder,
    transport: ScriptedTransport,
    config: ValidatorConfig,
) -> FormEngine {
    let engine = FormEngine::builder(form.into_shared())
        .config(config)
        .hooks(recorder.hooks())
        .transport(transport)
        .build()
        .expect("form has fields");
    engine.init();
    engine
}

pub fn submit_disabled(engine: &FormEngine) -> bool {
    engine
        .form()
        .read()
        .submit_controls()
        .iter()
        .all(|control| control.disabled)
}
