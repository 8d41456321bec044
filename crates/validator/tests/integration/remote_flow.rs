//! Remote coordination: cancel-and-replace, batching, failures and timeouts.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use formcheck::prelude::*;
use formcheck::{RemoteScope, ValidatorConfig};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::support::{
    Event, Recorder, engine_with, init_logging, invalid, scripted, signup_form, submit_disabled,
    valid,
};

const EMAIL: FieldId = FieldId(1);

fn set_value(engine: &FormEngine, id: FieldId, value: &str) {
    engine.form().write().field_mut(id).unwrap().set_value(value);
}

#[tokio::test]
async fn single_field_check_carries_uid_pairs() {
    init_logging();
    let recorder = Recorder::new();
    let (transport, mut calls) = scripted();
    let engine = engine_with(signup_form(), &recorder, transport, ValidatorConfig::default());

    let ticket = engine.revalidate(EMAIL).unwrap().remote.expect("remote check dispatched");
    let call = calls.recv().await.unwrap();
    assert_eq!(call.url, "/signup/check");
    assert_eq!(call.payload, "email=a%40x.com&session=s-1");
    assert!(engine.remote().is_in_flight("email"));

    call.respond(json!({ "email": true }));
    ticket.wait().await;

    assert!(!engine.remote().is_in_flight("email"));
    assert_eq!(
        recorder.events(),
        vec![valid("email"), valid("confirm"), valid("email")]
    );
}

#[tokio::test]
async fn newer_check_supersedes_older_one() {
    let recorder = Recorder::new();
    let (transport, mut calls) = scripted();
    let engine = engine_with(signup_form(), &recorder, transport, ValidatorConfig::default());

    let first = engine.revalidate(EMAIL).unwrap().remote.unwrap();
    let first_call = calls.recv().await.unwrap();

    set_value(&engine, EMAIL, "b@x.com");
    let second = engine.revalidate(EMAIL).unwrap().remote.unwrap();
    assert!(second.id() > first.id());
    let second_call = calls.recv().await.unwrap();
    assert_eq!(second_call.payload, "email=b%40x.com&session=s-1");

    // the stale answer arrives after the replacement was issued
    first_call.respond(json!({ "email": true }));
    second_call.respond(json!({ "email": "taken" }));
    first.wait().await;
    second.wait().await;

    assert_eq!(
        recorder.events(),
        vec![
            valid("email"),
            valid("confirm"),
            valid("email"),
            invalid("confirm", ErrorKind::Match),
            invalid("email", ErrorKind::RemoteRejected("taken".into())),
        ]
    );
    assert_eq!(engine.remote().in_flight_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn replacement_wins_on_a_multi_thread_runtime() {
    let recorder = Recorder::new();
    let (transport, mut calls) = scripted();
    let engine = engine_with(signup_form(), &recorder, transport, ValidatorConfig::default());

    let first = engine.revalidate(EMAIL).unwrap().remote.unwrap();
    let first_call = calls.recv().await.unwrap();
    set_value(&engine, EMAIL, "b@x.com");
    let second = engine.revalidate(EMAIL).unwrap().remote.unwrap();
    let second_call = calls.recv().await.unwrap();

    // both answers race on separate workers
    let stale = tokio::spawn(async move { first_call.respond(json!({ "email": true })) });
    second_call.respond(json!({ "email": "taken" }));
    stale.await.unwrap();
    first.wait().await;
    second.wait().await;

    let remote_events: Vec<_> = recorder.events().into_iter().skip(4).collect();
    assert_eq!(
        remote_events,
        vec![invalid("email", ErrorKind::RemoteRejected("taken".into()))]
    );
    assert_eq!(engine.remote().in_flight_count(), 0);
}

#[tokio::test]
async fn answered_but_undelivered_check_is_dropped_when_replaced() {
    let recorder = Recorder::new();
    let (transport, mut calls) = scripted();
    let engine = engine_with(signup_form(), &recorder, transport, ValidatorConfig::default());

    let first = engine.revalidate(EMAIL).unwrap().remote.unwrap();
    calls.recv().await.unwrap().respond(json!({ "email": "stale" }));
    // no yield between the answer and the replacement
    let second = engine.revalidate(EMAIL).unwrap().remote.unwrap();
    calls.recv().await.unwrap().respond(json!({ "email": true }));
    first.wait().await;
    second.wait().await;

    // two local passes of email and confirm precede the remote answer
    let remote_events: Vec<_> = recorder.events().into_iter().skip(4).collect();
    assert_eq!(remote_events, vec![valid("email")]);
}

#[tokio::test]
async fn missing_key_is_a_rejection() {
    let recorder = Recorder::new();
    let (transport, mut calls) = scripted();
    let engine = engine_with(signup_form(), &recorder, transport, ValidatorConfig::default());

    let ticket = engine.revalidate(EMAIL).unwrap().remote.unwrap();
    calls.recv().await.unwrap().respond(json!({ "other": true }));
    ticket.wait().await;

    assert_eq!(
        recorder.events().last(),
        Some(&invalid("email", ErrorKind::RemoteRejected(String::new())))
    );
}

#[tokio::test]
async fn single_field_transport_failure() {
    let recorder = Recorder::new();
    let (transport, mut calls) = scripted();
    let engine = engine_with(signup_form(), &recorder, transport, ValidatorConfig::default());

    let ticket = engine.revalidate(EMAIL).unwrap().remote.unwrap();
    calls
        .recv()
        .await
        .unwrap()
        .fail(RemoteError::Status { status: 502 });
    ticket.wait().await;

    assert_eq!(
        recorder.events(),
        vec![
            valid("email"),
            valid("confirm"),
            invalid("email", ErrorKind::TransportFailure),
            Event::RemoteError(RemoteScope::Field("email".into())),
        ]
    );
    assert!(!engine.remote().is_in_flight("email"));
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let recorder = Recorder::new();
    let (transport, mut calls) = scripted();
    let config = ValidatorConfig::default().with_remote_timeout(Some(Duration::from_millis(50)));
    let engine = engine_with(signup_form(), &recorder, transport, config);

    let ticket = engine.revalidate(EMAIL).unwrap().remote.unwrap();
    // hold the call open without answering
    let _pending = calls.recv().await.unwrap();
    ticket.wait().await;

    assert_eq!(
        recorder.events().last(),
        Some(&Event::RemoteError(RemoteScope::Field("email".into())))
    );
    assert!(!engine.remote().is_in_flight("email"));
}

#[tokio::test]
async fn batch_brackets_submit_controls() {
    let recorder = Recorder::new();
    let (transport, mut calls) = scripted();
    let engine = engine_with(signup_form(), &recorder, transport, ValidatorConfig::default());

    let SubmitOutcome::RemotePending(ticket) = engine.validate() else {
        panic!("locally valid form with remote fields goes remote");
    };
    assert!(submit_disabled(&engine));
    assert!(engine.remote().is_batch_in_flight());

    let call = calls.recv().await.unwrap();
    assert_eq!(call.payload, "session=s-1&email=a%40x.com&user=bob");
    call.respond(json!({ "user": "taken", "email": true, "ghost": true }));
    ticket.wait().await;

    assert!(!submit_disabled(&engine));
    assert_eq!(
        recorder.events(),
        vec![
            valid("email"),
            valid("user"),
            valid("confirm"),
            valid("email"),
            invalid("user", ErrorKind::RemoteRejected("taken".into())),
            Event::InvalidForm(vec!["user".into()]),
        ]
    );
}

#[tokio::test]
async fn accepted_batch_submits_the_form() {
    let submitted = Arc::new(AtomicUsize::new(0));
    let seen = submitted.clone();
    let form = signup_form().on_submit(move |form| {
        assert!(
            form.submit_controls().iter().all(|c| c.disabled),
            "submission happens inside the bracket"
        );
        seen.fetch_add(1, Ordering::SeqCst);
    });
    let (transport, mut calls) = scripted();
    let engine = FormEngine::builder(form.into_shared())
        .transport(transport)
        .build()
        .unwrap();
    engine.init();

    engine.dispatch(Signal::SubmitClick("go".into())).unwrap();
    let SignalOutcome::Submit(SubmitOutcome::RemotePending(ticket)) =
        engine.dispatch(Signal::Submit).unwrap()
    else {
        panic!("expected a pending batch");
    };
    calls
        .recv()
        .await
        .unwrap()
        .respond(json!({ "email": true, "user": true }));
    ticket.wait().await;

    assert_eq!(submitted.load(Ordering::SeqCst), 1);
    assert!(!submit_disabled(&engine));
}

#[tokio::test]
async fn failed_batch_reports_every_remote_field() {
    let recorder = Recorder::new();
    let (transport, mut calls) = scripted();
    let engine = engine_with(signup_form(), &recorder, transport, ValidatorConfig::default());

    let SubmitOutcome::RemotePending(ticket) = engine.validate() else {
        panic!("expected a pending batch");
    };
    recorder.clear();
    calls
        .recv()
        .await
        .unwrap()
        .fail(RemoteError::Parse("expected value".into()));
    ticket.wait().await;

    assert_eq!(
        recorder.events(),
        vec![
            invalid("email", ErrorKind::TransportFailure),
            invalid("user", ErrorKind::TransportFailure),
            Event::RemoteError(RemoteScope::Form),
            Event::InvalidForm(vec!["email".into(), "user".into()]),
        ]
    );
    assert!(!submit_disabled(&engine));
}

#[tokio::test]
async fn batch_omitting_a_remote_field_rejects_it() {
    let recorder = Recorder::new();
    let (transport, mut calls) = scripted();
    let engine = engine_with(signup_form(), &recorder, transport, ValidatorConfig::default());

    let SubmitOutcome::RemotePending(ticket) = engine.validate() else {
        panic!("expected a pending batch");
    };
    recorder.clear();
    calls.recv().await.unwrap().respond(json!({ "email": true }));
    ticket.wait().await;

    assert_eq!(
        recorder.events(),
        vec![
            valid("email"),
            invalid("user", ErrorKind::RemoteRejected(String::new())),
            Event::InvalidForm(vec!["user".into()]),
        ]
    );
}

#[tokio::test]
async fn batch_cancels_pending_field_checks() {
    let recorder = Recorder::new();
    let (transport, mut calls) = scripted();
    let engine = engine_with(signup_form(), &recorder, transport, ValidatorConfig::default());

    let field_ticket = engine.revalidate(EMAIL).unwrap().remote.unwrap();
    let field_call = calls.recv().await.unwrap();

    let SubmitOutcome::RemotePending(batch_ticket) = engine.validate() else {
        panic!("expected a pending batch");
    };
    assert!(!engine.remote().is_in_flight("email"));
    recorder.clear();

    field_call.respond(json!({ "email": "stale" }));
    field_ticket.wait().await;
    calls
        .recv()
        .await
        .unwrap()
        .respond(json!({ "email": true, "user": true }));
    batch_ticket.wait().await;

    assert_eq!(
        recorder.events(),
        vec![valid("email"), valid("user"), Event::ValidForm]
    );
}

#[tokio::test]
async fn replaced_batch_keeps_controls_disabled() {
    let recorder = Recorder::new();
    let (transport, mut calls) = scripted();
    let engine = engine_with(signup_form(), &recorder, transport, ValidatorConfig::default());

    let SubmitOutcome::RemotePending(first) = engine.validate() else {
        panic!("expected a pending batch");
    };
    let SubmitOutcome::RemotePending(second) = engine.validate() else {
        panic!("expected a pending batch");
    };

    first.wait().await;
    assert!(submit_disabled(&engine), "the newer batch still holds the controls");

    recorder.clear();
    calls
        .recv()
        .await
        .unwrap()
        .respond(json!({ "email": true, "user": true }));
    second.wait().await;

    assert!(!submit_disabled(&engine));
    assert_eq!(
        recorder.events(),
        vec![valid("email"), valid("user"), Event::ValidForm]
    );
}

#[tokio::test]
async fn reset_cancels_everything_and_releases_controls() {
    let recorder = Recorder::new();
    let (transport, mut calls) = scripted();
    let engine = engine_with(signup_form(), &recorder, transport, ValidatorConfig::default());

    let SubmitOutcome::RemotePending(ticket) = engine.validate() else {
        panic!("expected a pending batch");
    };
    let call = calls.recv().await.unwrap();
    recorder.clear();

    engine.reset();
    call.respond(json!({ "email": true, "user": true }));
    ticket.wait().await;

    assert!(!submit_disabled(&engine));
    assert_eq!(engine.remote().in_flight_count(), 0);
    assert!(recorder.events().is_empty());
    assert!(matches!(
        engine.dispatch(Signal::Submit).unwrap(),
        SignalOutcome::Ignored
    ));
}
