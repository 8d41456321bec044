//! Remote validation coordination
//!
//! The coordinator owns the map from request key (one field, or the form-wide
//! batch) to the request currently in flight for it. Starting a request for a
//! key cancels the previous one before the new one is dispatched. A response
//! is only delivered if its request still owns the key when it completes;
//! anything else is dropped without touching a hook. Deliveries for one key
//! are serialized and never go backwards: once a newer request has delivered,
//! an older one that claimed its key earlier is dropped.
//!
//! A batch disables the form's submit controls for its whole lifetime. They
//! are re-enabled on every exit path, unless a newer batch has taken over.

#[cfg(feature = "http")]
mod http;
mod transport;

#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use transport::{
    RemoteResponse, RemoteTransport, UnconfiguredTransport, encode_payload, parse_response,
};

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::aggregate::InvalidField;
use crate::error::{ErrorKind, RemoteError};
use crate::field::FieldId;
use crate::form::{Form, SharedForm};
use crate::hooks::Hooks;

// ============================================================================
// PUBLIC TYPES
// ============================================================================

/// What a remote request is checking.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestKey {
    /// A single field, by name.
    Field(String),
    /// Every remote field of the form, on submission.
    Batch,
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "field '{name}'"),
            Self::Batch => f.write_str("batch"),
        }
    }
}

/// Which check a transport failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteScope {
    Field(String),
    Form,
}

/// A remote check that produced no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    pub scope: RemoteScope,
    pub error: RemoteError,
}

/// What happened when a remote check was requested.
#[derive(Debug)]
pub enum RemoteDispatch {
    /// Nothing to check: no endpoint, or no remote-checked field.
    NotApplicable,
    /// The request is in flight.
    Pending(RemoteTicket),
    /// The request could not be dispatched; the failure has been delivered.
    Failed,
}

impl RemoteDispatch {
    #[must_use]
    pub fn into_ticket(self) -> Option<RemoteTicket> {
        match self {
            Self::Pending(ticket) => Some(ticket),
            Self::NotApplicable | Self::Failed => None,
        }
    }
}

/// Handle to a dispatched remote request.
#[derive(Debug)]
pub struct RemoteTicket {
    id: u64,
    handle: JoinHandle<()>,
}

impl RemoteTicket {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Resolves once the request has been delivered, dropped as stale, or cancelled.
    pub async fn wait(self) {
        if let Err(err) = self.handle.await {
            tracing::warn!(ticket = self.id, error = %err, "remote completion task failed");
        }
    }
}

// ============================================================================
// COORDINATOR
// ============================================================================

#[derive(Debug)]
struct InFlight {
    ticket: u64,
    cancel: CancellationToken,
}

type InFlightMap = Arc<DashMap<RequestKey, InFlight>>;

/// Last delivered ticket per key; the mutex is held for the whole delivery.
type DeliveredMap = Arc<DashMap<RequestKey, Arc<Mutex<u64>>>>;

/// Dispatches remote checks and routes their answers to the hooks.
pub struct RemoteCoordinator {
    transport: Arc<dyn RemoteTransport>,
    hooks: Arc<Hooks>,
    timeout: Option<Duration>,
    in_flight: InFlightMap,
    delivered: DeliveredMap,
    next_ticket: AtomicU64,
}

impl fmt::Debug for RemoteCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCoordinator")
            .field("timeout", &self.timeout)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl RemoteCoordinator {
    pub fn new(
        transport: Arc<dyn RemoteTransport>,
        hooks: Arc<Hooks>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            transport,
            hooks,
            timeout,
            in_flight: Arc::new(DashMap::new()),
            delivered: Arc::new(DashMap::new()),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Whether a single-field check for `name` is in flight.
    #[must_use]
    pub fn is_in_flight(&self, name: &str) -> bool {
        self.in_flight
            .contains_key(&RequestKey::Field(name.to_string()))
    }

    /// Whether a batched check is in flight.
    #[must_use]
    pub fn is_batch_in_flight(&self) -> bool {
        self.in_flight.contains_key(&RequestKey::Batch)
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Cancels the request for `key`, if any. Its response will never be delivered.
    pub fn cancel(&self, key: &RequestKey) -> bool {
        match self.in_flight.remove(key) {
            Some((_, entry)) => {
                entry.cancel.cancel();
                tracing::debug!(%key, ticket = entry.ticket, "remote check cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancels every request in flight.
    pub fn cancel_all(&self) {
        self.in_flight.retain(|key, entry| {
            entry.cancel.cancel();
            tracing::debug!(%key, ticket = entry.ticket, "remote check cancelled");
            false
        });
    }

    /// Checks one field remotely.
    ///
    /// Not applicable when the field is not remote-checked or the form has no
    /// endpoint. Without an async runtime the check fails immediately through
    /// the transport-failure path.
    pub fn check_field(&self, form: &SharedForm, id: FieldId) -> RemoteDispatch {
        let (url, name, payload) = {
            let form = form.read();
            let (Some(url), Some(field)) = (
                form.remote_url(),
                form.field(id).filter(|f| f.constraints.remote),
            ) else {
                return RemoteDispatch::NotApplicable;
            };
            let url = url.to_string();
            let mut pairs = vec![(field.name.clone(), field.current_value().to_string())];
            pairs.extend(form.uid_pairs());
            (url, field.name.clone(), encode_payload(&pairs))
        };

        let key = RequestKey::Field(name.clone());
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            deliver_field(
                &form.read(),
                &self.hooks,
                id,
                &name,
                Err(RemoteError::Transport("no async runtime".to_string())),
            );
            return RemoteDispatch::Failed;
        };

        let (ticket, cancel) = self.begin(key.clone());
        tracing::debug!(%key, ticket, "remote check dispatched");

        let transport = Arc::clone(&self.transport);
        let hooks = Arc::clone(&self.hooks);
        let in_flight = Arc::clone(&self.in_flight);
        let delivered = Arc::clone(&self.delivered);
        let timeout = self.timeout;
        let form = Arc::clone(form);

        let handle = runtime.spawn(async move {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                outcome = post(transport.as_ref(), &url, payload, timeout) => outcome,
            };
            let landed = claim(&in_flight, &key, ticket)
                && deliver_in_order(&delivered, &key, ticket, || {
                    deliver_field(&form.read(), &hooks, id, &name, outcome);
                });
            if !landed {
                tracing::trace!(%key, ticket, "stale remote response dropped");
            }
        });

        RemoteDispatch::Pending(RemoteTicket { id: ticket, handle })
    }

    /// Checks every remote field of the form in one request.
    ///
    /// Cancels the per-field checks of those fields first, then disables the
    /// submit controls until the batch is finished. Not applicable when the
    /// form has no endpoint or no remote field.
    pub fn check_form(&self, form: &SharedForm) -> RemoteDispatch {
        let (url, remote_ids, payload) = {
            let form = form.read();
            let remote_ids = form.remote_fields();
            let Some(url) = form.remote_url().filter(|_| !remote_ids.is_empty()) else {
                return RemoteDispatch::NotApplicable;
            };
            let url = url.to_string();
            for id in &remote_ids {
                if let Some(field) = form.field(*id) {
                    self.cancel(&RequestKey::Field(field.name.clone()));
                }
            }
            let mut pairs = form.uid_pairs();
            pairs.extend(
                remote_ids
                    .iter()
                    .filter_map(|id| form.field(*id))
                    .map(|f| (f.name.clone(), f.current_value().to_string())),
            );
            (url, remote_ids, encode_payload(&pairs))
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            deliver_batch(
                &form.read(),
                &self.hooks,
                &remote_ids,
                Err(RemoteError::Transport("no async runtime".to_string())),
            );
            return RemoteDispatch::Failed;
        };

        let (ticket, cancel) = self.begin(RequestKey::Batch);
        form.write().set_submit_disabled(true);
        tracing::debug!(ticket, fields = remote_ids.len(), "remote batch dispatched");

        let release = SubmitRelease {
            form: Arc::clone(form),
            in_flight: Arc::clone(&self.in_flight),
            ticket,
        };
        let transport = Arc::clone(&self.transport);
        let hooks = Arc::clone(&self.hooks);
        let in_flight = Arc::clone(&self.in_flight);
        let delivered = Arc::clone(&self.delivered);
        let timeout = self.timeout;
        let form = Arc::clone(form);

        let handle = runtime.spawn(async move {
            // dropped last, after delivery
            let _release = release;
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                outcome = post(transport.as_ref(), &url, payload, timeout) => outcome,
            };
            let key = RequestKey::Batch;
            let landed = claim(&in_flight, &key, ticket)
                && deliver_in_order(&delivered, &key, ticket, || {
                    deliver_batch(&form.read(), &hooks, &remote_ids, outcome);
                });
            if !landed {
                tracing::trace!(ticket, "stale remote batch response dropped");
            }
        });

        RemoteDispatch::Pending(RemoteTicket { id: ticket, handle })
    }

    /// Registers a new request for `key`, cancelling the one it replaces.
    fn begin(&self, key: RequestKey) -> (u64, CancellationToken) {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let entry = InFlight {
            ticket,
            cancel: cancel.clone(),
        };
        if let Some(previous) = self.in_flight.insert(key.clone(), entry) {
            previous.cancel.cancel();
            tracing::debug!(%key, ticket = previous.ticket, replaced_by = ticket, "remote check superseded");
        }
        (ticket, cancel)
    }
}

impl Drop for RemoteCoordinator {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Removes the entry for `key` if `ticket` still owns it.
fn claim(in_flight: &DashMap<RequestKey, InFlight>, key: &RequestKey, ticket: u64) -> bool {
    in_flight
        .remove_if(key, |_, entry| entry.ticket == ticket)
        .is_some()
}

/// Runs `deliver` unless a newer ticket for `key` has already delivered.
fn deliver_in_order(
    delivered: &DashMap<RequestKey, Arc<Mutex<u64>>>,
    key: &RequestKey,
    ticket: u64,
    deliver: impl FnOnce(),
) -> bool {
    let slot = Arc::clone(delivered.entry(key.clone()).or_default().value());
    let mut last = slot.lock();
    if *last > ticket {
        return false;
    }
    *last = ticket;
    deliver();
    true
}

async fn post(
    transport: &dyn RemoteTransport,
    url: &str,
    payload: String,
    timeout: Option<Duration>,
) -> Result<RemoteResponse, RemoteError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, transport.post(url, payload))
            .await
            .map_err(|_| RemoteError::Timeout {
                timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })?,
        None => transport.post(url, payload).await,
    }
}

// ============================================================================
// SUBMIT RELEASE
// ============================================================================

/// Re-enables submit controls when a batch task ends, however it ends.
struct SubmitRelease {
    form: SharedForm,
    in_flight: InFlightMap,
    ticket: u64,
}

impl Drop for SubmitRelease {
    fn drop(&mut self) {
        let superseded = self
            .in_flight
            .get(&RequestKey::Batch)
            .is_some_and(|entry| entry.ticket != self.ticket);
        if superseded {
            return;
        }
        self.form.write().set_submit_disabled(false);
        tracing::debug!(ticket = self.ticket, "submit controls re-enabled");
    }
}

// ============================================================================
// DELIVERY
// ============================================================================

fn deliver_field(
    form: &Form,
    hooks: &Hooks,
    id: FieldId,
    name: &str,
    outcome: Result<RemoteResponse, RemoteError>,
) {
    let Some(field) = form.field(id) else {
        tracing::warn!(field = name, "remote-checked field no longer exists");
        return;
    };
    match outcome {
        Ok(response) => match verdict(response.get(name)) {
            None => hooks.valid_field(field),
            Some(kind) => hooks.invalid_field(field, &kind),
        },
        Err(error) => {
            tracing::debug!(field = name, %error, "remote check failed");
            hooks.invalid_field(field, &ErrorKind::TransportFailure);
            hooks.remote_error(&RemoteFailure {
                scope: RemoteScope::Field(name.to_string()),
                error,
            });
        }
    }
}

fn deliver_batch(
    form: &Form,
    hooks: &Hooks,
    remote_ids: &[FieldId],
    outcome: Result<RemoteResponse, RemoteError>,
) {
    let mut invalid = Vec::new();
    match outcome {
        Ok(response) => {
            let mut answered: Vec<(FieldId, Option<&Value>)> = Vec::with_capacity(response.len());
            for (key, value) in &response {
                match form.field_id(key) {
                    Some(id) => answered.push((id, Some(value))),
                    None => tracing::warn!(key = %key, "remote response names an unknown field"),
                }
            }
            for id in remote_ids {
                if !answered.iter().any(|(answered_id, _)| answered_id == id) {
                    if let Some(field) = form.field(*id) {
                        tracing::warn!(field = %field.name, "remote response omits a remote field");
                    }
                    answered.push((*id, None));
                }
            }
            answered.sort_by_key(|(id, _)| *id);

            for (id, value) in answered {
                let Some(field) = form.field(id) else {
                    continue;
                };
                match verdict(value) {
                    None => hooks.valid_field(field),
                    Some(error) => {
                        hooks.invalid_field(field, &error);
                        invalid.push(InvalidField {
                            id,
                            field: field.clone(),
                            error,
                        });
                    }
                }
            }
        }
        Err(error) => {
            tracing::debug!(%error, "remote batch failed");
            for id in remote_ids {
                let Some(field) = form.field(*id) else {
                    continue;
                };
                hooks.invalid_field(field, &ErrorKind::TransportFailure);
                invalid.push(InvalidField {
                    id: *id,
                    field: field.clone(),
                    error: ErrorKind::TransportFailure,
                });
            }
            hooks.remote_error(&RemoteFailure {
                scope: RemoteScope::Form,
                error,
            });
        }
    }

    if invalid.is_empty() {
        hooks.valid_form(form);
    } else {
        hooks.invalid_form(&invalid);
    }
}

/// `None` accepts; anything but `true` rejects, and an absent answer rejects with no detail.
fn verdict(value: Option<&Value>) -> Option<ErrorKind> {
    match value {
        Some(Value::Bool(true)) => None,
        Some(other) => Some(ErrorKind::from_remote(other)),
        None => Some(ErrorKind::RemoteRejected(String::new())),
    }
}
