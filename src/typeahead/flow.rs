//! Search flow control for typeahead lookups.
//!
//! Lookups run as background tokio tasks so the UI stays responsive while a
//! search is outstanding. Every lookup is tagged with the session that issued
//! it and a [`Ticket`]; results travel back to the main loop as
//! [`LookupOutcome`] messages through an unbounded channel.
//!
//! Only the most recently issued ticket of a session is live. An older lookup
//! that resolves late still sends its outcome, but [`FlowController::accept`]
//! rejects it, so the newer lookup always wins regardless of resolution order.
//! Nothing is cancelled at the task level.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::capabilities::{LookupError, SearchSource};
use super::session::SessionId;

/// Identity of one issued lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    /// Create a ticket with an explicit sequence number.
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Get the sequence number.
    pub fn seq(self) -> u64 {
        self.0
    }
}

/// Why a lookup was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPurpose {
    /// The field text changed.
    Search,
    /// A commit found the field stale and needs fresh results to select from.
    Commit,
}

/// Result of a lookup, sent from the background task to the main loop.
#[derive(Debug)]
pub struct LookupOutcome<T> {
    /// Session that issued the lookup.
    pub session_id: SessionId,
    /// Ticket assigned when the lookup was issued.
    pub ticket: Ticket,
    /// Query text the lookup ran for.
    pub query: String,
    /// Why the lookup was issued.
    pub purpose: LookupPurpose,
    /// Items found, or the failure.
    pub result: Result<Vec<T>, LookupError>,
}

/// Issues lookups and decides which results may still be applied.
///
/// Cloning shares the live-ticket table, so one controller can serve every
/// control in a host.
pub struct FlowController<T> {
    tx: mpsc::UnboundedSender<LookupOutcome<T>>,
    live: Rc<RefCell<HashMap<SessionId, Ticket>>>,
    next_ticket: Rc<Cell<u64>>,
}

impl<T> Clone for FlowController<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            live: Rc::clone(&self.live),
            next_ticket: Rc::clone(&self.next_ticket),
        }
    }
}

impl<T: Send + 'static> FlowController<T> {
    /// Create a controller that sends outcomes through `tx`.
    pub fn new(tx: mpsc::UnboundedSender<LookupOutcome<T>>) -> Self {
        Self {
            tx,
            live: Rc::new(RefCell::new(HashMap::new())),
            next_ticket: Rc::new(Cell::new(1)),
        }
    }

    /// Issue a lookup for `query` on behalf of `session_id`.
    ///
    /// Any earlier lookup of the same session is superseded: its task keeps
    /// running but its outcome will be rejected by [`accept`](Self::accept).
    pub fn issue(
        &self,
        session_id: &SessionId,
        query: String,
        purpose: LookupPurpose,
        source: Arc<dyn SearchSource<T>>,
    ) -> Ticket {
        let ticket = Ticket(self.next_ticket.get());
        self.next_ticket.set(ticket.0 + 1);

        if let Some(previous) = self.live.borrow_mut().insert(session_id.clone(), ticket) {
            debug!(session = %session_id, superseded = previous.0, by = ticket.0, "Superseding lookup");
        }
        debug!(session = %session_id, ticket = ticket.0, query = %query, ?purpose, "Issuing lookup");

        let tx = self.tx.clone();
        let session_id = session_id.clone();
        let lookup = source.search(query.clone());
        tokio::spawn(async move {
            let result = lookup.await;
            let _ = tx.send(LookupOutcome {
                session_id,
                ticket,
                query,
                purpose,
                result,
            });
        });

        ticket
    }

    /// Claim an outcome for application.
    ///
    /// Returns `true` exactly once for the live lookup of a session and
    /// retires its ticket. Superseded or discarded outcomes return `false`.
    pub fn accept(&self, outcome: &LookupOutcome<T>) -> bool {
        let mut live = self.live.borrow_mut();
        if live.get(&outcome.session_id) == Some(&outcome.ticket) {
            live.remove(&outcome.session_id);
            true
        } else {
            trace!(
                session = %outcome.session_id,
                ticket = outcome.ticket.0,
                "Dropping superseded lookup result"
            );
            false
        }
    }

    /// Stop applying the outstanding lookup of a session, if any.
    pub fn discard(&self, session_id: &SessionId) -> bool {
        let removed = self.live.borrow_mut().remove(session_id);
        if let Some(ticket) = removed {
            debug!(session = %session_id, ticket = ticket.0, "Discarding outstanding lookup");
        }
        removed.is_some()
    }

    /// Check whether a session has a lookup outstanding.
    pub fn is_pending(&self, session_id: &SessionId) -> bool {
        self.live.borrow().contains_key(session_id)
    }
}

/// Create a lookup channel and the controller feeding it.
///
/// The receiver should be polled in the main event loop and each outcome
/// handed to the control whose session id it carries.
pub fn create_lookup_channel<T: Send + 'static>(
) -> (mpsc::UnboundedReceiver<LookupOutcome<T>>, FlowController<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (rx, FlowController::new(tx))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    /// A source whose latency shrinks as the query grows, so shorter
    /// queries resolve later.
    fn delayed_source() -> Arc<dyn SearchSource<String>> {
        Arc::new(|query: String| async move {
            let delay = 100u64.saturating_sub(query.len() as u64 * 10);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok::<_, LookupError>(vec![format!("{}-result", query)])
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_issued_wins_regardless_of_resolution_order() {
        let (mut rx, flow) = create_lookup_channel::<String>();
        let session = SessionId::new("city");

        flow.issue(&session, "a".into(), LookupPurpose::Search, delayed_source());
        flow.issue(&session, "ab".into(), LookupPurpose::Search, delayed_source());
        let last = flow.issue(&session, "abc".into(), LookupPurpose::Search, delayed_source());

        let mut applied = Vec::new();
        for _ in 0..3 {
            let outcome = rx.recv().await.unwrap();
            if flow.accept(&outcome) {
                applied.push((outcome.ticket, outcome.query));
            }
        }

        assert_eq!(applied, vec![(last, "abc".to_string())]);
        assert!(!flow.is_pending(&session));
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_result_arriving_late_is_rejected() {
        let (mut rx, flow) = create_lookup_channel::<String>();
        let session = SessionId::new("city");

        // "s" takes 90 ms, "stockholm" 10 ms: the newer one arrives first.
        flow.issue(&session, "s".into(), LookupPurpose::Search, delayed_source());
        flow.issue(&session, "stockholm".into(), LookupPurpose::Search, delayed_source());

        let first = rx.recv().await.unwrap();
        assert_eq!(first.query, "stockholm");
        assert!(flow.accept(&first));

        let second = rx.recv().await.unwrap();
        assert_eq!(second.query, "s");
        assert!(!flow.accept(&second));
    }

    #[tokio::test]
    async fn test_sessions_do_not_supersede_each_other() {
        let (mut rx, flow) = create_lookup_channel::<String>();
        let city = SessionId::new("city");
        let country = SessionId::new("country");

        flow.issue(&city, "os".into(), LookupPurpose::Search, delayed_source());
        flow.issue(&country, "no".into(), LookupPurpose::Search, delayed_source());

        let a = rx.recv().await.unwrap();
        let b = rx.recv().await.unwrap();
        assert!(flow.accept(&a));
        assert!(flow.accept(&b));
    }

    #[tokio::test]
    async fn test_accept_is_single_use() {
        let (mut rx, flow) = create_lookup_channel::<String>();
        let session = SessionId::new("city");
        flow.issue(&session, "x".into(), LookupPurpose::Commit, delayed_source());

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.purpose, LookupPurpose::Commit);
        assert!(flow.is_pending(&session));
        assert!(flow.accept(&outcome));
        assert!(!flow.is_pending(&session));
        assert!(!flow.accept(&outcome));
    }

    #[tokio::test]
    async fn test_discard_drops_pending_result() {
        let (mut rx, flow) = create_lookup_channel::<String>();
        let session = SessionId::new("city");
        flow.issue(&session, "x".into(), LookupPurpose::Search, delayed_source());
        assert!(flow.is_pending(&session));

        assert!(flow.discard(&session));
        assert!(!flow.discard(&session));

        let outcome = rx.recv().await.unwrap();
        assert!(!flow.accept(&outcome));
    }

    #[tokio::test]
    async fn test_failed_lookup_is_delivered_as_error() {
        let (mut rx, flow) = create_lookup_channel::<String>();
        let session = SessionId::new("city");
        let failing: Arc<dyn SearchSource<String>> =
            Arc::new(|_query: String| async { Err::<Vec<String>, _>(LookupError::Unavailable) });

        let ticket = flow.issue(&session, "x".into(), LookupPurpose::Search, failing);
        assert!(flow.is_pending(&session));

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.ticket, ticket);
        assert_eq!(outcome.result, Err(LookupError::Unavailable));
        assert!(flow.accept(&outcome));
    }

    #[test]
    fn test_ticket_ordering() {
        assert!(Ticket::new(1) < Ticket::new(2));
        assert_eq!(Ticket::new(7).seq(), 7);
    }
}
