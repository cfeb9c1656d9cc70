//! Finalization: reconcile Tab/Enter with the lookup state.
//!
//! A commit produces exactly one outcome per keypress: a selected item, a
//! cleared value, or nothing. When the field text has moved past the last
//! delivered lookup, the commit is deferred to one more lookup and completed
//! in [`Typeahead::deliver_commit`].

use tracing::debug;

use super::flow::{LookupOutcome, LookupPurpose};
use super::session::FocusTarget;
use super::Typeahead;

impl<T: Clone + Send + 'static> Typeahead<T> {
    /// Commit with Tab or Enter.
    ///
    /// Returns `true` if the key was consumed. A focus-based commit leaves
    /// the key unconsumed so host handlers can still move focus.
    pub fn commit(&mut self) -> bool {
        if !self.session.visible {
            return false;
        }

        if self.session.is_stale() {
            let text = self.session.query_text.clone();
            if text.is_empty() && self.caps.allow_clear {
                debug!(session = %self.session.id(), "Stale empty commit clears value");
                self.close();
                self.session.saved_query_text = None;
                self.caps.select(None);
            } else {
                debug!(session = %self.session.id(), query = %text, "Stale commit, searching again");
                self.issue(text, LookupPurpose::Commit);
            }
            return true;
        }

        let chosen = match self.session.focus {
            FocusTarget::Row(index) => self.session.candidates.get(index).cloned().map(Some),
            FocusTarget::Field if self.session.query_text.is_empty() && self.caps.allow_clear => {
                Some(None)
            }
            FocusTarget::Field => self.session.candidates.first().cloned().map(Some),
        };

        self.close();
        self.session.saved_query_text = None;
        match chosen {
            Some(item) => {
                debug!(session = %self.session.id(), cleared = item.is_none(), "Committed");
                self.caps.select(item);
            }
            None => debug!(session = %self.session.id(), "Nothing to commit"),
        }
        false
    }

    /// Complete a commit deferred by a stale field.
    ///
    /// A dropdown closed in the meantime cancels the commit; the results are
    /// kept for the next time the field regains focus.
    pub(super) fn deliver_commit(&mut self, outcome: LookupOutcome<T>) {
        if !self.session.visible {
            if let Ok(items) = outcome.result {
                debug!(session = %self.session.id(), query = %outcome.query, "Commit cancelled, keeping results");
                self.session.set_candidates(outcome.ticket, outcome.query, items);
            }
            return;
        }

        match outcome.result {
            Ok(items) if items.is_empty() => {
                debug!(session = %self.session.id(), query = %outcome.query, "Commit lookup found nothing");
                self.session.set_candidates(outcome.ticket, outcome.query, items);
            }
            Ok(items) => {
                let first = items[0].clone();
                self.session.set_candidates(outcome.ticket, outcome.query, items);
                self.close();
                self.session.saved_query_text = None;
                self.caps.select(Some(first));
                self.caps.advance_focus();
            }
            Err(e) => self.lookup_failed(&outcome.query, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::*;

    #[tokio::test]
    async fn test_commit_is_noop_while_hidden() {
        let mut h = harness(Options::default());
        assert!(!h.typeahead.commit());
        assert!(h.selections().is_empty());
        assert!(h.source.issued().is_empty());
    }

    #[tokio::test]
    async fn test_stale_commit_searches_before_selecting() {
        let mut h = harness(Options::default());
        h.type_and_resolve("a", &["Aalborg"]).await;
        h.typeahead.sync_text("ab");

        assert!(h.typeahead.commit());
        assert_eq!(h.source.issued(), vec!["a".to_string(), "ab".to_string()]);
        assert!(h.selections().is_empty());
        assert!(h.typeahead.is_visible());

        assert!(h.resolve("ab", &["Item1", "Item2"]).await);

        assert_eq!(h.selections(), vec![Some("Item1".to_string())]);
        assert!(!h.typeahead.is_visible());
        assert_eq!(*h.advances.borrow(), 1);
        assert_eq!(h.typeahead.session().last_issued_query(), Some("ab"));
    }

    #[tokio::test]
    async fn test_stale_commit_with_no_results_stays_open() {
        let mut h = harness(Options::default());
        h.type_and_resolve("a", &["Aalborg"]).await;
        h.typeahead.sync_text("ax");

        h.typeahead.commit();
        assert!(h.resolve("ax", &[]).await);

        assert!(h.selections().is_empty());
        assert!(h.typeahead.is_visible());
        assert!(h.typeahead.candidates().is_empty());
        assert_eq!(*h.advances.borrow(), 0);
    }

    #[tokio::test]
    async fn test_stale_commit_failure_selects_nothing() {
        let mut h = harness(Options::default());
        h.type_and_resolve("a", &["Aalborg"]).await;
        h.typeahead.sync_text("ab");

        h.typeahead.commit();
        h.source.answer("ab", Err(LookupError::Unavailable));
        let outcome = h.rx.recv().await.unwrap();
        assert!(h.typeahead.apply_outcome(outcome));

        assert!(h.selections().is_empty());
        assert!(h.typeahead.is_visible());
        assert_eq!(h.typeahead.candidates(), ["Aalborg"]);
    }

    #[tokio::test]
    async fn test_commit_while_search_in_flight_supersedes_it() {
        let mut h = harness(Options::default());
        h.type_and_resolve("a", &["Aalborg"]).await;
        h.typeahead.edit("ab");

        h.typeahead.commit();
        assert_eq!(h.source.issued(), vec!["a", "ab", "ab"]);

        // The edit's own lookup was superseded by the commit's
        assert!(!h.resolve("ab", &["Abu Dhabi"]).await);
        assert!(h.selections().is_empty());
        assert!(h.resolve("ab", &["Abuja"]).await);
        assert_eq!(h.selections(), vec![Some("Abuja".to_string())]);
    }

    #[tokio::test]
    async fn test_double_enter_selects_once() {
        let mut h = harness(Options::default());
        h.type_and_resolve("a", &["Aalborg"]).await;
        h.typeahead.sync_text("ab");

        assert!(h.typeahead.commit());
        assert!(h.typeahead.commit());

        assert!(!h.resolve("ab", &["Item1"]).await);
        assert!(h.resolve("ab", &["Item1"]).await);
        assert_eq!(h.selections(), vec![Some("Item1".to_string())]);

        // Closed now, so a third Enter does nothing
        assert!(!h.typeahead.commit());
        assert_eq!(h.selections().len(), 1);
    }

    #[tokio::test]
    async fn test_escape_before_commit_result_selects_nothing() {
        let mut h = harness(Options::default());
        h.type_and_resolve("a", &["Aalborg"]).await;
        h.typeahead.sync_text("ab");
        h.typeahead.commit();
        h.typeahead.escape();

        assert!(h.resolve("ab", &["Item1"]).await);
        assert!(h.selections().is_empty());
        assert!(!h.typeahead.is_visible());
        assert_eq!(*h.advances.borrow(), 0);
        assert_eq!(h.typeahead.candidates(), ["Item1"]);
    }

    #[tokio::test]
    async fn test_stale_empty_commit_clears() {
        let mut h = harness(Options::default());
        h.type_and_resolve("a", &["Aalborg"]).await;
        h.typeahead.sync_text("");

        assert!(h.typeahead.commit());
        assert_eq!(h.selections(), vec![None]);
        assert!(!h.typeahead.is_visible());
        assert_eq!(h.source.issued(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_stale_empty_commit_without_clear_searches() {
        let mut h = harness(Options {
            allow_clear: false,
            ..Options::default()
        });
        h.type_and_resolve("a", &["Aalborg"]).await;
        h.typeahead.sync_text("");

        assert!(h.typeahead.commit());
        assert!(h.selections().is_empty());
        assert_eq!(h.source.issued(), vec!["a".to_string(), String::new()]);
    }

    #[tokio::test]
    async fn test_empty_commit_with_clear_allowed() {
        let mut h = harness(Options::default());
        h.type_and_resolve("", &["Aalborg"]).await;

        assert!(!h.typeahead.commit());
        assert_eq!(h.selections(), vec![None]);
        assert!(!h.typeahead.is_visible());
    }

    #[tokio::test]
    async fn test_empty_commit_without_clear_takes_first() {
        let mut h = harness(Options {
            allow_clear: false,
            ..Options::default()
        });
        h.type_and_resolve("", &["Aalborg", "Bergen"]).await;

        h.typeahead.commit();
        assert_eq!(h.selections(), vec![Some("Aalborg".to_string())]);
    }

    #[tokio::test]
    async fn test_blind_commit_defaults_to_first() {
        let mut h = harness(Options::default());
        h.type_and_resolve("x", &["X", "Y"]).await;

        assert!(!h.typeahead.commit());
        assert_eq!(h.selections(), vec![Some("X".to_string())]);
        assert!(!h.typeahead.is_visible());
        assert_eq!(*h.advances.borrow(), 0);
    }

    #[tokio::test]
    async fn test_commit_selects_focused_row() {
        let mut h = harness(Options::default());
        h.type_and_resolve("o", &["Oslo", "Osaka", "Oman"]).await;
        h.typeahead.move_down();
        h.typeahead.move_down();

        h.typeahead.commit();
        assert_eq!(h.selections(), vec![Some("Osaka".to_string())]);
        assert_eq!(h.typeahead.focused_index(), None);
    }

    #[tokio::test]
    async fn test_commit_while_previewing_searches_previewed_text() {
        let mut h = harness(Options {
            preview: true,
            ..Options::default()
        });
        h.type_and_resolve("abc", &["xyz", "other"]).await;
        h.typeahead.move_down();
        assert_eq!(h.typeahead.query_text(), "XYZ");

        assert!(h.typeahead.commit());
        assert_eq!(h.source.issued(), vec!["abc".to_string(), "XYZ".to_string()]);
        assert!(h.selections().is_empty());

        assert!(h.resolve("XYZ", &["xyz"]).await);

        assert_eq!(h.selections(), vec![Some("xyz".to_string())]);
        assert_eq!(*h.advances.borrow(), 1);
        assert!(!h.typeahead.is_visible());
        assert!(h.typeahead.session().saved_query_text().is_none());
    }

    #[tokio::test]
    async fn test_commit_with_no_candidates_selects_nothing() {
        let mut h = harness(Options::default());
        h.type_and_resolve("zz", &[]).await;

        assert!(!h.typeahead.commit());
        assert!(h.selections().is_empty());
        assert!(!h.typeahead.is_visible());
    }

    #[tokio::test]
    async fn test_commit_routes_through_shortcuts() {
        let mut h = harness(Options::default());
        h.type_and_resolve("x", &["X"]).await;
        assert!(!h.typeahead.handle_shortcut(Shortcut::Tab));
        assert_eq!(h.selections(), vec![Some("X".to_string())]);
        assert_eq!(h.ignored.borrow().last(), Some(&Vec::new()));
    }
}
