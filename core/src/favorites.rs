use std::collections::HashMap;

use crate::venue::{Venue, VenueId};

/// Stamp for one in-flight toggle. Resolution only applies while this is
/// still the latest request for its venue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToggleTicket {
    venue_id: VenueId,
    request_id: u64,
}

impl ToggleTicket {
    pub fn venue_id(&self) -> VenueId {
        self.venue_id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The ticket was current; membership now follows the server's boolean.
    Reconciled,
    /// The ticket was current but the request failed; pre-toggle state is back.
    Reverted,
    /// A newer toggle for the same venue superseded this one; nothing changed.
    Discarded,
}

#[derive(Clone, Debug)]
struct PendingToggle {
    request_id: u64,
    ids_backup: Vec<VenueId>,
    details_backup: Vec<Venue>,
}

/// Favorite membership with optimistic toggles.
///
/// `ids` is the authoritative ordered set; `details` caches full records for
/// the favorites view and always stays a subset of `ids`.
#[derive(Debug, Default)]
pub struct FavoriteLedger {
    ids: Vec<VenueId>,
    details: Vec<Venue>,
    request_counter: u64,
    pending: HashMap<VenueId, PendingToggle>,
}

impl FavoriteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[VenueId] {
        &self.ids
    }

    pub fn details(&self) -> &[Venue] {
        &self.details
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_favorite(&self, venue_id: VenueId) -> bool {
        self.ids.contains(&venue_id)
    }

    /// Seed membership from the persisted record, dropping duplicates.
    pub fn restore_ids(&mut self, ids: Vec<VenueId>) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    /// Union server-known ids into the local set. Locally-added favorites the
    /// server has not seen yet survive. Returns whether anything was added.
    pub fn merge_server_ids(&mut self, server_ids: &[VenueId]) -> bool {
        let mut changed = false;
        for id in server_ids {
            if !self.ids.contains(id) {
                self.ids.push(*id);
                changed = true;
            }
        }
        changed
    }

    /// Replace the cached detail records and realign ids with them.
    pub fn set_details(&mut self, details: Vec<Venue>) {
        self.ids = details.iter().map(|venue| venue.id).collect();
        self.details = details;
    }

    /// Flip membership optimistically and stamp the request. The pre-toggle
    /// state is snapshotted for a possible revert; any older pending toggle
    /// for the same venue is superseded.
    pub fn begin_toggle(&mut self, venue_id: VenueId) -> ToggleTicket {
        let ids_backup = self.ids.clone();
        let details_backup = self.details.clone();
        self.request_counter += 1;
        let request_id = self.request_counter;

        if self.is_favorite(venue_id) {
            self.ids.retain(|id| *id != venue_id);
            self.details.retain(|venue| venue.id != venue_id);
        } else {
            self.ids.push(venue_id);
        }

        self.pending.insert(
            venue_id,
            PendingToggle {
                request_id,
                ids_backup,
                details_backup,
            },
        );
        ToggleTicket {
            venue_id,
            request_id,
        }
    }

    /// Settle a toggle. Exactly one of reconcile, revert, or discard happens
    /// per ticket; a stale ticket is always discarded, even on failure.
    pub fn resolve_toggle(
        &mut self,
        ticket: ToggleTicket,
        result: Result<bool, String>,
    ) -> ToggleOutcome {
        let current = self
            .pending
            .get(&ticket.venue_id)
            .map(|pending| pending.request_id);
        if current != Some(ticket.request_id) {
            return ToggleOutcome::Discarded;
        }
        let Some(pending) = self.pending.remove(&ticket.venue_id) else {
            return ToggleOutcome::Discarded;
        };
        match result {
            Ok(is_favorite) => {
                if is_favorite {
                    if !self.ids.contains(&ticket.venue_id) {
                        self.ids.push(ticket.venue_id);
                    }
                } else {
                    self.ids.retain(|id| *id != ticket.venue_id);
                    self.details.retain(|venue| venue.id != ticket.venue_id);
                }
                ToggleOutcome::Reconciled
            }
            Err(_) => {
                self.ids = pending.ids_backup;
                self.details = pending.details_backup;
                ToggleOutcome::Reverted
            }
        }
    }

    pub fn clear(&mut self) {
        *self = FavoriteLedger::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(id: VenueId) -> Venue {
        serde_json::from_str(&format!(r#"{{"id_sala": {id}, "nombre": "Sala {id}"}}"#)).unwrap()
    }

    /// Venue 42 starts un-favorited; two taps land within the same response
    /// window, and the first confirmation arrives after the second toggle was
    /// issued. The first resolution must be discarded and the second one must
    /// decide the final state.
    #[test]
    fn double_tap_keeps_last_toggle_effect() {
        let mut ledger = FavoriteLedger::new();
        let first = ledger.begin_toggle(42);
        assert!(ledger.is_favorite(42));
        let second = ledger.begin_toggle(42);
        assert!(!ledger.is_favorite(42));

        assert_eq!(
            ledger.resolve_toggle(first, Ok(true)),
            ToggleOutcome::Discarded
        );
        assert!(!ledger.is_favorite(42));

        assert_eq!(
            ledger.resolve_toggle(second, Ok(true)),
            ToggleOutcome::Reconciled
        );
        assert!(ledger.is_favorite(42));
    }

    #[test]
    fn reconcile_follows_the_server_boolean() {
        let mut ledger = FavoriteLedger::new();
        let ticket = ledger.begin_toggle(7);
        assert!(ledger.is_favorite(7));
        // server disagrees with the optimistic flip
        assert_eq!(
            ledger.resolve_toggle(ticket, Ok(false)),
            ToggleOutcome::Reconciled
        );
        assert!(!ledger.is_favorite(7));
    }

    #[test]
    fn failure_reverts_to_the_snapshot() {
        let mut ledger = FavoriteLedger::new();
        ledger.set_details(vec![venue(1), venue(2)]);

        let ticket = ledger.begin_toggle(2);
        assert!(!ledger.is_favorite(2));
        assert_eq!(ledger.details().len(), 1);

        assert_eq!(
            ledger.resolve_toggle(ticket, Err("offline".to_string())),
            ToggleOutcome::Reverted
        );
        assert!(ledger.is_favorite(2));
        assert_eq!(ledger.details().len(), 2);
    }

    #[test]
    fn stale_failure_is_discarded_too() {
        let mut ledger = FavoriteLedger::new();
        let first = ledger.begin_toggle(5);
        let second = ledger.begin_toggle(5);

        assert_eq!(
            ledger.resolve_toggle(first, Err("timeout".to_string())),
            ToggleOutcome::Discarded
        );
        assert!(!ledger.is_favorite(5));

        assert_eq!(
            ledger.resolve_toggle(second, Ok(false)),
            ToggleOutcome::Reconciled
        );
        assert!(!ledger.is_favorite(5));
    }

    #[test]
    fn a_ticket_resolves_at_most_once() {
        let mut ledger = FavoriteLedger::new();
        let ticket = ledger.begin_toggle(9);
        assert_eq!(
            ledger.resolve_toggle(ticket, Ok(true)),
            ToggleOutcome::Reconciled
        );
        assert_eq!(
            ledger.resolve_toggle(ticket, Ok(false)),
            ToggleOutcome::Discarded
        );
        assert!(ledger.is_favorite(9));
    }

    #[test]
    fn unfavorite_drops_the_cached_detail() {
        let mut ledger = FavoriteLedger::new();
        ledger.set_details(vec![venue(1), venue(2), venue(3)]);
        let ticket = ledger.begin_toggle(2);
        assert_eq!(
            ledger.resolve_toggle(ticket, Ok(false)),
            ToggleOutcome::Reconciled
        );
        assert_eq!(ledger.ids(), &[1, 3]);
        assert_eq!(ledger.details().len(), 2);
    }

    #[test]
    fn merge_server_ids_unions_without_dropping_local_additions() {
        let mut ledger = FavoriteLedger::new();
        ledger.restore_ids(vec![1, 2, 2, 3]);
        assert_eq!(ledger.ids(), &[1, 2, 3]);

        assert!(ledger.merge_server_ids(&[2, 4]));
        assert_eq!(ledger.ids(), &[1, 2, 3, 4]);
        assert!(!ledger.merge_server_ids(&[1, 4]));
    }

    #[test]
    fn clear_resets_everything() {
        let mut ledger = FavoriteLedger::new();
        ledger.set_details(vec![venue(1)]);
        let _ = ledger.begin_toggle(8);
        ledger.clear();
        assert_eq!(ledger.count(), 0);
        assert!(ledger.details().is_empty());
    }
}
