use crate::venue::{Venue, VenueId};

/// Page size for list fetches; a shorter page means the end of the data set.
pub const PAGE_SIZE: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    /// A reload is in flight; the current list is still the old one.
    Replacing,
    /// A next-page fetch is in flight.
    Appending,
    Ready,
    /// The backend returned a short or empty page; no more data.
    Exhausted,
}

/// Generation stamp handed out by `begin_*` and checked by `complete_*`.
/// A completion whose ticket is no longer current is discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

/// The paginated venue list. Pure state machine: fetches happen elsewhere,
/// split into begin/complete pairs so completions can be ordered.
#[derive(Debug, Default)]
pub struct VenueCollection {
    venues: Vec<Venue>,
    phase: LoadPhase,
    offset: usize,
    generation: u64,
}

impl Default for LoadPhase {
    fn default() -> Self {
        LoadPhase::Idle
    }
}

impl VenueCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoadPhase::Replacing | LoadPhase::Appending)
    }

    pub fn get(&self, id: VenueId) -> Option<&Venue> {
        self.venues.iter().find(|venue| venue.id == id)
    }

    /// Start a reload. Always allowed: a newer reload supersedes anything in
    /// flight, whose completion will then fail the ticket check.
    pub fn begin_reload(&mut self) -> FetchTicket {
        self.generation += 1;
        self.phase = LoadPhase::Replacing;
        FetchTicket {
            generation: self.generation,
        }
    }

    /// Start a next-page fetch, or `None` while loading or exhausted.
    pub fn begin_load_more(&mut self) -> Option<FetchTicket> {
        if self.is_loading() || self.phase == LoadPhase::Exhausted {
            return None;
        }
        self.generation += 1;
        self.phase = LoadPhase::Appending;
        Some(FetchTicket {
            generation: self.generation,
        })
    }

    /// Apply a reload result. Returns false when the ticket is stale, in
    /// which case nothing changes. A failed fetch keeps the old list and
    /// returns to `Ready` so the caller can retry.
    pub fn complete_reload(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Venue>, String>,
    ) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        match result {
            Ok(page) => {
                let received = page.len();
                self.venues = page;
                self.offset = received;
                self.phase = if received < PAGE_SIZE {
                    LoadPhase::Exhausted
                } else {
                    LoadPhase::Ready
                };
            }
            Err(_) => {
                self.phase = LoadPhase::Ready;
            }
        }
        true
    }

    /// Apply a next-page result under the same ticket rules. The offset
    /// advances by the count actually received, not the requested size.
    pub fn complete_load_more(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Venue>, String>,
    ) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        match result {
            Ok(page) => {
                let received = page.len();
                self.venues.extend(page);
                self.offset += received;
                self.phase = if received < PAGE_SIZE {
                    LoadPhase::Exhausted
                } else {
                    LoadPhase::Ready
                };
            }
            Err(_) => {
                self.phase = LoadPhase::Ready;
            }
        }
        true
    }

    /// Replace a record in place by id, preserving position and length.
    /// Unknown ids are a no-op; the record is not inserted.
    pub fn apply_update(&mut self, venue: Venue) -> bool {
        match self.venues.iter_mut().find(|have| have.id == venue.id) {
            Some(slot) => {
                *slot = venue;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(id: VenueId) -> Venue {
        serde_json::from_str(&format!(r#"{{"id_sala": {id}, "nombre": "Sala {id}"}}"#)).unwrap()
    }

    fn page(range: std::ops::Range<u32>) -> Vec<Venue> {
        range.map(venue).collect()
    }

    /// Walk a 45-record backend to the end: every id exactly once, in order.
    #[test]
    fn reload_then_load_more_covers_all_ids_without_duplicates() {
        const TOTAL: u32 = 45;
        let mut collection = VenueCollection::new();

        let ticket = collection.begin_reload();
        assert!(collection.complete_reload(ticket, Ok(page(0..PAGE_SIZE as u32))));
        assert_eq!(collection.phase(), LoadPhase::Ready);

        while let Some(ticket) = collection.begin_load_more() {
            let start = collection.offset() as u32;
            let end = (start + PAGE_SIZE as u32).min(TOTAL);
            assert!(collection.complete_load_more(ticket, Ok(page(start..end))));
        }

        assert_eq!(collection.phase(), LoadPhase::Exhausted);
        let ids: Vec<VenueId> = collection.venues().iter().map(|venue| venue.id).collect();
        assert_eq!(ids, (0..TOTAL).collect::<Vec<_>>());
    }

    #[test]
    fn empty_reload_is_exhausted_and_load_more_rejected() {
        let mut collection = VenueCollection::new();
        let ticket = collection.begin_reload();
        assert!(collection.complete_reload(ticket, Ok(vec![])));
        assert_eq!(collection.phase(), LoadPhase::Exhausted);
        assert!(collection.is_empty());
        assert_eq!(collection.begin_load_more(), None);
    }

    #[test]
    fn short_page_marks_exhausted() {
        let mut collection = VenueCollection::new();
        let ticket = collection.begin_reload();
        assert!(collection.complete_reload(ticket, Ok(page(0..7))));
        assert_eq!(collection.phase(), LoadPhase::Exhausted);
        assert_eq!(collection.offset(), 7);
    }

    #[test]
    fn load_more_rejected_while_loading() {
        let mut collection = VenueCollection::new();
        let _reload = collection.begin_reload();
        assert_eq!(collection.begin_load_more(), None);
    }

    #[test]
    fn apply_update_replaces_in_place() {
        let mut collection = VenueCollection::new();
        let ticket = collection.begin_reload();
        assert!(collection.complete_reload(ticket, Ok(page(0..20))));

        let mut updated = venue(7);
        updated.name = "Renamed".to_string();
        assert!(collection.apply_update(updated));

        assert_eq!(collection.len(), 20);
        assert_eq!(collection.venues()[7].name, "Renamed");
        let ids: Vec<VenueId> = collection.venues().iter().map(|venue| venue.id).collect();
        assert_eq!(ids, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn apply_update_unknown_id_is_noop() {
        let mut collection = VenueCollection::new();
        let ticket = collection.begin_reload();
        assert!(collection.complete_reload(ticket, Ok(page(0..5))));
        assert!(!collection.apply_update(venue(99)));
        assert_eq!(collection.len(), 5);
    }

    #[test]
    fn stale_reload_completion_is_discarded() {
        let mut collection = VenueCollection::new();
        let first = collection.begin_reload();
        let second = collection.begin_reload();

        // older criteria answered late: dropped entirely
        assert!(!collection.complete_reload(first, Ok(page(100..120))));
        assert!(collection.is_empty());

        assert!(collection.complete_reload(second, Ok(page(0..20))));
        assert_eq!(collection.venues()[0].id, 0);
    }

    #[test]
    fn reload_supersedes_inflight_append() {
        let mut collection = VenueCollection::new();
        let ticket = collection.begin_reload();
        assert!(collection.complete_reload(ticket, Ok(page(0..20))));

        let append = collection.begin_load_more().unwrap();
        let reload = collection.begin_reload();

        assert!(!collection.complete_load_more(append, Ok(page(20..40))));
        assert_eq!(collection.len(), 20);

        assert!(collection.complete_reload(reload, Ok(page(50..55))));
        assert_eq!(collection.venues()[0].id, 50);
        assert_eq!(collection.offset(), 5);
    }

    #[test]
    fn failed_fetch_keeps_the_list_and_returns_ready() {
        let mut collection = VenueCollection::new();
        let ticket = collection.begin_reload();
        assert!(collection.complete_reload(ticket, Ok(page(0..20))));

        let append = collection.begin_load_more().unwrap();
        assert!(collection.complete_load_more(append, Err("offline".to_string())));
        assert_eq!(collection.phase(), LoadPhase::Ready);
        assert_eq!(collection.len(), 20);

        // retry is possible afterwards
        assert!(collection.begin_load_more().is_some());
    }
}
