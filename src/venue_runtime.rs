use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;

use esukepu_core::{FilterCriteria, FilterPatch, LoadPhase, Venue, VenueCollection, PAGE_SIZE};

use crate::api;

/// Single owner of the venue list and the active filter criteria. Fetch
/// completions go through the collection's ticket check, so a stale response
/// can never clobber a newer one.
struct VenueRuntimeState {
    collection: VenueCollection,
    criteria: FilterCriteria,
    hooks: Vec<(u64, Rc<dyn Fn()>)>,
    next_hook_id: u64,
}

impl VenueRuntimeState {
    fn new() -> Self {
        Self {
            collection: VenueCollection::new(),
            criteria: FilterCriteria::default(),
            hooks: Vec::new(),
            next_hook_id: 0,
        }
    }
}

thread_local! {
    static STATE: RefCell<VenueRuntimeState> = RefCell::new(VenueRuntimeState::new());
}

pub(crate) struct CollectionHookHandle {
    id: u64,
}

impl Drop for CollectionHookHandle {
    fn drop(&mut self) {
        STATE.with(|slot| {
            slot.borrow_mut().hooks.retain(|(id, _)| *id != self.id);
        });
    }
}

pub(crate) fn register_collection_hook(hook: Rc<dyn Fn()>) -> CollectionHookHandle {
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        let id = state.next_hook_id;
        state.next_hook_id = id.wrapping_add(1);
        state.hooks.push((id, hook));
        CollectionHookHandle { id }
    })
}

fn notify_changed() {
    let hooks = STATE.with(|slot| {
        slot.borrow()
            .hooks
            .iter()
            .map(|(_, hook)| hook.clone())
            .collect::<Vec<_>>()
    });
    for hook in hooks {
        hook();
    }
}

pub(crate) fn criteria() -> FilterCriteria {
    STATE.with(|slot| slot.borrow().criteria.clone())
}

pub(crate) fn venues() -> Vec<Venue> {
    STATE.with(|slot| slot.borrow().collection.venues().to_vec())
}

pub(crate) fn phase() -> LoadPhase {
    STATE.with(|slot| slot.borrow().collection.phase())
}

/// Fold a filter patch into the criteria and refetch from the start.
pub(crate) fn apply_filter_patch(patch: FilterPatch) {
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.criteria = state.criteria.apply(patch);
    });
    reload();
}

pub(crate) fn set_location(lat: f64, lng: f64, distance_km: Option<f64>) {
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.criteria = state.criteria.with_location(lat, lng, distance_km);
    });
    reload();
}

pub(crate) fn clear_location() {
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.criteria = state.criteria.without_location();
    });
    reload();
}

pub(crate) fn set_city(city: Option<String>) {
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.criteria = state.criteria.with_city(city);
    });
    reload();
}

/// Refetch page zero under the current criteria. A reload always supersedes
/// whatever is in flight.
pub(crate) fn reload() {
    let (ticket, criteria) = STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        let ticket = state.collection.begin_reload();
        (ticket, state.criteria.clone())
    });
    notify_changed();
    spawn_local(async move {
        let result = api::fetch_venue_page(&criteria, 0, PAGE_SIZE).await;
        if let Err(message) = result.as_ref() {
            gloo::console::warn!("venue reload failed", message.clone());
        }
        let accepted = STATE.with(|slot| slot.borrow_mut().collection.complete_reload(ticket, result));
        if accepted {
            notify_changed();
        }
    });
}

/// Fetch the next page, if the collection will take one.
pub(crate) fn load_more() {
    let begun = STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        let offset = state.collection.offset();
        state
            .collection
            .begin_load_more()
            .map(|ticket| (ticket, state.criteria.clone(), offset))
    });
    let Some((ticket, criteria, offset)) = begun else {
        return;
    };
    notify_changed();
    spawn_local(async move {
        let result = api::fetch_venue_page(&criteria, offset, PAGE_SIZE).await;
        if let Err(message) = result.as_ref() {
            gloo::console::warn!("venue page load failed", message.clone());
        }
        let accepted =
            STATE.with(|slot| slot.borrow_mut().collection.complete_load_more(ticket, result));
        if accepted {
            notify_changed();
        }
    });
}

/// In-place record update from the push channel.
pub(crate) fn apply_update(venue: Venue) {
    let changed = STATE.with(|slot| slot.borrow_mut().collection.apply_update(venue));
    if changed {
        notify_changed();
    }
}
