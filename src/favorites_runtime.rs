use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;

use esukepu_core::{FavoriteLedger, ToggleOutcome, Venue, VenueId};

use crate::api;
use crate::persisted_store;

struct FavoritesRuntimeState {
    ledger: FavoriteLedger,
    hooks: Vec<(u64, Rc<dyn Fn()>)>,
    next_hook_id: u64,
    loading: bool,
}

impl FavoritesRuntimeState {
    fn new() -> Self {
        Self {
            ledger: FavoriteLedger::new(),
            hooks: Vec::new(),
            next_hook_id: 0,
            loading: false,
        }
    }
}

thread_local! {
    static STATE: RefCell<FavoritesRuntimeState> = RefCell::new(FavoritesRuntimeState::new());
}

pub(crate) struct FavoritesHookHandle {
    id: u64,
}

impl Drop for FavoritesHookHandle {
    fn drop(&mut self) {
        STATE.with(|slot| {
            slot.borrow_mut().hooks.retain(|(id, _)| *id != self.id);
        });
    }
}

pub(crate) fn register_favorites_hook(hook: Rc<dyn Fn()>) -> FavoritesHookHandle {
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        let id = state.next_hook_id;
        state.next_hook_id = id.wrapping_add(1);
        state.hooks.push((id, hook));
        FavoritesHookHandle { id }
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

fn persist_ids() {
    let ids = STATE.with(|slot| slot.borrow().ledger.ids().to_vec());
    persisted_store::set_favorite_ids(ids);
}

pub(crate) fn is_favorite(venue_id: VenueId) -> bool {
    STATE.with(|slot| slot.borrow().ledger.is_favorite(venue_id))
}

pub(crate) fn favorite_ids() -> Vec<VenueId> {
    STATE.with(|slot| slot.borrow().ledger.ids().to_vec())
}

pub(crate) fn favorites() -> Vec<Venue> {
    STATE.with(|slot| slot.borrow().ledger.details().to_vec())
}

pub(crate) fn count() -> usize {
    STATE.with(|slot| slot.borrow().ledger.count())
}

/// Seed membership from the persisted record; runs once at boot, before any
/// server answer.
pub(crate) fn restore_from_persisted() {
    let ids = persisted_store::favorite_ids();
    STATE.with(|slot| slot.borrow_mut().ledger.restore_ids(ids));
    notify_changed();
}

/// Optimistic toggle. Membership flips immediately; the server response
/// reconciles or reverts it later, and a superseded response is dropped by
/// the ledger's request-id check.
pub(crate) fn toggle(venue_id: VenueId) {
    let ticket = STATE.with(|slot| slot.borrow_mut().ledger.begin_toggle(venue_id));
    persist_ids();
    notify_changed();
    spawn_local(async move {
        let result = match api::toggle_favorite(venue_id).await {
            Ok(response) => Ok(response.is_favorite),
            Err(message) => {
                gloo::console::warn!("favorite toggle failed", message.clone());
                Err(message)
            }
        };
        let outcome = STATE.with(|slot| slot.borrow_mut().ledger.resolve_toggle(ticket, result));
        if outcome != ToggleOutcome::Discarded {
            persist_ids();
            notify_changed();
        }
    });
}

/// Union the server's id set into the ledger. Local additions the server has
/// not confirmed yet survive.
pub(crate) fn refresh_ids() {
    let already_loading = STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        if state.loading {
            return true;
        }
        state.loading = true;
        false
    });
    if already_loading {
        return;
    }
    spawn_local(async move {
        match api::fetch_favorite_ids().await {
            Ok(response) => {
                let changed = STATE.with(|slot| {
                    let mut state = slot.borrow_mut();
                    state.loading = false;
                    state.ledger.merge_server_ids(&response.ids)
                });
                if changed {
                    persist_ids();
                    notify_changed();
                }
            }
            Err(message) => {
                gloo::console::warn!("favorite ids load failed", message);
                STATE.with(|slot| slot.borrow_mut().loading = false);
            }
        }
    });
}

/// Load the full favorite records for the favorites view.
pub(crate) fn load_favorites(coords: Option<(f64, f64)>) {
    let already_loading = STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        if state.loading {
            return true;
        }
        state.loading = true;
        false
    });
    if already_loading {
        return;
    }
    spawn_local(async move {
        match api::fetch_favorites(coords).await {
            Ok(response) => {
                STATE.with(|slot| {
                    let mut state = slot.borrow_mut();
                    state.loading = false;
                    state.ledger.set_details(response.favoritos);
                });
                persist_ids();
                notify_changed();
            }
            Err(message) => {
                gloo::console::warn!("favorites load failed", message);
                STATE.with(|slot| slot.borrow_mut().loading = false);
            }
        }
    });
}

pub(crate) fn clear() {
    STATE.with(|slot| slot.borrow_mut().ledger.clear());
    persist_ids();
    notify_changed();
}
