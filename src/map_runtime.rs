use std::cell::RefCell;
use std::rc::Rc;

use gloo::timers::callback::Timeout;
use wasm_bindgen_futures::spawn_local;

use esukepu_core::{BoundingBox, CoordinateGroups, FilterCriteria, VenuePin};

use crate::api;
use crate::venue_runtime;

pub(crate) const VIEWPORT_DEBOUNCE_MS: u32 = 400;

/// Soft radius used on the very first coordinate-filtered map fetch when
/// neither a distance nor a bbox narrows the region.
const VIEWPORT_RADIUS_FALLBACK_KM: f64 = 7.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) bounds: BoundingBox,
    pub(crate) center: (f64, f64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PinSource {
    /// Markers mirror the venue list; regrouped whenever the list changes.
    Collection,
    /// Markers came from an explicit region fetch (viewport, city, or
    /// coordinate filter).
    Region,
}

struct MapRuntimeState {
    groups: CoordinateGroups<VenuePin>,
    pins: Vec<VenuePin>,
    source: PinSource,
    pending_viewport: Option<Viewport>,
    debounce_timer: Option<Timeout>,
    fetch_generation: u64,
    collection_hook: Option<venue_runtime::CollectionHookHandle>,
    hooks: Vec<(u64, Rc<dyn Fn()>)>,
    next_hook_id: u64,
}

impl MapRuntimeState {
    fn new() -> Self {
        Self {
            groups: CoordinateGroups::new(),
            pins: Vec::new(),
            source: PinSource::Collection,
            pending_viewport: None,
            debounce_timer: None,
            fetch_generation: 0,
            collection_hook: None,
            hooks: Vec::new(),
            next_hook_id: 0,
        }
    }
}

thread_local! {
    static STATE: RefCell<MapRuntimeState> = RefCell::new(MapRuntimeState::new());
}

pub(crate) struct MapHookHandle {
    id: u64,
}

impl Drop for MapHookHandle {
    fn drop(&mut self) {
        STATE.with(|slot| {
            slot.borrow_mut().hooks.retain(|(id, _)| *id != self.id);
        });
    }
}

pub(crate) fn register_map_hook(hook: Rc<dyn Fn()>) -> MapHookHandle {
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        let id = state.next_hook_id;
        state.next_hook_id = id.wrapping_add(1);
        state.hooks.push((id, hook));
        MapHookHandle { id }
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

pub(crate) fn init() {
    let handle = venue_runtime::register_collection_hook(Rc::new(|| {
        regroup_from_collection();
    }));
    STATE.with(|slot| slot.borrow_mut().collection_hook = Some(handle));
    initial_fetch();
}

/// First map load. An active city or coordinate filter drives an explicit
/// region fetch; with no location filter the map waits for the first
/// viewport settle instead.
pub(crate) fn initial_fetch() {
    let criteria = venue_runtime::criteria();
    if criteria.city.is_some() {
        fetch_pins(criteria);
        return;
    }
    if criteria.coords.is_some() {
        let mut criteria = criteria;
        if criteria.distance_km.is_none() && criteria.bbox.is_none() && criteria.radius_km.is_none()
        {
            criteria.radius_km = Some(VIEWPORT_RADIUS_FALLBACK_KM);
        }
        fetch_pins(criteria);
    }
}

/// The map stopped moving. Debounced: only the final viewport within the
/// window triggers a fetch, and exactly one fetch fires per settle burst.
pub(crate) fn viewport_settled(viewport: Viewport) {
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.pending_viewport = Some(viewport);
        // replacing the timer drops (and cancels) the previous one
        state.debounce_timer = Some(Timeout::new(VIEWPORT_DEBOUNCE_MS, fire_viewport_fetch));
    });
}

/// Switch the markers back to mirroring the venue list.
pub(crate) fn use_collection_pins() {
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.source = PinSource::Collection;
        state.pending_viewport = None;
        state.debounce_timer.take();
        // invalidate any region fetch still in flight
        state.fetch_generation += 1;
    });
    regroup_from_collection();
}

pub(crate) fn pins() -> Vec<VenuePin> {
    STATE.with(|slot| slot.borrow().pins.clone())
}

pub(crate) fn group_keys() -> Vec<String> {
    STATE.with(|slot| slot.borrow().groups.keys().map(str::to_string).collect())
}

pub(crate) fn group_size(key: &str) -> usize {
    STATE.with(|slot| slot.borrow().groups.size_of(key))
}

/// Marker pick list, sorted by name.
pub(crate) fn group_members_by_name(key: &str) -> Vec<VenuePin> {
    STATE.with(|slot| {
        slot.borrow()
            .groups
            .members_by_name(key)
            .into_iter()
            .cloned()
            .collect()
    })
}

fn regroup_from_collection() {
    let mirroring = STATE.with(|slot| slot.borrow().source == PinSource::Collection);
    if !mirroring {
        return;
    }
    let pins: Vec<VenuePin> = venue_runtime::venues().iter().map(VenuePin::from).collect();
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.pins = pins.clone();
        state.groups.rebuild(pins);
    });
    notify_changed();
}

fn fire_viewport_fetch() {
    let viewport = STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.debounce_timer = None;
        state.pending_viewport.take()
    });
    let Some(viewport) = viewport else {
        return;
    };
    let mut criteria = venue_runtime::criteria();
    // an explicit city or coordinate filter owns the map region
    if criteria.has_location() {
        return;
    }
    criteria.bbox = Some(viewport.bounds);
    criteria.radius_km = None;
    criteria.coords = Some(viewport.center);
    fetch_pins(criteria);
}

fn fetch_pins(criteria: FilterCriteria) {
    let generation = STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.fetch_generation += 1;
        state.fetch_generation
    });
    spawn_local(async move {
        match api::fetch_venue_pins(&criteria).await {
            Ok(pins) => {
                let accepted = STATE.with(|slot| {
                    let mut state = slot.borrow_mut();
                    if state.fetch_generation != generation {
                        return false;
                    }
                    state.source = PinSource::Region;
                    state.pins = pins.clone();
                    state.groups.rebuild(pins);
                    true
                });
                if accepted {
                    notify_changed();
                }
            }
            Err(message) => {
                gloo::console::warn!("map pin fetch failed", message);
            }
        }
    });
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use gloo::timers::future::TimeoutFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn viewport(west: f64) -> Viewport {
        Viewport {
            bounds: BoundingBox {
                west,
                south: 40.3,
                east: west + 0.2,
                north: 40.5,
            },
            center: (40.4, west + 0.1),
        }
    }

    #[wasm_bindgen_test]
    async fn rapid_settles_keep_only_the_final_viewport() {
        let first = viewport(-3.8);
        let second = viewport(-3.9);
        viewport_settled(first);
        viewport_settled(second);

        let pending = STATE.with(|slot| slot.borrow().pending_viewport);
        assert_eq!(pending, Some(second));

        TimeoutFuture::new(VIEWPORT_DEBOUNCE_MS + 100).await;
        // the single debounced fetch consumed the pending viewport
        let pending = STATE.with(|slot| slot.borrow().pending_viewport);
        assert_eq!(pending, None);
    }

    #[wasm_bindgen_test]
    async fn settle_within_the_window_restarts_the_debounce() {
        viewport_settled(viewport(-3.8));
        TimeoutFuture::new(VIEWPORT_DEBOUNCE_MS / 2).await;
        viewport_settled(viewport(-3.7));

        // the first timer was cancelled, so the pending viewport survives
        // past the first deadline
        TimeoutFuture::new(VIEWPORT_DEBOUNCE_MS / 2 + 50).await;
        let pending = STATE.with(|slot| slot.borrow().pending_viewport);
        assert_eq!(pending, Some(viewport(-3.7)));
    }
}
