use std::cell::RefCell;
use std::rc::Rc;

use gloo::timers::callback::Timeout;

use esukepu_core::RealtimeEvent;

use crate::app_env;
use crate::socket::RealtimeSocketAdapter;
use crate::venue_runtime;

const RETRY_DELAYS_MS: &[u32] = &[200, 500, 1_000, 2_000, 4_000, 8_000, 15_000, 30_000];

struct RealtimeRuntimeState {
    socket: Option<RealtimeSocketAdapter>,
    retry_attempts: u32,
    retry_timer: Option<Timeout>,
    active: bool,
}

impl RealtimeRuntimeState {
    fn new() -> Self {
        Self {
            socket: None,
            retry_attempts: 0,
            retry_timer: None,
            active: false,
        }
    }
}

thread_local! {
    static STATE: RefCell<RealtimeRuntimeState> = RefCell::new(RealtimeRuntimeState::new());
}

pub(crate) fn connect() {
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.active = true;
        state.retry_attempts = 0;
        state.retry_timer.take();
        open_socket(&mut state);
    });
}

pub(crate) fn disconnect() {
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.active = false;
        state.retry_timer.take();
        if let Some(socket) = state.socket.as_mut() {
            socket.disconnect();
        }
    });
}

fn open_socket(state: &mut RealtimeRuntimeState) {
    let Some(ws_base) = app_env::ws_base() else {
        return;
    };
    let url = app_env::venue_events_url(&ws_base);
    let mut socket = state.socket.take().unwrap_or_default();
    socket.connect(
        &url,
        Rc::new(handle_event),
        Rc::new(schedule_retry),
    );
    state.socket = Some(socket);
}

/// Route one push frame. A collection-level change refetches the whole list;
/// a record-level change is applied in place only when the record still
/// matches the narrow client-side predicate.
fn handle_event(event: RealtimeEvent) {
    match event {
        RealtimeEvent::CollectionChanged => {
            venue_runtime::reload();
        }
        RealtimeEvent::RecordChanged(venue) => {
            if venue_runtime::criteria().matches_record(&venue) {
                venue_runtime::apply_update(venue);
            }
        }
    }
}

fn schedule_retry() {
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        if !state.active {
            return;
        }
        if let Some(socket) = state.socket.as_mut() {
            socket.disconnect();
        }
        let Some(delay) = RETRY_DELAYS_MS.get(state.retry_attempts as usize).copied() else {
            state.retry_attempts = 0;
            state.retry_timer.take();
            gloo::console::warn!("venue events channel unavailable, giving up for now");
            return;
        };
        state.retry_attempts = state.retry_attempts.saturating_add(1);
        let timer = Timeout::new(delay, || {
            STATE.with(|slot| {
                let mut state = slot.borrow_mut();
                if !state.active {
                    return;
                }
                open_socket(&mut state);
            });
        });
        state.retry_timer = Some(timer);
    });
}
