use wasm_bindgen_futures::spawn_local;

use crate::favorites_runtime;
use crate::map_runtime;
use crate::persisted_store;
use crate::realtime_runtime;
use crate::venue_runtime;

/// Startup sequencing: persisted state first so favorites render instantly,
/// then the server-backed loads and the push channel.
pub(crate) fn start() {
    spawn_local(async {
        if let Err(message) = persisted_store::bootstrap().await {
            gloo::console::warn!("persisted store unavailable", message);
        }
        favorites_runtime::restore_from_persisted();
        favorites_runtime::refresh_ids();
        realtime_runtime::connect();
        map_runtime::init();
        venue_runtime::reload();
    });
}
