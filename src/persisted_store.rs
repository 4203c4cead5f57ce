use std::cell::RefCell;

use wasm_bindgen_futures::spawn_local;

use esukepu_core::{FavoritesRecord, VenueId};

use crate::idb;

const FAVORITES_KEY: &str = "favoritos_ids";

thread_local! {
    static FAVORITES_CACHE: RefCell<Option<FavoritesRecord>> = RefCell::new(None);
}

/// Read the persisted favorites record into the thread-local cache. Called
/// once at boot; all later reads are synchronous against the cache.
pub(crate) async fn bootstrap() -> Result<(), String> {
    let db = idb::open_db().await.map_err(idb::js_err)?;
    let record = load_favorites_record(&db)
        .await
        .unwrap_or_else(|| FavoritesRecord::new(Vec::new()));
    FAVORITES_CACHE.with(|slot| {
        *slot.borrow_mut() = Some(record);
    });
    Ok(())
}

pub(crate) fn favorite_ids() -> Vec<VenueId> {
    FAVORITES_CACHE.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|record| record.ids.clone())
            .unwrap_or_default()
    })
}

/// Update the cache and write through in the background. Persistence is best
/// effort; a failed write only costs the next session its seed.
pub(crate) fn set_favorite_ids(ids: Vec<VenueId>) {
    let record = FavoritesRecord::new(ids);
    FAVORITES_CACHE.with(|slot| {
        *slot.borrow_mut() = Some(record.clone());
    });
    spawn_local(async move {
        if let Err(message) = save_favorites_record(record).await {
            gloo::console::warn!("favorites save failed", message);
        }
    });
}

async fn load_favorites_record(db: &web_sys::IdbDatabase) -> Option<FavoritesRecord> {
    let bytes = idb::idb_get_bytes(db, idb::IDB_STORE_FAVORITES, FAVORITES_KEY)
        .await
        .ok()
        .flatten()?;
    FavoritesRecord::decode(&bytes)
}

async fn save_favorites_record(record: FavoritesRecord) -> Result<(), String> {
    let Some(bytes) = record.encode() else {
        return Ok(());
    };
    let db = idb::open_db().await.map_err(idb::js_err)?;
    idb::idb_put_bytes(&db, idb::IDB_STORE_FAVORITES, FAVORITES_KEY, &bytes)
        .await
        .map_err(idb::js_err)?;
    Ok(())
}
