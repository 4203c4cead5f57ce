//! JS-facing surface. The page layer drives the runtimes through these
//! exports and re-reads state through the JSON getters after a change
//! callback fires.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::JsValue;

use esukepu_core::{
    BoolInput, BoundingBox, FilterPatch, ListInput, LoadPhase, NumberInput, Patch,
};

use crate::favorites_runtime;
use crate::map_runtime::{self, Viewport};
use crate::realtime_runtime;
use crate::venue_runtime;

#[derive(Default)]
struct Subscriptions {
    list: Vec<venue_runtime::CollectionHookHandle>,
    favorites: Vec<favorites_runtime::FavoritesHookHandle>,
    map: Vec<map_runtime::MapHookHandle>,
}

thread_local! {
    // page-lifetime subscriptions; handles parked here so they never drop
    static SUBSCRIPTIONS: RefCell<Subscriptions> = RefCell::new(Subscriptions::default());
}

#[wasm_bindgen(js_name = applyFilters)]
pub fn apply_filters(patch_json: &str) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(patch_json) else {
        gloo::console::warn!("ignoring malformed filter patch", patch_json.to_string());
        return;
    };
    venue_runtime::apply_filter_patch(patch_from_json(&value));
}

#[wasm_bindgen(js_name = loadMore)]
pub fn load_more() {
    venue_runtime::load_more();
}

#[wasm_bindgen(js_name = venueList)]
pub fn venue_list() -> String {
    to_json(&venue_runtime::venues())
}

#[wasm_bindgen(js_name = listPhase)]
pub fn list_phase() -> String {
    let label = match venue_runtime::phase() {
        LoadPhase::Idle => "idle",
        LoadPhase::Replacing => "replacing",
        LoadPhase::Appending => "appending",
        LoadPhase::Ready => "ready",
        LoadPhase::Exhausted => "exhausted",
    };
    label.to_string()
}

#[wasm_bindgen(js_name = setLocation)]
pub fn set_location(lat: f64, lng: f64) {
    venue_runtime::set_location(lat, lng, None);
}

#[wasm_bindgen(js_name = clearLocation)]
pub fn clear_location() {
    venue_runtime::clear_location();
}

#[wasm_bindgen(js_name = setCity)]
pub fn set_city(city: Option<String>) {
    venue_runtime::set_city(city);
}

#[wasm_bindgen(js_name = toggleFavorite)]
pub fn toggle_favorite(venue_id: u32) {
    favorites_runtime::toggle(venue_id);
}

#[wasm_bindgen(js_name = isFavorite)]
pub fn is_favorite(venue_id: u32) -> bool {
    favorites_runtime::is_favorite(venue_id)
}

#[wasm_bindgen(js_name = favoriteIds)]
pub fn favorite_ids() -> Vec<u32> {
    favorites_runtime::favorite_ids()
}

#[wasm_bindgen(js_name = favoriteCount)]
pub fn favorite_count() -> u32 {
    favorites_runtime::count() as u32
}

#[wasm_bindgen(js_name = favoriteList)]
pub fn favorite_list() -> String {
    to_json(&favorites_runtime::favorites())
}

#[wasm_bindgen(js_name = loadFavorites)]
pub fn load_favorites(lat: Option<f64>, lng: Option<f64>) {
    let coords = match (lat, lng) {
        (Some(lat), Some(lng)) => Some((lat, lng)),
        _ => None,
    };
    favorites_runtime::load_favorites(coords);
}

#[wasm_bindgen(js_name = clearFavorites)]
pub fn clear_favorites() {
    favorites_runtime::clear();
}

#[wasm_bindgen(js_name = viewportSettled)]
pub fn viewport_settled(
    west: f64,
    south: f64,
    east: f64,
    north: f64,
    center_lat: f64,
    center_lng: f64,
) {
    map_runtime::viewport_settled(Viewport {
        bounds: BoundingBox {
            west,
            south,
            east,
            north,
        },
        center: (center_lat, center_lng),
    });
}

#[wasm_bindgen(js_name = useListPins)]
pub fn use_list_pins() {
    map_runtime::use_collection_pins();
}

#[wasm_bindgen(js_name = mapPins)]
pub fn map_pins() -> String {
    to_json(&map_runtime::pins())
}

#[wasm_bindgen(js_name = mapGroupKeys)]
pub fn map_group_keys() -> Vec<String> {
    map_runtime::group_keys()
}

#[wasm_bindgen(js_name = mapGroupSize)]
pub fn map_group_size(key: &str) -> u32 {
    map_runtime::group_size(key) as u32
}

#[wasm_bindgen(js_name = mapGroupMembers)]
pub fn map_group_members(key: &str) -> String {
    to_json(&map_runtime::group_members_by_name(key))
}

#[wasm_bindgen(js_name = suspendRealtime)]
pub fn suspend_realtime() {
    realtime_runtime::disconnect();
}

#[wasm_bindgen(js_name = resumeRealtime)]
pub fn resume_realtime() {
    realtime_runtime::connect();
}

#[wasm_bindgen(js_name = onListChanged)]
pub fn on_list_changed(callback: js_sys::Function) {
    let handle = venue_runtime::register_collection_hook(Rc::new(move || {
        let _ = callback.call0(&JsValue::NULL);
    }));
    SUBSCRIPTIONS.with(|slot| slot.borrow_mut().list.push(handle));
}

#[wasm_bindgen(js_name = onFavoritesChanged)]
pub fn on_favorites_changed(callback: js_sys::Function) {
    let handle = favorites_runtime::register_favorites_hook(Rc::new(move || {
        let _ = callback.call0(&JsValue::NULL);
    }));
    SUBSCRIPTIONS.with(|slot| slot.borrow_mut().favorites.push(handle));
}

#[wasm_bindgen(js_name = onMapChanged)]
pub fn on_map_changed(callback: js_sys::Function) {
    let handle = map_runtime::register_map_hook(Rc::new(move || {
        let _ = callback.call0(&JsValue::NULL);
    }));
    SUBSCRIPTIONS.with(|slot| slot.borrow_mut().map.push(handle));
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

/// Map a JSON filter object onto per-field patches: a missing key leaves the
/// field alone, an explicit `null` clears it, and any other value goes
/// through normalization.
fn patch_from_json(root: &serde_json::Value) -> FilterPatch {
    FilterPatch {
        query: text_patch(root.get("query")),
        city: text_patch(root.get("ciudad")),
        categories: list_patch(root.get("categorias")),
        difficulty: list_patch(root.get("dificultad")),
        accessibility: list_patch(root.get("accesibilidad")),
        restrictions: list_patch(root.get("restricciones_aptas")),
        audience: list_patch(root.get("publico_objetivo")),
        venue_types: list_patch(root.get("tipo_sala")),
        language: text_patch(root.get("idioma")),
        has_actors: bool_patch(root.get("actores")),
        players: number_patch(root.get("jugadores")),
        price_max: number_patch(root.get("precio")),
        distance_km: number_patch(root.get("distancia_km")),
        coords: Patch::Keep,
        bbox: Patch::Keep,
        radius_km: number_patch(root.get("radio_km")),
    }
}

fn text_patch(value: Option<&serde_json::Value>) -> Patch<String> {
    match value {
        None => Patch::Keep,
        Some(serde_json::Value::Null) => Patch::Clear,
        Some(serde_json::Value::String(text)) => Patch::Set(text.clone()),
        Some(other) => Patch::Set(other.to_string()),
    }
}

fn list_patch(value: Option<&serde_json::Value>) -> Patch<ListInput> {
    match value {
        None => Patch::Keep,
        Some(serde_json::Value::Null) => Patch::Clear,
        Some(serde_json::Value::Array(items)) => Patch::Set(ListInput::Items(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        )),
        Some(serde_json::Value::String(text)) => Patch::Set(ListInput::Csv(text.clone())),
        Some(_) => Patch::Keep,
    }
}

fn bool_patch(value: Option<&serde_json::Value>) -> Patch<BoolInput> {
    match value {
        None => Patch::Keep,
        Some(serde_json::Value::Null) => Patch::Clear,
        Some(serde_json::Value::Bool(flag)) => Patch::Set(BoolInput::Flag(*flag)),
        Some(serde_json::Value::String(text)) => Patch::Set(BoolInput::Text(text.clone())),
        Some(_) => Patch::Keep,
    }
}

fn number_patch(value: Option<&serde_json::Value>) -> Patch<NumberInput> {
    match value {
        None => Patch::Keep,
        Some(serde_json::Value::Null) => Patch::Clear,
        Some(serde_json::Value::Number(number)) => match number.as_f64() {
            Some(number) => Patch::Set(NumberInput::Value(number)),
            None => Patch::Keep,
        },
        Some(serde_json::Value::String(text)) => Patch::Set(NumberInput::Text(text.clone())),
        Some(_) => Patch::Keep,
    }
}
