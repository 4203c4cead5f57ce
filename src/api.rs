use gloo::net::http::Request;

use esukepu_core::{
    FavoriteIdsResponse, FavoritesResponse, FilterCriteria, ToggleResponse, Venue, VenueId,
    VenuePin,
};

use crate::app_env;

/// One page of the venue list under the given criteria.
pub(crate) async fn fetch_venue_page(
    criteria: &FilterCriteria,
    offset: usize,
    limit: usize,
) -> Result<Vec<Venue>, String> {
    let mut pairs = criteria.to_query_pairs();
    pairs.push(("offset".to_string(), offset.to_string()));
    pairs.push(("limit".to_string(), limit.to_string()));
    let url = format!("{}/salas", app_env::api_base());
    get_json(&url, &pairs).await
}

/// Marker records for a map region (bbox, or center plus radius).
pub(crate) async fn fetch_venue_pins(criteria: &FilterCriteria) -> Result<Vec<VenuePin>, String> {
    let url = format!("{}/salas-map", app_env::api_base());
    get_json(&url, &criteria.to_query_pairs()).await
}

pub(crate) async fn toggle_favorite(venue_id: VenueId) -> Result<ToggleResponse, String> {
    let url = format!("{}/favoritos/{venue_id}/toggle", app_env::api_base());
    let response = Request::post(&url)
        .send()
        .await
        .map_err(|error| error.to_string())?;
    if !response.ok() {
        return Err(format!("toggle failed with status {}", response.status()));
    }
    response
        .json::<ToggleResponse>()
        .await
        .map_err(|error| error.to_string())
}

pub(crate) async fn fetch_favorite_ids() -> Result<FavoriteIdsResponse, String> {
    let url = format!("{}/favoritos/ids", app_env::api_base());
    let pairs: Vec<(String, String)> = Vec::new();
    get_json(&url, &pairs).await
}

/// Full favorite records; coordinates make distances come back populated.
pub(crate) async fn fetch_favorites(
    coords: Option<(f64, f64)>,
) -> Result<FavoritesResponse, String> {
    let url = format!("{}/favoritos", app_env::api_base());
    let mut pairs = Vec::new();
    if let Some((lat, lng)) = coords {
        pairs.push(("lat".to_string(), format!("{lat:.6}")));
        pairs.push(("lng".to_string(), format!("{lng:.6}")));
    }
    get_json(&url, &pairs).await
}

async fn get_json<T>(url: &str, pairs: &[(String, String)]) -> Result<T, String>
where
    T: serde::de::DeserializeOwned,
{
    let request = Request::get(url).query(
        pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    );
    let response = request.send().await.map_err(|error| error.to_string())?;
    if !response.ok() {
        return Err(format!(
            "request to {url} failed with status {}",
            response.status()
        ));
    }
    response.json::<T>().await.map_err(|error| error.to_string())
}
