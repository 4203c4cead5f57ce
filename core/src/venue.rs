use serde::{Deserialize, Serialize};

pub type VenueId = u32;

/// Full venue record as the backend sends it on the list endpoint.
///
/// Wire names follow the backend vocabulary; everything the backend may omit
/// is optional or defaulted so a partial record still deserializes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    #[serde(rename = "id_sala")]
    pub id: VenueId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "empresa", default)]
    pub operator: String,
    #[serde(rename = "ciudad", default)]
    pub city: String,
    #[serde(rename = "dificultad", default)]
    pub difficulty: String,
    #[serde(rename = "jugadores_min", default)]
    pub players_min: Option<u32>,
    #[serde(rename = "jugadores_max", default)]
    pub players_max: Option<u32>,
    #[serde(rename = "categorias", default)]
    pub categories: Vec<String>,
    #[serde(rename = "idiomas", default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(rename = "distancia_km", default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub precio_min_pp: Option<f64>,
    #[serde(default)]
    pub precio_max_pp: Option<f64>,
    #[serde(rename = "latitud", default)]
    pub lat: Option<f64>,
    #[serde(rename = "longitud", default)]
    pub lng: Option<f64>,
}

impl Venue {
    /// Display string for the player range, when both ends are known.
    pub fn players_label(&self) -> Option<String> {
        match (self.players_min, self.players_max) {
            (Some(min), Some(max)) => Some(format!("{min} - {max}")),
            _ => None,
        }
    }

    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// Lightweight record from the map endpoint; only what a marker needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VenuePin {
    #[serde(rename = "id_sala")]
    pub id: VenueId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "latitud", default)]
    pub lat: Option<f64>,
    #[serde(rename = "longitud", default)]
    pub lng: Option<f64>,
    #[serde(rename = "ciudad", default)]
    pub city: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub precio_min_pp: Option<f64>,
    #[serde(rename = "distancia_km", default)]
    pub distance_km: Option<f64>,
}

impl From<&Venue> for VenuePin {
    fn from(venue: &Venue) -> Self {
        VenuePin {
            id: venue.id,
            name: venue.name.clone(),
            lat: venue.lat,
            lng: venue.lng,
            city: if venue.city.is_empty() {
                None
            } else {
                Some(venue.city.clone())
            },
            cover_url: venue.cover_url.clone(),
            precio_min_pp: venue.precio_min_pp,
            distance_km: venue.distance_km,
        }
    }
}

/// Seam between venue records and the coordinate grouping engine.
pub trait MapPoint {
    fn point_id(&self) -> VenueId;
    fn point_name(&self) -> &str;
    fn point_coords(&self) -> Option<(f64, f64)>;
}

impl MapPoint for Venue {
    fn point_id(&self) -> VenueId {
        self.id
    }

    fn point_name(&self) -> &str {
        &self.name
    }

    fn point_coords(&self) -> Option<(f64, f64)> {
        self.coords()
    }
}

impl MapPoint for VenuePin {
    fn point_id(&self) -> VenueId {
        self.id
    }

    fn point_name(&self) -> &str {
        &self.name
    }

    fn point_coords(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}
