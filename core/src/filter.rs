use crate::venue::Venue;

/// Default search radius applied when a location is set without an explicit
/// distance.
pub const DEFAULT_LOCATION_DISTANCE_KM: f64 = 10.0;

/// Rectangular map region, in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// `"west,south,east,north"` at 6 decimals, the backend's bbox format.
    pub fn query_value(&self) -> String {
        format!(
            "{:.6},{:.6},{:.6},{:.6}",
            self.west, self.south, self.east, self.north
        )
    }
}

/// The active filter set. Immutable: every mutation builds a new value via
/// [`FilterCriteria::apply`] or one of the location helpers.
///
/// Absent (`None`) fields are never sent to the backend. A field is either
/// absent or holds a normalized value; `Some(vec![])` never occurs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterCriteria {
    pub query: Option<String>,
    pub city: Option<String>,
    pub categories: Option<Vec<String>>,
    pub difficulty: Option<Vec<String>>,
    pub accessibility: Option<Vec<String>>,
    pub restrictions: Option<Vec<String>>,
    pub audience: Option<Vec<String>>,
    pub venue_types: Option<Vec<String>>,
    pub language: Option<String>,
    pub has_actors: Option<bool>,
    pub players: Option<u32>,
    pub price_max: Option<f64>,
    pub distance_km: Option<f64>,
    pub coords: Option<(f64, f64)>,
    pub bbox: Option<BoundingBox>,
    pub radius_km: Option<f64>,
}

/// Per-field update. `Keep` leaves the field alone, `Clear` unsets it, and
/// `Set` feeds raw input through normalization (which may still end absent).
#[derive(Clone, Debug, Default)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

/// Raw list input: either already split, or a comma-separated string.
#[derive(Clone, Debug)]
pub enum ListInput {
    Items(Vec<String>),
    Csv(String),
}

/// Raw boolean input: a flag, or the literals `"true"`/`"false"`.
#[derive(Clone, Debug)]
pub enum BoolInput {
    Flag(bool),
    Text(String),
}

/// Raw numeric input: a value, or a decimal string.
#[derive(Clone, Debug)]
pub enum NumberInput {
    Value(f64),
    Text(String),
}

#[derive(Clone, Debug, Default)]
pub struct FilterPatch {
    pub query: Patch<String>,
    pub city: Patch<String>,
    pub categories: Patch<ListInput>,
    pub difficulty: Patch<ListInput>,
    pub accessibility: Patch<ListInput>,
    pub restrictions: Patch<ListInput>,
    pub audience: Patch<ListInput>,
    pub venue_types: Patch<ListInput>,
    pub language: Patch<String>,
    pub has_actors: Patch<BoolInput>,
    pub players: Patch<NumberInput>,
    pub price_max: Patch<NumberInput>,
    pub distance_km: Patch<NumberInput>,
    pub coords: Patch<(f64, f64)>,
    pub bbox: Patch<BoundingBox>,
    pub radius_km: Patch<NumberInput>,
}

impl FilterCriteria {
    /// Pure transform: normalize the patch and fold it over `self`.
    /// Malformed input never errors; the field just ends up absent.
    pub fn apply(&self, patch: FilterPatch) -> FilterCriteria {
        let mut next = self.clone();
        apply_text(&mut next.query, patch.query);
        apply_text(&mut next.city, patch.city);
        apply_list(&mut next.categories, patch.categories);
        apply_list(&mut next.difficulty, patch.difficulty);
        apply_list(&mut next.accessibility, patch.accessibility);
        apply_list(&mut next.restrictions, patch.restrictions);
        apply_list(&mut next.audience, patch.audience);
        apply_list(&mut next.venue_types, patch.venue_types);
        apply_text(&mut next.language, patch.language);
        match patch.has_actors {
            Patch::Keep => {}
            Patch::Clear => next.has_actors = None,
            Patch::Set(raw) => next.has_actors = normalize_bool(raw),
        }
        match patch.players {
            Patch::Keep => {}
            Patch::Clear => next.players = None,
            Patch::Set(raw) => next.players = normalize_count(raw),
        }
        apply_number(&mut next.price_max, patch.price_max);
        apply_number(&mut next.distance_km, patch.distance_km);
        match patch.coords {
            Patch::Keep => {}
            Patch::Clear => next.coords = None,
            Patch::Set((lat, lng)) => {
                next.coords = (lat.is_finite() && lng.is_finite()).then_some((lat, lng));
            }
        }
        match patch.bbox {
            Patch::Keep => {}
            Patch::Clear => next.bbox = None,
            Patch::Set(bbox) => next.bbox = Some(bbox),
        }
        apply_number(&mut next.radius_km, patch.radius_km);
        next
    }

    /// Merge an ambient location. Distance falls back to
    /// [`DEFAULT_LOCATION_DISTANCE_KM`] when none is given.
    pub fn with_location(&self, lat: f64, lng: f64, distance_km: Option<f64>) -> FilterCriteria {
        let mut next = self.clone();
        if !(lat.is_finite() && lng.is_finite()) {
            return next;
        }
        next.coords = Some((lat, lng));
        next.distance_km = Some(
            distance_km
                .filter(|value| value.is_finite())
                .unwrap_or(DEFAULT_LOCATION_DISTANCE_KM),
        );
        next
    }

    /// Drop the ambient location, keeping every orthogonal field.
    pub fn without_location(&self) -> FilterCriteria {
        let mut next = self.clone();
        next.coords = None;
        next.distance_km = None;
        next
    }

    /// Select or deselect a city. Deselecting also strips the coordinate
    /// filter, matching how the city picker behaves.
    pub fn with_city(&self, city: Option<String>) -> FilterCriteria {
        let mut next = self.clone();
        match city.and_then(normalize_text) {
            Some(city) => next.city = Some(city),
            None => {
                next.city = None;
                next.coords = None;
                next.distance_km = None;
            }
        }
        next
    }

    pub fn has_location(&self) -> bool {
        self.city.is_some() || self.coords.is_some()
    }

    /// Flatten to backend query parameters. Lists are comma-joined, booleans
    /// are `"true"`/`"false"`, coordinates print at 6 decimals. Distance is
    /// dropped unless coordinates are present; when a bounding box is set it
    /// wins over a circular radius.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        push_text(&mut pairs, "query", self.query.as_deref());
        push_text(&mut pairs, "ciudad", self.city.as_deref());
        push_list(&mut pairs, "categorias", self.categories.as_deref());
        push_list(&mut pairs, "dificultad", self.difficulty.as_deref());
        push_list(&mut pairs, "accesibilidad", self.accessibility.as_deref());
        push_list(&mut pairs, "restricciones_aptas", self.restrictions.as_deref());
        push_list(&mut pairs, "publico_objetivo", self.audience.as_deref());
        push_list(&mut pairs, "tipo_sala", self.venue_types.as_deref());
        push_text(&mut pairs, "idioma", self.language.as_deref());
        if let Some(flag) = self.has_actors {
            let value = if flag { "true" } else { "false" };
            pairs.push(("actores".to_string(), value.to_string()));
        }
        if let Some(players) = self.players {
            pairs.push(("jugadores".to_string(), players.to_string()));
        }
        if let Some(price) = self.price_max {
            pairs.push(("precio".to_string(), price.to_string()));
        }
        if let Some((lat, lng)) = self.coords {
            pairs.push(("lat".to_string(), format!("{lat:.6}")));
            pairs.push(("lng".to_string(), format!("{lng:.6}")));
            if let Some(distance) = self.distance_km {
                pairs.push(("distancia_km".to_string(), distance.to_string()));
            }
        }
        if let Some(bbox) = self.bbox {
            pairs.push(("bbox".to_string(), bbox.query_value()));
        } else if let Some(radius) = self.radius_km {
            pairs.push(("radio_km".to_string(), radius.to_string()));
        }
        pairs
    }

    /// Narrow predicate for pushed record updates: text query against
    /// name/operator plus category intersection, nothing else. Other active
    /// filters are left to the next full reload.
    pub fn matches_record(&self, venue: &Venue) -> bool {
        if let Some(query) = self.query.as_deref() {
            let needle = query.to_lowercase();
            if !venue.name.to_lowercase().contains(&needle)
                && !venue.operator.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(categories) = self.categories.as_deref() {
            let hit = venue
                .categories
                .iter()
                .any(|have| categories.iter().any(|want| want == have));
            if !hit {
                return false;
            }
        }
        true
    }
}

pub fn normalize_text(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_list(raw: ListInput) -> Option<Vec<String>> {
    let items: Vec<String> = match raw {
        ListInput::Items(items) => items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        ListInput::Csv(text) => text
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    };
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

pub fn normalize_bool(raw: BoolInput) -> Option<bool> {
    match raw {
        BoolInput::Flag(value) => Some(value),
        BoolInput::Text(text) => match text.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
    }
}

pub fn normalize_number(raw: NumberInput) -> Option<f64> {
    let value = match raw {
        NumberInput::Value(value) => value,
        NumberInput::Text(text) => text.trim().parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

fn normalize_count(raw: NumberInput) -> Option<u32> {
    let value = normalize_number(raw)?;
    if !(0.0..=u32::MAX as f64).contains(&value) {
        return None;
    }
    Some(value as u32)
}

fn apply_text(slot: &mut Option<String>, patch: Patch<String>) {
    match patch {
        Patch::Keep => {}
        Patch::Clear => *slot = None,
        Patch::Set(raw) => *slot = normalize_text(raw),
    }
}

fn apply_list(slot: &mut Option<Vec<String>>, patch: Patch<ListInput>) {
    match patch {
        Patch::Keep => {}
        Patch::Clear => *slot = None,
        Patch::Set(raw) => *slot = normalize_list(raw),
    }
}

fn apply_number(slot: &mut Option<f64>, patch: Patch<NumberInput>) {
    match patch {
        Patch::Keep => {}
        Patch::Clear => *slot = None,
        Patch::Set(raw) => *slot = normalize_number(raw),
    }
}

fn push_text(pairs: &mut Vec<(String, String)>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        pairs.push((key.to_string(), value.to_string()));
    }
}

fn push_list(pairs: &mut Vec<(String, String)>, key: &str, values: Option<&[String]>) {
    if let Some(values) = values {
        pairs.push((key.to_string(), values.join(",")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(pair_key, _)| pair_key == key)
            .map(|(_, value)| value.as_str())
    }

    fn venue_with(name: &str, operator: &str, categories: &[&str]) -> Venue {
        serde_json::from_str::<Venue>(&format!(
            r#"{{"id_sala": 1, "nombre": "{name}", "empresa": "{operator}", "categorias": [{}]}}"#,
            categories
                .iter()
                .map(|category| format!("\"{category}\""))
                .collect::<Vec<_>>()
                .join(",")
        ))
        .unwrap()
    }

    #[test]
    fn csv_list_normalizes_to_trimmed_items() {
        let criteria = FilterCriteria::default().apply(FilterPatch {
            categories: Patch::Set(ListInput::Csv("a, b ,c".to_string())),
            ..FilterPatch::default()
        });
        assert_eq!(
            criteria.categories.as_deref(),
            Some(&["a".to_string(), "b".to_string(), "c".to_string()][..])
        );
    }

    #[test]
    fn empty_lists_normalize_to_absent() {
        let criteria = FilterCriteria::default().apply(FilterPatch {
            categories: Patch::Set(ListInput::Items(vec![])),
            difficulty: Patch::Set(ListInput::Csv("  , ,".to_string())),
            ..FilterPatch::default()
        });
        assert_eq!(criteria.categories, None);
        assert_eq!(criteria.difficulty, None);
    }

    #[test]
    fn bool_literals_parse_and_junk_is_absent() {
        assert_eq!(normalize_bool(BoolInput::Text("true".to_string())), Some(true));
        assert_eq!(normalize_bool(BoolInput::Text(" false ".to_string())), Some(false));
        assert_eq!(normalize_bool(BoolInput::Text("yes".to_string())), None);
        assert_eq!(normalize_bool(BoolInput::Flag(true)), Some(true));
    }

    #[test]
    fn non_finite_numbers_are_absent() {
        assert_eq!(normalize_number(NumberInput::Value(f64::NAN)), None);
        assert_eq!(normalize_number(NumberInput::Value(f64::INFINITY)), None);
        assert_eq!(normalize_number(NumberInput::Text("NaN".to_string())), None);
        assert_eq!(normalize_number(NumberInput::Text("12.5".to_string())), Some(12.5));
    }

    #[test]
    fn distance_only_flattens_with_coordinates() {
        let mut criteria = FilterCriteria::default();
        criteria.distance_km = Some(10.0);
        assert_eq!(value_of(&criteria.to_query_pairs(), "distancia_km"), None);

        criteria.coords = Some((40.4168, -3.7038));
        let pairs = criteria.to_query_pairs();
        assert_eq!(value_of(&pairs, "lat"), Some("40.416800"));
        assert_eq!(value_of(&pairs, "lng"), Some("-3.703800"));
        assert_eq!(value_of(&pairs, "distancia_km"), Some("10"));
    }

    #[test]
    fn bbox_wins_over_radius() {
        let mut criteria = FilterCriteria::default();
        criteria.radius_km = Some(7.0);
        criteria.bbox = Some(BoundingBox {
            west: -3.8,
            south: 40.3,
            east: -3.6,
            north: 40.5,
        });
        let pairs = criteria.to_query_pairs();
        assert_eq!(
            value_of(&pairs, "bbox"),
            Some("-3.800000,40.300000,-3.600000,40.500000")
        );
        assert_eq!(value_of(&pairs, "radio_km"), None);
    }

    #[test]
    fn lists_flatten_comma_joined_and_bools_lowercase() {
        let criteria = FilterCriteria::default().apply(FilterPatch {
            categories: Patch::Set(ListInput::Items(vec!["terror".into(), "aventura".into()])),
            has_actors: Patch::Set(BoolInput::Flag(true)),
            players: Patch::Set(NumberInput::Value(4.0)),
            ..FilterPatch::default()
        });
        let pairs = criteria.to_query_pairs();
        assert_eq!(value_of(&pairs, "categorias"), Some("terror,aventura"));
        assert_eq!(value_of(&pairs, "actores"), Some("true"));
        assert_eq!(value_of(&pairs, "jugadores"), Some("4"));
    }

    #[test]
    fn clear_patch_resets_only_named_fields() {
        let criteria = FilterCriteria::default().apply(FilterPatch {
            city: Patch::Set("Madrid".to_string()),
            categories: Patch::Set(ListInput::Csv("terror".to_string())),
            ..FilterPatch::default()
        });
        let next = criteria.apply(FilterPatch {
            categories: Patch::Clear,
            ..FilterPatch::default()
        });
        assert_eq!(next.categories, None);
        assert_eq!(next.city.as_deref(), Some("Madrid"));
    }

    #[test]
    fn with_location_defaults_the_distance() {
        let criteria = FilterCriteria::default().with_location(40.4168, -3.7038, None);
        assert_eq!(criteria.coords, Some((40.4168, -3.7038)));
        assert_eq!(criteria.distance_km, Some(DEFAULT_LOCATION_DISTANCE_KM));

        let stripped = criteria.without_location();
        assert_eq!(stripped.coords, None);
        assert_eq!(stripped.distance_km, None);
    }

    #[test]
    fn deselecting_the_city_strips_the_coordinate_filter() {
        let criteria = FilterCriteria::default()
            .with_location(40.4168, -3.7038, Some(5.0))
            .with_city(Some("Madrid".to_string()));
        let cleared = criteria.with_city(None);
        assert_eq!(cleared.city, None);
        assert_eq!(cleared.coords, None);
        assert_eq!(cleared.distance_km, None);
    }

    #[test]
    fn record_match_checks_query_and_categories_only() {
        let criteria = FilterCriteria::default().apply(FilterPatch {
            query: Patch::Set("cripta".to_string()),
            categories: Patch::Set(ListInput::Csv("terror".to_string())),
            price_max: Patch::Set(NumberInput::Value(1.0)),
            ..FilterPatch::default()
        });
        let venue = venue_with("La Cripta", "Enigma Rooms", &["terror"]);
        // price is not re-evaluated client-side
        assert!(criteria.matches_record(&venue));

        let other = venue_with("Submarino", "Enigma Rooms", &["terror"]);
        assert!(!criteria.matches_record(&other));

        let wrong_category = venue_with("La Cripta", "Enigma Rooms", &["familiar"]);
        assert!(!criteria.matches_record(&wrong_category));
    }

    #[test]
    fn query_matches_operator_too() {
        let criteria = FilterCriteria::default().apply(FilterPatch {
            query: Patch::Set("enigma".to_string()),
            ..FilterPatch::default()
        });
        let venue = venue_with("La Cripta", "Enigma Rooms", &[]);
        assert!(criteria.matches_record(&venue));
    }
}
