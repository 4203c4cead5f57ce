use serde::Deserialize;

use crate::venue::{Venue, VenueId};

pub const EVENT_COLLECTION_CHANGED: &str = "salasUpdated";
pub const EVENT_RECORD_CHANGED: &str = "salaModificada";

/// Push frame from the venue events channel.
#[derive(Clone, Debug)]
pub enum RealtimeEvent {
    /// Something changed server-side with no detail; refetch the list.
    CollectionChanged,
    /// One record changed; the full updated record rides along.
    RecordChanged(Venue),
}

#[derive(Deserialize)]
struct EventFrame {
    event: String,
    #[serde(default)]
    sala: Option<Venue>,
}

impl RealtimeEvent {
    /// Parse one text frame. Unknown events, malformed JSON, and a record
    /// event missing its payload all yield `None`; the channel never errors.
    pub fn parse(text: &str) -> Option<RealtimeEvent> {
        let frame: EventFrame = serde_json::from_str(text).ok()?;
        match frame.event.as_str() {
            EVENT_COLLECTION_CHANGED => Some(RealtimeEvent::CollectionChanged),
            EVENT_RECORD_CHANGED => frame.sala.map(RealtimeEvent::RecordChanged),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Added,
    Removed,
}

/// Body of the toggle endpoint's response; `is_favorite` is authoritative.
#[derive(Clone, Debug, Deserialize)]
pub struct ToggleResponse {
    #[serde(rename = "isFavorite")]
    pub is_favorite: bool,
    pub action: ToggleAction,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FavoriteIdsResponse {
    #[serde(default)]
    pub ids: Vec<VenueId>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FavoritesResponse {
    #[serde(default)]
    pub favoritos: Vec<Venue>,
}
