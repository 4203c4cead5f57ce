pub mod collection;
pub mod favorites;
pub mod filter;
pub mod grouping;
pub mod persisted;
pub mod protocol;
pub mod venue;

pub use collection::{FetchTicket, LoadPhase, VenueCollection, PAGE_SIZE};
pub use favorites::{FavoriteLedger, ToggleOutcome, ToggleTicket};
pub use filter::{
    BoolInput, BoundingBox, FilterCriteria, FilterPatch, ListInput, NumberInput, Patch,
    DEFAULT_LOCATION_DISTANCE_KM,
};
pub use grouping::{coordinate_key, CoordinateGroups};
pub use persisted::{FavoritesRecord, FAVORITES_RECORD_VERSION};
pub use protocol::{
    FavoriteIdsResponse, FavoritesResponse, RealtimeEvent, ToggleAction, ToggleResponse,
};
pub use venue::{MapPoint, Venue, VenueId, VenuePin};
