use rkyv::api::high::{HighDeserializer, HighSerializer, HighValidator};
use rkyv::bytecheck::CheckBytes;
use rkyv::rancor::Error;
use rkyv::ser::allocator::ArenaHandle;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};

use crate::venue::VenueId;

pub const FAVORITES_RECORD_VERSION: u32 = 1;

/// Favorite ids as persisted between sessions. The version field gates
/// decoding: any mismatch discards the blob and the session starts empty.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct FavoritesRecord {
    pub version: u32,
    pub ids: Vec<VenueId>,
}

impl FavoritesRecord {
    pub fn new(ids: Vec<VenueId>) -> Self {
        FavoritesRecord {
            version: FAVORITES_RECORD_VERSION,
            ids,
        }
    }

    pub fn encode(&self) -> Option<Vec<u8>> {
        encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Option<FavoritesRecord> {
        let record: FavoritesRecord = decode(bytes)?;
        (record.version == FAVORITES_RECORD_VERSION).then_some(record)
    }
}

fn encode<T>(value: &T) -> Option<Vec<u8>>
where
    T: for<'a> Serialize<HighSerializer<AlignedVec, ArenaHandle<'a>, Error>>,
{
    rkyv::to_bytes::<Error>(value).ok().map(|bytes| bytes.into_vec())
}

fn decode<T>(bytes: &[u8]) -> Option<T>
where
    T: Archive,
    T::Archived:
        for<'a> CheckBytes<HighValidator<'a, Error>> + Deserialize<T, HighDeserializer<Error>>,
{
    rkyv::from_bytes::<T, Error>(bytes).ok()
}
