use alloy_primitives::Address;
use announce_storage::{DatabaseError, Decode, Encode};

/// Namespace of the announce version table in the engine key space.
pub const ANNOUNCE_VERSION_PREFIX: &[u8] = b"announce-version:";

/// Key of the stored row-format version. Sits outside [`ANNOUNCE_VERSION_PREFIX`].
pub const ANNOUNCE_VERSION_SCHEMA_KEY: &[u8] = b"announce-version-schema";

/// Row format written by this crate. Bump on any change to the entry encoding.
pub const ANNOUNCE_VERSION_SCHEMA: u64 = 1;

/// Row key: [`ANNOUNCE_VERSION_PREFIX`] followed by the 20 raw address bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnnounceVersionKey(pub Address);

impl Encode for AnnounceVersionKey {
    type Encoded = Vec<u8>;

    fn encode(self) -> Self::Encoded {
        let mut key = Vec::with_capacity(ANNOUNCE_VERSION_PREFIX.len() + Address::len_bytes());
        key.extend_from_slice(ANNOUNCE_VERSION_PREFIX);
        key.extend_from_slice(self.0.as_slice());
        key
    }
}

impl Decode for AnnounceVersionKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        let raw = value
            .strip_prefix(ANNOUNCE_VERSION_PREFIX)
            .ok_or(DatabaseError::Decode)?;
        let raw: [u8; 20] = raw.try_into().map_err(|_| DatabaseError::Decode)?;
        Ok(Self(Address::from(raw)))
    }
}
