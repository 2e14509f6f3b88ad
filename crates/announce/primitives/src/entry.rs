//! Persisted envelope and its canonical encoding.
//!
//! The stored form is the RLP list `[address, version, signature, timestamp]`.
//! Field order is fixed here rather than derived, so the bytes stay identical
//! to any other RLP implementation writing the same four fields.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, Bytes};
use alloy_rlp::{BufMut, Decodable, Encodable, Header};

use crate::SignedAnnounceVersion;

/// A [`SignedAnnounceVersion`] as accepted into the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnounceVersionEntry {
    pub record: SignedAnnounceVersion,
    /// Acceptance time in nanoseconds since the unix epoch. Assigned by the
    /// store, never signed.
    pub timestamp: u64,
}

impl AnnounceVersionEntry {
    pub fn new(record: SignedAnnounceVersion, timestamp: u64) -> Self {
        Self { record, timestamp }
    }

    pub fn address(&self) -> Address {
        self.record.address
    }

    pub fn version(&self) -> u64 {
        self.record.version
    }

    pub fn signature(&self) -> &Bytes {
        &self.record.signature
    }

    /// Acceptance time as a [`SystemTime`].
    pub fn accepted_at(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_nanos(self.timestamp)
    }

    /// Canonical stored bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        alloy_rlp::encode(self)
    }

    /// Decode stored bytes, rejecting anything after the entry.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, alloy_rlp::Error> {
        let mut buf = bytes;
        let entry = Self::decode(&mut buf)?;
        if !buf.is_empty() {
            return Err(alloy_rlp::Error::Custom(
                "trailing bytes after announce version entry",
            ));
        }
        Ok(entry)
    }

    fn payload_length(&self) -> usize {
        self.record.address.length()
            + self.record.version.length()
            + self.record.signature.length()
            + self.timestamp.length()
    }
}

impl Encodable for AnnounceVersionEntry {
    fn encode(&self, out: &mut dyn BufMut) {
        Header {
            list: true,
            payload_length: self.payload_length(),
        }
        .encode(out);
        self.record.address.encode(out);
        self.record.version.encode(out);
        self.record.signature.encode(out);
        self.timestamp.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl Decodable for AnnounceVersionEntry {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        if buf.len() < header.payload_length {
            return Err(alloy_rlp::Error::InputTooShort);
        }
        let (mut payload, rest) = buf.split_at(header.payload_length);

        let address = Address::decode(&mut payload)?;
        let version = u64::decode(&mut payload)?;
        let signature = Bytes::decode(&mut payload)?;
        let timestamp = u64::decode(&mut payload)?;

        if !payload.is_empty() {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: header.payload_length - payload.len(),
            });
        }

        *buf = rest;
        Ok(Self {
            record: SignedAnnounceVersion::new(address, version, signature),
            timestamp,
        })
    }
}

impl fmt::Display for AnnounceVersionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Address: {}, Version: {}, Signature.length: {}, Timestamp: {}}}",
            self.record.address,
            self.record.version,
            self.record.signature.len(),
            self.timestamp
        )
    }
}
