//! Signed announce version records.
//!
//! An announce version is a counter an identity signs and publishes to mark
//! the freshness of its reachability information. This crate defines:
//!
//! - [`SignedAnnounceVersion`]: the signed fact `(address, version, signature)`
//! - [`AnnounceVersionEntry`]: the persisted envelope adding a local acceptance
//!   timestamp
//! - the canonical RLP encoding shared by signers and storage
//! - [`recover_signer`] and signature validation bound to that encoding

mod entry;
mod info;
mod record;
mod signature;

pub use entry::AnnounceVersionEntry;
pub use info::AnnounceVersionInfo;
pub use record::SignedAnnounceVersion;
pub use signature::{SIGNATURE_LENGTH, SignatureError, recover_signer};

// Re-export the types that appear in this crate's public API
pub use alloy_primitives::{Address, Bytes};
pub use alloy_rlp::Error as RlpError;
