//! The signed announce version record and its signature check.

use std::fmt;

use alloy_primitives::{Address, B256, Bytes, keccak256};
use alloy_rlp::{Encodable, Header};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use crate::signature::{SignatureError, recover_signer};

/// An identity's signed claim that `version` is its latest announce version.
///
/// The signature covers the canonical encoding of the record with an empty
/// signature field (see [`SignedAnnounceVersion::signing_payload`]). It never
/// covers the local acceptance timestamp, which differs between nodes.
///
/// `Debug` and `Display` print only the signature length.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SignedAnnounceVersion {
    /// Claimed signer identity, also the table key.
    pub address: Address,
    /// Caller-assigned counter; higher is newer.
    pub version: u64,
    /// `r || s || v` signature over [`Self::signing_payload`].
    pub signature: Bytes,
}

impl SignedAnnounceVersion {
    pub fn new(address: Address, version: u64, signature: Bytes) -> Self {
        Self {
            address,
            version,
            signature,
        }
    }

    /// Produce a signed record for `signer`'s own address.
    pub fn sign(signer: &PrivateKeySigner, version: u64) -> Result<Self, alloy_signer::Error> {
        let mut record = Self::new(signer.address(), version, Bytes::new());
        let signature = signer.sign_hash_sync(&record.signing_hash())?;
        record.signature = Bytes::copy_from_slice(&signature.as_bytes());
        Ok(record)
    }

    /// Canonical bytes covered by the signature.
    ///
    /// RLP list `[address, version, ""]`: the record itself with the signature
    /// field emptied, so the field layout matches the stored form.
    pub fn signing_payload(&self) -> Vec<u8> {
        let empty_signature = Bytes::new();
        let payload_length =
            self.address.length() + self.version.length() + empty_signature.length();

        let mut out =
            Vec::with_capacity(payload_length + alloy_rlp::length_of_length(payload_length));
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.address.encode(&mut out);
        self.version.encode(&mut out);
        empty_signature.encode(&mut out);
        out
    }

    /// Digest the signer signs.
    pub fn signing_hash(&self) -> B256 {
        keccak256(self.signing_payload())
    }

    /// Check that the signature was produced by `self.address` over this
    /// record's address and version.
    ///
    /// # Errors
    /// Returns a [`SignatureError`] when recovery fails or recovers a
    /// different address.
    pub fn validate_signature(&self) -> Result<(), SignatureError> {
        let recovered = recover_signer(&self.signing_payload(), &self.signature)?;
        if recovered != self.address {
            return Err(SignatureError::AddressMismatch {
                claimed: self.address,
                recovered,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for SignedAnnounceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedAnnounceVersion")
            .field("address", &self.address)
            .field("version", &self.version)
            .field("signature_len", &self.signature.len())
            .finish()
    }
}

impl fmt::Display for SignedAnnounceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Address: {}, Version: {}, Signature.length: {}}}",
            self.address,
            self.version,
            self.signature.len()
        )
    }
}
