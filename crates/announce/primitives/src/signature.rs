//! Signer recovery over keccak256 digests.

use alloy_primitives::{Address, Signature, keccak256};

/// Length of an `r || s || v` secp256k1 signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Authentication failures. None of these indicate a storage format problem.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid signature length: expected {SIGNATURE_LENGTH} bytes, got {0}")]
    InvalidLength(usize),
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
    #[error("signer recovery failed: {0}")]
    Recovery(#[from] alloy_primitives::SignatureError),
    #[error("signature recovers to {recovered}, expected {claimed}")]
    AddressMismatch { claimed: Address, recovered: Address },
}

/// Recovers the address that produced `signature` over `keccak256(message)`.
///
/// The digest is signed directly, without an EIP-191 prefix. Only the
/// recovery ids `0`, `1`, `27` and `28` are accepted, so every other value of
/// the trailing byte is rejected instead of being folded onto a parity.
///
/// # Errors
/// Returns a [`SignatureError`] if the signature is malformed or recovery fails.
pub fn recover_signer(message: &[u8], signature: &[u8]) -> Result<Address, SignatureError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidLength(signature.len()));
    }
    let (&v, rs) = signature
        .split_last()
        .ok_or(SignatureError::InvalidLength(0))?;
    let parity = match v {
        0 | 27 => false,
        1 | 28 => true,
        other => return Err(SignatureError::InvalidRecoveryId(other)),
    };

    let signature = Signature::from_bytes_and_parity(rs, parity);
    Ok(signature.recover_address_from_prehash(&keccak256(message))?)
}
