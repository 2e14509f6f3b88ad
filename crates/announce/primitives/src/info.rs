use serde::{Deserialize, Serialize};

use crate::AnnounceVersionEntry;

/// Public summary of a stored entry, safe to expose outside the process.
///
/// Carries no signature bytes and no timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnounceVersionInfo {
    /// EIP-55 checksummed hex address.
    pub address: String,
    pub version: u64,
}

impl From<&AnnounceVersionEntry> for AnnounceVersionInfo {
    fn from(entry: &AnnounceVersionEntry) -> Self {
        Self {
            address: entry.address().to_checksum(None),
            version: entry.version(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SignedAnnounceVersion;
    use alloy_primitives::{Address, Bytes, address};

    #[test]
    fn test_info_shape() {
        let entry = AnnounceVersionEntry::new(
            SignedAnnounceVersion::new(
                address!("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
                12,
                Bytes::from(vec![7u8; 65]),
            ),
            99,
        );

        let info = AnnounceVersionInfo::from(&entry);
        assert_eq!(info.address, "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "address": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
                "version": 12,
            })
        );
    }

    #[test]
    fn test_info_ignores_signature_and_timestamp() {
        let record = SignedAnnounceVersion::new(Address::repeat_byte(3), 4, Bytes::from(vec![1]));
        let a = AnnounceVersionEntry::new(record.clone(), 1);
        let b = AnnounceVersionEntry::new(
            SignedAnnounceVersion {
                signature: Bytes::from(vec![2, 2]),
                ..record
            },
            2,
        );
        assert_eq!(AnnounceVersionInfo::from(&a), AnnounceVersionInfo::from(&b));
    }
}
