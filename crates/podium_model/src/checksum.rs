//! 32-bit rolling checksum over the canonical dataset form.
//!
//! Used solely to detect structural corruption and cheap equality between
//! dataset copies. Not cryptographic and not collision resistant; never use
//! it for tamper detection.

use crate::dataset::Dataset;
use crate::error::ModelResult;

/// Computes the 32-bit rolling hash of a byte slice.
///
/// The recurrence is `h = h * 31 + byte`, wrapping to 32 bits, so other
/// clients of the same document format compute identical checksums.
pub fn checksum32(data: &[u8]) -> u32 {
    let mut hash: i32 = 0;
    for &byte in data {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(byte));
    }
    hash as u32
}

/// Checksums a dataset over its canonical JSON serialization.
pub fn dataset_checksum(dataset: &Dataset) -> ModelResult<u32> {
    let canonical = serde_json::to_string(dataset)?;
    Ok(checksum32(canonical.as_bytes()))
}

/// Checksums an arbitrary JSON value over its serialization.
///
/// Used for payloads that may not parse as a typed dataset (for example an
/// emergency snapshot of a corrupt state).
pub fn value_checksum(value: &serde_json::Value) -> ModelResult<u32> {
    let canonical = serde_json::to_string(value)?;
    Ok(checksum32(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use chrono::{TimeZone, Utc};

    #[test]
    fn known_vectors() {
        assert_eq!(checksum32(b""), 0);
        // h("abc") = (0*31 + 97)*31 + 98, *31 + 99
        assert_eq!(checksum32(b"abc"), 96354);
    }

    #[test]
    fn long_input_wraps() {
        let data = vec![0xFFu8; 4096];
        // Just needs to terminate and be stable.
        assert_eq!(checksum32(&data), checksum32(&data));
    }

    #[test]
    fn equal_datasets_hash_equal() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let a = Dataset::with_speakers(t, vec![Record::new(1, "Ada")]);
        let b = a.clone();
        assert_eq!(dataset_checksum(&a).unwrap(), dataset_checksum(&b).unwrap());

        let mut c = a.clone();
        c.speakers[0].email = Some("a@x.com".into());
        assert_ne!(dataset_checksum(&a).unwrap(), dataset_checksum(&c).unwrap());
    }
}
