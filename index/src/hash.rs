//! Content hashing for chunk and document identity.

use xxhash_rust::xxh3::xxh3_64;

/// Computes a stable content hash.
#[must_use]
pub fn content_hash(text: &str) -> u64 {
    xxh3_64(text.as_bytes())
}

/// Hex rendering of [`content_hash`], used as an id for documents created from bare text.
#[must_use]
pub fn content_id(text: &str) -> String {
    format!("{:016x}", content_hash(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_same_hash() {
        assert_eq!(content_hash("a test document"), content_hash("a test document"));
    }

    #[test]
    fn different_content_different_hash() {
        assert_ne!(content_hash("first"), content_hash("second"));
    }

    #[test]
    fn ids_are_fixed_width_hex() {
        let id = content_id("");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
