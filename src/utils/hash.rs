//! Content hashing utilities.

use xxhash_rust::xxh3::xxh3_128;

/// 128-bit content hash rendered as 32 lowercase hex characters.
///
/// Used as a document id, so the rendering must never change.
pub fn content_hash_hex(data: &[u8]) -> String {
    format!("{:032x}", xxh3_128(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_hex_is_fixed_width() {
        assert_eq!(content_hash_hex(b"").len(), 32);
        assert_eq!(content_hash_hex(b"numpy\x001.2\x00python").len(), 32);
        assert_eq!(content_hash_hex(b"abc"), content_hash_hex(b"abc"));
        assert_ne!(content_hash_hex(b"abc"), content_hash_hex(b"abd"));
    }
}
