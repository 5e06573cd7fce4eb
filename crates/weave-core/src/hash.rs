//! Content hashing for state roots, event logs and deploy seeds
//!
//! Hashing is pure and synchronous, so it lives outside the effect traits.
//! One algorithm is used for the whole engine; the executor and the replay
//! validator must agree on it bit for bit, so nothing else in the workspace
//! should reach for a digest crate directly.
//!
//! Current algorithm: **SHA-256** (32-byte output)

use sha2::{Digest, Sha256};

/// Hash bytes with the engine's algorithm
#[inline]
pub fn hash(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Hash `data` under a domain separation tag
pub fn hash_tagged(tag: &[u8], data: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(tag);
    h.update(data);
    h.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_determinism() {
        assert_eq!(hash(b"hello world"), hash(b"hello world"));
    }

    #[test]
    fn test_tag_separates_domains() {
        assert_ne!(hash_tagged(b"A", b"data"), hash_tagged(b"B", b"data"));
        assert_eq!(hash_tagged(b"A", b"data"), hash(b"Adata"));
    }

    #[test]
    fn test_sha256_known_vector() {
        // SHA256("") = e3b0c442...7852b855
        assert_eq!(
            hex::encode(hash(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
