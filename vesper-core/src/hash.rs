use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// First `len` hex characters of the SHA-256 digest of `input`.
///
/// Used for node identity (`sha256("host:port")[..16]`).
pub fn short_id(input: &str, len: usize) -> String {
    let digest = sha256_hex(input.as_bytes());
    digest[..len.min(digest.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_digest_matches_known_value() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn short_id_truncates() {
        let id = short_id("0.0.0.0:8333", 16);
        assert_eq!(id.len(), 16);
    }
}
