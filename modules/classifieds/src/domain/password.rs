use sha2::{Digest, Sha256};

/// One-way digest of a raw password: SHA-256 over the UTF-8 bytes, lowercase hex.
pub fn hash_password(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic_hex() {
        let h = hash_password("longenough1");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(h, hash_password("longenough1"));
        assert_ne!(h, hash_password("longenough2"));
    }

    #[test]
    fn known_vector() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
