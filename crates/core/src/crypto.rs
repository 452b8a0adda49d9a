//! Credential hashing helpers for offline password verification.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a freshly generated salt (hex-encoded to twice as many chars).
pub const SALT_LEN_BYTES: usize = 16;

/// Lowercase hex SHA-256 digest of `text`.
pub fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Generate a fresh salt from the OS CSPRNG, encoded as lowercase hex.
pub fn generate_salt() -> String {
    let mut bytes = [0_u8; SALT_LEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest of `password ‖ salt`.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut salted = String::with_capacity(password.len() + salt.len());
    salted.push_str(password);
    salted.push_str(salt);
    sha256_hex(&salted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(sha256_hex("secret"), sha256_hex("secret"));
        assert_ne!(sha256_hex("secret"), sha256_hex("Secret"));
    }

    #[test]
    fn salt_is_fixed_length_lowercase_hex() {
        let salt = generate_salt();
        assert_eq!(salt.len(), SALT_LEN_BYTES * 2);
        assert!(salt
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        assert_ne!(salt, generate_salt());
    }

    #[test]
    fn password_hash_appends_salt() {
        assert_eq!(hash_password("secret", "00ff"), sha256_hex("secret00ff"));
    }
}
