/// Salted SHA-256 credential digests
///
/// The local fallback store runs on the user's machine and has no use for a
/// memory-hard hash, but it still never writes plaintext passwords to disk.
/// Credentials are stored as `<salt>$<hex sha256(salt || password)>` and
/// compared in constant time.
///
/// # Example
///
/// ```
/// use encore_shared::auth::digest::{digest_password, verify_digest};
///
/// let stored = digest_password("password");
/// assert!(verify_digest("password", &stored));
/// assert!(!verify_digest("Password", &stored));
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of generated salts (characters)
const SALT_LENGTH: usize = 16;

/// Separator between salt and hash in a stored digest
const SEPARATOR: char = '$';

/// Generates a random alphanumeric string
///
/// Used for salts and for opaque local session tokens.
pub fn random_token(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hex-encoded SHA-256 of `salt || secret`
pub fn sha256_hex(salt: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digests a password with a fresh salt
pub fn digest_password(password: &str) -> String {
    let salt = random_token(SALT_LENGTH);
    format!("{}{}{}", salt, SEPARATOR, sha256_hex(&salt, password))
}

/// Verifies a password against a stored digest
///
/// Malformed digests never verify.
pub fn verify_digest(password: &str, stored: &str) -> bool {
    match stored.split_once(SEPARATOR) {
        Some((salt, hash)) if !salt.is_empty() => {
            constant_time_compare(&sha256_hex(salt, password), hash)
        }
        _ => false,
    }
}

/// Constant-time string comparison
///
/// Always walks the full length of equal-length inputs so the comparison time
/// does not reveal where they differ.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
