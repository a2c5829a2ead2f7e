use rand::RngExt;

pub const SHORT_CODE_LENGTH: usize = 8;

/// URL-safe alphabet. 64 symbols, so every character carries six bits.
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Generate a random short code.
///
/// The store is not consulted here; a collision shows up as a duplicate-code
/// error on insert and the caller draws again.
pub fn generate_short_code() -> String {
    let mut rng = rand::rng();
    (0..SHORT_CODE_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Whether `code` could have been produced by [`generate_short_code`].
pub fn is_well_formed(code: &str) -> bool {
    code.len() == SHORT_CODE_LENGTH && code.bytes().all(|b| ALPHABET.contains(&b))
}
