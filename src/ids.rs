//! Human-readable identifiers (`EMP-7K2QX9AB`)

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LENGTH: usize = 8;

pub const BOOK_PREFIX: &str = "LIV";
pub const SPECIMEN_PREFIX: &str = "EX";
pub const MEMBER_PREFIX: &str = "U";
pub const LOAN_PREFIX: &str = "EMP";
pub const RESERVATION_PREFIX: &str = "RES";

/// Generate `PREFIX-XXXXXXXX`, retrying while `taken` reports a collision.
pub fn generate_unique_id(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let code: String = (0..CODE_LENGTH)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        let id = format!("{}-{}", prefix, code);
        if !taken(&id) {
            return id;
        }
    }
}
