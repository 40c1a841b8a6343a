//! Database credential generation

use rand::Rng;
use sha2::{Digest, Sha256};

/// Password alphabet: no `0/O`, `1/l/I`, quotes or backslashes
pub const PASSWORD_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789!@$%^&*()-_=+";

pub const DB_USER_PREFIX: &str = "u_";
/// MySQL limit for user names
pub const MAX_DB_USER_LEN: usize = 32;
/// Hex digits of the database-name digest kept when a user name is shortened
const DB_USER_DIGEST_LEN: usize = 8;

/// Random password of `length` characters drawn from [`PASSWORD_CHARSET`]
pub fn generate_password(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| PASSWORD_CHARSET[rng.random_range(0..PASSWORD_CHARSET.len())] as char)
        .collect()
}

/// Database user derived from the database name, capped at [`MAX_DB_USER_LEN`].
///
/// Names that fit are `u_{db_name}`. Longer ones keep a prefix and end in
/// `_{digest}` of the full database name, so distinct databases never share a
/// user even when they differ only past the cap.
pub fn db_user_for(db_name: &str) -> String {
    let user = format!("{DB_USER_PREFIX}{db_name}");
    if user.chars().count() <= MAX_DB_USER_LEN {
        return user;
    }

    let digest = hex::encode(Sha256::digest(db_name.as_bytes()));
    let keep = MAX_DB_USER_LEN - DB_USER_DIGEST_LEN - 1;
    let head: String = user.chars().take(keep).collect();
    format!("{}_{}", head.trim_end_matches('_'), &digest[..DB_USER_DIGEST_LEN])
}
