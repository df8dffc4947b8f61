use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

const PBKDF2_ITERATIONS: u32 = 10_000;
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Hashes a password as `iterations$salt$key`, both byte fields base64.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let key = derive_key(password, &salt, PBKDF2_ITERATIONS);
    format!(
        "{}${}${}",
        PBKDF2_ITERATIONS,
        B64.encode(salt),
        B64.encode(key)
    )
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(iterations), Some(salt), Some(key), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let (Ok(iterations), Ok(salt), Ok(expected)) =
        (iterations.parse::<u32>(), B64.decode(salt), B64.decode(key))
    else {
        return false;
    };
    if expected.len() != KEY_LEN || iterations == 0 {
        return false;
    }

    let actual = derive_key(password, &salt, iterations);
    actual
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}
