use tracing::instrument;

use crate::secrets::SharedSecret;
use crate::signing::hmac_sha1;
use crate::time::{code_window, encode_timestamp, CODE_INTERVAL};

/// Symbols a guard code may contain: digits then consonants, with vowels and
/// lookalikes (0/1/I/O/S/Z) excluded.
pub const CODE_ALPHABET: &[u8; 26] = b"23456789BCDFGHJKMNPQRTVWXY";

/// Characters in one guard code.
pub const CODE_LENGTH: usize = 5;

/// Derives the guard code for the 30-second window containing `timestamp`.
///
/// The five characters come out least-significant digit first and are kept
/// in that order; the verifier expects no reversal.
#[must_use]
#[instrument(level = "debug", skip(secret), fields(window = code_window(timestamp)))]
pub fn guard_code(secret: &SharedSecret, timestamp: u64) -> String {
    let window = encode_timestamp(code_window(timestamp));
    let digest = hmac_sha1(secret.as_bytes(), &window);
    let offset = (digest[19] & 0x0f) as usize;
    let mut code_int = u32::from(digest[offset] & 0x7f) << 24
        | u32::from(digest[offset + 1]) << 16
        | u32::from(digest[offset + 2]) << 8
        | u32::from(digest[offset + 3]);

    let radix = CODE_ALPHABET.len() as u32;
    let mut code = String::with_capacity(CODE_LENGTH);
    for _ in 0..CODE_LENGTH {
        let index = (code_int % radix) as usize;
        code_int /= radix;
        code.push(CODE_ALPHABET[index] as char);
    }
    code
}

/// Seconds until the code for `timestamp` stops being the current one.
#[must_use]
pub fn code_remaining_seconds(timestamp: u64) -> u64 {
    CODE_INTERVAL - timestamp % CODE_INTERVAL
}
