use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use tracing::instrument;

use crate::secrets::IdentitySecret;
use crate::time::encode_timestamp;

type HmacSha1 = Hmac<Sha1>;

pub(crate) fn hmac_sha1(key: &[u8], message: &[u8]) -> [u8; 20] {
    let mut mac = HmacSha1::new_from_slice(key).expect("hmac accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// Derives the signature authorizing one confirmation-protocol request.
///
/// The tag is part of the signed message: a key produced for one tag is
/// invalid for any other tag, even at the identical timestamp.
#[must_use]
#[instrument(level = "debug", skip(secret), fields(timestamp, tag))]
pub fn confirmation_key(secret: &IdentitySecret, timestamp: u64, tag: &str) -> String {
    let mut message = Vec::with_capacity(8 + tag.len());
    message.extend_from_slice(&encode_timestamp(timestamp));
    message.extend_from_slice(tag.as_bytes());
    let digest = hmac_sha1(secret.as_bytes(), &message);
    STANDARD.encode(digest)
}
