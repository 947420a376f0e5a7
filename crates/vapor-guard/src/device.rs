use sha1::{Digest, Sha1};
use uuid::Uuid;

/// Derives the stable device identifier for a logical device from a
/// caller-chosen seed, typically the account name. One device derives its
/// id once and reuses it for every signed request.
#[must_use]
pub fn derive_device_id(seed: &str) -> String {
    let digest = Sha1::digest(seed.as_bytes());
    let hex = hex::encode(digest);
    format!(
        "android:{}-{}-{}-{}-{}",
        &hex[..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// A fresh random device identifier, for enrolling a new device.
#[must_use]
pub fn random_device_id() -> String {
    format!("android:{}", Uuid::new_v4())
}
