use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use proptest::collection::vec;
use proptest::prelude::*;
use vapor_guard::{
    confirmation_key, decode_timestamp, encode_timestamp, guard_code, IdentitySecret,
    SharedSecret, CODE_ALPHABET, CODE_LENGTH,
};

fn shared_secret(bytes: &[u8]) -> SharedSecret {
    SharedSecret::from_base64(&STANDARD.encode(bytes)).expect("valid base64")
}

fn identity_secret(bytes: &[u8]) -> IdentitySecret {
    IdentitySecret::from_base64(&STANDARD.encode(bytes)).expect("valid base64")
}

proptest! {
    #[test]
    fn guard_codes_use_the_alphabet(key in vec(any::<u8>(), 1..64), timestamp in any::<u64>()) {
        let secret = shared_secret(&key);
        let code = guard_code(&secret, timestamp);
        prop_assert_eq!(code.len(), CODE_LENGTH);
        prop_assert!(code.bytes().all(|ch| CODE_ALPHABET.contains(&ch)));
    }

    #[test]
    fn guard_codes_are_stable_within_a_window(
        key in vec(any::<u8>(), 1..64),
        window in 0u64..(u64::MAX / 30),
        skew in 0u64..30,
    ) {
        let secret = shared_secret(&key);
        prop_assert_eq!(
            guard_code(&secret, window * 30),
            guard_code(&secret, window * 30 + skew)
        );
    }

    #[test]
    fn confirmation_keys_are_deterministic_and_tag_sensitive(
        key in vec(any::<u8>(), 1..64),
        timestamp in any::<u64>(),
    ) {
        let secret = identity_secret(&key);
        let listing = confirmation_key(&secret, timestamp, "conf");
        prop_assert_eq!(&listing, &confirmation_key(&secret, timestamp, "conf"));
        prop_assert_ne!(&listing, &confirmation_key(&secret, timestamp, "allow"));
    }

    #[test]
    fn confirmation_keys_decode_to_a_sha1_digest(
        key in vec(any::<u8>(), 1..64),
        timestamp in any::<u64>(),
    ) {
        let secret = identity_secret(&key);
        let decoded = STANDARD
            .decode(confirmation_key(&secret, timestamp, "conf"))
            .expect("key is valid base64");
        prop_assert_eq!(decoded.len(), 20);
    }

    #[test]
    fn timestamp_codec_round_trips(secs in any::<u64>()) {
        prop_assert_eq!(decode_timestamp(encode_timestamp(secs)), secs);
    }
}
