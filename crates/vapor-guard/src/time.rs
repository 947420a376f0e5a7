use std::time::{SystemTime, UNIX_EPOCH};

/// Length of one guard-code validity window, in seconds.
pub const CODE_INTERVAL: u64 = 30;

#[must_use]
pub fn encode_timestamp(secs: u64) -> [u8; 8] {
    secs.to_be_bytes()
}

#[must_use]
pub fn decode_timestamp(buf: [u8; 8]) -> u64 {
    u64::from_be_bytes(buf)
}

#[must_use]
pub fn code_window(secs: u64) -> u64 {
    secs / CODE_INTERVAL
}

/// Injected time source. Signed requests read the clock at call time; a
/// timestamp is never cached across calls.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> u64;
}

/// Wall clock, floored to whole seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0)
    }
}

/// Fixed time source for deterministic replay.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_unix(&self) -> u64 {
        self.0
    }
}
