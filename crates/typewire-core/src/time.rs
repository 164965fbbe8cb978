use std::time::{SystemTime, UNIX_EPOCH};

/// Monotonic-enough wall clock used for speed and timestamp computations
/// (source spec §6, `Clock.nowMillis()`). A trait so tests can supply a
/// deterministic clock instead of the system one.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
    }
}
