use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" for tick computation, injectable for tests.
pub trait TimeProvider: Send + Sync {
    /// Seconds since the UNIX epoch.
    fn now_seconds(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

impl<F> TimeProvider for F
where
    F: Fn() -> u64 + Send + Sync,
{
    fn now_seconds(&self) -> u64 {
        self()
    }
}
