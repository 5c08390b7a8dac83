//! Wall-clock to tick mapping.
//!
//! A tick spans half a nonce lifetime. Verification accepts the current and
//! the previous tick, so a nonce lives between one half and one full
//! lifetime depending on when inside its tick it was issued.

use std::time::Duration;

use crate::error::Error;

/// Default nonce lifetime: one day.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// `ceil(now / (lifetime / 2))`.
///
/// The lifetime is taken per call so runtime overrides apply immediately.
/// A zero lifetime is a configuration error.
pub fn nonce_tick(now_secs: u64, lifetime: Duration) -> Result<i64, Error> {
    if lifetime.is_zero() {
        return Err(Error::InvalidConfig(
            "nonce lifetime must be greater than zero".into(),
        ));
    }
    let half_life = lifetime.as_secs_f64() / 2.0;
    Ok((now_secs as f64 / half_life).ceil() as i64)
}
