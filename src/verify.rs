use std::time::Duration;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::action::Action;
use crate::digest::{HmacMd5Digest, KeyedDigest};
use crate::error::Error;
use crate::nonce::derive_nonce;
use crate::tick::nonce_tick;

/// Outcome of checking a presented nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    /// Issued during the current tick.
    Fresh,
    /// Issued during the previous tick; still accepted.
    Stale,
    /// Empty, expired, forged or bound to something else.
    Invalid,
}

impl Verification {
    pub fn is_valid(self) -> bool {
        !matches!(self, Verification::Invalid)
    }

    /// Legacy numeric form: `1` fresh, `2` stale, `None` invalid.
    pub fn code(self) -> Option<u8> {
        match self {
            Verification::Fresh => Some(1),
            Verification::Stale => Some(2),
            Verification::Invalid => None,
        }
    }
}

/// Byte comparison whose running time does not depend on where the inputs
/// first differ. Inputs of different length compare unequal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Check `presented` against the current and previous tick using HMAC-MD5.
///
/// Only configuration problems (a zero lifetime) produce `Err`; anything
/// wrong with the nonce itself is [`Verification::Invalid`].
pub fn verify_nonce(
    presented: &str,
    action: &Action,
    uid: u64,
    session_token: &str,
    now_secs: u64,
    lifetime: Duration,
    key: &[u8],
) -> Result<Verification, Error> {
    verify_nonce_with(
        &HmacMd5Digest,
        presented,
        action,
        uid,
        session_token,
        now_secs,
        lifetime,
        key,
    )
}

/// [`verify_nonce`] with a caller-chosen digest.
#[allow(clippy::too_many_arguments)]
pub fn verify_nonce_with(
    digest: &dyn KeyedDigest,
    presented: &str,
    action: &Action,
    uid: u64,
    session_token: &str,
    now_secs: u64,
    lifetime: Duration,
    key: &[u8],
) -> Result<Verification, Error> {
    // lifetime is checked before the empty short-circuit
    let tick = nonce_tick(now_secs, lifetime)?;
    if presented.is_empty() {
        return Ok(Verification::Invalid);
    }

    for (offset, window) in [(0, Verification::Fresh), (1, Verification::Stale)] {
        let expected = derive_nonce(digest, key, tick - offset, action, uid, session_token);
        if constant_time_eq(expected.as_str().as_bytes(), presented.as_bytes()) {
            return Ok(window);
        }
    }
    Ok(Verification::Invalid)
}
