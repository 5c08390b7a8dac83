use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::digest::{HmacMd5Digest, KeyedDigest};
use crate::error::Error;
use crate::tick::nonce_tick;

/// Number of characters in an issued nonce.
pub const NONCE_LEN: usize = 10;

/// Characters skipped at the very end of the digest.
const TAIL_SKIP: usize = 2;

/// An issued nonce: ten hex characters cut from the digest tail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(String);

impl Nonce {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Characters `[len - 12, len - 2)` of a hex digest.
    fn from_digest(digest: &str) -> Self {
        let end = digest.len().saturating_sub(TAIL_SKIP);
        let start = end.saturating_sub(NONCE_LEN);
        Self(digest.get(start..end).unwrap_or_default().to_owned())
    }
}

impl Display for Nonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Nonce {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Message hashed for one tick: `tick|action|uid|token`.
pub(crate) fn nonce_message(tick: i64, action: &Action, uid: u64, session_token: &str) -> String {
    format!("{tick}|{action}|{uid}|{session_token}")
}

/// Derive the nonce for an explicit tick. Pure.
pub fn derive_nonce(
    digest: &dyn KeyedDigest,
    key: &[u8],
    tick: i64,
    action: &Action,
    uid: u64,
    session_token: &str,
) -> Nonce {
    let message = nonce_message(tick, action, uid, session_token);
    Nonce::from_digest(&digest.digest_hex(message.as_bytes(), key))
}

/// Nonce for the tick containing `now_secs`, using HMAC-MD5.
pub fn create_nonce(
    action: &Action,
    uid: u64,
    session_token: &str,
    now_secs: u64,
    lifetime: Duration,
    key: &[u8],
) -> Result<Nonce, Error> {
    create_nonce_with(&HmacMd5Digest, action, uid, session_token, now_secs, lifetime, key)
}

/// [`create_nonce`] with a caller-chosen digest.
pub fn create_nonce_with(
    digest: &dyn KeyedDigest,
    action: &Action,
    uid: u64,
    session_token: &str,
    now_secs: u64,
    lifetime: Duration,
    key: &[u8],
) -> Result<Nonce, Error> {
    let tick = nonce_tick(now_secs, lifetime)?;
    Ok(derive_nonce(digest, key, tick, action, uid, session_token))
}
