//! Extension points consulted by [`NonceEngine`](crate::NonceEngine).
//!
//! Every hook has a default that leaves behaviour unchanged, and plain
//! closures implement the value-returning hooks.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::verify::Verification;

/// Which request adapter produced a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    AdminReferer,
    AjaxReferer,
}

impl Display for CheckKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckKind::AdminReferer => write!(f, "check_admin_referer"),
            CheckKind::AjaxReferer => write!(f, "check_ajax_referer"),
        }
    }
}

/// Remaps the anonymous user id (0) before hashing, e.g. to scope nonces
/// of logged-out visitors by some other attribute.
pub trait AnonymousIdentityHook: Send + Sync {
    fn remap(&self, uid: u64, action: &Action) -> u64;
}

/// Leaves the anonymous id untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAnonymous;

impl AnonymousIdentityHook for KeepAnonymous {
    fn remap(&self, uid: u64, _action: &Action) -> u64 {
        uid
    }
}

impl<F> AnonymousIdentityHook for F
where
    F: Fn(u64, &Action) -> u64 + Send + Sync,
{
    fn remap(&self, uid: u64, action: &Action) -> u64 {
        self(uid, action)
    }
}

/// Overrides the nonce lifetime. Receives the configured lifetime.
pub trait LifetimeHook: Send + Sync {
    fn nonce_life(&self, configured: Duration) -> Duration;
}

/// Uses the configured lifetime as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredLifetime;

impl LifetimeHook for ConfiguredLifetime {
    fn nonce_life(&self, configured: Duration) -> Duration {
        configured
    }
}

impl<F> LifetimeHook for F
where
    F: Fn(Duration) -> Duration + Send + Sync,
{
    fn nonce_life(&self, configured: Duration) -> Duration {
        self(configured)
    }
}

/// Fire-and-forget notifications. Return values are ignored and the
/// verification result never depends on them.
pub trait NonceObserver: Send + Sync {
    /// A non-empty nonce matched neither window.
    fn verification_failed(&self, _nonce: &str, _action: &Action, _uid: u64, _session_token: &str) {}

    /// An adapter finished, whatever the outcome.
    fn checked(&self, _kind: CheckKind, _action: &Action, _result: Verification) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl NonceObserver for NoopObserver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_hooks() {
        let remap = |uid: u64, action: &Action| if action.is_unspecified() { uid } else { 9_999 };
        assert_eq!(remap.remap(0, &Action::from("edit")), 9_999);
        assert_eq!(remap.remap(0, &Action::Unspecified), 0);

        let half = |configured: Duration| configured / 2;
        assert_eq!(half.nonce_life(Duration::from_secs(10)), Duration::from_secs(5));
    }

    #[test]
    fn defaults_are_identity() {
        assert_eq!(KeepAnonymous.remap(0, &Action::Unspecified), 0);
        assert_eq!(
            ConfiguredLifetime.nonce_life(Duration::from_secs(3)),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn check_kind_names() {
        assert_eq!(CheckKind::AdminReferer.to_string(), "check_admin_referer");
        assert_eq!(CheckKind::AjaxReferer.to_string(), "check_ajax_referer");
    }
}
