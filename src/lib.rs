//! Stateless anti-forgery nonces for forms and ajax requests.
//!
//! A nonce binds a request to an action, a user, a session and a coarse
//! time window. Nothing is stored: the server recomputes the expected value
//! from a process-wide secret and compares it in constant time.
//!
//! - [`nonce_tick`] maps wall-clock time to half-lifetime ticks.
//! - [`hmac_md5_hex`] is the keyed digest; [`KeyedDigest`] makes it pluggable.
//! - [`create_nonce`] / [`verify_nonce`] are the pure core. Verification
//!   accepts the current tick ([`Verification::Fresh`]) and the previous
//!   one ([`Verification::Stale`]).
//! - [`NonceEngine`] binds the core to the ambient request through
//!   [`RequestContext`] and adds the admin/ajax referer checks.
//!
//! ```
//! use formnonce::{NonceEngine, SecretKey, StaticRequest, Verification};
//!
//! let engine = NonceEngine::builder()
//!     .secret(SecretKey::new("long-random-secret"))
//!     .build_validated()
//!     .unwrap();
//!
//! let req = StaticRequest::for_user(7).with_session_token("session-token");
//! let nonce = engine.create_nonce(&req, "delete-post-5").unwrap();
//! assert_eq!(nonce.as_str().len(), 10);
//!
//! let result = engine.verify_nonce(&req, nonce.as_str(), "delete-post-5").unwrap();
//! assert_eq!(result, Verification::Fresh);
//!
//! let other = engine.verify_nonce(&req, nonce.as_str(), "delete-post-6").unwrap();
//! assert_eq!(other, Verification::Invalid);
//! ```

pub mod action;
pub mod config;
pub mod digest;
pub mod engine;
pub mod error;
#[cfg(feature = "forms")]
pub mod form;
pub mod hooks;
pub mod nonce;
pub mod referer;
pub mod request;
pub mod secret;
pub mod tick;
pub mod time;
pub mod verify;

pub use action::Action;
pub use config::NonceConfig;
pub use digest::{hmac_md5_hex, HmacMd5Digest, KeyedDigest};
pub use engine::{NonceEngine, NonceEngineBuilder};
pub use error::{CallerError, Error};
pub use hooks::{
    AnonymousIdentityHook, CheckKind, ConfiguredLifetime, KeepAnonymous, LifetimeHook,
    NonceObserver, NoopObserver,
};
pub use nonce::{create_nonce, create_nonce_with, derive_nonce, Nonce, NONCE_LEN};
pub use referer::{RefererCheck, FORBIDDEN};
pub use request::{RequestContext, StaticRequest};
pub use secret::{EnvSalt, SaltProvider, SecretKey, StaticSalt, NONCE_NAMESPACE};
pub use tick::{nonce_tick, DEFAULT_LIFETIME};
pub use time::{SystemTimeProvider, TimeProvider};
pub use verify::{constant_time_eq, verify_nonce, verify_nonce_with, Verification};
