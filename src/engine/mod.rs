use crate::action::Action;
use crate::config::NonceConfig;
use crate::digest::{HmacMd5Digest, KeyedDigest};
use crate::error::Error;
use crate::hooks::{
    AnonymousIdentityHook, ConfiguredLifetime, KeepAnonymous, LifetimeHook, NonceObserver,
    NoopObserver,
};
use crate::nonce::{create_nonce_with, Nonce};
use crate::request::RequestContext;
use crate::secret::{SaltProvider, SecretKey};
use crate::time::{SystemTimeProvider, TimeProvider};
use crate::verify::{verify_nonce_with, Verification};
use derive_builder::Builder;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

/// Issues and verifies nonces for the request in hand.
///
/// Holds only immutable process-wide material, so one engine can be shared
/// behind an `Arc` by every request handler.
#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct NonceEngine {
    secret: SecretKey,
    #[builder(default)]
    config: NonceConfig,
    #[builder(default = "Arc::new(SystemTimeProvider)")]
    clock: Arc<dyn TimeProvider>,
    #[builder(default = "Arc::new(HmacMd5Digest)")]
    digest: Arc<dyn KeyedDigest>,
    #[builder(default = "Arc::new(KeepAnonymous)")]
    anonymous_hook: Arc<dyn AnonymousIdentityHook>,
    #[builder(default = "Arc::new(ConfiguredLifetime)")]
    lifetime_hook: Arc<dyn LifetimeHook>,
    #[builder(default = "Arc::new(NoopObserver)")]
    pub(crate) observer: Arc<dyn NonceObserver>,
}

impl NonceEngineBuilder {
    /// Resolve the secret from `provider` once, now.
    pub fn salt_provider(self, provider: &dyn SaltProvider) -> Result<Self, Error> {
        Ok(self.secret(SecretKey::from_provider(provider)?))
    }

    fn validate(&self) -> Result<(), Error> {
        match &self.secret {
            None => {
                return Err(Error::MissingSecret(
                    "a secret key or salt provider must be supplied".into(),
                ))
            }
            Some(secret) if secret.is_empty() => {
                return Err(Error::MissingSecret("secret key must not be empty".into()))
            }
            Some(_) => {}
        }
        if let Some(config) = &self.config {
            config.validate()?;
        }
        Ok(())
    }

    pub fn build_validated(self) -> Result<NonceEngine, Error> {
        self.validate()?;
        self.build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

impl Debug for NonceEngine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceEngine")
            .field("secret", &self.secret)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NonceEngine {
    pub fn builder() -> NonceEngineBuilder {
        NonceEngineBuilder::default()
    }

    pub fn config(&self) -> &NonceConfig {
        &self.config
    }

    /// Lifetime in force right now, after the override hook.
    pub fn lifetime(&self) -> Duration {
        self.lifetime_hook.nonce_life(self.config.lifetime())
    }

    /// User id that nonces for this request are bound to.
    pub fn identity(&self, ctx: &dyn RequestContext, action: &Action) -> u64 {
        let uid = ctx.current_user();
        if uid == 0 {
            self.anonymous_hook.remap(uid, action)
        } else {
            uid
        }
    }

    /// Nonce for `action`, bound to the current user, session and tick.
    pub fn create_nonce(
        &self,
        ctx: &dyn RequestContext,
        action: impl Into<Action>,
    ) -> Result<Nonce, Error> {
        let action = action.into();
        let uid = self.identity(ctx, &action);
        let token = ctx.session_token().unwrap_or_default();
        let nonce = create_nonce_with(
            self.digest.as_ref(),
            &action,
            uid,
            &token,
            self.clock.now_seconds(),
            self.lifetime(),
            self.secret.as_bytes(),
        )?;
        tracing::debug!(action = %action, uid, "nonce issued");
        Ok(nonce)
    }

    /// Check `nonce` for `action` against the current and previous tick.
    pub fn verify_nonce(
        &self,
        ctx: &dyn RequestContext,
        nonce: &str,
        action: impl Into<Action>,
    ) -> Result<Verification, Error> {
        let action = action.into();
        let uid = self.identity(ctx, &action);
        let token = ctx.session_token().unwrap_or_default();
        let result = verify_nonce_with(
            self.digest.as_ref(),
            nonce,
            &action,
            uid,
            &token,
            self.clock.now_seconds(),
            self.lifetime(),
            self.secret.as_bytes(),
        )?;

        if result == Verification::Invalid && !nonce.is_empty() {
            tracing::debug!(action = %action, uid, "nonce verification failed");
            self.observer.verification_failed(nonce, &action, uid, &token);
        } else {
            tracing::debug!(action = %action, uid, result = ?result, "nonce verified");
        }
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::hooks::CheckKind;
    use crate::request::StaticRequest;
    use crate::secret::StaticSalt;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// Clock the test moves by hand.
    pub(crate) fn manual_clock(start: u64) -> (Arc<AtomicU64>, Arc<dyn TimeProvider>) {
        let now = Arc::new(AtomicU64::new(start));
        let handle = Arc::clone(&now);
        let clock: Arc<dyn TimeProvider> = Arc::new(move || handle.load(Ordering::SeqCst));
        (now, clock)
    }

    /// Two-second lifetime: ticks advance every second.
    pub(crate) fn test_engine(clock: Arc<dyn TimeProvider>) -> NonceEngineBuilder {
        NonceEngine::builder()
            .secret(SecretKey::new("testkey"))
            .config(NonceConfig::default().with_lifetime(Duration::from_secs(2)))
            .clock(clock)
    }

    #[derive(Default)]
    pub(crate) struct RecordingObserver {
        pub failed: Mutex<Vec<(String, String, u64, String)>>,
        pub checked: Mutex<Vec<(CheckKind, String, Verification)>>,
    }

    impl NonceObserver for RecordingObserver {
        fn verification_failed(&self, nonce: &str, action: &Action, uid: u64, token: &str) {
            self.failed.lock().unwrap().push((
                nonce.to_owned(),
                action.to_string(),
                uid,
                token.to_owned(),
            ));
        }

        fn checked(&self, kind: CheckKind, action: &Action, result: Verification) {
            self.checked
                .lock()
                .unwrap()
                .push((kind, action.to_string(), result));
        }
    }

    #[test]
    fn build_requires_secret() {
        let err = NonceEngine::builder()
            .build_validated()
            .expect_err("secret is mandatory");
        assert!(matches!(err, Error::MissingSecret(_)));
    }

    #[test]
    fn build_rejects_empty_secret_and_bad_config() {
        let err = NonceEngine::builder()
            .secret(SecretKey::new(Vec::new()))
            .build_validated()
            .unwrap_err();
        assert!(matches!(err, Error::MissingSecret(_)));

        let err = NonceEngine::builder()
            .secret(SecretKey::new("k"))
            .config(NonceConfig {
                lifetime_secs: 0,
                ..NonceConfig::default()
            })
            .build_validated()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn salt_provider_feeds_the_secret() {
        let engine = NonceEngine::builder()
            .salt_provider(&StaticSalt::new("testkey"))
            .unwrap()
            .clock(Arc::new(|| 1_700_000_000u64))
            .build_validated()
            .unwrap();
        let nonce = engine
            .create_nonce(&StaticRequest::anonymous(), Action::Unspecified)
            .unwrap();
        assert_eq!(nonce.as_str(), "bbbd851e8f");
        assert!(!format!("{engine:?}").contains("testkey"));
    }

    #[test]
    fn session_token_comes_from_the_request() {
        let engine = NonceEngine::builder()
            .secret(SecretKey::new("testkey"))
            .clock(Arc::new(|| 1_700_000_000u64))
            .build_validated()
            .unwrap();
        let req = StaticRequest::for_user(42).with_session_token("sess-abc");
        assert_eq!(
            engine.create_nonce(&req, "test_action").unwrap().as_str(),
            "4cb7b37eb2"
        );
    }

    #[test]
    fn windows_through_the_engine() {
        let (now, clock) = manual_clock(0);
        let engine = test_engine(clock).build_validated().unwrap();
        let req = StaticRequest::for_user(7).with_session_token("abc");

        let nonce = engine.create_nonce(&req, "customAction").unwrap();
        assert_eq!(
            engine.verify_nonce(&req, nonce.as_str(), "customAction").unwrap(),
            Verification::Fresh
        );
        now.store(1, Ordering::SeqCst);
        assert_eq!(
            engine.verify_nonce(&req, nonce.as_str(), "customAction").unwrap(),
            Verification::Stale
        );
        now.store(2, Ordering::SeqCst);
        assert_eq!(
            engine.verify_nonce(&req, nonce.as_str(), "customAction").unwrap(),
            Verification::Invalid
        );
    }

    #[test]
    fn lifetime_hook_is_read_on_every_call() {
        let (_now, clock) = manual_clock(100);
        let life = Arc::new(AtomicU64::new(2));
        let life_handle = Arc::clone(&life);
        let engine = test_engine(clock)
            .lifetime_hook(Arc::new(move |_configured: Duration| {
                Duration::from_secs(life_handle.load(Ordering::SeqCst))
            }))
            .build_validated()
            .unwrap();
        assert_eq!(engine.lifetime(), Duration::from_secs(2));
        life.store(86_400, Ordering::SeqCst);
        assert_eq!(engine.lifetime(), Duration::from_secs(86_400));

        life.store(0, Ordering::SeqCst);
        let err = engine
            .create_nonce(&StaticRequest::anonymous(), "edit")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn anonymous_hook_only_applies_to_logged_out_users() {
        let (_now, clock) = manual_clock(0);
        let engine = test_engine(clock)
            .anonymous_hook(Arc::new(|uid: u64, _action: &Action| uid + 1_000))
            .build_validated()
            .unwrap();
        assert_eq!(
            engine.identity(&StaticRequest::anonymous(), &Action::Unspecified),
            1_000
        );
        assert_eq!(
            engine.identity(&StaticRequest::for_user(5), &Action::Unspecified),
            5
        );

        let anon = engine
            .create_nonce(&StaticRequest::anonymous(), "edit")
            .unwrap();
        let user_1000 = engine
            .create_nonce(&StaticRequest::for_user(1_000), "edit")
            .unwrap();
        assert_eq!(anon, user_1000);
    }

    #[test]
    fn failed_verification_notifies_observer() {
        let (_now, clock) = manual_clock(0);
        let observer = Arc::new(RecordingObserver::default());
        let engine = test_engine(clock)
            .observer(observer.clone())
            .build_validated()
            .unwrap();
        let req = StaticRequest::for_user(3).with_session_token("tok");

        assert_eq!(
            engine.verify_nonce(&req, "", "edit").unwrap(),
            Verification::Invalid
        );
        assert!(observer.failed.lock().unwrap().is_empty());

        assert_eq!(
            engine.verify_nonce(&req, "deadbeef00", "edit").unwrap(),
            Verification::Invalid
        );
        let failed = observer.failed.lock().unwrap();
        assert_eq!(
            failed.as_slice(),
            &[(
                "deadbeef00".to_owned(),
                "edit".to_owned(),
                3,
                "tok".to_owned()
            )]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_share_one_engine() {
        let engine = Arc::new(
            NonceEngine::builder()
                .secret(SecretKey::new("testkey"))
                .clock(Arc::new(|| 1_700_000_000u64))
                .build_validated()
                .unwrap(),
        );

        let mut handles = Vec::new();
        for user in 1..=32u64 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::task::spawn_blocking(move || {
                let req = StaticRequest::for_user(user).with_session_token(format!("s{user}"));
                let nonce = engine.create_nonce(&req, "edit").unwrap();
                let mine = engine.verify_nonce(&req, nonce.as_str(), "edit").unwrap();
                let other = StaticRequest::for_user(user + 100);
                let theirs = engine.verify_nonce(&other, nonce.as_str(), "edit").unwrap();
                (mine, theirs)
            }));
        }
        for handle in handles {
            let (mine, theirs) = handle.await.unwrap();
            assert_eq!(mine, Verification::Fresh);
            assert_eq!(theirs, Verification::Invalid);
        }
    }
}
