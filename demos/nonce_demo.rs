//! Issue a nonce for a form, then replay the submission as the clock moves.
//!
//! - Lifetime is shortened to 4 seconds so the windows are visible.
//! - Run with `RUST_LOG=formnonce=debug` to see the engine's own logging.

use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use formnonce::{
    Action, CheckKind, NonceConfig, NonceEngine, NonceObserver, StaticRequest, StaticSalt,
    TimeProvider, Verification,
};
use tracing_subscriber::EnvFilter;

struct AuditLog;

impl NonceObserver for AuditLog {
    fn verification_failed(&self, nonce: &str, action: &Action, uid: u64, _token: &str) {
        println!("  audit: rejected {nonce} for {action} (user {uid})");
    }

    fn checked(&self, kind: CheckKind, action: &Action, result: Verification) {
        println!("  audit: {kind}({action}) -> {result:?}");
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let now = Arc::new(AtomicU64::new(1_700_000_000));
    let handle = Arc::clone(&now);
    let clock: Arc<dyn TimeProvider> = Arc::new(move || handle.load(Ordering::SeqCst));

    let engine = NonceEngine::builder()
        .salt_provider(&StaticSalt::generate())?
        .config(
            NonceConfig::default()
                .with_lifetime(Duration::from_secs(4))
                .with_admin_url("https://example.com/wp-admin/"),
        )
        .clock(clock)
        .observer(Arc::new(AuditLog))
        .build_validated()?;

    let page = StaticRequest::for_user(7)
        .with_session_token("3f9c2a")
        .with_request_uri("/wp-admin/post.php?post=5&action=edit");
    println!("form:   {}", engine.nonce_field(&page, "delete-post-5", None, true)?);
    println!(
        "link:   {}",
        engine.nonce_url(&page, "https://example.com/wp-admin/post.php?post=5", "delete-post-5", None)?
    );

    let nonce = engine.create_nonce(&page, "delete-post-5")?;
    for elapsed in 0..5 {
        now.store(1_700_000_000 + elapsed, Ordering::SeqCst);
        let submit = StaticRequest::for_user(7)
            .with_session_token("3f9c2a")
            .with_field("_wpnonce", nonce.as_str());
        let check = engine.check_admin_referer(&submit, "delete-post-5", None)?;
        println!(
            "t+{elapsed}s:  accepted={} code={:?} terminated={:?}",
            check.accepted(),
            check.code(),
            check.terminated
        );
    }

    let other_user = StaticRequest::for_user(8).with_session_token("77aa01");
    let result = engine.verify_nonce(&other_user, nonce.as_str(), "delete-post-5")?;
    println!("other user: {result:?}");

    Ok(())
}
