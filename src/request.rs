use std::cell::Cell;
use std::collections::HashMap;

/// Ambient data of the request being served.
///
/// The engine reads identity, session and request fields through this trait
/// and never stores any of it.
pub trait RequestContext {
    /// Current user id; `0` for anonymous callers.
    fn current_user(&self) -> u64;

    /// Token of the logged-in session, if any.
    fn session_token(&self) -> Option<String>;

    /// A query or form field.
    fn field(&self, name: &str) -> Option<String>;

    /// The `Referer` the client sent.
    fn referer(&self) -> Option<String>;

    /// Path and query of the current request.
    fn request_uri(&self) -> Option<String> {
        None
    }

    /// Stop processing the request with `status`.
    fn terminate(&self, status: u16);
}

/// In-memory request, for tests and for frameworks that extract everything
/// up front.
#[derive(Debug, Default)]
pub struct StaticRequest {
    user: u64,
    session_token: Option<String>,
    fields: HashMap<String, String>,
    referer: Option<String>,
    request_uri: Option<String>,
    terminated: Cell<Option<u16>>,
}

impl StaticRequest {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: u64) -> Self {
        Self {
            user,
            ..Self::default()
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_request_uri(mut self, uri: impl Into<String>) -> Self {
        self.request_uri = Some(uri.into());
        self
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove_field(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    /// Status passed to the last [`RequestContext::terminate`] call.
    pub fn terminated(&self) -> Option<u16> {
        self.terminated.get()
    }
}

impl RequestContext for StaticRequest {
    fn current_user(&self) -> u64 {
        self.user
    }

    fn session_token(&self) -> Option<String> {
        self.session_token.clone()
    }

    fn field(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    fn referer(&self) -> Option<String> {
        self.referer.clone()
    }

    fn request_uri(&self) -> Option<String> {
        self.request_uri.clone()
    }

    fn terminate(&self, status: u16) {
        self.terminated.set(Some(status));
    }
}
