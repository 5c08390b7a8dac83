use std::fmt::{Debug, Formatter};

use rand::RngCore;

use crate::error::Error;

/// Namespace under which nonce key material is requested.
pub const NONCE_NAMESPACE: &str = "nonce";

/// Process-wide secret material, looked up by namespace.
pub trait SaltProvider: Send + Sync {
    fn salt(&self, namespace: &str) -> Result<Vec<u8>, Error>;
}

/// Fixed bytes handed to every namespace.
#[derive(Clone)]
pub struct StaticSalt {
    bytes: Vec<u8>,
}

impl StaticSalt {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// 64 random bytes. Nonces issued under a generated salt do not survive
    /// a process restart.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; 64];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }
}

impl Debug for StaticSalt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSalt")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl SaltProvider for StaticSalt {
    fn salt(&self, _namespace: &str) -> Result<Vec<u8>, Error> {
        Ok(self.bytes.clone())
    }
}

/// Reads `<PREFIX><NAMESPACE>_KEY` and `<PREFIX><NAMESPACE>_SALT` and joins
/// them, e.g. `NONCE_KEY` + `NONCE_SALT` with an empty prefix.
#[derive(Debug, Clone, Default)]
pub struct EnvSalt {
    prefix: String,
}

impl EnvSalt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn var_names(&self, namespace: &str) -> (String, String) {
        let base = format!("{}{}", self.prefix, namespace.to_ascii_uppercase());
        (format!("{base}_KEY"), format!("{base}_SALT"))
    }
}

impl SaltProvider for EnvSalt {
    fn salt(&self, namespace: &str) -> Result<Vec<u8>, Error> {
        let (key_var, salt_var) = self.var_names(namespace);
        let key = std::env::var(&key_var).unwrap_or_default();
        let salt = std::env::var(&salt_var).unwrap_or_default();
        if key.is_empty() && salt.is_empty() {
            return Err(Error::MissingSecret(format!(
                "neither {key_var} nor {salt_var} is set"
            )));
        }
        Ok(format!("{key}{salt}").into_bytes())
    }
}

/// Resolved key material for nonce hashing. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Resolve the `nonce` namespace from `provider`.
    pub fn from_provider(provider: &dyn SaltProvider) -> Result<Self, Error> {
        let bytes = provider.salt(NONCE_NAMESPACE)?;
        if bytes.is_empty() {
            return Err(Error::MissingSecret(format!(
                "salt provider returned no key material for `{NONCE_NAMESPACE}`"
            )));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey(<{} bytes redacted>)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_salt_resolves_for_nonce_namespace() {
        let key = SecretKey::from_provider(&StaticSalt::new("testkey")).unwrap();
        assert_eq!(key.as_bytes(), b"testkey");
    }

    #[test]
    fn empty_salt_is_rejected() {
        let err = SecretKey::from_provider(&StaticSalt::new(Vec::new())).unwrap_err();
        assert!(matches!(err, Error::MissingSecret(_)));
    }

    #[test]
    fn generated_salts_differ() {
        let a = StaticSalt::generate().salt(NONCE_NAMESPACE).unwrap();
        let b = StaticSalt::generate().salt(NONCE_NAMESPACE).unwrap();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn debug_never_prints_key_material() {
        let key = SecretKey::new("super-secret");
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("12 bytes"));
    }

    #[test]
    fn env_salt_joins_key_and_salt() {
        // unique prefix keeps parallel tests from sharing variables
        let provider = EnvSalt::with_prefix("FORMNONCE_TEST_JOIN_");
        std::env::set_var("FORMNONCE_TEST_JOIN_NONCE_KEY", "abc");
        std::env::set_var("FORMNONCE_TEST_JOIN_NONCE_SALT", "def");
        assert_eq!(provider.salt(NONCE_NAMESPACE).unwrap(), b"abcdef");
    }

    #[test]
    fn env_salt_requires_something() {
        let provider = EnvSalt::with_prefix("FORMNONCE_TEST_UNSET_");
        let err = provider.salt(NONCE_NAMESPACE).unwrap_err();
        assert!(matches!(err, Error::MissingSecret(_)));
    }
}
