use crate::hooks::CheckKind;

/// Configuration and setup failures.
///
/// A nonce that fails to verify is not an error; see
/// [`Verification::Invalid`](crate::Verification::Invalid).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("secret unavailable: {0}")]
    MissingSecret(String),
    #[error("config could not be parsed: {0}")]
    Config(#[from] serde_json::Error),
}

/// Misuse of an adapter by the calling code.
///
/// Adapters never propagate these; they are attached to the returned
/// [`RefererCheck`](crate::RefererCheck) and logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallerError {
    #[error(
        "{check}: you should specify a nonce action to be verified by using the first parameter"
    )]
    MissingAction { check: CheckKind },
}
