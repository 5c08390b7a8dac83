use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// What a nonce protects, e.g. `"delete-post-5"`.
///
/// [`Action::Unspecified`] renders as `-1` and matches any other unspecified
/// action, so any caller can reproduce it. Adapters refuse to check it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Action {
    #[default]
    Unspecified,
    Id(i64),
    Name(String),
}

impl Action {
    /// Sentinel value shared by every unspecified action.
    pub const SENTINEL: i64 = -1;

    /// True for the sentinel in any of its spellings.
    pub fn is_unspecified(&self) -> bool {
        match self {
            Action::Unspecified => true,
            Action::Id(id) => *id == Self::SENTINEL,
            Action::Name(name) => name.trim() == "-1",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Unspecified => write!(f, "{}", Self::SENTINEL),
            Action::Id(id) => write!(f, "{id}"),
            Action::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        Action::Name(name.to_owned())
    }
}

impl From<String> for Action {
    fn from(name: String) -> Self {
        Action::Name(name)
    }
}

impl From<i64> for Action {
    fn from(id: i64) -> Self {
        Action::Id(id)
    }
}

impl From<i32> for Action {
    fn from(id: i32) -> Self {
        Action::Id(i64::from(id))
    }
}

impl From<&Action> for Action {
    fn from(action: &Action) -> Self {
        action.clone()
    }
}
