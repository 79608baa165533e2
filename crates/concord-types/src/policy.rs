//! Treatment of unclaimed actual items.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What to do with actual rows or sub-messages that no expected item claimed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraPolicy {
    /// Leave them out of the result.
    Ignore,
    /// Report them as informational leaves.
    Info,
    /// Report them as failures.
    #[default]
    Fail,
}

impl ExtraPolicy {
    /// Whether unclaimed items appear in the result at all.
    pub fn is_reported(&self) -> bool {
        !matches!(self, Self::Ignore)
    }
}

impl fmt::Display for ExtraPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => write!(f, "ignore"),
            Self::Info => write!(f, "info"),
            Self::Fail => write!(f, "fail"),
        }
    }
}
