//! Study ending reasons.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classified cause for terminating the study on this install.
///
/// Serialized as its wire name (`"ineligible"`, `"expired"`,
/// `"user-disable"`, or the study-defined name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EndingReason {
    /// First-run eligibility check refused enrollment.
    Ineligible,
    /// `expireAt` has passed.
    Expired,
    /// The user disabled or uninstalled the study.
    UserDisable,
    /// Any other ending the study config defines.
    Custom(String),
}

impl EndingReason {
    /// Name used in config `endings` keys, telemetry and URL templates.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ineligible => "ineligible",
            Self::Expired => "expired",
            Self::UserDisable => "user-disable",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for EndingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EndingReason {
    fn from(name: String) -> Self {
        match name.as_str() {
            "ineligible" => Self::Ineligible,
            "expired" => Self::Expired,
            "user-disable" => Self::UserDisable,
            _ => Self::Custom(name),
        }
    }
}

impl From<&str> for EndingReason {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<EndingReason> for String {
    fn from(reason: EndingReason) -> Self {
        reason.as_str().to_string()
    }
}

impl FromStr for EndingReason {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}
