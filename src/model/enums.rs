//! Enumerated column values: roles, visibility, edge types, stream statuses.
//!
//! Each enum stores as its lowercase snake_case string and parses strictly
//! through [`FromStr`]. Lenient parsing with synonyms lives in
//! [`crate::validate`].

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who produced an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Assistant,
    System,
    Tool,
}

impl Role {
    pub const ALL: [Self; 4] = [Self::User, Self::Assistant, Self::System, Self::Tool];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Tool => "tool",
        }
    }
}

/// Item visibility.
///
/// - `Visible`: shown in the UI and included in LLM context
/// - `Hidden`: kept out of the UI but still in LLM context
/// - `Archived`: excluded from both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Archived,
}

impl Visibility {
    pub const ALL: [Self; 3] = [Self::Visible, Self::Hidden, Self::Archived];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Archived => "archived",
        }
    }

    /// Whether an item with this visibility belongs in the UI.
    #[must_use]
    pub const fn is_displayed(&self) -> bool {
        matches!(self, Self::Visible)
    }

    /// Whether an item with this visibility belongs in LLM context.
    #[must_use]
    pub const fn in_context(&self) -> bool {
        !matches!(self, Self::Archived)
    }
}

/// Kind of dependency between two items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// The target item depends on the source item.
    #[default]
    DependsOn,
    /// The target item was caused by the source item.
    CausedBy,
}

impl EdgeType {
    pub const ALL: [Self; 2] = [Self::DependsOn, Self::CausedBy];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DependsOn => "depends_on",
            Self::CausedBy => "caused_by",
        }
    }
}

/// Lifecycle state of a resumable stream.
///
/// `Active` is the only non-terminal state. Every stream leaves it at most
/// once, into exactly one of the three terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamStatus {
    #[default]
    Active,
    Completed,
    Aborted,
    Expired,
}

impl StreamStatus {
    pub const ALL: [Self; 4] = [Self::Active, Self::Completed, Self::Aborted, Self::Expired];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Expired => "expired",
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

macro_rules! string_enum_impls {
    ($ty:ident, $label:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| Error::InvalidArgument(format!("unknown {} '{s}'", $label)))
            }
        }
    };
}

string_enum_impls!(Role, "role");
string_enum_impls!(Visibility, "visibility");
string_enum_impls!(EdgeType, "edge type");
string_enum_impls!(StreamStatus, "stream status");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!("caused_by".parse::<EdgeType>().unwrap(), EdgeType::CausedBy);
        assert!("robot".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&EdgeType::DependsOn).unwrap(),
            "\"depends_on\""
        );
        let status: StreamStatus = serde_json::from_str("\"expired\"").unwrap();
        assert_eq!(status, StreamStatus::Expired);
    }

    #[test]
    fn test_only_active_is_live() {
        assert!(!StreamStatus::Active.is_terminal());
        for terminal in [
            StreamStatus::Completed,
            StreamStatus::Aborted,
            StreamStatus::Expired,
        ] {
            assert!(terminal.is_terminal());
        }
    }

    #[test]
    fn test_visibility_sets() {
        assert!(Visibility::Visible.is_displayed());
        assert!(!Visibility::Hidden.is_displayed());
        assert!(Visibility::Hidden.in_context());
        assert!(!Visibility::Archived.in_context());
    }
}
