//! Shared domain enumerations.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Directed relation kinds tracked by the social graph.
///
/// A favorite points from a user to a video; a follow points from a user to
/// another user. Each kind owns its own relation table, counter column and
/// cache namespace, so pairs of different kinds never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Favorite,
    Follow,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Favorite => "favorite",
            RelationKind::Follow => "follow",
        }
    }

    /// Namespace segment used when encoding cache keys.
    pub fn cache_namespace(self) -> &'static str {
        match self {
            RelationKind::Favorite => "fav",
            RelationKind::Follow => "follow",
        }
    }

    /// Entity type on the target side of the edge.
    pub fn target_entity(self) -> &'static str {
        match self {
            RelationKind::Favorite => "video",
            RelationKind::Follow => "user",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "favorite" | "fav" | "like" => Ok(RelationKind::Favorite),
            "follow" => Ok(RelationKind::Follow),
            other => Err(DomainError::validation(format!(
                "unknown relation kind `{other}` (expected `favorite` or `follow`)"
            ))),
        }
    }
}
