//! Staff role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles shared by the login service and the moderation bot.
///
/// Declaration order matches the database enum order, so `Ord` sorts
/// Owner first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "staff_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Configured owner; never granted through the registry.
    Owner,
    /// Manages moderators and runs every operation except system toggles.
    Admin,
    /// Works the moderation queue.
    Moderator,
    /// No staff capabilities.
    None,
}

impl Role {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Owner => 3,
            Self::Admin => 2,
            Self::Moderator => 1,
            Self::None => 0,
        }
    }

    /// True for any role above `None`.
    pub fn is_staff(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Return the role as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Admin => "ADMIN",
            Self::Moderator => "MODERATOR",
            Self::None => "NONE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = warden_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OWNER" => Ok(Self::Owner),
            "ADMIN" => Ok(Self::Admin),
            "MODERATOR" | "MOD" => Ok(Self::Moderator),
            "NONE" => Ok(Self::None),
            _ => Err(warden_core::AppError::invalid_input(format!(
                "Invalid role: '{s}'. Expected one of: OWNER, ADMIN, MODERATOR, NONE"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Moderator".parse::<Role>().unwrap(), Role::Moderator);
        assert_eq!("mod".parse::<Role>().unwrap(), Role::Moderator);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_uses_uppercase() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"ADMIN\"");
        assert!(Role::Owner.privilege_level() > Role::Admin.privilege_level());
        assert!(!Role::None.is_staff());
    }
}
