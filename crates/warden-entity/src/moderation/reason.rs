//! Rejection reason codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why a profile was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reject_reason", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// No face visible on the photos.
    PhotoNoFace,
    /// Photos show someone else.
    PhotoFakeNotYou,
    /// Photos contain prohibited content.
    PhotoProhibited,
    /// Video circle does not match the photos.
    CircleMismatch,
    /// Video circle could not be checked.
    CircleFailed,
    /// Required profile fields are missing.
    ProfileIncomplete,
    /// Spam, ads or links.
    SpamAdsLinks,
    /// Looks automated.
    BotSuspect,
    /// Free-form reason.
    Other,
}

impl RejectReason {
    /// Every code in display order.
    pub const ALL: [RejectReason; 9] = [
        Self::PhotoNoFace,
        Self::PhotoFakeNotYou,
        Self::PhotoProhibited,
        Self::CircleMismatch,
        Self::CircleFailed,
        Self::ProfileIncomplete,
        Self::SpamAdsLinks,
        Self::BotSuspect,
        Self::Other,
    ];

    /// Wire code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhotoNoFace => "PHOTO_NO_FACE",
            Self::PhotoFakeNotYou => "PHOTO_FAKE_NOT_YOU",
            Self::PhotoProhibited => "PHOTO_PROHIBITED",
            Self::CircleMismatch => "CIRCLE_MISMATCH",
            Self::CircleFailed => "CIRCLE_FAILED",
            Self::ProfileIncomplete => "PROFILE_INCOMPLETE",
            Self::SpamAdsLinks => "SPAM_ADS_LINKS",
            Self::BotSuspect => "BOT_SUSPECT",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RejectReason {
    type Err = warden_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| warden_core::AppError::invalid_input(format!("Unknown reason code: '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_code_parses_back() {
        for reason in RejectReason::ALL {
            assert_eq!(reason.as_str().parse::<RejectReason>().unwrap(), reason);
        }
        assert!("NOT_A_CODE".parse::<RejectReason>().is_err());
    }
}
