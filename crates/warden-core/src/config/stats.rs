//! Work-stats configuration.

use serde::{Deserialize, Serialize};

/// Calendar settings for work-stats buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// IANA zone used for day, week and month boundaries.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Offset from UTC in hours used when the zone name is unknown.
    #[serde(default = "default_fallback_offset")]
    pub fallback_offset_hours: i32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            fallback_offset_hours: default_fallback_offset(),
        }
    }
}

fn default_timezone() -> String {
    "Europe/Minsk".to_string()
}

fn default_fallback_offset() -> i32 {
    3
}
