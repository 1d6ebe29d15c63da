//! Moderator work statistics.

pub mod calendar;
pub mod service;

pub use calendar::CalendarBuckets;
pub use service::{StatsService, WorkReport, WorkTotals};
