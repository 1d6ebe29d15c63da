//! Local-calendar bucket bounds.
//!
//! Day, ISO week and month boundaries are computed in a configured IANA
//! zone. If the name does not resolve, a fixed UTC offset is used instead.

use chrono::{
    DateTime, Datelike, Days, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc,
};
use chrono_tz::Tz;
use tracing::warn;

use warden_core::config::StatsConfig;
use warden_database::store::StatsWindow;

#[derive(Debug, Clone, Copy)]
enum Zone {
    Named(Tz),
    Fixed(FixedOffset),
}

/// Computes `[start, end)` windows for the current day, week and month.
#[derive(Debug, Clone, Copy)]
pub struct CalendarBuckets {
    zone: Zone,
}

impl CalendarBuckets {
    /// Build from the stats settings.
    pub fn from_config(config: &StatsConfig) -> Self {
        match config.timezone.parse::<Tz>() {
            Ok(tz) => Self {
                zone: Zone::Named(tz),
            },
            Err(_) => {
                warn!(
                    timezone = %config.timezone,
                    offset_hours = config.fallback_offset_hours,
                    "Unknown timezone, using fixed offset"
                );
                Self::fixed(config.fallback_offset_hours)
            }
        }
    }

    /// A zone with a constant offset from UTC.
    pub fn fixed(offset_hours: i32) -> Self {
        let offset = FixedOffset::east_opt(offset_hours * 3600)
            .or_else(|| FixedOffset::east_opt(0))
            .map(Zone::Fixed);
        Self {
            zone: offset.unwrap_or(Zone::Named(Tz::UTC)),
        }
    }

    /// Windows containing `now`.
    pub fn window(&self, now: DateTime<Utc>) -> StatsWindow {
        match self.zone {
            Zone::Named(tz) => window_in(&tz, now),
            Zone::Fixed(offset) => window_in(&offset, now),
        }
    }
}

fn window_in<Z: TimeZone>(zone: &Z, now: DateTime<Utc>) -> StatsWindow {
    let today = now.with_timezone(zone).date_naive();
    let week_start = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
    let month_start = today.with_day(1).unwrap_or(today);
    let next_month = if month_start.month() == 12 {
        NaiveDate::from_ymd_opt(month_start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(month_start.year(), month_start.month() + 1, 1)
    }
    .unwrap_or(month_start);

    StatsWindow {
        day_start: midnight(zone, today),
        day_end: midnight(zone, today + Days::new(1)),
        week_start: midnight(zone, week_start),
        week_end: midnight(zone, week_start + Days::new(7)),
        month_start: midnight(zone, month_start),
        month_end: midnight(zone, next_month),
    }
}

/// Local 00:00 of `date` as UTC. A midnight skipped by a DST jump resolves
/// to the first instant after the gap.
fn midnight<Z: TimeZone>(zone: &Z, date: NaiveDate) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    resolve(zone, local)
        .or_else(|| resolve(zone, local + chrono::Duration::hours(1)))
        .unwrap_or_else(|| local.and_utc())
}

fn resolve<Z: TimeZone>(zone: &Z, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(at) => Some(at.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_minsk_buckets() {
        let buckets = CalendarBuckets::from_config(&StatsConfig::default());
        // 2026-03-04 is a Wednesday; 22:30 UTC is already Thursday 01:30 in Minsk.
        let window = buckets.window(utc(2026, 3, 4, 22, 30));
        assert_eq!(window.day_start, utc(2026, 3, 4, 21, 0));
        assert_eq!(window.day_end, utc(2026, 3, 5, 21, 0));
        assert_eq!(window.week_start, utc(2026, 3, 1, 21, 0));
        assert_eq!(window.week_end, utc(2026, 3, 8, 21, 0));
        assert_eq!(window.month_start, utc(2026, 2, 28, 21, 0));
        assert_eq!(window.month_end, utc(2026, 3, 31, 21, 0));
    }

    #[test]
    fn test_december_rolls_year() {
        let buckets = CalendarBuckets::fixed(0);
        let window = buckets.window(utc(2026, 12, 31, 23, 59));
        assert_eq!(window.month_start, utc(2026, 12, 1, 0, 0));
        assert_eq!(window.month_end, utc(2027, 1, 1, 0, 0));
        assert_eq!(window.week_start, utc(2026, 12, 28, 0, 0));
    }

    #[test]
    fn test_unknown_zone_falls_back_to_offset() {
        let buckets = CalendarBuckets::from_config(&StatsConfig {
            timezone: "Mars/Olympus".into(),
            fallback_offset_hours: 3,
        });
        let window = buckets.window(utc(2026, 6, 10, 12, 0));
        assert_eq!(window.day_start, utc(2026, 6, 9, 21, 0));
    }
}
