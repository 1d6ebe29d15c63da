//! Work-stats report.

use std::sync::Arc;

use serde::Serialize;

use warden_core::clock::Clock;
use warden_core::result::AppResult;
use warden_database::store::{ModerationStore, StatsWindow};
use warden_entity::moderation::ActorWorkStats;

use super::calendar::CalendarBuckets;
use crate::access::Capability;
use crate::context::Actor;

/// Decision counts summed over every actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkTotals {
    /// Current local day.
    pub day: i64,
    /// Current ISO week.
    pub week: i64,
    /// Current month.
    pub month: i64,
    /// All time.
    pub all: i64,
}

/// Totals plus the per-actor breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct WorkReport {
    /// Bucket bounds used.
    #[serde(skip)]
    pub window: StatsWindow,
    /// Sums.
    pub totals: WorkTotals,
    /// Ordered by `all DESC, actor ASC, role ASC`.
    pub rows: Vec<ActorWorkStats>,
}

/// Aggregates the moderation action log.
#[derive(Clone)]
pub struct StatsService {
    queue: Arc<dyn ModerationStore>,
    calendar: CalendarBuckets,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for StatsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsService")
            .field("calendar", &self.calendar)
            .finish_non_exhaustive()
    }
}

impl StatsService {
    /// Creates a stats service.
    pub fn new(
        queue: Arc<dyn ModerationStore>,
        calendar: CalendarBuckets,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            queue,
            calendar,
            clock,
        }
    }

    /// Report for the buckets containing now.
    pub async fn report(&self, actor: &Actor) -> AppResult<WorkReport> {
        actor.require(Capability::ViewStats)?;
        let window = self.calendar.window(self.clock.now());
        let rows = self.queue.work_stats(&window).await?;
        let totals = rows.iter().fold(WorkTotals::default(), |acc, row| WorkTotals {
            day: acc.day + row.day,
            week: acc.week + row.week,
            month: acc.month + row.month,
            all: acc.all + row.all,
        });
        Ok(WorkReport {
            window,
            totals,
            rows,
        })
    }
}
