//! Periodic purge of dead login state.
//!
//! Expired challenges, setup tokens and ended sessions are kept for a day
//! so that operators can be traced after an incident, then deleted.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use warden_core::clock::Clock;
use warden_core::config::SessionConfig;
use warden_core::result::AppResult;
use warden_database::Stores;
use warden_database::store::{ChallengeStore, SessionStore, TotpSetupStore};

/// How long dead rows are retained before deletion.
pub const RETENTION_HOURS: i64 = 24;

/// Rows deleted by one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Login challenges.
    pub challenges: u64,
    /// TOTP setup tokens.
    pub setup_tokens: u64,
    /// Sessions.
    pub sessions: u64,
}

impl CleanupReport {
    fn total(&self) -> u64 {
        self.challenges + self.setup_tokens + self.sessions
    }
}

/// Background purger for challenges, setup tokens and sessions.
pub struct StateCleanup {
    challenges: Arc<dyn ChallengeStore>,
    setup_tokens: Arc<dyn TotpSetupStore>,
    sessions: Arc<dyn SessionStore>,
    interval: StdDuration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for StateCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCleanup")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl StateCleanup {
    /// Create a purger over the given stores.
    pub fn new(stores: &Stores, config: &SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            challenges: stores.challenges.clone(),
            setup_tokens: stores.totp_setups.clone(),
            sessions: stores.sessions.clone(),
            interval: StdDuration::from_secs(config.cleanup_interval_minutes.max(1) * 60),
            clock,
        }
    }

    /// Delete everything that ended more than [`RETENTION_HOURS`] ago.
    pub async fn run_once(&self) -> AppResult<CleanupReport> {
        let cutoff = self.clock.now() - Duration::hours(RETENTION_HOURS);

        let report = CleanupReport {
            challenges: self.challenges.purge_expired(cutoff).await?,
            setup_tokens: self.setup_tokens.purge_expired(cutoff).await?,
            sessions: self.sessions.purge_expired(cutoff).await?,
        };

        if report.total() > 0 {
            info!(
                challenges = report.challenges,
                setup_tokens = report.setup_tokens,
                sessions = report.sessions,
                "Purged expired login state"
            );
        } else {
            debug!("Nothing to purge");
        }

        Ok(report)
    }

    /// Purge on every interval tick until `cancel` flips to `true`.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.interval.as_secs(), "State cleanup started");

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        error!(error = %e, "State cleanup pass failed");
                    }
                }
            }
        }

        info!("State cleanup stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use warden_core::clock::ManualClock;
    use warden_database::MemoryStore;
    use warden_database::store::OperatorStore;
    use warden_entity::auth::{CreateChallenge, CreateSession};
    use warden_entity::operator::{CreateOperator, Role};

    #[tokio::test]
    async fn test_purges_only_past_retention() {
        let now = Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(now));
        let store = Arc::new(MemoryStore::new());
        let stores = Stores::from_memory(store.clone());

        let op = OperatorStore::create(
            store.as_ref(),
            &CreateOperator {
                external_id: 7,
                login_handle: None,
                display_name: None,
                role: Role::Admin,
                password_hash: "x".into(),
            },
            now,
        )
        .await
        .unwrap();

        ChallengeStore::create(
            store.as_ref(),
            &CreateChallenge {
                operator_id: op.id,
                expires_at: now + Duration::minutes(5),
                ip: None,
                user_agent: None,
            },
            now,
        )
        .await
        .unwrap();

        SessionStore::create(
            store.as_ref(),
            &CreateSession {
                operator_id: op.id,
                now,
                idle_expires_at: now + Duration::minutes(30),
                max_expires_at: now + Duration::hours(12),
                ip: None,
                user_agent: None,
            },
        )
        .await
        .unwrap();

        let cleanup = StateCleanup::new(&stores, &SessionConfig::default(), clock.clone());
        assert_eq!(cleanup.run_once().await.unwrap(), CleanupReport::default());

        clock.advance(Duration::hours(25));
        let report = cleanup.run_once().await.unwrap();
        assert_eq!(
            report,
            CleanupReport {
                challenges: 1,
                setup_tokens: 0,
                sessions: 1,
            }
        );
    }
}
