//! Long-poll loop.
//!
//! Fetches batches with `getUpdates` and hands each update to its own task,
//! at most `bot.concurrency` at a time. On shutdown the loop stops polling,
//! waits for in-flight updates and confirms the last offset.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Semaphore, watch};
use tokio::time;
use tracing::{debug, info, warn};

use warden_core::result::AppResult;

use crate::router::UpdateRouter;
use crate::telegram::{BotApi, Update};

/// Where updates come from.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Updates with `update_id >= offset`, waiting up to `timeout_secs`.
    async fn updates(&self, offset: i64, timeout_secs: u64) -> AppResult<Vec<Update>>;
}

#[async_trait]
impl UpdateSource for BotApi {
    async fn updates(&self, offset: i64, timeout_secs: u64) -> AppResult<Vec<Update>> {
        self.get_updates(offset, timeout_secs).await
    }
}

/// Polls a source and dispatches updates to the router.
pub struct PollRunner {
    source: Arc<dyn UpdateSource>,
    router: Arc<UpdateRouter>,
    concurrency: usize,
    poll_timeout: u64,
    retry_delay: Duration,
    drain_timeout: Duration,
}

impl std::fmt::Debug for PollRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollRunner")
            .field("concurrency", &self.concurrency)
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

impl PollRunner {
    pub fn new(
        source: Arc<dyn UpdateSource>,
        router: Arc<UpdateRouter>,
        concurrency: usize,
        poll_timeout: u64,
    ) -> Self {
        Self {
            source,
            router,
            concurrency: concurrency.max(1),
            poll_timeout,
            retry_delay: Duration::from_secs(3),
            drain_timeout: Duration::from_secs(30),
        }
    }

    /// Pause between failed polls.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// How long shutdown waits for in-flight updates.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Poll until `cancel` flips to `true`.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        info!(
            concurrency = self.concurrency,
            poll_timeout = self.poll_timeout,
            "Bot poller started"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut offset: i64 = 0;

        'poll: loop {
            let batch = tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break 'poll;
                    }
                    continue;
                }
                batch = self.source.updates(offset, self.poll_timeout) => batch,
            };

            match batch {
                Ok(updates) => {
                    if !updates.is_empty() {
                        debug!(count = updates.len(), offset, "Updates received");
                    }
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let Ok(permit) = semaphore.clone().acquire_owned().await else {
                            break 'poll;
                        };
                        let router = Arc::clone(&self.router);
                        tokio::spawn(async move {
                            let _permit = permit;
                            let update_id = update.update_id;
                            if let Err(e) = router.handle(update).await {
                                warn!(update_id, error = %e, "Failed to answer update");
                            }
                        });
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Polling Telegram failed");
                    tokio::select! {
                        changed = cancel.changed() => {
                            if changed.is_err() || *cancel.borrow() {
                                break 'poll;
                            }
                        }
                        _ = time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }

        info!("Bot poller waiting for in-flight updates");
        let permits = u32::try_from(self.concurrency).unwrap_or(u32::MAX);
        if time::timeout(self.drain_timeout, semaphore.acquire_many(permits))
            .await
            .is_err()
        {
            warn!("In-flight updates did not finish before the drain timeout");
        }

        if offset > 0 {
            if let Err(e) = self.source.updates(offset, 0).await {
                warn!(offset, error = %e, "Failed to confirm last offset");
            }
        }

        info!("Bot poller stopped");
    }
}
