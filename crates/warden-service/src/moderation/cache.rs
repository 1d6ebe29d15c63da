//! Best-effort cache of moderation cards.
//!
//! Filled on acquire, dropped on decision. Losing it only costs a reload.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use super::service::ModerationCard;

/// `item_id -> card` plus `subject -> latest item_id`.
#[derive(Debug, Clone)]
pub struct LookupCache {
    cards: Cache<i64, Arc<ModerationCard>>,
    latest: Cache<i64, i64>,
}

impl LookupCache {
    /// Bounded by `capacity` entries, each living at most `ttl`.
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            cards: Cache::builder().max_capacity(capacity).time_to_live(ttl).build(),
            latest: Cache::builder().max_capacity(capacity).time_to_live(ttl).build(),
        }
    }

    /// Store a freshly loaded card.
    pub async fn put(&self, card: Arc<ModerationCard>) {
        self.latest
            .insert(card.item.subject_user_id, card.item.id)
            .await;
        self.cards.insert(card.item.id, card).await;
    }

    /// Card for `item_id`.
    pub async fn get(&self, item_id: i64) -> Option<Arc<ModerationCard>> {
        self.cards.get(&item_id).await
    }

    /// Most recently cached card for a subject.
    pub async fn latest_for(&self, subject_user_id: i64) -> Option<Arc<ModerationCard>> {
        let item_id = self.latest.get(&subject_user_id).await?;
        self.get(item_id).await
    }

    /// Drop the card for `item_id`.
    pub async fn invalidate(&self, item_id: i64) {
        if let Some(card) = self.cards.remove(&item_id).await {
            let subject = card.item.subject_user_id;
            if self.latest.get(&subject).await == Some(item_id) {
                self.latest.invalidate(&subject).await;
            }
        }
    }

    /// Drop everything cached for a subject.
    pub async fn invalidate_subject(&self, subject_user_id: i64) {
        if let Some(item_id) = self.latest.remove(&subject_user_id).await {
            self.cards.invalidate(&item_id).await;
        }
    }
}
