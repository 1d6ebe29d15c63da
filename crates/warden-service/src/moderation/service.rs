//! Moderation workflow: lease, present, decide.

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use warden_core::clock::Clock;
use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_database::store::{
    DecisionRecord, FlagStore, ForceReviewOutcome, ModerationStore, ProfileStore,
};
use warden_entity::audit::AuditAction;
use warden_entity::flag::MODERATION_PAUSED;
use warden_entity::moderation::{
    Decision, ModerationItem, NewModerationAction, RejectReason,
};
use warden_entity::profile::Profile;

use super::cache::LookupCache;
use super::templates::compose;
use crate::access::Capability;
use crate::audit::AuditService;
use crate::context::Actor;
use crate::media::MediaSigner;

/// Everything a moderator needs to judge one item.
#[derive(Debug, Clone, Serialize)]
pub struct ModerationCard {
    /// The leased item.
    pub item: ModerationItem,
    /// Subject profile, if one exists.
    pub profile: Option<Profile>,
    /// Signed URLs of photos 1..=3 in position order.
    pub photos: Vec<String>,
    /// Signed URL of the latest circle video.
    pub circle: Option<String>,
    /// Reason of the subject's previous rejection.
    pub last_rejection: Option<RejectReason>,
}

/// Drives the moderation queue on behalf of staff.
#[derive(Clone)]
pub struct ModerationService {
    queue: Arc<dyn ModerationStore>,
    profiles: Arc<dyn ProfileStore>,
    flags: Arc<dyn FlagStore>,
    signer: Arc<dyn MediaSigner>,
    cache: LookupCache,
    lease: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ModerationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModerationService")
            .field("lease", &self.lease)
            .field("signer", &self.signer.name())
            .finish_non_exhaustive()
    }
}

impl ModerationService {
    /// Creates a moderation service.
    pub fn new(
        queue: Arc<dyn ModerationStore>,
        profiles: Arc<dyn ProfileStore>,
        flags: Arc<dyn FlagStore>,
        signer: Arc<dyn MediaSigner>,
        cache: LookupCache,
        lease: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            queue,
            profiles,
            flags,
            signer,
            cache,
            lease,
            clock,
        }
    }

    /// Lease the oldest acquirable item and load its card.
    pub async fn acquire(&self, actor: &Actor) -> AppResult<Arc<ModerationCard>> {
        actor.require(Capability::Moderate)?;
        if self.is_paused().await? {
            return Err(AppError::service_unavailable("Moderation is paused"));
        }

        let now = self.clock.now();
        let item = self
            .queue
            .acquire_next(actor.external_id, now, now + self.lease)
            .await?
            .ok_or_else(|| AppError::new(ErrorKind::QueueEmpty, "No pending profiles"))?;

        info!(actor = actor.external_id, item_id = item.id, subject = item.subject_user_id, "Item leased");

        let card = Arc::new(self.build_card(item).await?);
        self.cache.put(card.clone()).await;
        Ok(card)
    }

    /// Card for `item_id`, from cache when possible.
    pub async fn card(&self, actor: &Actor, item_id: i64) -> AppResult<Arc<ModerationCard>> {
        actor.require(Capability::Moderate)?;
        if let Some(card) = self.cache.get(item_id).await {
            return Ok(card);
        }
        let item = self
            .queue
            .find(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Moderation item {item_id} not found")))?;
        let card = Arc::new(self.build_card(item).await?);
        self.cache.put(card.clone()).await;
        Ok(card)
    }

    /// Approve a pending item.
    pub async fn approve(&self, actor: &Actor, item_id: i64) -> AppResult<ModerationItem> {
        actor.require(Capability::Moderate)?;
        let record = DecisionRecord {
            item_id,
            action: NewModerationAction {
                actor_external_id: actor.external_id,
                actor_role: actor.role,
                decision: Decision::Approve,
                reason_code: None,
            },
            reason_text: None,
            required_fix_step: None,
            audit: AuditService::entry(
                actor,
                AuditAction::ModerationApproved,
                json!({ "item_id": item_id }),
            ),
        };
        self.decide(&record).await
    }

    /// Reject a pending item with a reason and an optional comment.
    pub async fn reject(
        &self,
        actor: &Actor,
        item_id: i64,
        reason: RejectReason,
        comment: Option<&str>,
    ) -> AppResult<ModerationItem> {
        actor.require(Capability::Moderate)?;
        let text = compose(reason, comment);
        let record = DecisionRecord {
            item_id,
            action: NewModerationAction {
                actor_external_id: actor.external_id,
                actor_role: actor.role,
                decision: Decision::Reject,
                reason_code: Some(reason),
            },
            reason_text: Some(text.reason_text),
            required_fix_step: Some(text.required_fix_step),
            audit: AuditService::entry(
                actor,
                AuditAction::ModerationRejected,
                json!({
                    "item_id": item_id,
                    "reason": reason,
                    "has_comment": comment.is_some_and(|c| !c.trim().is_empty()),
                }),
            ),
        };
        self.decide(&record).await
    }

    /// Send a subject back to the queue.
    pub async fn force_review(&self, actor: &Actor, subject: i64) -> AppResult<ForceReviewOutcome> {
        actor.require(Capability::ForceReview)?;
        let audit = AuditService::entry(actor, AuditAction::ForceReview, json!({ "subject": subject }));
        let outcome = self
            .queue
            .force_review(subject, &audit, self.clock.now())
            .await?;
        self.cache.invalidate_subject(subject).await;
        info!(actor = actor.external_id, subject, item_id = outcome.item.id, created = outcome.created, "Review forced");
        Ok(outcome)
    }

    /// Number of PENDING items.
    pub async fn pending_count(&self) -> AppResult<i64> {
        self.queue.pending_count().await
    }

    async fn decide(&self, record: &DecisionRecord) -> AppResult<ModerationItem> {
        let result = self.queue.decide(record, self.clock.now()).await;
        self.cache.invalidate(record.item_id).await;
        match result {
            Ok(item) => {
                info!(
                    actor = record.action.actor_external_id,
                    item_id = item.id,
                    decision = ?record.action.decision,
                    "Item decided"
                );
                Ok(item)
            }
            Err(e) if e.is(ErrorKind::NotPending) => {
                warn!(actor = record.action.actor_external_id, item_id = record.item_id, "Item already decided");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn build_card(&self, item: ModerationItem) -> AppResult<ModerationCard> {
        let subject = item.subject_user_id;
        let profile = self.profiles.find(subject).await?;

        let mut photos = Vec::new();
        for photo in self.profiles.active_photos(subject).await? {
            match self.signer.sign(&photo.storage_ref).await {
                Ok(url) => photos.push(url),
                Err(e) => warn!(subject, media_id = photo.id, error = %e, "Photo URL unavailable"),
            }
        }
        let circle = match self.profiles.latest_circle(subject).await? {
            Some(circle) => match self.signer.sign(&circle.storage_ref).await {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(subject, media_id = circle.id, error = %e, "Circle URL unavailable");
                    None
                }
            },
            None => None,
        };

        Ok(ModerationCard {
            last_rejection: self.queue.last_rejection(subject).await?,
            item,
            profile,
            photos,
            circle,
        })
    }

    async fn is_paused(&self) -> AppResult<bool> {
        Ok(self
            .flags
            .get(MODERATION_PAUSED)
            .await?
            .is_some_and(|flag| flag.value_bool))
    }
}
