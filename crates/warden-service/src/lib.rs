//! # warden-service
//!
//! Moderation bot business logic. Each service takes its stores, the audit
//! writer and the clock at construction and checks the acting staff
//! member's capabilities before doing anything.

pub mod access;
pub mod audit;
pub mod ban;
pub mod context;
pub mod lookup;
pub mod media;
pub mod moderation;
pub mod stats;
pub mod system;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;

use warden_core::clock::Clock;
use warden_core::config::AppConfig;
use warden_core::result::AppResult;
use warden_database::Stores;

pub use access::{AccessService, Capability};
pub use audit::AuditService;
pub use ban::BanService;
pub use context::Actor;
pub use lookup::{LookupQuery, LookupService, ProfileCard};
pub use media::{MediaSigner, PassthroughSigner};
pub use moderation::{LookupCache, ModerationCard, ModerationService};
pub use stats::{CalendarBuckets, StatsService, WorkReport};
pub use system::SystemService;

/// Every bot-facing service, wired from one configuration.
#[derive(Debug, Clone)]
pub struct Services {
    /// Role resolution and grants.
    pub access: AccessService,
    /// Moderation queue.
    pub moderation: ModerationService,
    /// Profile lookup.
    pub lookup: LookupService,
    /// Bans.
    pub bans: BanService,
    /// Flags and counts.
    pub system: SystemService,
    /// Work stats.
    pub stats: StatsService,
    /// Audit trail.
    pub audit: AuditService,
}

impl Services {
    /// Build with the signer selected by `media.provider`.
    pub async fn build(config: &AppConfig, stores: &Stores, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let signer = media::build_signer(&config.media).await?;
        Ok(Self::with_signer(config, stores, signer, clock))
    }

    /// Build with an explicit signer.
    pub fn with_signer(
        config: &AppConfig,
        stores: &Stores,
        signer: Arc<dyn MediaSigner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let audit = AuditService::new(stores.audit.clone(), clock.clone());
        let cache = LookupCache::new(
            config.bot.lookup_cache_capacity,
            StdDuration::from_secs(config.bot.lease_seconds),
        );

        Self {
            access: AccessService::new(
                stores.registry.clone(),
                config.bot.owner_id,
                clock.clone(),
            ),
            moderation: ModerationService::new(
                stores.moderation.clone(),
                stores.profiles.clone(),
                stores.flags.clone(),
                signer,
                cache,
                Duration::seconds(config.bot.lease_seconds as i64),
                clock.clone(),
            ),
            lookup: LookupService::new(
                stores.profiles.clone(),
                stores.registry.clone(),
                stores.bans.clone(),
                stores.moderation.clone(),
                audit.clone(),
            ),
            bans: BanService::new(stores.bans.clone(), clock.clone()),
            system: SystemService::new(
                stores.flags.clone(),
                stores.profiles.clone(),
                audit.clone(),
                clock.clone(),
            ),
            stats: StatsService::new(
                stores.moderation.clone(),
                CalendarBuckets::from_config(&config.stats),
                clock,
            ),
            audit,
        }
    }
}
