//! # warden-database
//!
//! Store traits for every table, their PostgreSQL repositories, and an
//! in-memory backend that honours the same atomicity contracts.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

use std::sync::Arc;

use tracing::info;

use warden_core::config::{DatabaseBackend, DatabaseConfig};
use warden_core::result::AppResult;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{
    AuditStore, BanStore, ChallengeStore, DecisionRecord, FlagStore, ForceReviewOutcome,
    ModerationStore, OperatorStore, ProfileStore, RegistryStore, SessionStore, StatsWindow,
    TotpSetupStore,
};

use repositories::{
    AuditRepository, BanRepository, ChallengeRepository, FlagRepository, ModerationRepository,
    OperatorRepository, ProfileRepository, RegistryRepository, SessionRepository,
    TotpSetupRepository,
};

/// One handle per table, shared by every service in the process.
#[derive(Clone)]
pub struct Stores {
    /// Operator accounts.
    pub operators: Arc<dyn OperatorStore>,
    /// Login challenges.
    pub challenges: Arc<dyn ChallengeStore>,
    /// TOTP enrollment tokens.
    pub totp_setups: Arc<dyn TotpSetupStore>,
    /// Sessions.
    pub sessions: Arc<dyn SessionStore>,
    /// Moderation queue.
    pub moderation: Arc<dyn ModerationStore>,
    /// User bans.
    pub bans: Arc<dyn BanStore>,
    /// Audit log.
    pub audit: Arc<dyn AuditStore>,
    /// Feature flags.
    pub flags: Arc<dyn FlagStore>,
    /// Bot registry and roles.
    pub registry: Arc<dyn RegistryStore>,
    /// Profiles and media.
    pub profiles: Arc<dyn ProfileStore>,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

impl Stores {
    /// PostgreSQL repositories over a shared pool.
    pub fn postgres(pool: &DatabasePool) -> Self {
        let pool = pool.pool().clone();
        Self {
            operators: Arc::new(OperatorRepository::new(pool.clone())),
            challenges: Arc::new(ChallengeRepository::new(pool.clone())),
            totp_setups: Arc::new(TotpSetupRepository::new(pool.clone())),
            sessions: Arc::new(SessionRepository::new(pool.clone())),
            moderation: Arc::new(ModerationRepository::new(pool.clone())),
            bans: Arc::new(BanRepository::new(pool.clone())),
            audit: Arc::new(AuditRepository::new(pool.clone())),
            flags: Arc::new(FlagRepository::new(pool.clone())),
            registry: Arc::new(RegistryRepository::new(pool.clone())),
            profiles: Arc::new(ProfileRepository::new(pool)),
        }
    }

    /// Every table backed by the same in-memory store.
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            operators: store.clone(),
            challenges: store.clone(),
            totp_setups: store.clone(),
            sessions: store.clone(),
            moderation: store.clone(),
            bans: store.clone(),
            audit: store.clone(),
            flags: store.clone(),
            registry: store.clone(),
            profiles: store,
        }
    }

    /// Fresh in-memory tables.
    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    /// Build the configured backend. The pool is returned so the caller can
    /// ping and close it.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<(Self, Option<DatabasePool>)> {
        match config.backend {
            DatabaseBackend::Memory => {
                info!("Using in-memory store");
                Ok((Self::memory(), None))
            }
            DatabaseBackend::Postgres => {
                let pool = DatabasePool::connect(config).await?;
                if config.run_migrations {
                    migration::run_migrations(pool.pool()).await?;
                }
                Ok((Self::postgres(&pool), Some(pool)))
            }
        }
    }
}
