//! Process-local backend implementing every store trait.
//!
//! All tables sit behind one async mutex, so each trait method is a single
//! linearizable step: the same guarantee the PostgreSQL repositories get from
//! conditional updates and row locks. Used for local development and tests.

mod auth;
mod moderation;
mod registry;

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_entity::audit::{AuditEntry, CreateAuditEntry};
use warden_entity::auth::{LoginChallenge, Session, TotpSetupToken};
use warden_entity::ban::UserBan;
use warden_entity::bot_user::{BotUser, RoleAssignment};
use warden_entity::flag::{AppFlag, KNOWN_FLAGS, REGISTRATION_OPEN};
use warden_entity::moderation::{ModerationAction, ModerationItem};
use warden_entity::operator::Operator;
use warden_entity::profile::{MediaRef, Profile};

#[derive(Default)]
struct Tables {
    operators: BTreeMap<i64, Operator>,
    challenges: HashMap<Uuid, LoginChallenge>,
    totp_setups: HashMap<Uuid, TotpSetupToken>,
    sessions: HashMap<Uuid, Session>,
    items: BTreeMap<i64, ModerationItem>,
    actions: Vec<ModerationAction>,
    bans: HashMap<i64, UserBan>,
    audit: Vec<AuditEntry>,
    flags: BTreeMap<String, AppFlag>,
    bot_users: HashMap<i64, BotUser>,
    assignments: Vec<RoleAssignment>,
    profiles: BTreeMap<i64, Profile>,
    media: Vec<MediaRef>,
    sequence: i64,
}

impl Tables {
    /// Shared BIGSERIAL stand-in; ids are unique across tables, which is enough.
    fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }

    fn push_audit(&mut self, entry: &CreateAuditEntry, now: DateTime<Utc>) -> AuditEntry {
        let row = AuditEntry {
            id: self.next_id(),
            actor_external_id: entry.actor_external_id,
            action: entry.action,
            payload: entry.payload.clone(),
            created_at: now,
        };
        self.audit.push(row.clone());
        row
    }
}

/// In-memory store.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    audit_offline: AtomicBool,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Empty tables with the default flags seeded.
    pub fn new() -> Self {
        let now = Utc::now();
        let mut tables = Tables::default();
        for key in KNOWN_FLAGS {
            tables.flags.insert(
                key.to_string(),
                AppFlag {
                    key: key.to_string(),
                    value_bool: key == REGISTRATION_OPEN,
                    updated_at: now,
                    updated_by: None,
                },
            );
        }
        Self {
            tables: Mutex::new(tables),
            audit_offline: AtomicBool::new(false),
        }
    }

    /// While set, every audit append fails, and so does every mutation that
    /// carries an audit entry, leaving the tables untouched.
    pub fn set_audit_offline(&self, offline: bool) {
        self.audit_offline.store(offline, Ordering::SeqCst);
    }

    fn audit_writable(&self) -> AppResult<()> {
        if self.audit_offline.load(Ordering::SeqCst) {
            return Err(AppError::new(ErrorKind::Database, "Audit log unavailable"));
        }
        Ok(())
    }

    /// Snapshot of the moderation action log, oldest first.
    pub async fn moderation_actions(&self) -> Vec<ModerationAction> {
        self.tables.lock().await.actions.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
