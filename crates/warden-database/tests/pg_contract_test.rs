//! Queue contracts against a live PostgreSQL.
//!
//! Ignored by default. Point `WARDEN_TEST_DATABASE_URL` at a disposable
//! database and run with `--ignored`; the moderation and audit tables are
//! truncated first.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use futures::future::join_all;
use serde_json::json;

use warden_core::config::DatabaseConfig;
use warden_core::error::ErrorKind;
use warden_database::migration::run_migrations;
use warden_database::store::{AuditStore, DecisionRecord, ModerationStore, ProfileStore};
use warden_database::{DatabasePool, Stores};
use warden_entity::audit::{AuditAction, CreateAuditEntry};
use warden_entity::moderation::{Decision, EtaBucket, ModerationStatus, NewModerationAction};
use warden_entity::operator::Role;

async fn connect() -> Option<(DatabasePool, Stores)> {
    let Ok(url) = std::env::var("WARDEN_TEST_DATABASE_URL") else {
        eprintln!("WARDEN_TEST_DATABASE_URL is not set; skipping");
        return None;
    };
    let config = DatabaseConfig {
        url,
        ..DatabaseConfig::default()
    };
    let pool = DatabasePool::connect(&config).await.unwrap();
    run_migrations(pool.pool()).await.unwrap();
    sqlx::query(
        "TRUNCATE moderation_actions, moderation_items, audit_log, profiles RESTART IDENTITY CASCADE",
    )
    .execute(pool.pool())
    .await
    .unwrap();
    let stores = Stores::postgres(&pool);
    Some((pool, stores))
}

fn approval(item_id: i64, actor: i64) -> DecisionRecord {
    DecisionRecord {
        item_id,
        action: NewModerationAction {
            actor_external_id: actor,
            actor_role: Role::Moderator,
            decision: Decision::Approve,
            reason_code: None,
        },
        reason_text: None,
        required_fix_step: None,
        audit: CreateAuditEntry {
            actor_external_id: actor,
            action: AuditAction::ModerationApproved,
            payload: json!({ "item_id": item_id }),
        },
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "needs WARDEN_TEST_DATABASE_URL"]
async fn test_postgres_lease_and_decision_contract() {
    let Some((pool, stores)) = connect().await else {
        return;
    };
    let now = Utc::now();
    let lease = now + Duration::minutes(10);

    let mut enqueued = HashSet::new();
    for subject in 9001..9004 {
        let item = stores
            .moderation
            .enqueue(subject, EtaBucket::UpTo10, now)
            .await
            .unwrap();
        enqueued.insert(item.id);
    }

    // Five moderators race for three items: SKIP LOCKED hands each row out once.
    let leases = join_all((0..5).map(|actor| {
        let moderation = stores.moderation.clone();
        async move { moderation.acquire_next(100 + actor, now, lease).await.unwrap() }
    }))
    .await;
    let won: Vec<_> = leases.into_iter().flatten().collect();
    assert_eq!(won.len(), 3);
    let leased: HashSet<_> = won.iter().map(|item| item.id).collect();
    assert_eq!(leased, enqueued);
    assert!(stores.moderation.acquire_next(200, now, lease).await.unwrap().is_none());

    // Two deciders on one item: exactly one commits, and only its audit row lands.
    let target = won[0].id;
    let outcomes = join_all([100, 101].map(|actor| {
        let moderation = stores.moderation.clone();
        async move { moderation.decide(&approval(target, actor), now).await }
    }))
    .await;
    let winners: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].status, ModerationStatus::Approved);
    let loser = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(loser.is(ErrorKind::NotPending));

    let audit = stores.audit.recent(10).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, AuditAction::ModerationApproved);
    assert_eq!(audit[0].payload["item_id"], json!(target));
    assert_eq!(audit[0].payload["subject"], json!(won[0].subject_user_id));

    let profile = stores
        .profiles
        .find(won[0].subject_user_id)
        .await
        .unwrap()
        .unwrap();
    assert!(profile.approved);
    assert_eq!(stores.moderation.pending_count().await.unwrap(), 2);

    pool.close().await;
}
