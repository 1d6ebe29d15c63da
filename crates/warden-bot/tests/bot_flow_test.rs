//! Bot flows end to end against the in-memory store and a recording outbox.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::watch;

use warden_bot::telegram::{
    CallbackQuery, Chat, InlineKeyboardMarkup, Message, ReplyMarkup, Update, User,
};
use warden_bot::{BotContext, DialogMap, Outbox, PollRunner, UpdateRouter, UpdateSource};
use warden_core::clock::{Clock, ManualClock};
use warden_core::config::AppConfig;
use warden_core::result::AppResult;
use warden_database::store::{ModerationStore, ProfileStore};
use warden_database::{MemoryStore, Stores};
use warden_entity::moderation::{EtaBucket, ModerationStatus};
use warden_entity::profile::Profile;
use warden_service::{PassthroughSigner, Services};

const OWNER: i64 = 1;
const MODERATOR: i64 = 2;
const STRANGER: i64 = 99;
const SUBJECT: i64 = 1001;

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Message {
        chat_id: i64,
        text: String,
        markup: Option<ReplyMarkup>,
    },
    Edit {
        message_id: i64,
        text: String,
        markup: Option<InlineKeyboardMarkup>,
    },
    Answer {
        text: Option<String>,
    },
    Photos {
        count: usize,
    },
}

#[derive(Default)]
struct RecordingOutbox {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingOutbox {
    fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    fn len(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn push(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl Outbox for RecordingOutbox {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> AppResult<()> {
        self.push(Sent::Message {
            chat_id,
            text: text.to_string(),
            markup,
        });
        Ok(())
    }

    async fn edit_message(
        &self,
        _chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> AppResult<()> {
        self.push(Sent::Edit {
            message_id,
            text: text.to_string(),
            markup,
        });
        Ok(())
    }

    async fn answer_callback(&self, _callback_id: &str, text: Option<&str>) -> AppResult<()> {
        self.push(Sent::Answer {
            text: text.map(str::to_string),
        });
        Ok(())
    }

    async fn send_photos(&self, _chat_id: i64, urls: &[String]) -> AppResult<()> {
        self.push(Sent::Photos { count: urls.len() });
        Ok(())
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    outbox: Arc<RecordingOutbox>,
    router: Arc<UpdateRouter>,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 12, 10, 0, 0).unwrap()
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(start()));
    let mut config = AppConfig::default();
    config.bot.owner_id = OWNER;

    let services = Services::with_signer(
        &config,
        &Stores::from_memory(store.clone()),
        Arc::new(PassthroughSigner::default()),
        clock.clone(),
    );
    let outbox = Arc::new(RecordingOutbox::default());
    let router = Arc::new(UpdateRouter::new(BotContext {
        services,
        outbox: outbox.clone(),
        dialogs: DialogMap::new(100, Duration::from_secs(300)),
    }));

    Harness {
        store,
        clock,
        outbox,
        router,
    }
}

fn user(id: i64) -> User {
    User {
        id,
        is_bot: false,
        first_name: format!("user{id}"),
        last_name: None,
        username: Some(format!("user{id}")),
    }
}

fn text_update(from: i64, text: &str) -> Update {
    Update {
        update_id: 1,
        message: Some(Message {
            message_id: 10,
            chat: Chat { id: from },
            from: Some(user(from)),
            text: Some(text.to_string()),
        }),
        callback_query: None,
    }
}

fn press_update(from: i64, data: &str, message_id: i64) -> Update {
    Update {
        update_id: 1,
        message: None,
        callback_query: Some(CallbackQuery {
            id: format!("cb-{message_id}"),
            from: user(from),
            message: Some(Message {
                message_id,
                chat: Chat { id: from },
                from: None,
                text: None,
            }),
            data: Some(data.to_string()),
        }),
    }
}

impl Harness {
    async fn say(&self, from: i64, text: &str) -> Vec<Sent> {
        self.router.handle(text_update(from, text)).await.unwrap();
        self.outbox.take()
    }

    async fn press(&self, from: i64, data: &str, message_id: i64) -> Vec<Sent> {
        self.router
            .handle(press_update(from, data, message_id))
            .await
            .unwrap();
        self.outbox.take()
    }

    async fn profile(&self, user_id: i64, username: &str) {
        let now = self.clock.now();
        ProfileStore::save(
            self.store.as_ref(),
            &Profile {
                user_id,
                username: Some(username.into()),
                display_name: Some("Dana".into()),
                bio: None,
                moderation_status: ModerationStatus::Pending,
                approved: false,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .unwrap();
    }

    async fn enqueue(&self, subject: i64) -> i64 {
        self.store
            .enqueue(subject, EtaBucket::UpTo10, self.clock.now())
            .await
            .unwrap()
            .id
    }

    async fn with_moderator(&self) {
        let sent = self.say(OWNER, "/grant 2 moderator").await;
        assert_eq!(text_of(&sent[0]), "Granted MODERATOR for 2");
    }
}

fn text_of(sent: &Sent) -> &str {
    match sent {
        Sent::Message { text, .. } | Sent::Edit { text, .. } => text,
        other => panic!("no text in {other:?}"),
    }
}

fn toast(sent: &[Sent]) -> Option<String> {
    match sent.last() {
        Some(Sent::Answer { text }) => text.clone(),
        other => panic!("expected an answer last, got {other:?}"),
    }
}

fn inline_callbacks(sent: &Sent) -> Vec<String> {
    let markup = match sent {
        Sent::Message {
            markup: Some(ReplyMarkup::Inline(markup)),
            ..
        } => markup,
        Sent::Edit {
            markup: Some(markup),
            ..
        } => markup,
        other => panic!("no inline keyboard in {other:?}"),
    };
    markup.callbacks().into_iter().map(str::to_string).collect()
}

#[tokio::test]
async fn test_strangers_are_refused() {
    let h = harness();

    let sent = h.say(STRANGER, "/start").await;
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Sent::Message {
            chat_id,
            text,
            markup,
        } => {
            assert_eq!(*chat_id, STRANGER);
            assert_eq!(text, "You have no staff access.");
            assert!(matches!(markup, Some(ReplyMarkup::Remove(_))));
        }
        other => panic!("unexpected {other:?}"),
    }

    let sent = h.press(STRANGER, "mod:next", 5).await;
    assert_eq!(sent.len(), 1);
    assert!(toast(&sent).unwrap().starts_with("Not allowed"));
}

#[tokio::test]
async fn test_menus_follow_roles() {
    let h = harness();

    let sent = h.say(OWNER, "/start").await;
    match &sent[0] {
        Sent::Message {
            markup: Some(ReplyMarkup::Keyboard(menu)),
            ..
        } => assert_eq!(menu.labels().len(), 5),
        other => panic!("unexpected {other:?}"),
    }

    h.with_moderator().await;
    let sent = h.say(MODERATOR, "/start").await;
    match &sent[0] {
        Sent::Message {
            markup: Some(ReplyMarkup::Keyboard(menu)),
            ..
        } => assert_eq!(menu.labels(), vec!["Moderation", "Work stats"]),
        other => panic!("unexpected {other:?}"),
    }

    let sent = h.say(MODERATOR, "Access").await;
    assert_eq!(sent.len(), 1);
    assert!(text_of(&sent[0]).starts_with("Use the menu below."));
}

#[tokio::test]
async fn test_approve_then_queue_runs_dry() {
    let h = harness();
    h.with_moderator().await;
    h.profile(SUBJECT, "dana").await;
    let item = h.enqueue(SUBJECT).await;

    let sent = h.say(MODERATOR, "Moderation").await;
    assert_eq!(text_of(&sent[0]), "Profiles waiting for review: 1");
    assert_eq!(inline_callbacks(&sent[0]), vec!["mod:next"]);

    let sent = h.press(MODERATOR, "mod:next", 20).await;
    assert_eq!(sent.len(), 2);
    assert!(text_of(&sent[0]).contains(&format!("Item #{item}")));
    assert!(text_of(&sent[0]).contains("Name: Dana"));
    assert_eq!(
        inline_callbacks(&sent[0]),
        vec![
            format!("mod:approve:{item}"),
            format!("mod:reject:{item}"),
            format!("mod:skip:{item}"),
        ]
    );
    assert_eq!(toast(&sent), None);

    let sent = h.press(MODERATOR, &format!("mod:approve:{item}"), 21).await;
    assert_eq!(
        sent[0],
        Sent::Edit {
            message_id: 21,
            text: format!("Item #{item} approved."),
            markup: None,
        }
    );
    assert_eq!(text_of(&sent[1]), "The queue is empty.");
    assert!(matches!(sent[1], Sent::Message { .. }));
    assert_eq!(toast(&sent), None);

    let stored = ModerationStore::find(h.store.as_ref(), item).await.unwrap().unwrap();
    assert_eq!(stored.status, ModerationStatus::Approved);

    let sent = h.press(OWNER, &format!("mod:approve:{item}"), 21).await;
    assert_eq!(toast(&sent).as_deref(), Some("Already decided by someone else."));
}

#[tokio::test]
async fn test_other_rejection_takes_a_comment() {
    let h = harness();
    h.with_moderator().await;
    h.profile(SUBJECT, "dana").await;
    let item = h.enqueue(SUBJECT).await;

    h.press(MODERATOR, "mod:next", 30).await;

    let sent = h.press(MODERATOR, &format!("mod:reject:{item}"), 31).await;
    assert!(text_of(&sent[0]).ends_with("Choose a rejection reason:"));
    let callbacks = inline_callbacks(&sent[0]);
    assert!(callbacks.contains(&format!("mod:reason:{item}:OTHER")));
    assert_eq!(callbacks.len(), 10);

    let sent = h
        .press(MODERATOR, &format!("mod:reason:{item}:OTHER"), 31)
        .await;
    assert!(text_of(&sent[0]).contains("send a comment"));

    // Another staff member's text does not complete this dialog.
    let sent = h.say(OWNER, "not for you").await;
    assert!(text_of(&sent[0]).starts_with("Use the menu below."));

    let sent = h.say(MODERATOR, "Blurry photos").await;
    assert_eq!(text_of(&sent[0]), format!("Item #{item} rejected with comment."));
    assert_eq!(text_of(&sent[1]), "The queue is empty.");

    let stored = ModerationStore::find(h.store.as_ref(), item).await.unwrap().unwrap();
    assert_eq!(stored.status, ModerationStatus::Rejected);
    assert!(stored.reason_text.unwrap().ends_with("Blurry photos"));
}

#[tokio::test]
async fn test_canned_rejection_and_skip() {
    let h = harness();
    h.with_moderator().await;
    h.profile(SUBJECT, "dana").await;
    h.profile(SUBJECT + 1, "eve").await;
    let first = h.enqueue(SUBJECT).await;
    let second = h.enqueue(SUBJECT + 1).await;

    let sent = h.press(MODERATOR, "mod:next", 40).await;
    assert!(text_of(&sent[0]).contains(&format!("Item #{first}")));

    let sent = h.press(MODERATOR, &format!("mod:skip:{first}"), 41).await;
    assert_eq!(text_of(&sent[0]), format!("Item #{first} skipped."));
    assert!(text_of(&sent[1]).contains(&format!("Item #{second}")));

    let sent = h
        .press(MODERATOR, &format!("mod:reason:{second}:PHOTO_NO_FACE"), 42)
        .await;
    assert_eq!(text_of(&sent[0]), format!("Item #{second} rejected: No face."));
    assert_eq!(text_of(&sent[1]), "The queue is empty.");
    assert_eq!(toast(&sent), None);
}

#[tokio::test]
async fn test_lookup_and_ban() {
    let h = harness();
    h.profile(SUBJECT, "dana").await;

    let sent = h.say(OWNER, "Find user").await;
    assert_eq!(text_of(&sent[0]), "Send @username or a numeric id.");

    let sent = h.say(OWNER, "@Dana").await;
    assert!(text_of(&sent[0]).contains("Not banned"));
    let callbacks = inline_callbacks(&sent[0]);
    assert_eq!(
        callbacks,
        vec![
            format!("find:ban:{SUBJECT}"),
            format!("find:review:{SUBJECT}"),
            format!("acc:grant:{SUBJECT}:MODERATOR"),
            format!("acc:grant:{SUBJECT}:ADMIN"),
            "find:start".to_string(),
        ]
    );

    let sent = h.press(OWNER, &format!("find:ban:{SUBJECT}"), 60).await;
    assert!(text_of(&sent[0]).contains("Banned by 1"));
    assert!(inline_callbacks(&sent[0]).contains(&format!("find:unban:{SUBJECT}")));
    assert_eq!(toast(&sent), None);

    let sent = h.press(OWNER, &format!("find:review:{SUBJECT}"), 60).await;
    assert!(text_of(&sent[1]).starts_with("Queued as item #"));

    let sent = h.say(OWNER, "/find @nobody").await;
    assert!(text_of(&sent[0]).starts_with("Not found"));
}

#[tokio::test]
async fn test_access_is_role_gated() {
    let h = harness();
    h.with_moderator().await;

    let sent = h.press(MODERATOR, "acc:list", 70).await;
    assert!(toast(&sent).unwrap().starts_with("Not allowed"));

    let sent = h.say(MODERATOR, "/grant 3 moderator").await;
    assert!(text_of(&sent[0]).starts_with("Not allowed"));

    let sent = h.press(OWNER, "acc:list", 71).await;
    assert!(text_of(&sent[0]).contains("MODERATOR 2 @user2"));
    assert_eq!(inline_callbacks(&sent[0]), vec!["acc:revoke:2:MODERATOR"]);

    let sent = h.press(OWNER, "acc:revoke:2:MODERATOR", 71).await;
    assert_eq!(text_of(&sent[0]), "Revoked MODERATOR for 2");

    let sent = h.say(MODERATOR, "/start").await;
    assert_eq!(text_of(&sent[0]), "You have no staff access.");

    let sent = h.say(OWNER, "/grant 3").await;
    assert!(text_of(&sent[0]).starts_with("Usage:"));
}

#[tokio::test]
async fn test_pause_blocks_the_queue() {
    let h = harness();
    h.with_moderator().await;
    h.profile(SUBJECT, "dana").await;
    h.enqueue(SUBJECT).await;

    let sent = h.say(OWNER, "System").await;
    assert!(text_of(&sent[0]).contains("moderation_paused: off"));

    let sent = h.press(OWNER, "sys:toggle:moderation_paused", 80).await;
    assert!(text_of(&sent[0]).contains("moderation_paused: on"));

    let sent = h.press(MODERATOR, "mod:next", 81).await;
    assert_eq!(
        toast(&sent).as_deref(),
        Some("Unavailable: Moderation is paused")
    );

    let sent = h.press(OWNER, "sys:users", 80).await;
    assert!(text_of(&sent[0]).contains("Pending: 1"));
}

#[tokio::test]
async fn test_work_stats_after_a_decision() {
    let h = harness();
    h.with_moderator().await;
    h.profile(SUBJECT, "dana").await;
    let item = h.enqueue(SUBJECT).await;

    h.press(MODERATOR, "mod:next", 90).await;
    h.press(MODERATOR, &format!("mod:approve:{item}"), 91).await;

    let sent = h.say(MODERATOR, "Work stats").await;
    let text = text_of(&sent[0]);
    assert!(text.contains("Total: day 1 / week 1 / month 1 / all 1"));
    assert!(text.contains("MODERATOR 2: 1 / 1 / 1 / 1"));
    assert_eq!(inline_callbacks(&sent[0]), vec!["wst:show"]);
}

#[tokio::test]
async fn test_malformed_callback_is_answered() {
    let h = harness();
    let sent = h.press(OWNER, "mod:approve:abc", 5).await;
    assert_eq!(sent.len(), 1);
    assert!(toast(&sent).unwrap().starts_with("Bad id"));
}

struct ScriptedSource {
    batches: tokio::sync::Mutex<VecDeque<Vec<Update>>>,
    calls: Mutex<Vec<(i64, u64)>>,
}

#[async_trait]
impl UpdateSource for ScriptedSource {
    async fn updates(&self, offset: i64, timeout_secs: u64) -> AppResult<Vec<Update>> {
        self.calls.lock().unwrap().push((offset, timeout_secs));
        if let Some(batch) = self.batches.lock().await.pop_front() {
            return Ok(batch);
        }
        if timeout_secs > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_runner_dispatches_and_confirms_offset() {
    let h = harness();
    let mut first = text_update(OWNER, "/start");
    first.update_id = 500;
    let mut second = text_update(STRANGER, "/start");
    second.update_id = 501;

    let source = Arc::new(ScriptedSource {
        batches: tokio::sync::Mutex::new(VecDeque::from([vec![first, second]])),
        calls: Mutex::new(Vec::new()),
    });
    let runner = PollRunner::new(source.clone(), h.router.clone(), 4, 25)
        .with_retry_delay(Duration::from_millis(10))
        .with_drain_timeout(Duration::from_secs(2));

    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(async move { runner.run(rx).await });

    for _ in 0..200 {
        if h.outbox.len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tx.send(true).unwrap();
    task.await.unwrap();

    assert_eq!(h.outbox.len(), 2);
    let calls = source.calls.lock().unwrap().clone();
    assert_eq!(calls.first(), Some(&(0, 25)));
    assert_eq!(calls.last(), Some(&(502, 0)));
}
