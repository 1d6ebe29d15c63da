//! Reply menus and inline keyboards.

use warden_entity::bot_user::StaffMember;
use warden_entity::flag::{AppFlag, KNOWN_FLAGS};
use warden_entity::moderation::RejectReason;
use warden_entity::operator::Role;
use warden_service::access::can_assign;
use warden_service::{Actor, Capability, ProfileCard};

use crate::callback::Callback;
use crate::telegram::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, ReplyKeyboardMarkup,
};

/// A reply-keyboard section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    Moderation,
    Lookup,
    Access,
    System,
    Stats,
}

impl MenuEntry {
    const ALL: [MenuEntry; 5] = [
        Self::Moderation,
        Self::Lookup,
        Self::Access,
        Self::System,
        Self::Stats,
    ];

    /// Button text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Moderation => "Moderation",
            Self::Lookup => "Find user",
            Self::Access => "Access",
            Self::System => "System",
            Self::Stats => "Work stats",
        }
    }

    /// Inverse of [`MenuEntry::label`].
    pub fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.into_iter().find(|e| e.label() == text)
    }

    /// Which entries a role sees.
    pub fn visible_to(self, role: Role) -> bool {
        match role {
            Role::Owner | Role::Admin => true,
            Role::Moderator => matches!(self, Self::Moderation | Self::Stats),
            Role::None => false,
        }
    }
}

/// Main menu for `role`; `None` for users without staff access.
pub fn main_menu(role: Role) -> Option<ReplyKeyboardMarkup> {
    let entries: Vec<MenuEntry> = MenuEntry::ALL
        .into_iter()
        .filter(|e| e.visible_to(role))
        .collect();
    if entries.is_empty() {
        return None;
    }

    Some(ReplyKeyboardMarkup {
        keyboard: entries
            .chunks(2)
            .map(|row| {
                row.iter()
                    .map(|e| KeyboardButton {
                        text: e.label().to_string(),
                    })
                    .collect()
            })
            .collect(),
        resize_keyboard: true,
        is_persistent: true,
    })
}

fn button(text: impl Into<String>, callback: Callback) -> InlineKeyboardButton {
    InlineKeyboardButton::new(text, callback)
}

fn markup(rows: Vec<Vec<InlineKeyboardButton>>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: rows.into_iter().filter(|r| !r.is_empty()).collect(),
    }
}

/// Single "next card" button.
pub fn queue_start() -> InlineKeyboardMarkup {
    markup(vec![vec![button("Next profile", Callback::ModNext)]])
}

/// Decision buttons under a moderation card.
pub fn moderation_card(item_id: i64) -> InlineKeyboardMarkup {
    markup(vec![
        vec![
            button("Approve", Callback::ModApprove(item_id)),
            button("Reject", Callback::ModReject(item_id)),
        ],
        vec![button("Skip", Callback::ModSkip(item_id))],
    ])
}

/// Short staff-facing label for a rejection reason.
pub fn reason_label(reason: RejectReason) -> &'static str {
    match reason {
        RejectReason::PhotoNoFace => "No face",
        RejectReason::PhotoFakeNotYou => "Fake photo",
        RejectReason::PhotoProhibited => "Prohibited photo",
        RejectReason::CircleMismatch => "Circle mismatch",
        RejectReason::CircleFailed => "Circle failed",
        RejectReason::ProfileIncomplete => "Incomplete",
        RejectReason::SpamAdsLinks => "Spam / links",
        RejectReason::BotSuspect => "Bot suspect",
        RejectReason::Other => "Other (comment)",
    }
}

/// One button per rejection reason, two per row, plus skip.
pub fn reject_reasons(item_id: i64) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = RejectReason::ALL
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|r| button(reason_label(*r), Callback::ModReason(item_id, *r)))
                .collect()
        })
        .collect();
    rows.push(vec![button("Skip", Callback::ModSkip(item_id))]);
    markup(rows)
}

/// Actions under a lookup card, filtered by what the actor may do.
pub fn profile_actions(card: &ProfileCard, actor: &Actor) -> InlineKeyboardMarkup {
    let uid = card.user_id;
    let mut first = Vec::new();
    if actor.can(Capability::Ban) {
        if card.is_banned() {
            first.push(button("Unban", Callback::FindUnban(uid)));
        } else {
            first.push(button("Ban", Callback::FindBan(uid)));
        }
    }
    if actor.can(Capability::ForceReview) && card.profile.is_some() {
        first.push(button("Send to review", Callback::FindReview(uid)));
    }

    let second = if actor.can(Capability::ManageRoles) {
        [Role::Moderator, Role::Admin]
            .into_iter()
            .filter(|r| can_assign(actor.role, *r))
            .map(|r| button(format!("Make {}", r.as_str().to_lowercase()), Callback::AccGrant(uid, r)))
            .collect()
    } else {
        Vec::new()
    };

    markup(vec![first, second, vec![button("Find another", Callback::FindStart)]])
}

/// Revoke buttons for every staff member the actor may demote.
pub fn staff_actions(staff: &[StaffMember], actor: &Actor) -> InlineKeyboardMarkup {
    let rows = staff
        .iter()
        .filter(|m| m.external_id != actor.external_id && can_assign(actor.role, m.role))
        .map(|m| {
            let who = m
                .username
                .as_deref()
                .map(|u| format!("@{u}"))
                .unwrap_or_else(|| m.external_id.to_string());
            vec![button(
                format!("Revoke {} {who}", m.role.as_str()),
                Callback::AccRevoke(m.external_id, m.role),
            )]
        })
        .collect();
    markup(rows)
}

/// Value of every known flag; a flag never written reads as off.
pub fn flag_states(flags: &[AppFlag]) -> Vec<(&'static str, bool)> {
    KNOWN_FLAGS
        .into_iter()
        .map(|key| {
            let value = flags.iter().any(|f| f.key == key && f.value_bool);
            (key, value)
        })
        .collect()
}

/// Flag toggles for OWNER, users count for anyone allowed to see it.
pub fn system_panel(states: &[(&str, bool)], actor: &Actor) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    if actor.can(Capability::SystemToggles) {
        for (key, value) in states {
            let state = if *value { "on" } else { "off" };
            rows.push(vec![button(
                format!("{key}: {state}"),
                Callback::SysToggle((*key).to_string()),
            )]);
        }
    }
    if actor.can(Capability::ViewUsersCount) {
        rows.push(vec![button("Users count", Callback::SysUsers)]);
    }
    markup(rows)
}

/// Refresh button under the work-stats report.
pub fn stats_refresh() -> InlineKeyboardMarkup {
    markup(vec![vec![button("Refresh", Callback::WstShow)]])
}

/// Staff list entry point.
pub fn access_panel() -> InlineKeyboardMarkup {
    markup(vec![vec![button("Staff list", Callback::AccList)]])
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_menus_follow_roles() {
        let owner = main_menu(Role::Owner).unwrap();
        assert_eq!(owner.labels().len(), 5);
        assert_eq!(main_menu(Role::Admin).unwrap().labels().len(), 5);

        let moderator = main_menu(Role::Moderator).unwrap();
        assert_eq!(moderator.labels(), vec!["Moderation", "Work stats"]);

        assert!(main_menu(Role::None).is_none());
    }

    #[test]
    fn test_labels_map_back() {
        for entry in MenuEntry::ALL {
            assert_eq!(MenuEntry::from_label(entry.label()), Some(entry));
        }
        assert_eq!(MenuEntry::from_label("hello"), None);
    }

    #[test]
    fn test_reason_keyboard_covers_every_reason() {
        let keyboard = reject_reasons(4);
        let callbacks = keyboard.callbacks();
        for reason in RejectReason::ALL {
            let data = Callback::ModReason(4, reason).to_string();
            assert!(callbacks.contains(&data.as_str()), "{data}");
        }
        assert_eq!(callbacks.last(), Some(&"mod:skip:4"));
    }

    #[test]
    fn test_admin_cannot_revoke_admins() {
        let now = Utc::now();
        let staff = vec![
            StaffMember {
                external_id: 2,
                role: Role::Admin,
                username: Some("ann".into()),
                granted_at: now,
            },
            StaffMember {
                external_id: 3,
                role: Role::Moderator,
                username: None,
                granted_at: now,
            },
        ];
        let admin = Actor::new(9, Role::Admin);
        assert_eq!(staff_actions(&staff, &admin).callbacks(), vec!["acc:revoke:3:MODERATOR"]);

        let owner = Actor::new(1, Role::Owner);
        assert_eq!(staff_actions(&staff, &owner).callbacks().len(), 2);
    }

    #[test]
    fn test_system_panel_hides_toggles_from_admin() {
        let flags = vec![AppFlag {
            key: "registration_open".into(),
            value_bool: true,
            updated_at: Utc::now(),
            updated_by: None,
        }];
        let states = flag_states(&flags);
        assert_eq!(
            states,
            vec![("registration_open", true), ("moderation_paused", false)]
        );

        let admin = system_panel(&states, &Actor::new(2, Role::Admin));
        assert_eq!(admin.callbacks(), vec!["sys:users"]);

        let owner = system_panel(&states, &Actor::new(1, Role::Owner));
        assert_eq!(
            owner.callbacks(),
            vec![
                "sys:toggle:registration_open",
                "sys:toggle:moderation_paused",
                "sys:users"
            ]
        );
    }
}
