//! Plain-text bodies for bot messages.

use std::fmt::Write;

use warden_core::error::{AppError, ErrorKind};
use warden_entity::bot_user::StaffMember;
use warden_entity::profile::{Profile, ProfileCounts};
use warden_service::access::RoleChange;
use warden_service::{ModerationCard, ProfileCard, WorkReport};

use crate::keyboard::reason_label;

/// Telegram's message length limit.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Cut `text` to the Telegram limit on a char boundary.
pub fn clip(mut text: String) -> String {
    if let Some((idx, _)) = text.char_indices().nth(MAX_MESSAGE_CHARS - 1) {
        text.truncate(idx);
        text.push('…');
    }
    text
}

fn profile_lines(out: &mut String, user_id: i64, profile: Option<&Profile>) {
    let _ = writeln!(out, "User id: {user_id}");
    match profile {
        Some(p) => {
            if let Some(name) = &p.display_name {
                let _ = writeln!(out, "Name: {name}");
            }
            if let Some(username) = &p.username {
                let _ = writeln!(out, "Username: @{username}");
            }
            if let Some(bio) = p.bio.as_deref().filter(|b| !b.trim().is_empty()) {
                let _ = writeln!(out, "About: {bio}");
            }
            let _ = writeln!(out, "Status: {}", p.moderation_status);
        }
        None => {
            let _ = writeln!(out, "No profile");
        }
    }
}

/// Body of a leased moderation card.
pub fn moderation_card(card: &ModerationCard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Item #{} ({})", card.item.id, card.item.eta_bucket.as_str());
    profile_lines(&mut out, card.item.subject_user_id, card.profile.as_ref());
    let _ = writeln!(out, "Photos: {}", card.photos.len());
    match &card.circle {
        Some(url) => {
            let _ = writeln!(out, "Circle: {url}");
        }
        None => {
            let _ = writeln!(out, "Circle: none");
        }
    }
    if let Some(reason) = card.last_rejection {
        let _ = writeln!(out, "Last rejection: {}", reason_label(reason));
    }
    clip(out.trim_end().to_string())
}

/// Body of a lookup card.
pub fn profile_card(card: &ProfileCard) -> String {
    let mut out = String::new();
    profile_lines(&mut out, card.user_id, card.profile.as_ref());

    match &card.ban {
        Some(ban) if ban.banned => {
            let _ = write!(out, "Banned by {} at {}", ban.updated_by, ban.updated_at.format("%Y-%m-%d %H:%M"));
            if let Some(reason) = &ban.reason {
                let _ = write!(out, " ({reason})");
            }
            out.push('\n');
        }
        _ => {
            let _ = writeln!(out, "Not banned");
        }
    }

    if let Some(item) = &card.latest_item {
        let _ = writeln!(
            out,
            "Latest item: #{} {} created {}",
            item.id,
            item.status,
            item.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    if let Some(reason) = card.last_rejection {
        let _ = writeln!(out, "Last rejection: {}", reason_label(reason));
    }
    clip(out.trim_end().to_string())
}

/// Staff roster.
pub fn staff_list(staff: &[StaffMember]) -> String {
    if staff.is_empty() {
        return "No staff assigned yet.".to_string();
    }
    let mut out = String::from("Staff:\n");
    for member in staff {
        let _ = write!(out, "{} {}", member.role.as_str(), member.external_id);
        if let Some(username) = &member.username {
            let _ = write!(out, " @{username}");
        }
        let _ = writeln!(out, " since {}", member.granted_at.format("%Y-%m-%d"));
    }
    clip(out.trim_end().to_string())
}

/// Confirmation of a grant or revoke.
pub fn role_change(change: &RoleChange, granted: bool) -> String {
    let verb = if granted { "Granted" } else { "Revoked" };
    format!("{verb} {} for {}", change.role.as_str(), change.target)
}

/// Flag values.
pub fn flags(states: &[(&str, bool)]) -> String {
    let mut out = String::from("System flags:\n");
    for (key, value) in states {
        let state = if *value { "on" } else { "off" };
        let _ = writeln!(out, "{key}: {state}");
    }
    out.trim_end().to_string()
}

/// Profile population.
pub fn counts(counts: &ProfileCounts) -> String {
    format!(
        "Profiles: {}\nApproved: {}\nPending: {}\nBanned: {}",
        counts.total, counts.approved, counts.pending, counts.banned
    )
}

/// Totals plus one line per actor.
pub fn work_report(report: &WorkReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Decisions since {} (day), {} (week), {} (month)",
        report.window.day_start.format("%Y-%m-%d %H:%M"),
        report.window.week_start.format("%Y-%m-%d"),
        report.window.month_start.format("%Y-%m-%d"),
    );
    let t = &report.totals;
    let _ = writeln!(
        out,
        "Total: day {} / week {} / month {} / all {}",
        t.day, t.week, t.month, t.all
    );
    if report.rows.is_empty() {
        let _ = writeln!(out, "No decisions recorded yet.");
    }
    for row in &report.rows {
        let _ = writeln!(
            out,
            "{} {}: {} / {} / {} / {}",
            row.actor_role.as_str(),
            row.actor_external_id,
            row.day,
            row.week,
            row.month,
            row.all
        );
    }
    clip(out.trim_end().to_string())
}

/// What a staff member sees when an action fails.
pub fn error(err: &AppError) -> String {
    match err.kind {
        ErrorKind::Forbidden => format!("Not allowed: {}", err.message),
        ErrorKind::QueueEmpty => "The queue is empty.".to_string(),
        ErrorKind::NotPending => "Already decided by someone else.".to_string(),
        ErrorKind::NotFound => format!("Not found: {}", err.message),
        ErrorKind::InvalidInput | ErrorKind::Conflict => err.message.clone(),
        ErrorKind::ServiceUnavailable => format!("Unavailable: {}", err.message),
        _ => "Something went wrong, try again later.".to_string(),
    }
}
