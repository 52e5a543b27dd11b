//! Human-readable projection of decoded group updates.
//!
//! Pure functions from a decoded control payload to a display string; the
//! caller supplies a [`NameResolver`] so this module never touches storage.
//! Anything unrecognised projects to the empty string rather than an error.

use crate::control::Kind;

/// Naming capability the projector depends on.
pub trait NameResolver {
    /// Display name for an account, if one is known.
    fn display_name(&self, public_key: &str) -> Option<String>;

    /// The local account's public key (used to detect "you were removed").
    fn local_public_key(&self) -> Option<String>;
}

/// Shorten an account id for display: first and last four characters.
/// Counts characters, not bytes, so arbitrary strings are safe to pass.
pub fn truncate_id_for_display(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 8 {
        return id.to_owned();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

fn resolved_name(names: &dyn NameResolver, public_key: &str) -> String {
    names
        .display_name(public_key)
        .unwrap_or_else(|| truncate_id_for_display(public_key))
}

/// The user-visible subset of a control message, with member keys already
/// hex-encoded for lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupUpdate {
    Creation,
    NameChange { name: String },
    MembersAdded { members: Vec<String> },
    MembersRemoved { members: Vec<String> },
    MemberLeft,
}

impl GroupUpdate {
    /// Project a decoded kind onto its visible update, if it has one.
    /// Key distribution is invisible to users.
    pub fn from_control(kind: &Kind) -> Option<Self> {
        let hex_members = |members: &[Vec<u8>]| members.iter().map(hex::encode).collect();
        match kind {
            Kind::New { .. } => Some(GroupUpdate::Creation),
            Kind::EncryptionKeyPair { .. } => None,
            Kind::NameChange { name } => Some(GroupUpdate::NameChange { name: name.clone() }),
            Kind::MembersAdded { members } => Some(GroupUpdate::MembersAdded {
                members: hex_members(members),
            }),
            Kind::MembersRemoved { members } => Some(GroupUpdate::MembersRemoved {
                members: hex_members(members),
            }),
            Kind::MemberLeft => Some(GroupUpdate::MemberLeft),
        }
    }
}

/// Render an update as conversation text.
///
/// `sender` is the originating account (ignored for outgoing updates);
/// an incoming update without a sender renders as the empty string.
pub fn group_update_text(
    update: &GroupUpdate,
    sender: Option<&str>,
    is_outgoing: bool,
    names: &dyn NameResolver,
) -> String {
    let sender_name = if is_outgoing {
        "You".to_owned()
    } else {
        match sender {
            Some(sender) => resolved_name(names, sender),
            None => return String::new(),
        }
    };

    match update {
        GroupUpdate::Creation => {
            if is_outgoing {
                "You created a new group".to_owned()
            } else {
                format!("{sender_name} added you to the group")
            }
        }
        GroupUpdate::NameChange { name } => {
            if is_outgoing {
                format!("You renamed the group to {name}")
            } else {
                format!("{sender_name} renamed the group to {name}")
            }
        }
        GroupUpdate::MembersAdded { members } => {
            let members = joined_names(members, names);
            if is_outgoing {
                format!("You added {members} to the group")
            } else {
                format!("{sender_name} added {members} to the group")
            }
        }
        GroupUpdate::MembersRemoved { members } => {
            let local = names.local_public_key();
            if local.as_deref().is_some_and(|me| members.iter().any(|m| m == me)) {
                if is_outgoing {
                    "You have left the group".to_owned()
                } else {
                    "You were removed from the group".to_owned()
                }
            } else {
                let members = joined_names(members, names);
                if is_outgoing {
                    format!("You removed {members} from the group")
                } else {
                    format!("{sender_name} removed {members} from the group")
                }
            }
        }
        GroupUpdate::MemberLeft => {
            if is_outgoing {
                "You have left the group".to_owned()
            } else {
                format!("{sender_name} left the group")
            }
        }
    }
}

/// Convenience over [`group_update_text`] straight from a decoded kind.
/// Kinds with no visible update project to the empty string.
pub fn group_update_text_for_kind(
    kind: &Kind,
    sender: Option<&str>,
    is_outgoing: bool,
    names: &dyn NameResolver,
) -> String {
    GroupUpdate::from_control(kind)
        .map(|update| group_update_text(&update, sender, is_outgoing, names))
        .unwrap_or_default()
}

/// Text for a disappearing-message timer change.
pub fn expiration_timer_text(
    duration_seconds: u32,
    sender: Option<&str>,
    is_outgoing: bool,
    names: &dyn NameResolver,
) -> String {
    if is_outgoing {
        if duration_seconds == 0 {
            "You disabled disappearing messages".to_owned()
        } else {
            format!(
                "You set the disappearing message timer to {}",
                format_duration(duration_seconds)
            )
        }
    } else {
        let sender_name = match sender {
            Some(sender) => resolved_name(names, sender),
            None => return String::new(),
        };
        if duration_seconds == 0 {
            format!("{sender_name} disabled disappearing messages")
        } else {
            format!(
                "{sender_name} set the disappearing message timer to {}",
                format_duration(duration_seconds)
            )
        }
    }
}

fn joined_names(members: &[String], names: &dyn NameResolver) -> String {
    members
        .iter()
        .map(|member| resolved_name(names, member))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_duration(seconds: u32) -> String {
    const MINUTE: u32 = 60;
    const HOUR: u32 = 60 * MINUTE;
    const DAY: u32 = 24 * HOUR;
    const WEEK: u32 = 7 * DAY;

    let unit = |count: u32, singular: &str| {
        if count == 1 {
            format!("1 {singular}")
        } else {
            format!("{count} {singular}s")
        }
    };

    if seconds >= WEEK && seconds % WEEK == 0 {
        unit(seconds / WEEK, "week")
    } else if seconds >= DAY {
        unit(seconds / DAY, "day")
    } else if seconds >= HOUR {
        unit(seconds / HOUR, "hour")
    } else if seconds >= MINUTE {
        unit(seconds / MINUTE, "minute")
    } else {
        unit(seconds, "second")
    }
}
