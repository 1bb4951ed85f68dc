use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A member the inviter brought in who is still (or was) resident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitedUser {
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
}

/// Per-community, per-member invite counters.
///
/// Counters are signed and never clamped: `fake` decrements apply verbatim,
/// so admin overrides that don't match reality show up as negative numbers
/// instead of being silently masked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteStat {
    pub total_invites: i64,
    pub current_invites: i64,
    pub left_members: i64,
    pub fake_invites: i64,
    pub invited_users: Vec<InvitedUser>,
    pub last_updated: DateTime<Utc>,
}

impl Default for InviteStat {
    fn default() -> Self {
        Self {
            total_invites: 0,
            current_invites: 0,
            left_members: 0,
            fake_invites: 0,
            invited_users: Vec::new(),
            last_updated: Utc::now(),
        }
    }
}

/// The three mutations an inviter's record supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatAction {
    /// A new member joined through one of this member's invites.
    Invite,
    /// A previously invited member departed.
    Leave,
    /// An invite was flagged as fraudulent.
    Fake,
}

impl InviteStat {
    /// Apply one action. `Invite` and `Leave` require the invited member's
    /// id and are no-ops without one; `Fake` ignores it.
    pub fn apply(&mut self, action: StatAction, invited_member_id: Option<&str>, now: DateTime<Utc>) {
        match (action, invited_member_id) {
            (StatAction::Invite, Some(member_id)) => {
                self.total_invites += 1;
                self.current_invites += 1;
                self.invited_users.push(InvitedUser {
                    user_id: member_id.to_string(),
                    joined_at: now,
                });
            }
            (StatAction::Leave, Some(member_id)) => {
                self.current_invites -= 1;
                self.left_members += 1;
                // Member ids are unique within the list, so at most one entry.
                if let Some(pos) = self.invited_users.iter().position(|u| u.user_id == member_id) {
                    self.invited_users.remove(pos);
                }
            }
            (StatAction::Fake, _) => {
                self.fake_invites += 1;
                self.total_invites -= 1;
                self.current_invites -= 1;
            }
            (StatAction::Invite | StatAction::Leave, None) => return,
        }
        self.last_updated = now;
    }

    pub fn invited(&self, member_id: &str) -> bool {
        self.invited_users.iter().any(|u| u.user_id == member_id)
    }
}
