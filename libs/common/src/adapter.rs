//! Abstraction over the chat platform.
//!
//! The subsystems never talk to the platform SDK directly; everything goes
//! through [`PlatformAdapter`] so the same core serves both production bots
//! and the tests can run against an in-memory mock.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;

use crate::error::Result;

/// One active invite code and its cumulative use count, as reported by the
/// platform. `inviter_id` is `None` when the platform no longer knows who
/// created the code (e.g. a vanity invite).
#[derive(Debug, Clone)]
pub struct InviteUsage {
    pub code: String,
    pub uses: u64,
    pub inviter_id: Option<String>,
}

/// A single message from a channel's history, chronological order.
#[derive(Debug, Clone)]
pub struct HistoryMessage {
    pub author_id: String,
    pub author_name: String,
    pub is_bot: bool,
    pub is_pinned: bool,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub attachment_names: Vec<String>,
}

/// Channel permissions the core cares about. Anything richer than
/// read/send/manage is the platform binding's problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPermissions {
    pub read: bool,
    pub send: bool,
    pub manage: bool,
}

impl ChannelPermissions {
    pub fn allow() -> Self {
        Self {
            read: true,
            send: true,
            manage: false,
        }
    }

    pub fn allow_manage() -> Self {
        Self {
            read: true,
            send: true,
            manage: true,
        }
    }

    pub fn deny() -> Self {
        Self {
            read: false,
            send: false,
            manage: false,
        }
    }
}

/// Who a permission override applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideTarget {
    Everyone,
    Member(String),
    Role(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionOverride {
    pub target: OverrideTarget,
    pub permissions: ChannelPermissions,
}

/// Thin binding to the chat platform, implemented outside this workspace.
///
/// Calls are blocking-I/O shaped; no ordering is guaranteed between
/// in-flight operations. Callers that need serialization (snapshot
/// compare-and-replace, index updates) hold their own lock across the await.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// All active invite codes for a community with their use counts.
    async fn list_invites(&self, community_id: &str) -> Result<Vec<InviteUsage>>;

    /// Create a private channel with the given overrides. Returns the new
    /// channel id.
    async fn create_isolated_channel(
        &self,
        community_id: &str,
        name: &str,
        overrides: &[PermissionOverride],
    ) -> Result<String>;

    async fn delete_channel(&self, channel_id: &str) -> Result<()>;

    /// Finite, chronological message history. Restartable: each call
    /// produces a fresh stream from the beginning.
    async fn fetch_channel_history(
        &self,
        channel_id: &str,
    ) -> Result<BoxStream<'static, HistoryMessage>>;

    /// The member's current role set within a community.
    async fn member_roles(&self, community_id: &str, member_id: &str)
        -> Result<HashSet<String>>;

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<()>;

    /// Pin a previously sent message. Best-effort; callers ignore failures.
    async fn pin_last_message(&self, channel_id: &str) -> Result<()>;

    /// Grant (`Some`) or clear (`None`) a member's override on a channel.
    async fn set_member_overwrite(
        &self,
        channel_id: &str,
        member_id: &str,
        permissions: Option<ChannelPermissions>,
    ) -> Result<()>;
}
