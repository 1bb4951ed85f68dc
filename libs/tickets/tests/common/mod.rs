//! Shared in-memory platform mock for the ticket tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures_util::stream::{self, BoxStream, StreamExt};

use vigil_common::{
    ChannelPermissions, Error, HistoryMessage, InviteUsage, PermissionOverride, PlatformAdapter,
    Result,
};

/// A channel created through the mock, with the overrides it was born with.
#[derive(Debug, Clone)]
pub struct CreatedChannel {
    pub community_id: String,
    pub name: String,
    pub overrides: Vec<PermissionOverride>,
}

/// In-memory adapter that records every call so tests can assert on the
/// platform side effects.
#[derive(Default)]
pub struct MockAdapter {
    next_channel: AtomicU64,
    pub channels: Mutex<HashMap<String, CreatedChannel>>,
    pub deleted: Mutex<Vec<String>>,
    pub messages: Mutex<Vec<(String, String)>>,
    pub pins: Mutex<Vec<String>>,
    pub history: Mutex<HashMap<String, Vec<HistoryMessage>>>,
    pub roles: Mutex<HashMap<(String, String), HashSet<String>>>,
    pub overwrites: Mutex<Vec<(String, String, Option<ChannelPermissions>)>>,
    pub fail_channel_creation: Mutex<bool>,
    pub fail_history: Mutex<bool>,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant_role(&self, community_id: &str, member_id: &str, role_id: &str) {
        self.roles
            .lock()
            .unwrap()
            .entry((community_id.to_string(), member_id.to_string()))
            .or_default()
            .insert(role_id.to_string());
    }

    pub fn push_history(&self, channel_id: &str, message: HistoryMessage) {
        self.history
            .lock()
            .unwrap()
            .entry(channel_id.to_string())
            .or_default()
            .push(message);
    }

    pub fn fail_channel_creation(&self, fail: bool) {
        *self.fail_channel_creation.lock().unwrap() = fail;
    }

    pub fn fail_history(&self, fail: bool) {
        *self.fail_history.lock().unwrap() = fail;
    }

    /// Every message body sent to the given channel.
    pub fn sent_to(&self, channel_id: &str) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(chan, _)| chan == channel_id)
            .map(|(_, content)| content.clone())
            .collect()
    }

    pub fn deleted_channels(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformAdapter for MockAdapter {
    async fn list_invites(&self, _community_id: &str) -> Result<Vec<InviteUsage>> {
        Ok(Vec::new())
    }

    async fn create_isolated_channel(
        &self,
        community_id: &str,
        name: &str,
        overrides: &[PermissionOverride],
    ) -> Result<String> {
        if *self.fail_channel_creation.lock().unwrap() {
            return Err(Error::adapter_unavailable("channel creation refused"));
        }
        let id = format!("chan-{}", self.next_channel.fetch_add(1, Ordering::SeqCst) + 1);
        self.channels.lock().unwrap().insert(
            id.clone(),
            CreatedChannel {
                community_id: community_id.to_string(),
                name: name.to_string(),
                overrides: overrides.to_vec(),
            },
        );
        Ok(id)
    }

    async fn delete_channel(&self, channel_id: &str) -> Result<()> {
        self.channels.lock().unwrap().remove(channel_id);
        self.deleted.lock().unwrap().push(channel_id.to_string());
        Ok(())
    }

    async fn fetch_channel_history(
        &self,
        channel_id: &str,
    ) -> Result<BoxStream<'static, HistoryMessage>> {
        if *self.fail_history.lock().unwrap() {
            return Err(Error::adapter_unavailable("history disabled"));
        }
        let messages = self
            .history
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .unwrap_or_default();
        Ok(stream::iter(messages).boxed())
    }

    async fn member_roles(
        &self,
        community_id: &str,
        member_id: &str,
    ) -> Result<HashSet<String>> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .get(&(community_id.to_string(), member_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<()> {
        self.messages
            .lock()
            .unwrap()
            .push((channel_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn pin_last_message(&self, channel_id: &str) -> Result<()> {
        self.pins.lock().unwrap().push(channel_id.to_string());
        Ok(())
    }

    async fn set_member_overwrite(
        &self,
        channel_id: &str,
        member_id: &str,
        permissions: Option<ChannelPermissions>,
    ) -> Result<()> {
        self.overwrites.lock().unwrap().push((
            channel_id.to_string(),
            member_id.to_string(),
            permissions,
        ));
        Ok(())
    }
}

/// A human-authored message `age` before now.
pub fn human_message(author_id: &str, content: &str, age: Duration) -> HistoryMessage {
    message(author_id, content, age, false)
}

/// A bot-authored message `age` before now.
pub fn bot_message(author_id: &str, content: &str, age: Duration) -> HistoryMessage {
    message(author_id, content, age, true)
}

fn message(author_id: &str, content: &str, age: Duration, is_bot: bool) -> HistoryMessage {
    let timestamp: DateTime<Utc> = Utc::now() - age;
    HistoryMessage {
        author_id: author_id.to_string(),
        author_name: author_id.to_string(),
        is_bot,
        is_pinned: false,
        timestamp,
        content: content.to_string(),
        attachment_names: Vec::new(),
    }
}
