//! Ticket lifecycle: creation, closure, idle sweep, and the per-member
//! open-ticket index.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use futures_util::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use vigil_common::time::format_duration;
use vigil_common::{
    ChannelPermissions, Error, JsonStore, OverrideTarget, PermissionOverride, PlatformAdapter,
    Result,
};

use crate::config::TicketConfig;
use crate::ticket::{Ticket, TicketLogConfig, TicketStatus, TicketStore};
use crate::transcript::{self, Transcript};

/// The Ticket Lifecycle Manager.
///
/// A single mutex serializes every mutation of the active store and the
/// per-member index; channel deletions run as detached tasks tracked for
/// cancellation at shutdown.
pub struct TicketManager {
    adapter: Arc<dyn PlatformAdapter>,
    config: TicketConfig,
    /// The bot's own member id, used as `closed_by` for auto-closures.
    bot_member_id: String,
    store: JsonStore,
    log_store: JsonStore,
    state: Mutex<TicketStore>,
    log_config: Mutex<TicketLogConfig>,
    pending_deletions: Arc<DashMap<String, JoinHandle<()>>>,
}

impl TicketManager {
    /// Load both persisted documents and resume tracking whatever tickets
    /// were open when the process last stopped.
    pub fn new(
        adapter: Arc<dyn PlatformAdapter>,
        config: TicketConfig,
        bot_member_id: impl Into<String>,
        store: JsonStore,
        log_store: JsonStore,
    ) -> Self {
        let state: TicketStore = store.load_or_default();
        let log_config: TicketLogConfig = log_store.load_or_default();
        Self {
            adapter,
            config,
            bot_member_id: bot_member_id.into(),
            store,
            log_store,
            state: Mutex::new(state),
            log_config: Mutex::new(log_config),
            pending_deletions: Arc::new(DashMap::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Open a ticket for `requester_id` in the given category.
    ///
    /// Rejects with `NotFound` for an unconfigured category and
    /// `LimitExceeded` once the requester is at the open-ticket cap. Channel
    /// creation failures are logged and surfaced; no ticket is recorded.
    pub async fn create_ticket(
        &self,
        community_id: &str,
        requester_id: &str,
        category: &str,
    ) -> Result<Ticket> {
        let category = self
            .config
            .categories
            .iter()
            .find(|c| c.name == category)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("unknown ticket category: {category}")))?;

        let mut state = self.state.lock().await;

        let open = state
            .user_tickets
            .get(requester_id)
            .map(Vec::len)
            .unwrap_or(0);
        if open >= self.config.max_tickets_per_user {
            return Err(Error::limit_exceeded(format!(
                "you already have {open} open tickets (limit {})",
                self.config.max_tickets_per_user
            )));
        }

        let channel_name = allocate_channel_name(&state);
        let overrides = self.channel_overrides(requester_id);
        let channel_id = match self
            .adapter
            .create_isolated_channel(community_id, &channel_name, &overrides)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(community_id, requester_id, %err, "ticket channel creation failed");
                return Err(err);
            }
        };

        let ticket = Ticket {
            channel_id: channel_id.clone(),
            channel_name: channel_name.clone(),
            community_id: community_id.to_string(),
            owner_id: requester_id.to_string(),
            category: category.name.clone(),
            reason: format!("Support request: {}", category.name),
            created_at: Utc::now(),
            status: TicketStatus::Open,
            closed_at: None,
            closed_by: None,
            close_reason: None,
        };
        state
            .active_tickets
            .insert(channel_id.clone(), ticket.clone());
        state
            .user_tickets
            .entry(requester_id.to_string())
            .or_default()
            .push(channel_id.clone());
        self.persist(&state);

        // Pinned so it survives the transcript's bot-message filter.
        let notice = format!(
            "Support ticket {channel_name} ({}) opened for <@{requester_id}>. \
             Describe the issue and the team will follow up.",
            category.name
        );
        if let Err(err) = self.adapter.send_message(&channel_id, &notice).await {
            tracing::warn!(%channel_id, %err, "could not post opening notice");
        } else if let Err(err) = self.adapter.pin_last_message(&channel_id).await {
            tracing::warn!(%channel_id, %err, "could not pin opening notice");
        }

        tracing::info!(%channel_id, %channel_name, requester_id, "ticket created");
        Ok(ticket)
    }

    // -----------------------------------------------------------------------
    // Closure
    // -----------------------------------------------------------------------

    /// Close an open ticket and return its transcript.
    ///
    /// `closed_by` must be the owner or hold one of the configured support
    /// roles. The transcript sink being unconfigured or unreachable never
    /// fails the close; the channel itself is deleted after the grace delay.
    pub async fn close_ticket(
        &self,
        channel_id: &str,
        closed_by: &str,
        reason: &str,
    ) -> Result<Transcript> {
        let ticket = self.lookup(channel_id).await?;

        if closed_by != ticket.owner_id && !self.is_support(&ticket.community_id, closed_by).await
        {
            return Err(Error::permission_denied(
                "only the ticket owner or support staff can close a ticket",
            ));
        }

        let mut state = self.state.lock().await;
        // The role lookup happened outside the lock; the ticket may have
        // been closed in the meantime.
        let Some(ticket) = state.active_tickets.get(channel_id).cloned() else {
            return Err(Error::not_found("not an open ticket channel"));
        };
        self.finalize_close(
            &mut state,
            ticket,
            closed_by,
            reason,
            TicketStatus::Closed,
            self.config.close_grace,
        )
        .await
    }

    /// Auto-close every open ticket in the community that is past
    /// `auto_close_hours` and has had no human message within
    /// `idle_window_hours`. One ticket's failure never aborts the rest.
    /// Returns how many tickets were closed.
    pub async fn sweep_idle_tickets(&self, community_id: &str) -> usize {
        let now = Utc::now();
        let max_age = Duration::hours(self.config.auto_close_hours);
        let candidates: Vec<String> = {
            let state = self.state.lock().await;
            state
                .active_tickets
                .values()
                .filter(|t| t.community_id == community_id && now - t.created_at >= max_age)
                .map(|t| t.channel_id.clone())
                .collect()
        };

        let mut closed = 0;
        for channel_id in candidates {
            if self.has_recent_human_activity(&channel_id, now).await {
                continue;
            }

            let mut state = self.state.lock().await;
            let Some(ticket) = state.active_tickets.get(&channel_id).cloned() else {
                continue;
            };
            match self
                .finalize_close(
                    &mut state,
                    ticket,
                    &self.bot_member_id,
                    "inactivity",
                    TicketStatus::AutoClosed,
                    self.config.auto_close_grace,
                )
                .await
            {
                Ok(_) => closed += 1,
                Err(err) => {
                    tracing::error!(%channel_id, %err, "auto-close failed; continuing sweep");
                }
            }
        }
        closed
    }

    /// Run the idle sweep on the configured interval until aborted.
    pub fn spawn_sweep(self: &Arc<Self>, community_id: impl Into<String>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let community_id = community_id.into();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(manager.config.sweep_interval).await;
                let closed = manager.sweep_idle_tickets(&community_id).await;
                if closed > 0 {
                    tracing::info!(%community_id, closed, "idle sweep closed tickets");
                }
            }
        })
    }

    async fn finalize_close(
        &self,
        state: &mut TicketStore,
        mut ticket: Ticket,
        closed_by: &str,
        reason: &str,
        status: TicketStatus,
        grace: StdDuration,
    ) -> Result<Transcript> {
        let now = Utc::now();

        let announcement = format!(
            "Closing {} (open {}). Reason: {reason}. \
             This channel will be deleted shortly.",
            ticket.channel_name,
            format_duration(now - ticket.created_at),
        );
        if let Err(err) = self
            .adapter
            .send_message(&ticket.channel_id, &announcement)
            .await
        {
            tracing::warn!(channel_id = %ticket.channel_id, %err, "could not announce closure");
        }

        let transcript =
            transcript::generate(self.adapter.as_ref(), &ticket, closed_by, reason, now).await;
        self.deliver_transcript(&ticket, &transcript).await;

        ticket.status = status;
        ticket.closed_at = Some(now);
        ticket.closed_by = Some(closed_by.to_string());
        ticket.close_reason = Some(reason.to_string());

        state.active_tickets.shift_remove(&ticket.channel_id);
        if let Some(open) = state.user_tickets.get_mut(&ticket.owner_id) {
            open.retain(|id| id != &ticket.channel_id);
        }
        self.persist(state);

        self.schedule_deletion(ticket.channel_id.clone(), grace);
        tracing::info!(
            channel_id = %ticket.channel_id,
            closed_by,
            reason,
            status = ?ticket.status,
            "ticket closed"
        );
        Ok(transcript)
    }

    async fn deliver_transcript(&self, ticket: &Ticket, transcript: &Transcript) {
        let log_channel = self.log_config.lock().await.log_channel_id.clone();
        let Some(log_channel) = log_channel else {
            tracing::warn!(
                channel_name = %ticket.channel_name,
                "no ticket log channel configured; transcript dropped"
            );
            return;
        };

        let payload = format!("{}\n\n{}", transcript.summary, transcript.content);
        if let Err(err) = self.adapter.send_message(&log_channel, &payload).await {
            tracing::warn!(%log_channel, %err, "transcript delivery failed");
        }
    }

    /// Delete the channel after the grace delay. Failure is logged, not
    /// retried; a pending deletion for the same channel is replaced.
    fn schedule_deletion(&self, channel_id: String, grace: StdDuration) {
        let adapter = Arc::clone(&self.adapter);
        let pending = Arc::clone(&self.pending_deletions);
        let key = channel_id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if let Err(err) = adapter.delete_channel(&channel_id).await {
                tracing::warn!(%channel_id, %err, "ticket channel deletion failed");
            }
            pending.remove(&channel_id);
        });
        if let Some(previous) = self.pending_deletions.insert(key, handle) {
            previous.abort();
        }
    }

    async fn has_recent_human_activity(&self, channel_id: &str, now: DateTime<Utc>) -> bool {
        let window = Duration::hours(self.config.idle_window_hours);
        let mut history = match self.adapter.fetch_channel_history(channel_id).await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(channel_id, %err, "history unavailable, treating ticket as idle");
                return false;
            }
        };

        // Keep only the most recent messages; history is chronological.
        let mut recent = Vec::new();
        while let Some(message) = history.next().await {
            recent.push(message);
            if recent.len() > self.config.history_scan_limit {
                recent.remove(0);
            }
        }
        recent
            .iter()
            .any(|m| !m.is_bot && now - m.timestamp < window)
    }

    // -----------------------------------------------------------------------
    // Participants and capability checks
    // -----------------------------------------------------------------------

    /// Whether a member holds any configured support role. Role lookup
    /// failure degrades to "not support" rather than erroring.
    pub async fn is_support(&self, community_id: &str, member_id: &str) -> bool {
        let roles = match self.adapter.member_roles(community_id, member_id).await {
            Ok(roles) => roles,
            Err(err) => {
                tracing::warn!(member_id, %err, "role lookup unavailable, treating as no roles");
                HashSet::new()
            }
        };
        self.config.support_roles.iter().any(|r| roles.contains(r))
    }

    /// Grant a member access to a ticket channel (support staff only).
    pub async fn add_participant(
        &self,
        channel_id: &str,
        acting_member_id: &str,
        target_member_id: &str,
    ) -> Result<()> {
        let ticket = self.lookup(channel_id).await?;
        if !self.is_support(&ticket.community_id, acting_member_id).await {
            return Err(Error::permission_denied(
                "only support staff can manage ticket participants",
            ));
        }
        self.adapter
            .set_member_overwrite(channel_id, target_member_id, Some(ChannelPermissions::allow()))
            .await
            .map_err(|err| {
                tracing::error!(channel_id, target_member_id, %err, "participant grant failed");
                err
            })
    }

    /// Clear a member's access to a ticket channel (support staff only).
    pub async fn remove_participant(
        &self,
        channel_id: &str,
        acting_member_id: &str,
        target_member_id: &str,
    ) -> Result<()> {
        let ticket = self.lookup(channel_id).await?;
        if !self.is_support(&ticket.community_id, acting_member_id).await {
            return Err(Error::permission_denied(
                "only support staff can manage ticket participants",
            ));
        }
        self.adapter
            .set_member_overwrite(channel_id, target_member_id, None)
            .await
            .map_err(|err| {
                tracing::error!(channel_id, target_member_id, %err, "participant removal failed");
                err
            })
    }

    // -----------------------------------------------------------------------
    // Queries and configuration
    // -----------------------------------------------------------------------

    pub async fn active_tickets(&self, community_id: &str) -> Vec<Ticket> {
        let state = self.state.lock().await;
        state
            .active_tickets
            .values()
            .filter(|t| t.community_id == community_id)
            .cloned()
            .collect()
    }

    pub async fn open_ticket_count(&self, member_id: &str) -> usize {
        let state = self.state.lock().await;
        state.user_tickets.get(member_id).map(Vec::len).unwrap_or(0)
    }

    /// Set or clear the transcript sink and persist the choice.
    pub async fn set_log_channel(&self, channel_id: Option<String>) {
        let mut config = self.log_config.lock().await;
        config.log_channel_id = channel_id;
        if let Err(err) = self.log_store.save(&*config) {
            tracing::error!(%err, "failed to persist ticket log configuration");
        }
    }

    pub async fn log_channel(&self) -> Option<String> {
        self.log_config.lock().await.log_channel_id.clone()
    }

    pub fn pending_deletion_count(&self) -> usize {
        self.pending_deletions.len()
    }

    /// Abort every pending channel deletion. Call on process shutdown so no
    /// timer outlives the manager.
    pub fn shutdown(&self) {
        for entry in self.pending_deletions.iter() {
            entry.value().abort();
        }
        self.pending_deletions.clear();
    }

    async fn lookup(&self, channel_id: &str) -> Result<Ticket> {
        let state = self.state.lock().await;
        state
            .active_tickets
            .get(channel_id)
            .cloned()
            .ok_or_else(|| Error::not_found("not an open ticket channel"))
    }

    fn channel_overrides(&self, requester_id: &str) -> Vec<PermissionOverride> {
        let mut overrides = vec![
            PermissionOverride {
                target: OverrideTarget::Everyone,
                permissions: ChannelPermissions::deny(),
            },
            PermissionOverride {
                target: OverrideTarget::Member(requester_id.to_string()),
                permissions: ChannelPermissions::allow(),
            },
        ];
        for role in &self.config.support_roles {
            overrides.push(PermissionOverride {
                target: OverrideTarget::Role(role.clone()),
                permissions: ChannelPermissions::allow_manage(),
            });
        }
        overrides
    }

    fn persist(&self, state: &TicketStore) {
        if let Err(err) = self.store.save(state) {
            tracing::error!(%err, "failed to persist ticket store; memory stays authoritative");
        }
    }
}

/// Sequential, collision-avoided channel name: start at `count + 1` and
/// increment past any name still in the active set. Freed slots are never
/// reused while later tickets remain open.
fn allocate_channel_name(state: &TicketStore) -> String {
    let existing: HashSet<&str> = state
        .active_tickets
        .values()
        .map(|t| t.channel_name.as_str())
        .collect();
    let mut seq = state.active_tickets.len() + 1;
    loop {
        let name = format!("ticket-{seq:04}");
        if !existing.contains(name.as_str()) {
            return name;
        }
        seq += 1;
    }
}
