//! Invite attribution and per-inviter statistics.
//!
//! The attribution heuristic diffs the platform's cumulative invite-use
//! counters against the snapshot taken at the previous join. The first code
//! whose count increased, in the order the platform returned the list, is
//! declared the used invite. Simultaneous increments on several codes are
//! not disambiguated; first match wins. That is a documented limitation of
//! the heuristic, not something this module tries to repair.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::Mutex;

use vigil_common::{InviteUsage, JsonStore, PlatformAdapter};

use crate::config::LedgerConfig;
use crate::rank::InviteRank;
use crate::stats::{InviteStat, StatAction};

/// Persisted document: community id -> member id -> counters.
///
/// Insertion order is preserved so leaderboard tie-breaking stays stable
/// across full-document rewrites.
pub type StatsDocument = IndexMap<String, IndexMap<String, InviteStat>>;

/// Invite code -> last observed cumulative use count. Memory-only, replaced
/// wholesale after every join.
pub type UsageSnapshot = HashMap<String, u64>;

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub member_id: String,
    pub total_invites: i64,
    pub current_invites: i64,
    pub points: i64,
    /// `current / total` as a fraction; 0.0 for members with no invites.
    pub retention: f64,
}

struct LedgerState {
    stats: StatsDocument,
    snapshots: HashMap<String, UsageSnapshot>,
}

/// The Invite Ledger subsystem.
///
/// One mutex serializes every read-modify-write, including the whole
/// fetch-compare-replace sequence in
/// [`attribute_join`](Self::attribute_join): two racing joins would
/// otherwise both diff against the same stale snapshot, or finish their
/// fetches out of order and regress the snapshot.
pub struct InviteLedger {
    adapter: Arc<dyn PlatformAdapter>,
    store: JsonStore,
    config: LedgerConfig,
    state: Mutex<LedgerState>,
}

impl InviteLedger {
    /// Load the persisted statistics document and start with empty
    /// snapshots. Call [`record_usage_snapshot`](Self::record_usage_snapshot)
    /// once per community after construction.
    pub fn new(adapter: Arc<dyn PlatformAdapter>, store: JsonStore, config: LedgerConfig) -> Self {
        let stats: StatsDocument = store.load_or_default();
        Self {
            adapter,
            store,
            config,
            state: Mutex::new(LedgerState {
                stats,
                snapshots: HashMap::new(),
            }),
        }
    }

    /// Poll the platform and replace the stored usage snapshot for a
    /// community. Returns the fresh mapping. Platform failure degrades to an
    /// empty mapping and never raises.
    ///
    /// The fetch happens under the state lock: a replacement computed from an
    /// older poll must never land after a newer one.
    pub async fn record_usage_snapshot(&self, community_id: &str) -> UsageSnapshot {
        let mut state = self.state.lock().await;
        let usage: UsageSnapshot = self
            .fetch_invites(community_id)
            .await
            .into_iter()
            .map(|invite| (invite.code, invite.uses))
            .collect();
        state
            .snapshots
            .insert(community_id.to_string(), usage.clone());
        usage
    }

    /// Infer who invited a newly joined member.
    ///
    /// Fetches the current usage counters, diffs them against the cached
    /// snapshot, and replaces the snapshot wholesale whether or not an
    /// inviter was found. Does not touch statistics; pair with
    /// [`update_stats`](Self::update_stats) or use
    /// [`handle_member_join`](Self::handle_member_join).
    pub async fn attribute_join(&self, community_id: &str, new_member_id: &str) -> Option<String> {
        // Fetch under the lock. Two racing joins that fetched concurrently
        // could otherwise finish out of order and let the join holding the
        // older counters overwrite the snapshot with stale data.
        let mut state = self.state.lock().await;
        let current = self.fetch_invites(community_id).await;

        let cached = state
            .snapshots
            .entry(community_id.to_string())
            .or_default();

        let mut used: Option<&InviteUsage> = None;
        for invite in &current {
            let cached_uses = cached.get(&invite.code).copied().unwrap_or(0);
            if invite.uses > cached_uses {
                used = Some(invite);
                break;
            }
        }
        let inviter = used.and_then(|invite| invite.inviter_id.clone());

        *cached = current
            .iter()
            .map(|invite| (invite.code.clone(), invite.uses))
            .collect();

        match &inviter {
            Some(inviter_id) => {
                tracing::info!(community_id, new_member_id, %inviter_id, "join attributed");
            }
            None => {
                tracing::info!(community_id, new_member_id, "join without attributable invite");
            }
        }
        inviter
    }

    /// Full member-join path: attribute, then credit the inviter.
    pub async fn handle_member_join(
        &self,
        community_id: &str,
        new_member_id: &str,
    ) -> Option<String> {
        let inviter_id = self.attribute_join(community_id, new_member_id).await?;
        self.update_stats(
            community_id,
            &inviter_id,
            Some(new_member_id),
            StatAction::Invite,
        )
        .await;
        Some(inviter_id)
    }

    /// Apply one stat mutation and rewrite the whole document.
    ///
    /// Also the admin-override entry point. A failed write is logged and the
    /// in-memory state stays authoritative until the next successful save.
    pub async fn update_stats(
        &self,
        community_id: &str,
        inviter_id: &str,
        invited_member_id: Option<&str>,
        action: StatAction,
    ) {
        let mut state = self.state.lock().await;
        let stat = state
            .stats
            .entry(community_id.to_string())
            .or_default()
            .entry(inviter_id.to_string())
            .or_default();
        stat.apply(action, invited_member_id, Utc::now());
        self.persist(&state.stats);
    }

    /// Debit whichever inviter brought in a departing member.
    ///
    /// Linear scan; the first inviter whose list contains the member wins,
    /// since a member has at most one recorded inviter. Returns that
    /// inviter, or `None` when the member was never attributed.
    pub async fn handle_member_leave(
        &self,
        community_id: &str,
        member_id: &str,
    ) -> Option<String> {
        let mut state = self.state.lock().await;
        let community = state.stats.get_mut(community_id)?;

        let inviter_id = community
            .iter()
            .find(|(_, stat)| stat.invited(member_id))
            .map(|(id, _)| id.clone())?;

        if let Some(stat) = community.get_mut(&inviter_id) {
            stat.apply(StatAction::Leave, Some(member_id), Utc::now());
        }
        self.persist(&state.stats);
        tracing::info!(community_id, member_id, %inviter_id, "departure debited");
        Some(inviter_id)
    }

    /// Raw counters for one member; zeroed record when unknown.
    pub async fn member_stats(&self, community_id: &str, member_id: &str) -> InviteStat {
        let state = self.state.lock().await;
        state
            .stats
            .get(community_id)
            .and_then(|community| community.get(member_id))
            .cloned()
            .unwrap_or_default()
    }

    /// Community leaderboard, descending by total invites. The sort is
    /// stable, so ties keep their insertion order.
    pub async fn leaderboard(&self, community_id: &str) -> Vec<LeaderboardEntry> {
        let state = self.state.lock().await;
        let Some(community) = state.stats.get(community_id) else {
            return Vec::new();
        };

        let mut entries: Vec<LeaderboardEntry> = community
            .iter()
            .map(|(member_id, stat)| LeaderboardEntry {
                member_id: member_id.clone(),
                total_invites: stat.total_invites,
                current_invites: stat.current_invites,
                points: stat.total_invites * self.config.points_per_invite,
                retention: if stat.total_invites > 0 {
                    stat.current_invites as f64 / stat.total_invites as f64
                } else {
                    0.0
                },
            })
            .collect();
        entries.sort_by(|a, b| b.total_invites.cmp(&a.total_invites));
        entries
    }

    /// Recruitment tier for a cumulative invite count.
    pub fn rank(total_invites: i64) -> InviteRank {
        InviteRank::for_total(total_invites)
    }

    /// Admin purge of one member's record, or the whole community when
    /// `member_id` is `None`. Returns whether anything was removed.
    pub async fn reset_stats(&self, community_id: &str, member_id: Option<&str>) -> bool {
        let mut state = self.state.lock().await;
        let removed = match member_id {
            Some(member) => state
                .stats
                .get_mut(community_id)
                .and_then(|community| community.shift_remove(member))
                .is_some(),
            None => state.stats.shift_remove(community_id).is_some(),
        };
        if removed {
            self.persist(&state.stats);
        }
        removed
    }

    async fn fetch_invites(&self, community_id: &str) -> Vec<InviteUsage> {
        match self.adapter.list_invites(community_id).await {
            Ok(invites) => invites,
            Err(err) => {
                tracing::warn!(community_id, %err, "invite listing unavailable, degrading to empty");
                Vec::new()
            }
        }
    }

    fn persist(&self, stats: &StatsDocument) {
        if let Err(err) = self.store.save(stats) {
            tracing::error!(%err, "failed to persist invite statistics; memory stays authoritative");
        }
    }
}
