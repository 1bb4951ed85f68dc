use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a ticket. `Closed` and `AutoClosed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    Closed,
    AutoClosed,
}

/// One support request bound to an isolated channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub channel_id: String,
    pub channel_name: String,
    pub community_id: String,
    pub owner_id: String,
    pub category: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub status: TicketStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_reason: Option<String>,
}

/// Persisted ticket document: the active set keyed by channel id, plus the
/// per-member index of open channel ids. The index must always mirror the
/// set of open tickets; both are mutated under the same lock and written in
/// the same save.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TicketStore {
    pub active_tickets: IndexMap<String, Ticket>,
    pub user_tickets: IndexMap<String, Vec<String>>,
}

/// Small persisted document holding the transcript sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketLogConfig {
    pub log_channel_id: Option<String>,
}
