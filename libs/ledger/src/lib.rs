//! Invite Ledger: converts member-join and member-leave events plus periodic
//! invite-usage polls into durable per-inviter statistics, and answers point
//! and rank queries over them.

pub mod config;
pub mod ledger;
pub mod rank;
pub mod stats;

pub use config::LedgerConfig;
pub use ledger::{InviteLedger, LeaderboardEntry, StatsDocument, UsageSnapshot};
pub use rank::InviteRank;
pub use stats::{InviteStat, InvitedUser, StatAction};
