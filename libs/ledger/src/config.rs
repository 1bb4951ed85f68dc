/// Invite Ledger configuration, loaded from environment variables with
/// production defaults.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Leaderboard points awarded per successful invite.
    pub points_per_invite: i64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            points_per_invite: 33,
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            points_per_invite: std::env::var("POINTS_PER_INVITE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.points_per_invite),
        }
    }
}
