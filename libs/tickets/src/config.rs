use std::time::Duration;

/// One user-selectable ticket category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketCategory {
    pub name: String,
    pub description: String,
}

impl TicketCategory {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Ticket system configuration, loaded from environment variables with
/// production defaults.
#[derive(Debug, Clone)]
pub struct TicketConfig {
    /// Maximum simultaneously-open tickets per member.
    pub max_tickets_per_user: usize,
    /// Tickets older than this are candidates for auto-closure.
    pub auto_close_hours: i64,
    /// A candidate survives the sweep if a human wrote within this window.
    pub idle_window_hours: i64,
    /// Delay between a manual close and channel deletion.
    pub close_grace: Duration,
    /// Delay between an auto-close and channel deletion.
    pub auto_close_grace: Duration,
    /// How often the idle sweep runs.
    pub sweep_interval: Duration,
    /// How many recent messages the sweep inspects per ticket.
    pub history_scan_limit: usize,
    /// Role ids granted read/write/manage on every ticket channel.
    pub support_roles: Vec<String>,
    pub categories: Vec<TicketCategory>,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            max_tickets_per_user: 3,
            auto_close_hours: 72,
            idle_window_hours: 24,
            close_grace: Duration::from_secs(10),
            auto_close_grace: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(3600),
            history_scan_limit: 50,
            support_roles: Vec::new(),
            categories: vec![
                TicketCategory::new(
                    "Game Support",
                    "Issues with gameplay, bugs, or technical problems",
                ),
                TicketCategory::new("General Help", "Questions about the server or community"),
                TicketCategory::new("Report Issue", "Report problematic behavior or content"),
                TicketCategory::new("Suggestions", "Suggest new features or improvements"),
                TicketCategory::new("Moderator Help", "Need assistance from a moderator"),
            ],
        }
    }
}

impl TicketConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults above for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.max_tickets_per_user =
            env_parsed("MAX_TICKETS_PER_USER", config.max_tickets_per_user);
        config.auto_close_hours = env_parsed("TICKET_AUTO_CLOSE_HOURS", config.auto_close_hours);
        config.idle_window_hours = env_parsed("TICKET_IDLE_WINDOW_HOURS", config.idle_window_hours);
        if let Ok(raw) = std::env::var("SUPPORT_ROLE_IDS") {
            config.support_roles = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        config
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
