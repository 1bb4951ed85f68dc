use std::fmt;

/// Application-level error shared by every Vigil subsystem.
///
/// Each variant carries a human-readable reason that the command layer can
/// forward to the user verbatim. The taxonomy is deliberately small: the
/// subsystems are glue over a platform adapter and a flat-file store, and
/// those are the only two things that can fail.
#[derive(Debug)]
pub enum Error {
    /// The caller lacks the capability required for this operation.
    PermissionDenied(String),
    /// A per-user quota (e.g. open tickets) would be exceeded.
    LimitExceeded(String),
    /// Unknown ticket, channel, member, or category.
    NotFound(String),
    /// An external platform call failed (transport error or missing
    /// privilege). Read paths degrade instead of surfacing this.
    AdapterUnavailable(String),
    /// The backing JSON document could not be written. In-memory state stays
    /// authoritative until the next successful write.
    Persistence(String),
}

impl Error {
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    pub fn limit_exceeded(message: impl Into<String>) -> Self {
        Self::LimitExceeded(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn adapter_unavailable(message: impl Into<String>) -> Self {
        Self::AdapterUnavailable(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Stable machine-readable code for logs and user-facing responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::LimitExceeded(_) => "LIMIT_EXCEEDED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AdapterUnavailable(_) => "ADAPTER_UNAVAILABLE",
            Self::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::PermissionDenied(m)
            | Self::LimitExceeded(m)
            | Self::NotFound(m)
            | Self::AdapterUnavailable(m)
            | Self::Persistence(m) => m,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
