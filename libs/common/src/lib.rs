//! Shared foundation for the Vigil bot core: the platform adapter seam, the
//! error taxonomy, the flat-file JSON store, and component dispatch.

pub mod adapter;
pub mod dispatch;
pub mod error;
pub mod store;
pub mod time;

pub use adapter::{
    ChannelPermissions, HistoryMessage, InviteUsage, OverrideTarget, PermissionOverride,
    PlatformAdapter,
};
pub use dispatch::{ComponentEvent, ComponentRegistry};
pub use error::{Error, Result};
pub use store::JsonStore;
