//! Component-id dispatch for persistent UI elements.
//!
//! The platform delivers component interactions (dropdowns, buttons) keyed
//! by an opaque string id that survives process restarts. Handlers are a
//! pure mapping registered deterministically at startup; nothing here
//! depends on runtime object identity.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::Result;

/// The interaction payload handed to a component handler.
#[derive(Debug, Clone)]
pub struct ComponentEvent {
    pub community_id: String,
    pub channel_id: String,
    pub member_id: String,
    /// Selected value for dropdowns, empty for plain buttons.
    pub value: String,
}

pub type ComponentHandler =
    Arc<dyn Fn(ComponentEvent) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Mapping from stable component ids to handlers.
#[derive(Default)]
pub struct ComponentRegistry {
    handlers: HashMap<String, ComponentHandler>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a stable id. Re-registering replaces the
    /// previous handler, so startup registration is idempotent.
    pub fn register<F>(&mut self, component_id: impl Into<String>, handler: F)
    where
        F: Fn(ComponentEvent) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        self.handlers.insert(component_id.into(), Arc::new(handler));
    }

    /// Look up the handler for a component id. Unknown ids are not an error;
    /// the platform can deliver interactions for components an older build
    /// registered.
    pub fn resolve(&self, component_id: &str) -> Option<ComponentHandler> {
        self.handlers.get(component_id).cloned()
    }

    pub fn registered_ids(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}
