//! Ticket lifecycle management: isolated support channels, permission
//! scoping, transcripts, and idle auto-closure.

pub mod config;
pub mod manager;
pub mod ticket;
pub mod transcript;

pub use config::{TicketCategory, TicketConfig};
pub use manager::TicketManager;
pub use ticket::{Ticket, TicketLogConfig, TicketStatus, TicketStore};
pub use transcript::Transcript;
