//! Shared error types, external API clients, and utilities for Party Bot

pub mod error;
pub mod getracker;
pub mod time;
pub mod wom;

// Re-export commonly used types
pub use error::{PartyError, Result};
pub use getracker::{
    BlastFurnaceMethod, GeTrackerClient, GeTrackerConfig, GeTrackerResponse, ItemDetail,
    ItemSummary,
};
pub use time::{format_days, parse_time_requirement};
pub use wom::{GroupDetail, GroupMembership, NameChange, Player, WomClient, WomConfig};
