//! Slash commands for the 302 Party clan bot
//!
//! Commands are grouped by concern: the points economy, member lookups,
//! verification, rank requirements, giveaways, and GE price tools. All
//! shared state lives in [`Data`], built by the bot binary.

pub mod config_cmd;
pub mod cooldown;
pub mod framework;
pub mod giveaway;
pub mod name;
pub mod points;
pub mod prices;
pub mod ranks;
pub mod requirements;
pub mod updaters;
pub mod verify;

pub use cooldown::{CooldownConfig, CooldownManager};
pub use framework::{create_framework_options, Context, Data, Error};
pub use giveaway::{handle_entry_button, ENTRY_BUTTON_ID};
