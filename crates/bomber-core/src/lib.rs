//! Bomber - core engine for an autonomous bomberman bot
//!
//! This crate provides everything the bot needs to play, with no I/O:
//! - Board representation with the cell code encoding and occupancy overlay
//! - Player capabilities and the bonus effect table
//! - The client-side game mirror, updated from server events
//! - Breadth-first searches for soft walls, paths and safe cells
//! - The bot's state machine
//!
//! # Architecture
//!
//! The engine is transport-agnostic. A client decodes server notifications
//! into [`GameEvent`]s, applies them to a [`GameState`], and forwards them to
//! the [`Bot`]. On each timer tick the bot reads the state and returns the
//! [`GameAction`]s to send.
//!
//! # Modules
//!
//! - [`board`]: Grid, positions and directions
//! - [`player`]: Capabilities and bonuses
//! - [`game`]: Game mirror and bomb registry
//! - [`search`]: Path, soft wall and hazard searches
//! - [`bot`]: Decision engine

pub mod actions;
pub mod board;
pub mod bot;
pub mod game;
pub mod player;
pub mod search;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent, GameSetup};
pub use board::{Board, Direction, PlayerId, Position};
pub use bot::{Bot, BotState};
pub use game::{Bomb, GameError, GameState};
pub use player::{Bonus, Capabilities, Player};
