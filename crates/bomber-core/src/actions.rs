//! Actions the bot issues and the game events it reacts to.
//!
//! Actions map one-to-one onto outbound RPC calls. Events are the decoded,
//! typed form of the server's game notifications.

use crate::board::{Board, Direction, PlayerId, Position};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// All actions the bot can send to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    /// Step one cell in a direction
    Move(Direction),
    /// Drop a bomb on the current cell
    PlaceBomb,
}

impl GameAction {
    /// RPC method name
    pub fn method(&self) -> &'static str {
        match self {
            GameAction::Move(_) => "Move",
            GameAction::PlaceBomb => "PlaceBomb",
        }
    }

    /// RPC arguments
    pub fn args(&self) -> Value {
        match self {
            GameAction::Move(direction) => json!({ "Direction": direction }),
            GameAction::PlaceBomb => Value::Null,
        }
    }
}

/// Initial snapshot delivered when a game starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSetup {
    pub board: Board,
    /// This bot's player id
    pub player_id: PlayerId,
    /// Every player and its starting cell, this bot included
    pub roster: Vec<(PlayerId, Position)>,
}

/// Game notifications that mutate the mirrored state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A player stepped one cell
    Move {
        player: PlayerId,
        direction: Direction,
    },
    /// A player dropped a bomb where it stands
    Bomb { player: PlayerId },
    /// A bomb went off, clearing the affected cells
    BombExploded {
        player: PlayerId,
        origin: Position,
        affected: Vec<Position>,
    },
    /// A bonus appeared on the board
    BonusSpawned { position: Position, bonus: i32 },
    /// A player picked up a bonus
    CollectBonus {
        player: PlayerId,
        bonus: i32,
        position: Position,
    },
    /// A player was eliminated
    PlayerDied { player: PlayerId, position: Position },
}

impl GameEvent {
    /// The player this event is about, if any
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            GameEvent::Move { player, .. }
            | GameEvent::Bomb { player }
            | GameEvent::BombExploded { player, .. }
            | GameEvent::CollectBonus { player, .. }
            | GameEvent::PlayerDied { player, .. } => Some(*player),
            GameEvent::BonusSpawned { .. } => None,
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::Move { .. } => "Move",
            GameEvent::Bomb { .. } => "Bomb",
            GameEvent::BombExploded { .. } => "BombExploded",
            GameEvent::BonusSpawned { .. } => "BonusSpawned",
            GameEvent::CollectBonus { .. } => "CollectBonus",
            GameEvent::PlayerDied { .. } => "PlayerDied",
        }
    }
}
