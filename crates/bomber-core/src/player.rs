//! Player state and bomb capabilities.
//!
//! This module contains:
//! - Player struct with position and capabilities
//! - Capability record (bomb count, blast radius) and its bounds
//! - The bonus pickup table

use crate::board::{PlayerId, Position};
use serde::{Deserialize, Serialize};

/// Smallest blast radius a player can be reduced to
pub const MIN_BLAST_RADIUS: u8 = 1;
/// Largest blast radius a player can grow to
pub const MAX_BLAST_RADIUS: u8 = 4;
/// Smallest bomb allowance
pub const MIN_BOMBS: u8 = 1;
/// Largest bomb allowance
pub const MAX_BOMBS: u8 = 3;
/// Blast radius every player starts with
pub const DEFAULT_BLAST_RADIUS: u8 = 2;

/// Bonus pickups and their board codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bonus {
    /// Blast radius +1
    RadiusUp,
    /// Blast radius set to the maximum
    RadiusMax,
    /// Blast radius -1
    RadiusDown,
    /// One more bomb
    BombUp,
    /// One bomb less
    BombDown,
}

impl Bonus {
    pub const ALL: [Bonus; 5] = [
        Bonus::RadiusUp,
        Bonus::RadiusMax,
        Bonus::RadiusDown,
        Bonus::BombUp,
        Bonus::BombDown,
    ];

    /// Look up a bonus by its board code. Unknown codes yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            10 => Some(Bonus::RadiusUp),
            11 => Some(Bonus::RadiusMax),
            12 => Some(Bonus::RadiusDown),
            13 => Some(Bonus::BombUp),
            14 => Some(Bonus::BombDown),
            _ => None,
        }
    }

    /// Board code for this bonus
    pub const fn code(&self) -> i32 {
        match self {
            Bonus::RadiusUp => 10,
            Bonus::RadiusMax => 11,
            Bonus::RadiusDown => 12,
            Bonus::BombUp => 13,
            Bonus::BombDown => 14,
        }
    }
}

/// What a player is currently able to do with bombs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub max_bombs: u8,
    pub bombs_available: u8,
    pub blast_radius: u8,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            max_bombs: MIN_BOMBS,
            bombs_available: MIN_BOMBS,
            blast_radius: DEFAULT_BLAST_RADIUS,
        }
    }
}

impl Capabilities {
    /// Apply a bonus effect. Bombs available never exceed the allowance afterwards.
    pub fn apply_bonus(&mut self, bonus: Bonus) {
        match bonus {
            Bonus::RadiusUp => {
                self.blast_radius = (self.blast_radius + 1).min(MAX_BLAST_RADIUS);
            }
            Bonus::RadiusMax => self.blast_radius = MAX_BLAST_RADIUS,
            Bonus::RadiusDown => {
                self.blast_radius = self.blast_radius.saturating_sub(1).max(MIN_BLAST_RADIUS);
            }
            Bonus::BombUp => {
                self.max_bombs = (self.max_bombs + 1).min(MAX_BOMBS);
                self.bombs_available = self.bombs_available.saturating_add(1);
            }
            Bonus::BombDown => {
                self.max_bombs = self.max_bombs.saturating_sub(1).max(MIN_BOMBS);
            }
        }
        self.bombs_available = self.bombs_available.min(self.max_bombs);
    }

    /// Apply a bonus by board code; unknown codes are ignored.
    /// Returns whether anything was applied.
    pub fn apply_bonus_code(&mut self, code: i32) -> bool {
        match Bonus::from_code(code) {
            Some(bonus) => {
                self.apply_bonus(bonus);
                true
            }
            None => false,
        }
    }

    /// A bomb has been placed
    pub fn consume_bomb(&mut self) {
        self.bombs_available = self.bombs_available.saturating_sub(1);
    }

    /// A bomb has exploded and can be placed again
    pub fn restore_bomb(&mut self) {
        self.bombs_available = (self.bombs_available + 1).min(self.max_bombs);
    }

    pub fn can_place_bomb(&self) -> bool {
        self.bombs_available > 0
    }
}

/// A player on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub position: Position,
    pub capabilities: Capabilities,
}

impl Player {
    pub fn new(id: PlayerId, position: Position) -> Self {
        Self {
            id,
            position,
            capabilities: Capabilities::default(),
        }
    }
}
