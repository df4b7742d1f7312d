//! Board representation: the cell grid, positions and movement directions.
//!
//! The grid is indexed `cells[x][y]`. Each cell holds an integer code:
//! - `0`: free
//! - `1`: indestructible wall
//! - `2`: soft (destructible) wall
//! - `10..100`: free cell carrying a bonus pickup
//! - `value % 100 == 3`: a bomb is present
//!
//! Players standing on a cell add [`OCCUPANT`] to it, so the hundreds
//! component counts superimposed occupants while the low two digits keep
//! the underlying terrain, bonus or bomb marker.

use crate::game::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Player identifier as sent by the server
pub type PlayerId = i32;

/// Free cell
pub const FREE: i32 = 0;
/// Indestructible wall
pub const WALL: i32 = 1;
/// Destructible wall
pub const SOFT_WALL: i32 = 2;
/// Bomb marker (low two digits)
pub const BOMB: i32 = 3;
/// Added to a cell for every player standing on it
pub const OCCUPANT: i32 = 100;

/// A cell coordinate on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step in `direction`
    pub fn step(&self, direction: Direction) -> Position {
        let (dx, dy) = direction.delta();
        Position::new(self.x + dx, self.y + dy)
    }

    /// Manhattan distance to another position
    pub fn distance_to(&self, other: &Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Movement direction, serialized as the server's `UP`/`DOWN`/`LEFT`/`RIGHT` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Search order used by every scan over the grid
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit offset. `Up` increases y.
    pub const fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Wire token for this direction
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a raw cell code can be walked on: free, or free with a bonus on it.
pub fn is_walkable_code(code: i32) -> bool {
    code == FREE || (10..100).contains(&code)
}

/// Whether a raw cell code carries a bomb
pub fn is_bomb_code(code: i32) -> bool {
    code % 100 == BOMB
}

/// The game grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: Vec<Vec<i32>>,
}

impl Board {
    /// Build a board from a `cells[x][y]` snapshot.
    ///
    /// Every column must have the same length.
    pub fn from_cells(cells: Vec<Vec<i32>>) -> Result<Self, GameError> {
        let height = match cells.first() {
            Some(column) if !column.is_empty() => column.len(),
            _ => return Err(GameError::EmptyBoard),
        };
        if cells.iter().any(|column| column.len() != height) {
            return Err(GameError::RaggedBoard);
        }
        Ok(Self { cells })
    }

    /// An all-free board
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            cells: vec![vec![FREE; height]; width],
        }
    }

    pub fn width(&self) -> i32 {
        self.cells.len() as i32
    }

    pub fn height(&self) -> i32 {
        self.cells.first().map_or(0, |c| c.len()) as i32
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width() && pos.y >= 0 && pos.y < self.height()
    }

    /// Raw cell code, `None` outside the board
    pub fn get(&self, pos: Position) -> Option<i32> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(self.cells[pos.x as usize][pos.y as usize])
    }

    /// Overwrite a cell. Out-of-bounds writes are rejected.
    pub fn set(&mut self, pos: Position, code: i32) -> Result<(), GameError> {
        let cell = self.cell_mut(pos)?;
        *cell = code;
        Ok(())
    }

    fn cell_mut(&mut self, pos: Position) -> Result<&mut i32, GameError> {
        if !self.in_bounds(pos) {
            return Err(GameError::OutOfBounds(pos));
        }
        Ok(&mut self.cells[pos.x as usize][pos.y as usize])
    }

    /// In bounds and free (possibly with a bonus on it)
    pub fn is_traversable(&self, pos: Position) -> bool {
        self.get(pos).is_some_and(is_walkable_code)
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        self.get(pos) == Some(WALL)
    }

    pub fn is_soft_wall(&self, pos: Position) -> bool {
        self.get(pos) == Some(SOFT_WALL)
    }

    pub fn has_bomb(&self, pos: Position) -> bool {
        self.get(pos).is_some_and(is_bomb_code)
    }

    /// Bonus code lying on the cell, ignoring occupants
    pub fn bonus_at(&self, pos: Position) -> Option<i32> {
        let terrain = self.get(pos)? % OCCUPANT;
        (10..100).contains(&terrain).then_some(terrain)
    }

    /// Mark a player as standing on the cell
    pub fn add_occupant(&mut self, pos: Position) -> Result<(), GameError> {
        *self.cell_mut(pos)? += OCCUPANT;
        Ok(())
    }

    /// Remove one occupant from the cell. A cell already cleared (for
    /// instance by an explosion) is left as is.
    pub fn remove_occupant(&mut self, pos: Position) -> Result<(), GameError> {
        let cell = self.cell_mut(pos)?;
        if *cell >= OCCUPANT {
            *cell -= OCCUPANT;
        }
        Ok(())
    }

    /// Add a bomb marker to the cell. A bonus still lying there is dropped.
    pub fn add_bomb(&mut self, pos: Position) -> Result<(), GameError> {
        let cell = self.cell_mut(pos)?;
        let terrain = *cell % OCCUPANT;
        if (10..100).contains(&terrain) {
            *cell -= terrain;
        }
        *cell += BOMB;
        Ok(())
    }

    /// Remove a bomb marker from the cell
    pub fn remove_bomb(&mut self, pos: Position) -> Result<(), GameError> {
        let cell = self.cell_mut(pos)?;
        if is_bomb_code(*cell) {
            *cell -= BOMB;
        }
        Ok(())
    }

    /// Put a bonus on the cell, keeping whoever stands on it
    pub fn place_bonus(&mut self, pos: Position, bonus: i32) -> Result<(), GameError> {
        let cell = self.cell_mut(pos)?;
        *cell = (*cell / OCCUPANT) * OCCUPANT + bonus;
        Ok(())
    }

    /// Remove a bonus from the cell, keeping whoever stands on it
    pub fn clear_bonus(&mut self, pos: Position) -> Result<(), GameError> {
        let cell = self.cell_mut(pos)?;
        let terrain = *cell % OCCUPANT;
        if (10..100).contains(&terrain) {
            *cell -= terrain;
        }
        Ok(())
    }

    /// Iterate over every position of the board, column by column
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let height = self.height();
        (0..self.width()).flat_map(move |x| (0..height).map(move |y| Position::new(x, y)))
    }
}

impl fmt::Display for Board {
    /// Renders the highest row first so `UP` points up on screen.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board columns={} rows={}", self.width(), self.height())?;
        for y in (0..self.height()).rev() {
            for x in 0..self.width() {
                write!(f, "{:>3} ", self.cells[x as usize][y as usize])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
