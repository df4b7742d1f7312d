//! Client-side mirror of the game.
//!
//! `GameState` owns the board, the roster and the bomb registry. It is only
//! ever mutated by applying server events; the decision engine reads it.

use crate::actions::{GameEvent, GameSetup};
use crate::board::{Board, PlayerId, Position, FREE};
use crate::player::{Capabilities, Player};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while applying events to the mirrored state.
///
/// None of them are fatal: the event is dropped and the state stays as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Board snapshot is empty")]
    EmptyBoard,

    #[error("Board snapshot has columns of different lengths")]
    RaggedBoard,

    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("Position {0} is outside the board")]
    OutOfBounds(Position),

    #[error("Player {player} cannot move to {to}")]
    BlockedMove { player: PlayerId, to: Position },
}

/// A bomb ticking on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bomb {
    pub owner: PlayerId,
    /// Owner's blast radius at the moment the bomb was dropped
    pub radius: u8,
    pub position: Position,
}

impl Bomb {
    /// Whether the cell lies on this bomb's row or column within its radius.
    ///
    /// Walls between the bomb and the cell are not taken into account.
    pub fn reaches(&self, pos: Position) -> bool {
        let radius = u32::from(self.radius);
        (self.position.x == pos.x && self.position.y.abs_diff(pos.y) <= radius)
            || (self.position.y == pos.y && self.position.x.abs_diff(pos.x) <= radius)
    }
}

/// The complete mirrored game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// The game board, occupancy overlay included
    board: Board,
    /// Living players
    players: BTreeMap<PlayerId, Player>,
    /// Bombs that have not exploded yet, in placement order
    bombs: Vec<Bomb>,
    /// This bot's player id
    player_id: PlayerId,
}

impl GameState {
    /// Create the mirror from the game start snapshot
    pub fn new(setup: GameSetup) -> Result<Self, GameError> {
        let GameSetup {
            mut board,
            player_id,
            roster,
        } = setup;

        let mut players = BTreeMap::new();
        for (id, position) in roster {
            if !board.in_bounds(position) {
                return Err(GameError::OutOfBounds(position));
            }
            if players.insert(id, Player::new(id, position)).is_none() {
                board.add_occupant(position)?;
            }
        }

        Ok(Self {
            board,
            players,
            bombs: Vec::new(),
            player_id,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn bombs(&self) -> &[Bomb] {
        &self.bombs
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// This bot's player id
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// This bot, if still alive
    pub fn me(&self) -> Option<&Player> {
        self.player(self.player_id)
    }

    pub fn my_position(&self) -> Option<Position> {
        self.me().map(|p| p.position)
    }

    pub fn capabilities(&self, id: PlayerId) -> Option<Capabilities> {
        self.player(id).map(|p| p.capabilities)
    }

    /// Bombs dropped by a given player that have not exploded yet
    pub fn bombs_of(&self, owner: PlayerId) -> impl Iterator<Item = &Bomb> {
        self.bombs.iter().filter(move |b| b.owner == owner)
    }

    /// Apply one server event to the mirror
    pub fn apply_event(&mut self, event: &GameEvent) -> Result<(), GameError> {
        match event {
            GameEvent::Move { player, direction } => {
                let player_state = self
                    .players
                    .get_mut(player)
                    .ok_or(GameError::UnknownPlayer(*player))?;

                let from = player_state.position;
                let to = from.step(*direction);
                if !self.board.is_traversable(to) {
                    return Err(GameError::BlockedMove {
                        player: *player,
                        to,
                    });
                }

                self.board.remove_occupant(from)?;
                self.board.add_occupant(to)?;
                player_state.position = to;
                Ok(())
            }

            GameEvent::Bomb { player } => {
                let player_state = self
                    .players
                    .get_mut(player)
                    .ok_or(GameError::UnknownPlayer(*player))?;

                let bomb = Bomb {
                    owner: *player,
                    radius: player_state.capabilities.blast_radius,
                    position: player_state.position,
                };
                self.board.add_bomb(bomb.position)?;
                player_state.capabilities.consume_bomb();
                self.bombs.push(bomb);
                Ok(())
            }

            GameEvent::BombExploded {
                player,
                origin,
                affected,
            } => {
                for pos in affected {
                    if self.board.in_bounds(*pos) {
                        self.board.set(*pos, FREE)?;
                    }
                }
                if self.board.has_bomb(*origin) {
                    self.board.remove_bomb(*origin)?;
                }

                let index = self
                    .bombs
                    .iter()
                    .position(|b| b.owner == *player && b.position == *origin)
                    .or_else(|| self.bombs.iter().position(|b| b.owner == *player));
                if let Some(index) = index {
                    self.bombs.remove(index);
                }

                // the owner may have died before its bomb went off
                if let Some(owner) = self.players.get_mut(player) {
                    owner.capabilities.restore_bomb();
                }
                Ok(())
            }

            GameEvent::BonusSpawned { position, bonus } => {
                self.board.place_bonus(*position, *bonus)
            }

            GameEvent::CollectBonus {
                player,
                bonus,
                position,
            } => {
                if self.board.in_bounds(*position) {
                    self.board.clear_bonus(*position)?;
                }
                let player_state = self
                    .players
                    .get_mut(player)
                    .ok_or(GameError::UnknownPlayer(*player))?;
                player_state.capabilities.apply_bonus_code(*bonus);
                Ok(())
            }

            GameEvent::PlayerDied { player, position } => {
                let removed = self
                    .players
                    .remove(player)
                    .ok_or(GameError::UnknownPlayer(*player))?;

                let cell = if self.board.in_bounds(removed.position) {
                    removed.position
                } else {
                    *position
                };
                if self.board.in_bounds(cell) {
                    self.board.remove_occupant(cell)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Direction, OCCUPANT, SOFT_WALL};
    use pretty_assertions::assert_eq;

    fn setup(board: Board, roster: Vec<(PlayerId, Position)>) -> GameState {
        GameState::new(GameSetup {
            board,
            player_id: roster[0].0,
            roster,
        })
        .unwrap()
    }

    #[test]
    fn test_new_game_marks_occupants() {
        let game = setup(
            Board::empty(5, 5),
            vec![(1, Position::new(0, 0)), (2, Position::new(4, 4))],
        );

        assert_eq!(game.board().get(Position::new(0, 0)), Some(OCCUPANT));
        assert_eq!(game.board().get(Position::new(4, 4)), Some(OCCUPANT));
        assert_eq!(game.my_position(), Some(Position::new(0, 0)));
        assert_eq!(game.players().count(), 2);
    }

    #[test]
    fn test_roster_out_of_bounds() {
        let result = GameState::new(GameSetup {
            board: Board::empty(2, 2),
            player_id: 1,
            roster: vec![(1, Position::new(3, 0))],
        });
        assert!(matches!(result, Err(GameError::OutOfBounds(_))));
    }

    #[test]
    fn test_move_updates_position_and_overlay() {
        let mut game = setup(Board::empty(3, 3), vec![(1, Position::new(1, 1))]);

        game.apply_event(&GameEvent::Move {
            player: 1,
            direction: Direction::Up,
        })
        .unwrap();

        assert_eq!(game.my_position(), Some(Position::new(1, 2)));
        assert_eq!(game.board().get(Position::new(1, 1)), Some(0));
        assert_eq!(game.board().get(Position::new(1, 2)), Some(OCCUPANT));
    }

    #[test]
    fn test_move_blocked_leaves_state() {
        let mut board = Board::empty(3, 3);
        board.set(Position::new(2, 1), SOFT_WALL).unwrap();
        let mut game = setup(board, vec![(1, Position::new(1, 1))]);

        let right = game.apply_event(&GameEvent::Move {
            player: 1,
            direction: Direction::Right,
        });
        assert!(matches!(right, Err(GameError::BlockedMove { .. })));

        game.apply_event(&GameEvent::Move {
            player: 1,
            direction: Direction::Down,
        })
        .unwrap();
        let off_board = game.apply_event(&GameEvent::Move {
            player: 1,
            direction: Direction::Down,
        });
        assert!(off_board.is_err());
        assert_eq!(game.my_position(), Some(Position::new(1, 0)));
    }

    #[test]
    fn test_move_onto_bonus_cell() {
        let mut board = Board::empty(3, 3);
        board.set(Position::new(1, 2), 11).unwrap();
        let mut game = setup(board, vec![(1, Position::new(1, 1))]);

        game.apply_event(&GameEvent::Move {
            player: 1,
            direction: Direction::Up,
        })
        .unwrap();
        assert_eq!(game.board().get(Position::new(1, 2)), Some(OCCUPANT + 11));
    }

    #[test]
    fn test_bomb_lifecycle() {
        let mut game = setup(Board::empty(5, 5), vec![(1, Position::new(2, 2))]);

        game.apply_event(&GameEvent::Bomb { player: 1 }).unwrap();
        assert_eq!(
            game.bombs(),
            &[Bomb {
                owner: 1,
                radius: 2,
                position: Position::new(2, 2),
            }]
        );
        assert!(game.board().has_bomb(Position::new(2, 2)));
        assert_eq!(game.capabilities(1).unwrap().bombs_available, 0);

        game.apply_event(&GameEvent::BombExploded {
            player: 1,
            origin: Position::new(2, 2),
            affected: vec![Position::new(2, 3), Position::new(2, 4), Position::new(9, 9)],
        })
        .unwrap();

        assert!(game.bombs().is_empty());
        assert!(!game.board().has_bomb(Position::new(2, 2)));
        assert_eq!(game.capabilities(1).unwrap().bombs_available, 1);
    }

    #[test]
    fn test_bomb_before_bonus_pickup() {
        let mut board = Board::empty(3, 1);
        board.set(Position::new(1, 0), 13).unwrap();
        let mut game = setup(board, vec![(1, Position::new(0, 0))]);

        game.apply_event(&GameEvent::Move {
            player: 1,
            direction: Direction::Right,
        })
        .unwrap();
        game.apply_event(&GameEvent::Bomb { player: 1 }).unwrap();
        game.apply_event(&GameEvent::CollectBonus {
            player: 1,
            bonus: 13,
            position: Position::new(1, 0),
        })
        .unwrap();
        game.apply_event(&GameEvent::Move {
            player: 1,
            direction: Direction::Right,
        })
        .unwrap();

        assert!(game.board().has_bomb(Position::new(1, 0)));
        assert!(!game.board().is_traversable(Position::new(1, 0)));
        assert_eq!(game.capabilities(1).unwrap().max_bombs, 2);
    }

    #[test]
    fn test_bomb_radius_captured_at_placement() {
        let mut game = setup(Board::empty(5, 5), vec![(1, Position::new(2, 2))]);
        game.apply_event(&GameEvent::Bomb { player: 1 }).unwrap();
        game.apply_event(&GameEvent::CollectBonus {
            player: 1,
            bonus: 11,
            position: Position::new(2, 2),
        })
        .unwrap();

        assert_eq!(game.capabilities(1).unwrap().blast_radius, 4);
        assert_eq!(game.bombs()[0].radius, 2);
    }

    #[test]
    fn test_explosion_clears_soft_walls() {
        let mut board = Board::empty(5, 5);
        board.set(Position::new(2, 4), SOFT_WALL).unwrap();
        let mut game = setup(board, vec![(1, Position::new(2, 2))]);
        game.apply_event(&GameEvent::Bomb { player: 1 }).unwrap();

        game.apply_event(&GameEvent::BombExploded {
            player: 1,
            origin: Position::new(2, 2),
            affected: vec![Position::new(2, 2), Position::new(2, 3), Position::new(2, 4)],
        })
        .unwrap();
        assert_eq!(game.board().get(Position::new(2, 4)), Some(0));
    }

    #[test]
    fn test_bonus_spawn_and_collect() {
        let mut game = setup(
            Board::empty(4, 4),
            vec![(1, Position::new(0, 0)), (2, Position::new(3, 3))],
        );

        game.apply_event(&GameEvent::BonusSpawned {
            position: Position::new(1, 0),
            bonus: 13,
        })
        .unwrap();
        assert_eq!(game.board().bonus_at(Position::new(1, 0)), Some(13));

        game.apply_event(&GameEvent::Move {
            player: 1,
            direction: Direction::Right,
        })
        .unwrap();
        game.apply_event(&GameEvent::CollectBonus {
            player: 1,
            bonus: 13,
            position: Position::new(1, 0),
        })
        .unwrap();

        assert_eq!(game.board().get(Position::new(1, 0)), Some(OCCUPANT));
        let caps = game.capabilities(1).unwrap();
        assert_eq!(caps.max_bombs, 2);
        assert_eq!(caps.bombs_available, 2);
        assert_eq!(game.capabilities(2), Some(Capabilities::default()));
    }

    #[test]
    fn test_player_died_is_purged() {
        let mut game = setup(
            Board::empty(4, 4),
            vec![(1, Position::new(0, 0)), (2, Position::new(3, 3))],
        );

        game.apply_event(&GameEvent::Bomb { player: 2 }).unwrap();
        game.apply_event(&GameEvent::PlayerDied {
            player: 2,
            position: Position::new(3, 3),
        })
        .unwrap();

        assert!(game.player(2).is_none());
        assert_eq!(game.board().get(Position::new(3, 3)), Some(3));

        // later references to the dead player are harmless
        assert_eq!(
            game.apply_event(&GameEvent::Move {
                player: 2,
                direction: Direction::Down,
            }),
            Err(GameError::UnknownPlayer(2))
        );
        game.apply_event(&GameEvent::BombExploded {
            player: 2,
            origin: Position::new(3, 3),
            affected: vec![Position::new(3, 3), Position::new(3, 2)],
        })
        .unwrap();
        assert!(game.bombs().is_empty());
        assert_eq!(
            game.apply_event(&GameEvent::PlayerDied {
                player: 2,
                position: Position::new(3, 3),
            }),
            Err(GameError::UnknownPlayer(2))
        );
    }
}
