//! Bomberman bot decision engine.
//!
//! The bot cycles through four states:
//!
//! ```text
//! MoveToSoftWall -> PlaceBomb(target) -> MoveToSafeLocation -> Idle -> MoveToSoftWall
//! ```
//!
//! `MoveToSoftWall` and `MoveToSafeLocation` act on the periodic tick.
//! `PlaceBomb` and `Idle` wait for server events: arrival on the target
//! cell, and the explosion of this bot's bomb.

use crate::actions::{GameAction, GameEvent};
use crate::board::{PlayerId, Position};
use crate::game::GameState;
use crate::search;
use serde::{Deserialize, Serialize};

/// Controller state. Each variant carries the data it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotState {
    /// Look for the closest cell next to a soft wall and walk there
    MoveToSoftWall,
    /// Walking towards `target`; the bomb goes down on arrival
    PlaceBomb { target: Position },
    /// Bomb is down, get out of its reach
    MoveToSafeLocation,
    /// In cover, waiting for the bomb to go off
    Idle,
}

/// A bot player that decides on actions
#[derive(Debug, Clone)]
pub struct Bot {
    pub player_id: PlayerId,
    state: BotState,
}

impl Bot {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            state: BotState::MoveToSoftWall,
        }
    }

    pub fn state(&self) -> BotState {
        self.state
    }

    /// Periodic evaluation. Returns the batch of actions to send this tick,
    /// empty when waiting or when nothing useful can be done yet.
    pub fn tick(&mut self, game: &GameState) -> Vec<GameAction> {
        let Some(me) = game.me() else {
            return Vec::new();
        };
        let position = me.position;

        match self.state {
            BotState::MoveToSoftWall => {
                if !me.capabilities.can_place_bomb() {
                    return Vec::new();
                }
                let Some(target) = search::nearest_soft_wall_approach(game.board(), position)
                else {
                    return Vec::new();
                };

                if target == position {
                    self.state = BotState::MoveToSafeLocation;
                    return vec![GameAction::PlaceBomb];
                }

                let path = search::find_path(game.board(), position, target);
                if path.is_empty() {
                    return Vec::new();
                }
                self.state = BotState::PlaceBomb { target };
                path.into_iter().map(GameAction::Move).collect()
            }

            BotState::MoveToSafeLocation => {
                // wait until our bomb shows up so the search knows what to avoid
                if game.bombs_of(self.player_id).next().is_none() {
                    return Vec::new();
                }
                let Some(safe) = search::nearest_safe_cell(game.board(), game.bombs(), position)
                else {
                    return Vec::new();
                };

                let path = search::find_path(game.board(), position, safe);
                self.state = BotState::Idle;
                path.into_iter().map(GameAction::Move).collect()
            }

            BotState::PlaceBomb { .. } | BotState::Idle => Vec::new(),
        }
    }

    /// React to an event that has already been applied to `game`.
    pub fn observe(&mut self, game: &GameState, event: &GameEvent) -> Vec<GameAction> {
        if event.player() != Some(self.player_id) {
            return Vec::new();
        }

        match event {
            GameEvent::Move { .. } => {
                if let BotState::PlaceBomb { target } = self.state {
                    if game.my_position() == Some(target) {
                        // the Bomb event moves us on to MoveToSafeLocation
                        return vec![GameAction::PlaceBomb];
                    }
                }
                Vec::new()
            }
            GameEvent::Bomb { .. } => {
                self.state = BotState::MoveToSafeLocation;
                Vec::new()
            }
            GameEvent::BombExploded { .. } => {
                if self.state == BotState::Idle || self.state == BotState::MoveToSafeLocation {
                    self.state = BotState::MoveToSoftWall;
                }
                Vec::new()
            }
            GameEvent::PlayerDied { .. } => {
                self.state = BotState::Idle;
                Vec::new()
            }
            GameEvent::BonusSpawned { .. } | GameEvent::CollectBonus { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::GameSetup;
    use crate::board::{Board, Direction, SOFT_WALL};
    use pretty_assertions::assert_eq;

    fn game_with(board: Board, me: Position) -> GameState {
        GameState::new(GameSetup {
            board,
            player_id: 1,
            roster: vec![(1, me)],
        })
        .unwrap()
    }

    fn apply(game: &mut GameState, bot: &mut Bot, event: GameEvent) -> Vec<GameAction> {
        game.apply_event(&event).unwrap();
        bot.observe(game, &event)
    }

    #[test]
    fn test_bot_creation() {
        let bot = Bot::new(3);
        assert_eq!(bot.player_id, 3);
        assert_eq!(bot.state(), BotState::MoveToSoftWall);
    }

    #[test]
    fn test_adjacent_soft_wall_bombs_in_place() {
        let mut board = Board::empty(3, 3);
        board.set(Position::new(1, 2), SOFT_WALL).unwrap();
        let mut game = game_with(board, Position::new(1, 1));
        let mut bot = Bot::new(1);

        assert_eq!(bot.tick(&game), vec![GameAction::PlaceBomb]);
        assert_eq!(bot.state(), BotState::MoveToSafeLocation);

        apply(&mut game, &mut bot, GameEvent::Bomb { player: 1 });
        assert_eq!(bot.state(), BotState::MoveToSafeLocation);

        let actions = apply(
            &mut game,
            &mut bot,
            GameEvent::BombExploded {
                player: 1,
                origin: Position::new(1, 1),
                affected: vec![Position::new(1, 2)],
            },
        );
        assert!(actions.is_empty());
        assert_eq!(bot.state(), BotState::MoveToSoftWall);
    }

    #[test]
    fn test_walks_to_target_then_bombs_on_arrival() {
        //   y=1   .  S
        //   y=0   @  .
        let mut board = Board::empty(2, 2);
        board.set(Position::new(1, 1), SOFT_WALL).unwrap();
        let mut game = game_with(board, Position::new(0, 0));
        let mut bot = Bot::new(1);

        let actions = bot.tick(&game);
        assert_eq!(actions, vec![GameAction::Move(Direction::Up)]);
        assert_eq!(
            bot.state(),
            BotState::PlaceBomb {
                target: Position::new(0, 1)
            }
        );

        // waiting for arrival
        assert!(bot.tick(&game).is_empty());

        let actions = apply(
            &mut game,
            &mut bot,
            GameEvent::Move {
                player: 1,
                direction: Direction::Up,
            },
        );
        assert_eq!(actions, vec![GameAction::PlaceBomb]);
    }

    #[test]
    fn test_move_elsewhere_does_not_bomb() {
        let mut board = Board::empty(4, 1);
        board.set(Position::new(3, 0), SOFT_WALL).unwrap();
        let mut game = game_with(board, Position::new(0, 0));
        let mut bot = Bot::new(1);

        assert_eq!(
            bot.tick(&game),
            vec![GameAction::Move(Direction::Right), GameAction::Move(Direction::Right)]
        );

        let actions = apply(
            &mut game,
            &mut bot,
            GameEvent::Move {
                player: 1,
                direction: Direction::Right,
            },
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn test_flees_after_own_bomb() {
        let mut board = Board::empty(5, 5);
        board.set(Position::new(2, 3), SOFT_WALL).unwrap();
        let mut game = game_with(board, Position::new(2, 2));
        let mut bot = Bot::new(1);

        assert_eq!(bot.tick(&game), vec![GameAction::PlaceBomb]);

        // bomb not registered yet: hold
        assert!(bot.tick(&game).is_empty());
        assert_eq!(bot.state(), BotState::MoveToSafeLocation);

        apply(&mut game, &mut bot, GameEvent::Bomb { player: 1 });
        let moves = bot.tick(&game);
        assert_eq!(bot.state(), BotState::Idle);

        let destination = moves.iter().fold(Position::new(2, 2), |pos, action| match action {
            GameAction::Move(d) => pos.step(*d),
            GameAction::PlaceBomb => pos,
        });
        assert!(!search::is_in_danger(game.bombs(), destination));

        // idle until the explosion
        assert!(bot.tick(&game).is_empty());
    }

    #[test]
    fn test_other_players_do_not_drive_state() {
        let mut game = GameState::new(GameSetup {
            board: Board::empty(4, 4),
            player_id: 1,
            roster: vec![(1, Position::new(0, 0)), (2, Position::new(3, 3))],
        })
        .unwrap();
        let mut bot = Bot::new(1);

        apply(&mut game, &mut bot, GameEvent::Bomb { player: 2 });
        assert_eq!(bot.state(), BotState::MoveToSoftWall);
    }

    #[test]
    fn test_no_bombs_left_means_no_plan() {
        let mut board = Board::empty(3, 3);
        board.set(Position::new(1, 2), SOFT_WALL).unwrap();
        let mut game = game_with(board, Position::new(1, 1));
        let mut bot = Bot::new(1);

        game.apply_event(&GameEvent::Bomb { player: 1 }).unwrap();
        assert!(bot.tick(&game).is_empty());
        assert_eq!(bot.state(), BotState::MoveToSoftWall);
    }

    #[test]
    fn test_dead_bot_never_acts() {
        let mut board = Board::empty(3, 3);
        board.set(Position::new(1, 2), SOFT_WALL).unwrap();
        let mut game = game_with(board, Position::new(1, 1));
        let mut bot = Bot::new(1);

        apply(
            &mut game,
            &mut bot,
            GameEvent::PlayerDied {
                player: 1,
                position: Position::new(1, 1),
            },
        );
        assert!(bot.tick(&game).is_empty());
    }
}
