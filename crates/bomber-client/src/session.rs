//! Game session: the mirrored state plus the bot playing it.

use bomber_core::{Bot, BotState, GameAction, GameError, GameEvent, GameSetup, GameState};
use tracing::{debug, info, warn};

/// One game, from `GameStart` until the next one replaces it.
#[derive(Debug)]
pub struct GameSession {
    state: GameState,
    bot: Bot,
}

impl GameSession {
    pub fn start(setup: GameSetup) -> Result<Self, GameError> {
        let player_id = setup.player_id;
        let state = GameState::new(setup)?;
        info!(
            "Game started as player {} at {} on a {}x{} board",
            player_id,
            state
                .my_position()
                .map_or_else(|| "?".to_string(), |p| p.to_string()),
            state.board().width(),
            state.board().height()
        );
        debug!("\n{}", state.board());

        Ok(Self {
            state,
            bot: Bot::new(player_id),
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn bot_state(&self) -> BotState {
        self.bot.state()
    }

    /// Apply a server event and collect whatever the bot wants to do about it.
    ///
    /// An event the mirror cannot apply is logged and dropped.
    pub fn apply(&mut self, event: &GameEvent) -> Vec<GameAction> {
        if let Err(e) = self.state.apply_event(event) {
            match e {
                GameError::UnknownPlayer(_) => debug!("Ignoring {} event: {}", event.name(), e),
                _ => warn!("Ignoring {} event: {}", event.name(), e),
            }
            return Vec::new();
        }
        debug!("Applied {:?}", event);

        let before = self.bot.state();
        let actions = self.bot.observe(&self.state, event);
        self.log_transition(before, event.name());
        actions
    }

    /// Run one controller tick
    pub fn tick(&mut self) -> Vec<GameAction> {
        let before = self.bot.state();
        let actions = self.bot.tick(&self.state);
        self.log_transition(before, "tick");
        if !actions.is_empty() {
            debug!("Tick in {:?} issued {} actions", before, actions.len());
        }
        actions
    }

    fn log_transition(&self, before: BotState, cause: &str) {
        let after = self.bot.state();
        if before != after {
            info!("Bot {:?} -> {:?} ({})", before, after, cause);
        }
    }
}
