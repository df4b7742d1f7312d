//! RPC protocol messages exchanged with the game server.
//!
//! Every line on the wire is `{"method": ..., "args": ...}`. The server
//! capitalizes the keys (`Method`/`Args`) and encodes most event fields as
//! strings holding JSON, so every field goes through [`decode_nested`].

use bomber_core::{
    Board, Direction, GameAction, GameError, GameEvent, GameSetup, PlayerId, Position,
};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

/// Message-local decoding failures. The message is dropped, the connection
/// keeps going.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid message: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid {name} event: {source}")]
    InvalidEvent {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid board snapshot: {0}")]
    InvalidBoard(#[from] GameError),
}

/// A call sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundRpc {
    pub method: String,
    pub args: Value,
}

impl OutboundRpc {
    /// Reply to the server's login request
    pub fn login(identity: Uuid) -> Self {
        Self {
            method: "Login".into(),
            args: json!({ "UUID": identity }),
        }
    }

    pub fn from_action(action: &GameAction) -> Self {
        Self {
            method: action.method().into(),
            args: action.args(),
        }
    }

    /// Serialize as one newline-terminated line
    pub fn to_line(&self) -> Result<String, ProtocolError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Raw envelope of a call received from the server.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundRpc {
    #[serde(alias = "Method")]
    pub method: String,
    #[serde(alias = "Args", default)]
    pub args: Value,
}

/// A decoded server message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// The server asks who we are
    Login,
    /// Informational text
    Help(Value),
    /// The server is shutting down
    ServerClosing,
    /// A new game begins
    GameStart(GameSetup),
    /// A game notification for the state store
    Game(GameEvent),
    /// An `Event` whose discriminator is not a game event
    Notice(String),
    /// A method this client does not handle
    Unhandled(String),
}

/// Decode one frame.
pub fn decode(frame: &str) -> Result<InboundMessage, ProtocolError> {
    let rpc: InboundRpc = serde_json::from_str(frame)?;

    match rpc.method.as_str() {
        "Login" => Ok(InboundMessage::Login),
        "Help" => Ok(InboundMessage::Help(rpc.args)),
        "Event" => decode_event(rpc.args),
        _ => Ok(InboundMessage::Unhandled(rpc.method)),
    }
}

fn decode_event(args: Value) -> Result<InboundMessage, ProtocolError> {
    let args = match args {
        Value::String(text) => serde_json::from_str(&text)?,
        other => other,
    };
    let name = args
        .get("MethodName")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
        .to_string();

    let event: EventArgs = serde_json::from_value(args)
        .map_err(|source| ProtocolError::InvalidEvent { name: name.clone(), source })?;

    let message = match event {
        EventArgs::GameStart(start) => InboundMessage::GameStart(start.into_setup()?),
        EventArgs::Move(args) => InboundMessage::Game(GameEvent::Move {
            player: args.player,
            direction: args.direction,
        }),
        EventArgs::Bomb(args) => InboundMessage::Game(GameEvent::Bomb {
            player: args.player,
        }),
        EventArgs::BombExploded(args) => InboundMessage::Game(GameEvent::BombExploded {
            player: args.player,
            origin: Position::new(args.x, args.y),
            affected: args.affected.into_iter().map(Position::from).collect(),
        }),
        EventArgs::BonusSpawned(args) => InboundMessage::Game(GameEvent::BonusSpawned {
            position: Position::new(args.x, args.y),
            bonus: args.bonus,
        }),
        EventArgs::CollectBonus(args) => InboundMessage::Game(GameEvent::CollectBonus {
            player: args.player,
            bonus: args.bonus,
            position: Position::new(args.x, args.y),
        }),
        EventArgs::PlayerDied(args) => InboundMessage::Game(GameEvent::PlayerDied {
            player: args.player,
            position: Position::new(args.x, args.y),
        }),
        EventArgs::ServerClosing => InboundMessage::ServerClosing,
        EventArgs::Other => InboundMessage::Notice(name),
    };
    Ok(message)
}

/// Decode a field that may hold either a JSON value or a string of JSON.
///
/// A string that is not valid JSON is decoded as a plain string, so bare
/// tokens such as `UP` still work.
pub fn decode_nested<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    match value {
        Value::String(text) => match serde_json::from_str(&text) {
            Ok(decoded) => Ok(decoded),
            Err(e) => serde_json::from_value(Value::String(text)).map_err(|_| e),
        },
        other => serde_json::from_value(other),
    }
}

fn nested<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    decode_nested(value).map_err(de::Error::custom)
}

fn nested_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => decode_nested(value).map(Some).map_err(de::Error::custom),
    }
}

/// Event payloads, selected by `MethodName`.
#[derive(Debug, Deserialize)]
#[serde(tag = "MethodName")]
enum EventArgs {
    GameStart(GameStartArgs),
    Move(MoveArgs),
    Bomb(PlayerArgs),
    BombExploded(BombExplodedArgs),
    BonusSpawned(BonusSpawnedArgs),
    CollectBonus(CollectBonusArgs),
    PlayerDied(PlayerDiedArgs),
    ServerClosing,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct GameStartArgs {
    #[serde(rename = "Board", deserialize_with = "nested")]
    board: Vec<Vec<i32>>,
    #[serde(rename = "Player", deserialize_with = "nested")]
    player: PlayerId,
    #[serde(rename = "X", deserialize_with = "nested")]
    x: i32,
    #[serde(rename = "Y", deserialize_with = "nested")]
    y: i32,
    #[serde(rename = "Players", default, deserialize_with = "nested_opt")]
    players: Option<Vec<RosterEntry>>,
}

impl GameStartArgs {
    fn into_setup(self) -> Result<GameSetup, ProtocolError> {
        let board = Board::from_cells(self.board)?;
        let mut roster: Vec<(PlayerId, Position)> = self
            .players
            .unwrap_or_default()
            .into_iter()
            .map(|entry| (entry.player, Position::new(entry.x, entry.y)))
            .collect();
        if !roster.iter().any(|(id, _)| *id == self.player) {
            roster.push((self.player, Position::new(self.x, self.y)));
        }

        Ok(GameSetup {
            board,
            player_id: self.player,
            roster,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RosterEntry {
    #[serde(rename = "Player", alias = "Id", deserialize_with = "nested")]
    player: PlayerId,
    #[serde(rename = "X", deserialize_with = "nested")]
    x: i32,
    #[serde(rename = "Y", deserialize_with = "nested")]
    y: i32,
}

#[derive(Debug, Deserialize)]
struct MoveArgs {
    #[serde(rename = "Player", deserialize_with = "nested")]
    player: PlayerId,
    #[serde(rename = "Direction", deserialize_with = "nested")]
    direction: Direction,
}

#[derive(Debug, Deserialize)]
struct PlayerArgs {
    #[serde(rename = "Player", deserialize_with = "nested")]
    player: PlayerId,
}

#[derive(Debug, Deserialize)]
struct BombExplodedArgs {
    #[serde(rename = "Player", deserialize_with = "nested")]
    player: PlayerId,
    #[serde(rename = "X", deserialize_with = "nested")]
    x: i32,
    #[serde(rename = "Y", deserialize_with = "nested")]
    y: i32,
    #[serde(rename = "AffectedCoordinates", deserialize_with = "nested")]
    affected: Vec<WireCoord>,
}

#[derive(Debug, Deserialize)]
struct BonusSpawnedArgs {
    #[serde(rename = "X", deserialize_with = "nested")]
    x: i32,
    #[serde(rename = "Y", deserialize_with = "nested")]
    y: i32,
    #[serde(rename = "Bonus", deserialize_with = "nested")]
    bonus: i32,
}

#[derive(Debug, Deserialize)]
struct CollectBonusArgs {
    #[serde(rename = "Player", deserialize_with = "nested")]
    player: PlayerId,
    #[serde(rename = "Bonus", deserialize_with = "nested")]
    bonus: i32,
    #[serde(rename = "X", deserialize_with = "nested")]
    x: i32,
    #[serde(rename = "Y", deserialize_with = "nested")]
    y: i32,
}

#[derive(Debug, Deserialize)]
struct PlayerDiedArgs {
    #[serde(rename = "Player", deserialize_with = "nested")]
    player: PlayerId,
    #[serde(rename = "X", deserialize_with = "nested")]
    x: i32,
    #[serde(rename = "Y", deserialize_with = "nested")]
    y: i32,
}

/// Coordinate pair in any of the shapes the server produces
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum WireCoord {
    Pair(i32, i32),
    Tuple {
        #[serde(rename = "Item1")]
        x: i32,
        #[serde(rename = "Item2")]
        y: i32,
    },
    Named {
        #[serde(alias = "X")]
        x: i32,
        #[serde(alias = "Y")]
        y: i32,
    },
}

impl From<WireCoord> for Position {
    fn from(coord: WireCoord) -> Self {
        match coord {
            WireCoord::Pair(x, y) | WireCoord::Tuple { x, y } | WireCoord::Named { x, y } => {
                Position::new(x, y)
            }
        }
    }
}
