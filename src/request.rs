//! Requests the client sends to the game server.

use crate::{GameId, Players};
use serde_json::json;

/// Server endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
pub enum Endpoint {
    /// Create a game.
    #[strum(serialize = "/play")]
    Play,
    /// Submit a human move.
    #[strum(serialize = "/human_move")]
    HumanMove,
    /// Ask the server to play for the computer.
    #[strum(serialize = "/computer_move")]
    ComputerMove,
}

impl Endpoint {
    /// Path relative to the server root.
    pub fn path(self) -> &'static str {
        self.into()
    }
}

/// A game request and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameRequest {
    /// Start a game between `Players`.
    Play(Players),
    /// Play the square labelled `position`.
    HumanMove {
        /// Move token, the clicked square's label.
        position: String,
        /// Game being played.
        game_id: GameId,
    },
    /// Let the server move for the computer player.
    ComputerMove {
        /// Game being played.
        game_id: GameId,
    },
}

impl GameRequest {
    /// Endpoint this request is posted to.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            GameRequest::Play(_) => Endpoint::Play,
            GameRequest::HumanMove { .. } => Endpoint::HumanMove,
            GameRequest::ComputerMove { .. } => Endpoint::ComputerMove,
        }
    }

    /// JSON body.
    pub fn body(&self) -> serde_json::Value {
        match self {
            GameRequest::Play(players) => json!({
                "x": players.x().as_str(),
                "o": players.o().as_str(),
            }),
            GameRequest::HumanMove { position, game_id } => json!({
                "move": position,
                "game_id": game_id.as_str(),
            }),
            GameRequest::ComputerMove { game_id } => json!({
                "game_id": game_id.as_str(),
            }),
        }
    }
}
