//! Client-side session: the server's game id and the chosen players.

use crate::Players;
use derive_more::Display;
use tracing::{debug, info, instrument};

/// Server-issued identifier of a running game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub struct GameId(String);

impl GameId {
    /// Identifier as sent back to the server.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for GameId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for GameId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// State carried between requests.
///
/// Reset points are [`Session::start`] (new game or rematch) and
/// [`Session::reset`] (back to player selection).
#[derive(Debug, Clone, Default)]
pub struct Session {
    game_id: Option<GameId>,
    players: Players,
}

impl Session {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a new game with `players`, forgetting any previous game id.
    #[instrument(skip(self))]
    pub fn start(&mut self, players: Players) {
        info!(x = %players.x(), o = %players.o(), "Starting session");
        self.game_id = None;
        self.players = players;
    }

    /// Records the id returned by the server for the current game.
    #[instrument(skip(self))]
    pub fn record_game_id(&mut self, game_id: GameId) {
        debug!(game_id = %game_id, "Recorded game id");
        self.game_id = Some(game_id);
    }

    /// Drops the current game id.
    pub fn reset(&mut self) {
        self.game_id = None;
    }

    /// Id of the current game, if the server has issued one.
    pub fn game_id(&self) -> Option<&GameId> {
        self.game_id.as_ref()
    }

    /// Current player assignment.
    pub fn players(&self) -> &Players {
        &self.players
    }
}
