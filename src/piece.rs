//! Pieces and the player types assigned to them.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};
use tracing::instrument;

/// Player type the client treats specially: moves come from the keyboard.
pub const HUMAN: &str = "Human";

/// A piece on the board.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Piece {
    /// Piece X (moves first).
    X,
    /// Piece O.
    O,
}

impl Piece {
    /// Returns the other piece.
    pub fn opponent(self) -> Self {
        match self {
            Piece::X => Piece::O,
            Piece::O => Piece::X,
        }
    }

    /// Upper-case mark drawn into an occupied cell.
    pub fn mark(self) -> &'static str {
        match self {
            Piece::X => "X",
            Piece::O => "O",
        }
    }
}

/// Who plays a piece: the human at the keyboard or a named server-side strategy.
///
/// The strategy id is opaque to the client and sent to the server verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum PlayerType {
    /// Moves are read from the user.
    #[display("Human")]
    Human,
    /// Moves are computed by the server using this strategy.
    #[display("{}", _0)]
    Computer(String),
}

impl PlayerType {
    /// Returns true for [`PlayerType::Human`].
    pub fn is_human(&self) -> bool {
        matches!(self, PlayerType::Human)
    }

    /// Identifier sent to the server.
    pub fn as_str(&self) -> &str {
        match self {
            PlayerType::Human => HUMAN,
            PlayerType::Computer(id) => id,
        }
    }
}

impl From<&str> for PlayerType {
    fn from(id: &str) -> Self {
        if id == HUMAN {
            PlayerType::Human
        } else {
            PlayerType::Computer(id.to_string())
        }
    }
}

impl From<String> for PlayerType {
    fn from(id: String) -> Self {
        if id == HUMAN {
            PlayerType::Human
        } else {
            PlayerType::Computer(id)
        }
    }
}

/// The two player-type assignments of a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Players {
    x: PlayerType,
    o: PlayerType,
}

impl Players {
    /// Creates a new assignment.
    pub fn new(x: impl Into<PlayerType>, o: impl Into<PlayerType>) -> Self {
        Self {
            x: x.into(),
            o: o.into(),
        }
    }

    /// Player type assigned to X.
    pub fn x(&self) -> &PlayerType {
        &self.x
    }

    /// Player type assigned to O.
    pub fn o(&self) -> &PlayerType {
        &self.o
    }

    /// Player type assigned to `piece`.
    pub fn get(&self, piece: Piece) -> &PlayerType {
        match piece {
            Piece::X => &self.x,
            Piece::O => &self.o,
        }
    }

    /// Same players with the pieces exchanged.
    #[instrument]
    pub fn swapped(&self) -> Self {
        Self {
            x: self.o.clone(),
            o: self.x.clone(),
        }
    }

    /// True when swapping pieces would produce a different game.
    pub fn differ(&self) -> bool {
        self.x != self.o
    }
}

impl Default for Players {
    fn default() -> Self {
        Self::new(PlayerType::Human, PlayerType::Human)
    }
}
