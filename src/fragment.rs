//! Decoding of the HTML fragments the server renders for every game request.
//!
//! A fragment carries the board as a list of `.square` elements plus hidden
//! inputs describing the game:
//!
//! ```html
//! <input type="hidden" id="game-id" value="5f0c...">
//! <input type="hidden" id="turn" value="x">
//! <input type="hidden" id="expired" value="0">
//! <input type="hidden" id="game-over" value="0">
//! <table id="board">
//!   <tr><td class="square empty-disabled">1</td><td class="square x">X</td>...</tr>
//! </table>
//! <p id="message">X to move</p>
//! ```
//!
//! The `"1"`/`"0"` flags are decoded into a [`Status`] here so nothing past
//! this boundary deals with strings.

use crate::error::FragmentError;
use crate::{GameId, Piece};
use derive_getters::Getters;
use scraper::{ElementRef, Html, Selector};
use std::str::FromStr;
use tracing::{debug, instrument, warn};

/// Where the game stands according to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The server no longer knows the game.
    Expired,
    /// The game has finished.
    GameOver,
    /// The game continues and `Piece` is to move.
    Turn(Piece),
}

/// What occupies a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    /// Nobody has played here.
    Empty,
    /// Occupied by a piece.
    Occupied(Piece),
}

/// One square of the rendered board.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Cell {
    /// Text of the square; for empty squares this is the move token.
    label: String,
    /// Occupancy.
    state: CellState,
    /// Part of the winning line.
    winner: bool,
}

impl Cell {
    /// An empty square showing `label`.
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: CellState::Empty,
            winner: false,
        }
    }

    /// A square holding `piece`.
    pub fn occupied(piece: Piece) -> Self {
        Self {
            label: piece.mark().to_string(),
            state: CellState::Occupied(piece),
            winner: false,
        }
    }

    /// True if the square can still be played.
    pub fn is_empty(&self) -> bool {
        self.state == CellState::Empty
    }
}

/// A decoded server fragment.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Fragment {
    /// Game id, present on `/play` responses.
    game_id: Option<GameId>,
    /// Decoded flags.
    status: Status,
    /// Squares in document order.
    cells: Vec<Cell>,
    /// Status line rendered by the server.
    message: Option<String>,
}

impl Fragment {
    /// Decodes `markup`.
    #[instrument(skip(markup), fields(len = markup.len()))]
    pub fn parse(markup: &str) -> Result<Self, FragmentError> {
        let document = Html::parse_fragment(markup);

        let game_id = hidden_value(&document, "game-id")?
            .filter(|id| !id.is_empty())
            .map(GameId::from);
        let expired = decode_flag("expired", hidden_value(&document, "expired")?)?;
        let game_over = decode_flag("game-over", hidden_value(&document, "game-over")?)?;

        let status = if expired {
            Status::Expired
        } else if game_over {
            Status::GameOver
        } else {
            let turn = hidden_value(&document, "turn")?
                .ok_or_else(|| FragmentError::new("Missing #turn in fragment"))?;
            let piece = Piece::from_str(turn.trim())
                .map_err(|_| FragmentError::new(format!("Unknown turn marker {:?}", turn)))?;
            Status::Turn(piece)
        };

        let square = selector(".square")?;
        let cells = document
            .select(&square)
            .map(decode_cell)
            .collect::<Result<Vec<_>, _>>()?;

        if !expired && cells.is_empty() {
            warn!("Fragment for a live game carries no squares");
        }

        let message = document
            .select(&selector("#message")?)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty());

        debug!(?status, cells = cells.len(), game_id = ?game_id, "Decoded fragment");

        Ok(Self {
            game_id,
            status,
            cells,
            message,
        })
    }

    /// Piece to move, if the game is live.
    pub fn turn(&self) -> Option<Piece> {
        match self.status {
            Status::Turn(piece) => Some(piece),
            _ => None,
        }
    }
}

fn selector(css: &str) -> Result<Selector, FragmentError> {
    Selector::parse(css).map_err(|e| FragmentError::new(format!("Bad selector {}: {}", css, e)))
}

/// Reads the `value` attribute of the element with the given id.
fn hidden_value(document: &Html, id: &str) -> Result<Option<String>, FragmentError> {
    let sel = selector(&format!("#{}", id))?;
    Ok(document
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr("value"))
        .map(str::to_string))
}

/// `"1"` is set, `"0"` or absent is clear; anything else is rejected.
fn decode_flag(name: &str, value: Option<String>) -> Result<bool, FragmentError> {
    match value.as_deref().map(str::trim) {
        None | Some("0") => Ok(false),
        Some("1") => Ok(true),
        Some(other) => Err(FragmentError::new(format!(
            "Flag #{} has unexpected value {:?}",
            name, other
        ))),
    }
}

fn decode_cell(el: ElementRef<'_>) -> Result<Cell, FragmentError> {
    let label = el.text().collect::<String>().trim().to_string();
    let mut state = None;
    let mut winner = false;

    for class in el.value().classes() {
        match class {
            "empty" | "empty-disabled" => state = Some(CellState::Empty),
            "x" => state = Some(CellState::Occupied(Piece::X)),
            "o" => state = Some(CellState::Occupied(Piece::O)),
            "winner" => winner = true,
            _ => {}
        }
    }

    let state =
        state.ok_or_else(|| FragmentError::new(format!("Square {:?} has no state class", label)))?;

    Ok(Cell {
        label,
        state,
        winner,
    })
}
