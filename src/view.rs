//! The surface the controller drives.
//!
//! A [`View`] owns two regions, the player-selection form and the board,
//! plus the waiting and error lines. It never decides anything on its own:
//! the controller tells it what to show and which inputs are live through
//! [`Bindings`].

use crate::{Cell, Fragment, Players};

/// Text shown while a request is slow.
pub const WAITING_TEXT: &str = "Waiting for server...";

/// User action delivered by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// Submit the selection form.
    Play,
    /// Click the square at this index.
    ClickCell(usize),
    /// Rematch with the same assignment.
    SamePlayersSamePieces,
    /// Rematch with the assignment swapped.
    SamePlayersDiffPieces,
    /// Back to the selection form.
    DiffPlayers,
    /// Leave an expired game.
    Reload,
}

/// The complete set of live handlers.
///
/// Installing a set replaces the previous one entirely, so no state can
/// leave stale handlers behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bindings {
    /// Nothing accepts input, e.g. while a request is in flight.
    #[default]
    None,
    /// The selection form's play button.
    Selection,
    /// Empty squares of the board.
    EmptyCells,
    /// The post-game buttons.
    GameOver {
        /// Whether "same players, different pieces" is offered.
        offer_swap: bool,
    },
    /// The reload button of an expired game.
    Reload,
}

impl Bindings {
    /// True if `action` has a handler in this set.
    pub fn accepts(&self, action: &UserAction) -> bool {
        matches!(
            (self, action),
            (Bindings::Selection, UserAction::Play)
                | (Bindings::EmptyCells, UserAction::ClickCell(_))
                | (
                    Bindings::GameOver { .. },
                    UserAction::SamePlayersSamePieces | UserAction::DiffPlayers
                )
                | (
                    Bindings::GameOver { offer_swap: true },
                    UserAction::SamePlayersDiffPieces
                )
                | (Bindings::Reload, UserAction::Reload)
        )
    }
}

/// Rendering surface driven by [`GameController`](crate::GameController).
pub trait View {
    /// Shows or hides the selection form.
    fn show_selection(&mut self, visible: bool);

    /// Enables or disables the selection form's controls.
    fn enable_selection(&mut self, enabled: bool);

    /// Player types currently chosen in the form.
    fn selected_players(&self) -> Players;

    /// Writes an assignment back into the form.
    fn select_players(&mut self, players: &Players);

    /// Replaces the game region with a rendered fragment.
    fn render_board(&mut self, fragment: &Fragment);

    /// Empties the game region.
    fn clear_board(&mut self);

    /// Redraws one square.
    fn set_cell(&mut self, index: usize, cell: &Cell);

    /// Shows the waiting line.
    fn show_waiting(&mut self, text: &str);

    /// Clears the waiting line.
    fn clear_waiting(&mut self);

    /// Shows the error line.
    fn show_error(&mut self, message: &str);

    /// Clears the error line.
    fn clear_error(&mut self);

    /// Installs the live handler set.
    fn set_bindings(&mut self, bindings: Bindings);
}
