//! Terminal implementation of [`View`].

use crate::tui::input::move_cursor;
use crate::view::{Bindings, UserAction, View};
use crate::{Cell, Fragment, Piece, PlayerTypeInfo, Players};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use tracing::{debug, instrument};

/// What a key press means to the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Leave the application.
    Quit,
    /// Forward to the controller.
    Action(UserAction),
    /// Local change only (cursor, form field); redraw.
    Redraw,
    /// Nothing happened.
    Ignored,
}

/// Board region contents.
#[derive(Debug, Clone, Default)]
pub struct BoardRegion {
    /// Squares in row-major order.
    pub cells: Vec<Cell>,
    /// Server status line.
    pub message: Option<String>,
    /// Piece to move, if any.
    pub turn: Option<Piece>,
}

/// Everything the terminal shows, rendered by [`super::ui::draw`].
#[derive(Debug)]
pub struct TerminalView {
    pub(super) options: Vec<PlayerTypeInfo>,
    pub(super) chosen: [usize; 2],
    pub(super) focus: Piece,
    pub(super) selection_visible: bool,
    pub(super) selection_enabled: bool,
    pub(super) board: Option<BoardRegion>,
    pub(super) cursor: usize,
    pub(super) waiting: Option<String>,
    pub(super) error: Option<String>,
    pub(super) bindings: Bindings,
}

impl TerminalView {
    /// Creates a view offering `options`, preselecting `players`.
    #[instrument(skip(options))]
    pub fn new(options: Vec<PlayerTypeInfo>, players: &Players) -> Self {
        let mut view = Self {
            options,
            chosen: [0, 0],
            focus: Piece::X,
            selection_visible: false,
            selection_enabled: false,
            board: None,
            cursor: 4,
            waiting: None,
            error: None,
            bindings: Bindings::None,
        };
        view.select_players(players);
        view
    }

    /// Current handler set, for the help line.
    pub fn bindings(&self) -> Bindings {
        self.bindings
    }

    /// Translates a key press.
    #[instrument(skip(self))]
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.kind != KeyEventKind::Press {
            return KeyOutcome::Ignored;
        }
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            return KeyOutcome::Quit;
        }

        match self.bindings {
            Bindings::Selection if self.selection_enabled => self.selection_key(key.code),
            Bindings::EmptyCells => self.board_key(key.code),
            Bindings::GameOver { offer_swap } => match key.code {
                KeyCode::Char('s') => KeyOutcome::Action(UserAction::SamePlayersSamePieces),
                KeyCode::Char('w') if offer_swap => {
                    KeyOutcome::Action(UserAction::SamePlayersDiffPieces)
                }
                KeyCode::Char('d') => KeyOutcome::Action(UserAction::DiffPlayers),
                _ => KeyOutcome::Ignored,
            },
            Bindings::Reload => match key.code {
                KeyCode::Char('r') | KeyCode::Enter => KeyOutcome::Action(UserAction::Reload),
                _ => KeyOutcome::Ignored,
            },
            _ => KeyOutcome::Ignored,
        }
    }

    fn selection_key(&mut self, code: KeyCode) -> KeyOutcome {
        let field = self.field();
        let count = self.options.len();
        match code {
            KeyCode::Up | KeyCode::Down | KeyCode::Tab => {
                self.focus = self.focus.opponent();
                KeyOutcome::Redraw
            }
            KeyCode::Right if count > 0 => {
                self.chosen[field] = (self.chosen[field] + 1) % count;
                KeyOutcome::Redraw
            }
            KeyCode::Left if count > 0 => {
                self.chosen[field] = (self.chosen[field] + count - 1) % count;
                KeyOutcome::Redraw
            }
            KeyCode::Enter => KeyOutcome::Action(UserAction::Play),
            _ => KeyOutcome::Ignored,
        }
    }

    fn board_key(&mut self, code: KeyCode) -> KeyOutcome {
        match code {
            KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
                let index = c.to_digit(10).map(|d| d as usize - 1).unwrap_or(0);
                self.cursor = index;
                KeyOutcome::Action(UserAction::ClickCell(index))
            }
            KeyCode::Enter => KeyOutcome::Action(UserAction::ClickCell(self.cursor)),
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
                self.cursor = move_cursor(self.cursor, code);
                KeyOutcome::Redraw
            }
            _ => KeyOutcome::Ignored,
        }
    }

    fn field(&self) -> usize {
        match self.focus {
            Piece::X => 0,
            Piece::O => 1,
        }
    }

    /// Index of `name` in the options, appending it if the server accepts
    /// something the configuration did not list.
    fn option_index(&mut self, name: &str) -> usize {
        match self.options.iter().position(|o| o.name() == name) {
            Some(index) => index,
            None => {
                debug!(name, "Adding unlisted player type to options");
                self.options.push(PlayerTypeInfo::new(name, ""));
                self.options.len() - 1
            }
        }
    }

    fn option_name(&self, field: usize) -> &str {
        self.options
            .get(self.chosen[field])
            .map(|o| o.name().as_str())
            .unwrap_or(crate::HUMAN)
    }
}

impl View for TerminalView {
    fn show_selection(&mut self, visible: bool) {
        self.selection_visible = visible;
    }

    fn enable_selection(&mut self, enabled: bool) {
        self.selection_enabled = enabled;
    }

    fn selected_players(&self) -> Players {
        Players::new(self.option_name(0), self.option_name(1))
    }

    fn select_players(&mut self, players: &Players) {
        let x = self.option_index(players.x().as_str());
        let o = self.option_index(players.o().as_str());
        self.chosen = [x, o];
    }

    fn render_board(&mut self, fragment: &Fragment) {
        self.board = Some(BoardRegion {
            cells: fragment.cells().clone(),
            message: fragment.message().clone(),
            turn: fragment.turn(),
        });
    }

    fn clear_board(&mut self) {
        self.board = None;
    }

    fn set_cell(&mut self, index: usize, cell: &Cell) {
        if let Some(slot) = self
            .board
            .as_mut()
            .and_then(|board| board.cells.get_mut(index))
        {
            *slot = cell.clone();
        }
    }

    fn show_waiting(&mut self, text: &str) {
        self.waiting = Some(text.to_string());
    }

    fn clear_waiting(&mut self) {
        self.waiting = None;
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    fn clear_error(&mut self) {
        self.error = None;
    }

    fn set_bindings(&mut self, bindings: Bindings) {
        self.bindings = bindings;
    }
}
