//! Line-oriented [`View`] for watching computer-vs-computer games.

use crate::controller::{ClientEvent, GameController, Phase};
use crate::transport::Transport;
use crate::view::{Bindings, UserAction, View};
use crate::{Cell, CellState, Fragment, Players, Status};
use anyhow::{Result, bail};
use std::io::Write;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Prints each rendered board to a writer.
///
/// The selection form is a fixed assignment: there is nobody to fill it in.
#[derive(Debug)]
pub struct ConsoleView<W = std::io::Stdout> {
    players: Players,
    out: W,
    cells: Vec<Cell>,
    last_error: Option<String>,
    outcomes: Vec<String>,
}

impl ConsoleView {
    /// Prints to standard output.
    pub fn new(players: Players) -> Self {
        Self::with_writer(players, std::io::stdout())
    }
}

impl<W: Write> ConsoleView<W> {
    /// Prints to `out`.
    pub fn with_writer(players: Players, out: W) -> Self {
        Self {
            players,
            out,
            cells: Vec::new(),
            last_error: None,
            outcomes: Vec::new(),
        }
    }

    /// Last error shown, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Closing message of every finished game, in order.
    pub fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    /// Underlying writer.
    pub fn writer(&self) -> &W {
        &self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            warn!(error = %e, "Console write failed");
        }
    }

    fn print_board(&mut self) {
        let rows: Vec<String> = self
            .cells
            .chunks(3)
            .map(|row| {
                row.iter()
                    .map(|cell| match cell.state() {
                        CellState::Empty => format!(" {} ", cell.label()),
                        CellState::Occupied(piece) if *cell.winner() => {
                            format!("[{}]", piece.mark())
                        }
                        CellState::Occupied(piece) => format!(" {} ", piece.mark()),
                    })
                    .collect::<Vec<_>>()
                    .join("|")
            })
            .collect();
        let board = rows.join("\n---+---+---\n");
        self.line(&board);
    }
}

impl<W: Write> View for ConsoleView<W> {
    fn show_selection(&mut self, visible: bool) {
        debug!(visible, "Selection visibility");
    }

    fn enable_selection(&mut self, enabled: bool) {
        debug!(enabled, "Selection enabled");
    }

    fn selected_players(&self) -> Players {
        self.players.clone()
    }

    fn select_players(&mut self, players: &Players) {
        self.players = players.clone();
    }

    fn render_board(&mut self, fragment: &Fragment) {
        self.cells = fragment.cells().clone();
        self.print_board();

        let message = fragment.message().clone();
        match fragment.status() {
            Status::Turn(piece) => {
                let text = message.unwrap_or_else(|| format!("{} to move", piece.mark()));
                self.line(&text);
            }
            Status::GameOver => {
                let text = message.unwrap_or_else(|| "Game over".to_string());
                self.line(&text);
                self.outcomes.push(text);
            }
            Status::Expired => {
                let text = message.unwrap_or_else(|| "Game expired".to_string());
                self.line(&text);
            }
        }
        self.line("");
    }

    fn clear_board(&mut self) {
        self.cells.clear();
    }

    fn set_cell(&mut self, index: usize, cell: &Cell) {
        if let Some(slot) = self.cells.get_mut(index) {
            *slot = cell.clone();
        }
    }

    fn show_waiting(&mut self, text: &str) {
        self.line(text);
    }

    fn clear_waiting(&mut self) {}

    fn show_error(&mut self, message: &str) {
        self.last_error = Some(message.to_string());
        self.line(message);
    }

    fn clear_error(&mut self) {
        self.last_error = None;
    }

    fn set_bindings(&mut self, bindings: Bindings) {
        debug!(?bindings, "Bindings");
    }
}

/// Plays `games` games through `controller`, rematching with the same pieces.
///
/// Both players must be computers: nobody is there to click a square. Stops
/// with an error if the game expires or a request fails.
#[instrument(skip(controller, events))]
pub async fn watch<W: Write, T: Transport>(
    controller: &mut GameController<ConsoleView<W>, T>,
    events: &mut mpsc::UnboundedReceiver<ClientEvent>,
    games: u32,
) -> Result<()> {
    let players = controller.view().selected_players();
    if players.x().is_human() || players.o().is_human() {
        bail!(
            "watch needs two computer players, got {} and {}",
            players.x(),
            players.o()
        );
    }
    if games == 0 {
        bail!("watch needs at least one game");
    }

    info!(x = %players.x(), o = %players.o(), games, "Watching games");
    controller.handle(ClientEvent::User(UserAction::Play));

    let mut finished = 0;
    while let Some(event) = events.recv().await {
        controller.handle(event);
        if controller.request_in_flight() || controller.computer_move_pending() {
            continue;
        }

        match controller.phase() {
            Phase::GameOver => {
                finished += 1;
                if finished >= games {
                    return Ok(());
                }
                controller.handle(ClientEvent::User(UserAction::SamePlayersSamePieces));
            }
            Phase::Expired => bail!("Game expired on the server"),
            Phase::SelectingPlayers | Phase::InProgress => {
                if *controller.bindings() == Bindings::EmptyCells {
                    warn!("Server asked for a human move");
                }
                let message = controller.view().last_error().unwrap_or("Game stalled");
                bail!("{}", message);
            }
        }
    }

    bail!("Event channel closed after {} of {} games", finished, games)
}
