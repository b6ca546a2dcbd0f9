//! Game lifecycle controller: the state machine behind the client.
//!
//! The controller runs on a single event loop. Inputs arrive as
//! [`ClientEvent`]s on one channel: user actions from the view, responses
//! from request tasks and deliveries from the two [`Deferred`] timers.
//! Every state installs exactly one [`Bindings`] set, and user actions that
//! the current set does not accept are dropped, so at most one request is
//! in flight at a time.

use crate::fragment::{Cell, Fragment, Status};
use crate::request::{Endpoint, GameRequest};
use crate::timer::Deferred;
use crate::transport::{Transport, TransportError, TransportStatus};
use crate::view::{Bindings, UserAction, View, WAITING_TEXT};
use crate::{Piece, Players, Session};
use derive_getters::Getters;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Input to the controller's event loop.
#[derive(Debug)]
pub enum ClientEvent {
    /// The user did something.
    User(UserAction),
    /// The waiting-indicator timer of this generation elapsed.
    WaitingElapsed(u64),
    /// The automated move scheduled under this generation is due.
    ComputerMoveDue(u64),
    /// A request finished.
    Response {
        /// Endpoint the request went to.
        endpoint: Endpoint,
        /// Markup on success.
        result: Result<String, TransportError>,
    },
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Phase {
    /// The selection form is up.
    SelectingPlayers,
    /// A game is being played.
    InProgress,
    /// The game finished; rematch buttons are offered.
    GameOver,
    /// The server forgot the game.
    Expired,
}

/// What per-turn dispatch does with a rendered fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAction {
    /// Bind the reload button.
    Reload,
    /// Bind the post-game buttons.
    GameOver {
        /// Whether the swap rematch is offered.
        offer_swap: bool,
    },
    /// Let the user click an empty square.
    Human(Piece),
    /// Ask the server to move for the computer.
    Computer(Piece),
}

impl TurnAction {
    /// Decides the next step for `status` under `players`.
    pub fn plan(status: Status, players: &Players) -> Self {
        match status {
            Status::Expired => TurnAction::Reload,
            Status::GameOver => TurnAction::GameOver {
                offer_swap: players.differ(),
            },
            Status::Turn(piece) if players.get(piece).is_human() => TurnAction::Human(piece),
            Status::Turn(piece) => TurnAction::Computer(piece),
        }
    }
}

/// Delays used by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_new::new)]
pub struct Timings {
    /// Round trips shorter than this never show the waiting line.
    pub waiting_delay: Duration,
    /// Pause before requesting an automated move, letting the board paint.
    pub computer_move_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_millis(100))
    }
}

/// Request awaiting its response, with what is needed to undo it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum InFlight {
    Play,
    HumanMove { index: usize, label: String },
    ComputerMove,
}

impl InFlight {
    fn endpoint(&self) -> Endpoint {
        match self {
            InFlight::Play => Endpoint::Play,
            InFlight::HumanMove { .. } => Endpoint::HumanMove,
            InFlight::ComputerMove => Endpoint::ComputerMove,
        }
    }
}

/// Drives a [`View`] through the game lifecycle.
///
/// Call [`GameController::handle`] with every event taken off the channel
/// whose sender was passed to [`GameController::new`].
#[derive(Getters)]
pub struct GameController<V, T> {
    view: V,
    #[getter(skip)]
    transport: Arc<T>,
    #[getter(skip)]
    events: mpsc::UnboundedSender<ClientEvent>,
    session: Session,
    phase: Phase,
    bindings: Bindings,
    #[getter(skip)]
    waiting: Deferred,
    #[getter(skip)]
    computer_move: Deferred,
    #[getter(skip)]
    in_flight: Option<InFlight>,
    #[getter(skip)]
    turn: Option<Piece>,
    #[getter(skip)]
    cells: Vec<Cell>,
}

impl<V: View, T: Transport> GameController<V, T> {
    /// Creates a controller and shows the selection form.
    #[instrument(skip_all)]
    pub fn new(
        view: V,
        transport: Arc<T>,
        events: mpsc::UnboundedSender<ClientEvent>,
        timings: Timings,
    ) -> Self {
        info!(?timings, "Creating game controller");
        let mut controller = Self {
            view,
            transport,
            events,
            session: Session::new(),
            phase: Phase::SelectingPlayers,
            bindings: Bindings::None,
            waiting: Deferred::new("waiting", timings.waiting_delay),
            computer_move: Deferred::new("computer_move", timings.computer_move_delay),
            in_flight: None,
            turn: None,
            cells: Vec::new(),
        };
        controller.show_selection();
        controller
    }

    /// Mutable access to the view, for input handling.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// True while an automated move is scheduled but not yet requested.
    pub fn computer_move_pending(&self) -> bool {
        self.computer_move.is_armed()
    }

    /// True while the waiting indicator is armed.
    pub fn waiting_armed(&self) -> bool {
        self.waiting.is_armed()
    }

    /// True while a request is awaiting its response.
    pub fn request_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Squares as last rendered, including optimistic marks.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Applies one event.
    #[instrument(skip(self), fields(phase = %self.phase))]
    pub fn handle(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::User(action) => self.on_user(action),
            ClientEvent::WaitingElapsed(generation) => {
                if self.waiting.fire(generation) {
                    debug!("Request is slow, showing waiting indicator");
                    self.view.show_waiting(WAITING_TEXT);
                }
            }
            ClientEvent::ComputerMoveDue(generation) => {
                if self.computer_move.fire(generation) {
                    self.post_computer_move();
                }
            }
            ClientEvent::Response { endpoint, result } => self.on_response(endpoint, result),
        }
    }

    fn on_user(&mut self, action: UserAction) {
        if !self.bindings.accepts(&action) {
            warn!(?action, bindings = ?self.bindings, "Ignoring action with no live handler");
            return;
        }

        info!(?action, "User action");
        match action {
            UserAction::Play => self.play_game(),
            UserAction::ClickCell(index) => self.post_human_move(index),
            UserAction::SamePlayersSamePieces => {
                self.install(Bindings::None);
                self.play_game();
            }
            UserAction::SamePlayersDiffPieces => {
                self.install(Bindings::None);
                let swapped = self.session.players().swapped();
                self.view.select_players(&swapped);
                self.play_game();
            }
            UserAction::DiffPlayers => {
                self.install(Bindings::None);
                self.show_selection();
            }
            UserAction::Reload => self.show_selection(),
        }
    }

    /// Reads the form and asks the server for a new game.
    fn play_game(&mut self) {
        self.view.enable_selection(false);
        self.install(Bindings::None);
        let players = self.view.selected_players();
        self.session.start(players.clone());
        self.send(GameRequest::Play(players), InFlight::Play);
    }

    fn post_human_move(&mut self, index: usize) {
        let label = match self.cells.get(index) {
            Some(cell) if cell.is_empty() => cell.label().trim().to_string(),
            Some(_) => {
                warn!(index, "Square already occupied");
                return;
            }
            None => {
                warn!(index, cells = self.cells.len(), "No such square");
                return;
            }
        };
        let (Some(piece), Some(game_id)) = (self.turn, self.session.game_id().cloned()) else {
            warn!(index, "No live game to move in");
            return;
        };

        self.install(Bindings::None);
        self.mark_cell(index, Cell::occupied(piece));
        info!(index, position = %label, piece = %piece, "Posting human move");
        self.send(
            GameRequest::HumanMove {
                position: label.clone(),
                game_id,
            },
            InFlight::HumanMove { index, label },
        );
    }

    fn post_computer_move(&mut self) {
        let Some(game_id) = self.session.game_id().cloned() else {
            warn!("Automated move due without a game id");
            return;
        };
        info!(game_id = %game_id, "Requesting computer move");
        self.send(GameRequest::ComputerMove { game_id }, InFlight::ComputerMove);
    }

    /// Issues `request` with the waiting/error indicator lifecycle.
    fn send(&mut self, request: GameRequest, in_flight: InFlight) {
        self.view.clear_error();
        self.waiting
            .arm(&self.events, ClientEvent::WaitingElapsed);
        self.in_flight = Some(in_flight);

        let endpoint = request.endpoint();
        let body = request.body();
        let transport = Arc::clone(&self.transport);
        let events = self.events.clone();
        debug!(%endpoint, %body, "Dispatching request");

        tokio::spawn(async move {
            let result = transport.post(endpoint.path(), body).await;
            if events.send(ClientEvent::Response { endpoint, result }).is_err() {
                debug!(%endpoint, "Event loop gone, dropping response");
            }
        });
    }

    fn on_response(&mut self, endpoint: Endpoint, result: Result<String, TransportError>) {
        let in_flight = match self.in_flight.take() {
            Some(in_flight) if in_flight.endpoint() == endpoint => in_flight,
            other => {
                warn!(%endpoint, expected = ?other, "Unexpected response");
                self.in_flight = other;
                return;
            }
        };

        let decoded = result.and_then(|markup| {
            Fragment::parse(&markup).map_err(|e| {
                warn!(error = %e, "Could not decode fragment");
                TransportError::from(e)
            })
        });

        match (in_flight, decoded) {
            (InFlight::Play, Ok(fragment)) => {
                let Some(game_id) = fragment.game_id().clone() else {
                    self.fail_play(TransportError::new(
                        TransportStatus::ParserError,
                        Some("Missing #game-id in fragment".to_string()),
                    ));
                    return;
                };
                self.session.record_game_id(game_id);
                self.view.show_selection(false);
                self.show_game(fragment);
            }
            (InFlight::Play, Err(err)) => self.fail_play(err),
            (InFlight::HumanMove { .. }, Ok(fragment))
            | (InFlight::ComputerMove, Ok(fragment)) => self.show_game(fragment),
            (InFlight::HumanMove { index, label }, Err(err)) => {
                info!(index, position = %label, "Reverting optimistic move");
                self.mark_cell(index, Cell::empty(label));
                self.install(Bindings::EmptyCells);
                self.indicate_error(&err);
            }
            (InFlight::ComputerMove, Err(err)) => {
                // Nothing to revert; offer a way out of the stalled game.
                self.install(Bindings::Reload);
                self.indicate_error(&err);
            }
        }
    }

    fn fail_play(&mut self, err: TransportError) {
        self.show_selection();
        self.indicate_error(&err);
    }

    /// Renders `fragment` and runs per-turn dispatch.
    fn show_game(&mut self, fragment: Fragment) {
        self.view.render_board(&fragment);
        self.cells = fragment.cells().clone();
        self.turn = fragment.turn();
        self.indicate_not_waiting();

        let action = TurnAction::plan(*fragment.status(), self.session.players());
        info!(?action, "Per-turn dispatch");
        match action {
            TurnAction::Reload => {
                self.phase = Phase::Expired;
                self.install(Bindings::Reload);
            }
            TurnAction::GameOver { offer_swap } => {
                self.phase = Phase::GameOver;
                self.install(Bindings::GameOver { offer_swap });
            }
            TurnAction::Human(_) => {
                self.phase = Phase::InProgress;
                self.install(Bindings::EmptyCells);
            }
            TurnAction::Computer(_) => {
                self.phase = Phase::InProgress;
                self.install(Bindings::None);
                self.computer_move
                    .arm(&self.events, ClientEvent::ComputerMoveDue);
            }
        }
    }

    /// Hides the game and brings back an enabled selection form.
    fn show_selection(&mut self) {
        self.computer_move.cancel();
        self.session.reset();
        self.cells.clear();
        self.turn = None;
        self.view.clear_board();
        self.view.enable_selection(true);
        self.view.show_selection(true);
        self.phase = Phase::SelectingPlayers;
        self.install(Bindings::Selection);
    }

    fn mark_cell(&mut self, index: usize, cell: Cell) {
        self.view.set_cell(index, &cell);
        if let Some(slot) = self.cells.get_mut(index) {
            *slot = cell;
        }
    }

    fn install(&mut self, bindings: Bindings) {
        debug!(from = ?self.bindings, to = ?bindings, "Installing bindings");
        self.bindings = bindings;
        self.view.set_bindings(bindings);
    }

    fn indicate_not_waiting(&mut self) {
        self.waiting.cancel();
        self.view.clear_waiting();
    }

    fn indicate_error(&mut self, err: &TransportError) {
        error!(error = %err, "Request failed");
        self.indicate_not_waiting();
        self.view.show_error(&err.to_string());
    }
}
