//! Tests for the game lifecycle controller.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tictactoe_client::{
    Bindings, Cell, ClientEvent, Fragment, GameController, GameId, Phase, Players, Timings,
    Transport, TransportError, TransportStatus, UserAction, View, WAITING_TEXT,
};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

/// View that records what the controller asked it to show.
#[derive(Debug, Default)]
struct RecordingView {
    players: Players,
    selection_visible: bool,
    selection_enabled: bool,
    cells: Option<Vec<Cell>>,
    waiting: Option<String>,
    error: Option<String>,
    bindings: Bindings,
}

impl View for RecordingView {
    fn show_selection(&mut self, visible: bool) {
        self.selection_visible = visible;
    }

    fn enable_selection(&mut self, enabled: bool) {
        self.selection_enabled = enabled;
    }

    fn selected_players(&self) -> Players {
        self.players.clone()
    }

    fn select_players(&mut self, players: &Players) {
        self.players = players.clone();
    }

    fn render_board(&mut self, fragment: &Fragment) {
        self.cells = Some(fragment.cells().clone());
    }

    fn clear_board(&mut self) {
        self.cells = None;
    }

    fn set_cell(&mut self, index: usize, cell: &Cell) {
        if let Some(cells) = self.cells.as_mut() {
            cells[index] = cell.clone();
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

type Reply = (Duration, Result<String, TransportError>);

/// Transport answering from a script and recording every request.
#[derive(Debug, Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    fn reply(&self, markup: String) {
        self.reply_after(Duration::ZERO, Ok(markup));
    }

    fn fail(&self, err: TransportError) {
        self.reply_after(Duration::ZERO, Err(err));
    }

    fn reply_after(&self, delay: Duration, result: Result<String, TransportError>) {
        self.replies.lock().unwrap().push_back((delay, result));
    }

    fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, path: &str, body: Value) -> Result<String, TransportError> {
        self.requests.lock().unwrap().push((path.to_string(), body));
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some((delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => Err(TransportError::new(
                TransportStatus::Error,
                Some("no scripted reply".to_string()),
            )),
        }
    }
}

struct Harness {
    controller: GameController<RecordingView, ScriptedTransport>,
    events: mpsc::UnboundedReceiver<ClientEvent>,
    transport: Arc<ScriptedTransport>,
}

impl Harness {
    fn new(players: Players) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(ScriptedTransport::default());
        let view = RecordingView {
            players,
            ..RecordingView::default()
        };
        let controller = GameController::new(view, Arc::clone(&transport), tx, Timings::default());
        Self {
            controller,
            events: rx,
            transport,
        }
    }

    fn user(&mut self, action: UserAction) {
        self.controller.handle(ClientEvent::User(action));
    }

    /// Handles the next event and returns a short name for it.
    async fn step(&mut self) -> &'static str {
        let event = self.events.recv().await.expect("event channel closed");
        let name = match &event {
            ClientEvent::User(_) => "user",
            ClientEvent::WaitingElapsed(_) => "waiting",
            ClientEvent::ComputerMoveDue(_) => "computer_move",
            ClientEvent::Response { .. } => "response",
        };
        self.controller.handle(event);
        name
    }

    /// Requests sent so far, once spawned request tasks have run.
    async fn requests(&self) -> Vec<(String, Value)> {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        self.transport.requests()
    }

    async fn last_request(&self) -> (String, Value) {
        self.requests().await.last().cloned().expect("no request sent")
    }

    fn view(&self) -> &RecordingView {
        self.controller.view()
    }

    fn label(&self, index: usize) -> String {
        self.view().cells.as_ref().expect("no board")[index]
            .label()
            .clone()
    }

    /// Starts a game whose first board is `markup`.
    async fn start(&mut self, markup: String) {
        self.transport.reply(markup);
        self.user(UserAction::Play);
        assert_eq!(self.step().await, "response");
    }
}

/// Renders a board fragment. Squares are `"1"`..`"9"` for empty or `"X"`/`"O"`.
fn board(game_id: Option<&str>, turn: &str, game_over: bool, squares: [&str; 9]) -> String {
    let mut markup = String::new();
    if let Some(id) = game_id {
        markup.push_str(&format!(r#"<input type="hidden" id="game-id" value="{id}">"#));
    }
    markup.push_str(&format!(
        r#"<input type="hidden" id="turn" value="{turn}"><input type="hidden" id="expired" value="0"><input type="hidden" id="game-over" value="{}">"#,
        if game_over { "1" } else { "0" }
    ));
    markup.push_str("<table>");
    for row in squares.chunks(3) {
        markup.push_str("<tr>");
        for square in row {
            let class = match *square {
                "X" => "x",
                "O" => "o",
                _ => "empty-disabled",
            };
            markup.push_str(&format!(r#"<td class="square {class}">{square}</td>"#));
        }
        markup.push_str("</tr>");
    }
    markup.push_str("</table>");
    markup
}

const EMPTY: [&str; 9] = ["1", "2", "3", "4", "5", "6", "7", "8", "9"];

fn expired() -> String {
    r#"<input type="hidden" id="expired" value="1"><p id="message">This game has expired</p>"#
        .to_string()
}

#[tokio::test(start_paused = true)]
async fn test_starts_on_enabled_selection_form() {
    let harness = Harness::new(Players::new("Human", "Random"));
    assert_eq!(*harness.controller.phase(), Phase::SelectingPlayers);
    assert!(harness.view().selection_visible);
    assert!(harness.view().selection_enabled);
    assert_eq!(harness.view().bindings, Bindings::Selection);
}

#[tokio::test(start_paused = true)]
async fn test_human_turn_enables_empty_cells() {
    let mut harness = Harness::new(Players::new("Human", "Minimax"));
    harness.transport.reply(board(Some("g1"), "x", false, EMPTY));

    harness.user(UserAction::Play);
    assert!(!harness.view().selection_enabled);
    assert_eq!(harness.view().bindings, Bindings::None);
    assert_eq!(
        harness.last_request().await,
        ("/play".to_string(), json!({"x": "Human", "o": "Minimax"}))
    );

    assert_eq!(harness.step().await, "response");
    assert!(!harness.view().selection_visible);
    assert_eq!(harness.view().bindings, Bindings::EmptyCells);
    assert_eq!(*harness.controller.phase(), Phase::InProgress);
    assert!(!harness.controller.computer_move_pending());
    assert_eq!(
        harness.controller.session().game_id(),
        Some(&GameId::from("g1"))
    );
    assert_eq!(harness.requests().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_computer_turn_schedules_move_after_delay() {
    let mut harness = Harness::new(Players::new("Minimax", "Human"));
    harness.start(board(Some("g1"), "x", false, EMPTY)).await;

    assert_eq!(harness.view().bindings, Bindings::None);
    assert!(harness.controller.computer_move_pending());
    assert_eq!(harness.requests().await.len(), 1);

    let mut after = EMPTY;
    after[4] = "X";
    harness.transport.reply(board(None, "o", false, after));

    let scheduled = Instant::now();
    assert_eq!(harness.step().await, "computer_move");
    assert!(scheduled.elapsed() >= Duration::from_millis(100));
    assert_eq!(
        harness.last_request().await,
        ("/computer_move".to_string(), json!({"game_id": "g1"}))
    );

    assert_eq!(harness.step().await, "response");
    assert_eq!(harness.view().bindings, Bindings::EmptyCells);
    assert_eq!(harness.label(4), "X");
    // Move responses omit the id; the session keeps it.
    assert_eq!(
        harness.controller.session().game_id(),
        Some(&GameId::from("g1"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_human_move_reverts_and_rebinds() {
    let mut harness = Harness::new(Players::new("Human", "Minimax"));
    harness.start(board(Some("g1"), "x", false, EMPTY)).await;

    harness.transport.fail(TransportError::new(
        TransportStatus::Error,
        Some("timeout".to_string()),
    ));
    harness.user(UserAction::ClickCell(4));

    assert_eq!(harness.label(4), "X");
    assert_eq!(harness.view().bindings, Bindings::None);
    assert_eq!(
        harness.last_request().await,
        ("/human_move".to_string(), json!({"move": "5", "game_id": "g1"}))
    );

    assert_eq!(harness.step().await, "response");
    assert_eq!(
        harness.view().error.as_deref(),
        Some("Error accessing server: timeout")
    );
    assert_eq!(harness.label(4), "5");
    assert!(harness.controller.cells()[4].is_empty());
    assert_eq!(harness.view().bindings, Bindings::EmptyCells);

    // The square is clickable again.
    harness.transport.reply(board(None, "o", false, EMPTY));
    harness.user(UserAction::ClickCell(4));
    assert_eq!(harness.requests().await.len(), 3);
    assert!(harness.view().error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_successful_human_move_keeps_mark() {
    let mut harness = Harness::new(Players::new("Human", "Minimax"));
    harness.start(board(Some("g1"), "x", false, EMPTY)).await;

    let mut after = EMPTY;
    after[0] = "X";
    harness.transport.reply(board(None, "o", false, after));
    harness.user(UserAction::ClickCell(0));
    assert_eq!(harness.label(0), "X");

    assert_eq!(harness.step().await, "response");
    assert_eq!(harness.label(0), "X");
    assert!(harness.view().error.is_none());
    assert!(harness.controller.computer_move_pending());
}

#[tokio::test(start_paused = true)]
async fn test_clicks_ignored_while_move_in_flight() {
    let mut harness = Harness::new(Players::new("Human", "Human"));
    harness.start(board(Some("g1"), "x", false, EMPTY)).await;

    harness.transport.reply(board(None, "o", false, EMPTY));
    harness.user(UserAction::ClickCell(2));
    harness.user(UserAction::ClickCell(3));
    harness.user(UserAction::Play);

    assert_eq!(harness.requests().await.len(), 2);
    assert!(harness.controller.request_in_flight());
}

#[tokio::test(start_paused = true)]
async fn test_occupied_square_is_not_playable() {
    let mut harness = Harness::new(Players::new("Human", "Human"));
    let mut squares = EMPTY;
    squares[8] = "O";
    harness.start(board(Some("g1"), "x", false, squares)).await;

    harness.user(UserAction::ClickCell(8));
    harness.user(UserAction::ClickCell(42));
    assert_eq!(harness.requests().await.len(), 1);
    assert_eq!(harness.view().bindings, Bindings::EmptyCells);
}

#[tokio::test(start_paused = true)]
async fn test_failed_play_returns_to_selection() {
    let mut harness = Harness::new(Players::new("Human", "TD"));
    harness.transport.fail(TransportError::new(
        TransportStatus::Error,
        Some("Internal Server Error".to_string()),
    ));
    harness.user(UserAction::Play);
    assert_eq!(harness.step().await, "response");

    assert_eq!(*harness.controller.phase(), Phase::SelectingPlayers);
    assert!(harness.view().selection_visible);
    assert!(harness.view().selection_enabled);
    assert!(harness.view().cells.is_none());
    assert_eq!(harness.view().bindings, Bindings::Selection);
    assert_eq!(
        harness.view().error.as_deref(),
        Some("Error accessing server: Internal Server Error")
    );
}

#[tokio::test(start_paused = true)]
async fn test_undecodable_response_is_reported_like_a_transport_failure() {
    let mut harness = Harness::new(Players::new("Human", "TD"));
    harness
        .transport
        .reply(r#"<input id="game-id" value="g1"><input id="expired" value="maybe">"#.to_string());
    harness.user(UserAction::Play);
    harness.step().await;

    let error = harness.view().error.clone().expect("error shown");
    assert!(error.starts_with("Parsererror accessing server: "));
    assert_eq!(harness.view().bindings, Bindings::Selection);
}

#[tokio::test(start_paused = true)]
async fn test_play_without_game_id_fails() {
    let mut harness = Harness::new(Players::new("Human", "TD"));
    harness.start(board(None, "x", false, EMPTY)).await;

    assert_eq!(*harness.controller.phase(), Phase::SelectingPlayers);
    assert_eq!(
        harness.view().error.as_deref(),
        Some("Parsererror accessing server: Missing #game-id in fragment")
    );
}

#[tokio::test(start_paused = true)]
async fn test_waiting_indicator_only_for_slow_responses() {
    let mut harness = Harness::new(Players::new("Human", "TD"));
    harness.transport.reply_after(
        Duration::from_millis(800),
        Ok(board(Some("g1"), "x", false, EMPTY)),
    );
    harness.user(UserAction::Play);
    assert!(harness.controller.waiting_armed());

    assert_eq!(harness.step().await, "waiting");
    assert_eq!(harness.view().waiting.as_deref(), Some(WAITING_TEXT));

    assert_eq!(harness.step().await, "response");
    assert!(harness.view().waiting.is_none());
    assert!(!harness.controller.waiting_armed());
}

#[tokio::test(start_paused = true)]
async fn test_fast_response_never_shows_waiting() {
    let mut harness = Harness::new(Players::new("Human", "TD"));
    harness.start(board(Some("g1"), "x", false, EMPTY)).await;
    assert!(!harness.controller.waiting_armed());

    tokio::time::advance(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;
    assert!(harness.events.try_recv().is_err());
    assert!(harness.view().waiting.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_each_request_rearms_a_single_waiting_timer() {
    let mut harness = Harness::new(Players::new("Random", "Human"));
    harness.start(board(Some("g1"), "x", false, EMPTY)).await;
    assert!(!harness.controller.waiting_armed());

    harness.transport.reply_after(
        Duration::from_millis(600),
        Ok(board(None, "o", false, EMPTY)),
    );
    assert_eq!(harness.step().await, "computer_move");
    assert!(harness.controller.waiting_armed());

    assert_eq!(harness.step().await, "waiting");
    assert_eq!(harness.step().await, "response");
    assert!(!harness.controller.waiting_armed());
    assert!(harness.events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_game_over_offers_swap_when_players_differ() {
    let mut harness = Harness::new(Players::new("Human", "Random"));
    harness.start(board(Some("g1"), "o", false, EMPTY)).await;
    // O is Random: its move is scheduled.
    assert!(harness.controller.computer_move_pending());

    harness.transport.reply(board(
        None,
        "x",
        true,
        ["O", "O", "O", "X", "X", "6", "7", "8", "9"],
    ));
    assert_eq!(harness.step().await, "computer_move");
    assert_eq!(harness.step().await, "response");

    assert_eq!(*harness.controller.phase(), Phase::GameOver);
    assert_eq!(
        harness.view().bindings,
        Bindings::GameOver { offer_swap: true }
    );

    harness.transport.reply(board(Some("g2"), "x", false, EMPTY));
    harness.user(UserAction::SamePlayersDiffPieces);
    assert_eq!(harness.view().bindings, Bindings::None);
    assert_eq!(harness.view().players, Players::new("Random", "Human"));
    assert_eq!(
        harness.last_request().await,
        ("/play".to_string(), json!({"x": "Random", "o": "Human"}))
    );

    assert_eq!(harness.step().await, "response");
    // X is now the computer.
    assert!(harness.controller.computer_move_pending());
    assert_eq!(harness.view().bindings, Bindings::None);
    assert_eq!(
        harness.controller.session().game_id(),
        Some(&GameId::from("g2"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_swap_withheld_for_identical_players() {
    let mut harness = Harness::new(Players::new("Human", "Human"));
    harness
        .start(board(
            Some("g1"),
            "o",
            true,
            ["X", "X", "X", "O", "O", "6", "7", "8", "9"],
        ))
        .await;

    assert_eq!(
        harness.view().bindings,
        Bindings::GameOver { offer_swap: false }
    );
    harness.user(UserAction::SamePlayersDiffPieces);
    assert_eq!(harness.requests().await.len(), 1);

    harness.transport.reply(board(Some("g2"), "x", false, EMPTY));
    harness.user(UserAction::SamePlayersSamePieces);
    assert_eq!(
        harness.last_request().await,
        ("/play".to_string(), json!({"x": "Human", "o": "Human"}))
    );
}

#[tokio::test(start_paused = true)]
async fn test_different_players_returns_to_selection() {
    let mut harness = Harness::new(Players::new("Human", "TD"));
    harness
        .start(board(
            Some("g1"),
            "o",
            true,
            ["X", "X", "X", "O", "O", "6", "7", "8", "9"],
        ))
        .await;

    harness.user(UserAction::DiffPlayers);
    assert_eq!(*harness.controller.phase(), Phase::SelectingPlayers);
    assert!(harness.view().selection_visible);
    assert!(harness.view().selection_enabled);
    assert!(harness.view().cells.is_none());
    assert_eq!(harness.view().bindings, Bindings::Selection);
    assert!(harness.controller.session().game_id().is_none());
    assert_eq!(harness.requests().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_game_binds_reload() {
    let mut harness = Harness::new(Players::new("Human", "TD"));
    harness.start(board(Some("g1"), "x", false, EMPTY)).await;

    harness.transport.reply(expired());
    harness.user(UserAction::ClickCell(0));
    assert_eq!(harness.step().await, "response");

    assert_eq!(*harness.controller.phase(), Phase::Expired);
    assert_eq!(harness.view().bindings, Bindings::Reload);
    assert!(!harness.controller.computer_move_pending());

    harness.user(UserAction::Reload);
    assert_eq!(*harness.controller.phase(), Phase::SelectingPlayers);
    assert_eq!(harness.view().bindings, Bindings::Selection);
    assert!(harness.view().selection_visible);
}

#[tokio::test(start_paused = true)]
async fn test_failed_computer_move_offers_reload() {
    let mut harness = Harness::new(Players::new("TD", "Human"));
    harness.start(board(Some("g1"), "x", false, EMPTY)).await;

    harness.transport.fail(TransportError::new(TransportStatus::Timeout, None));
    assert_eq!(harness.step().await, "computer_move");
    assert_eq!(harness.step().await, "response");

    assert_eq!(
        harness.view().error.as_deref(),
        Some("Timeout accessing server")
    );
    assert_eq!(harness.view().bindings, Bindings::Reload);
}
