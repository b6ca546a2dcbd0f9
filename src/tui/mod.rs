//! Terminal UI for the tic-tac-toe client

mod input;
mod ui;
mod view;

pub use view::{BoardRegion, KeyOutcome, TerminalView};

use crate::{ClientConfig, ClientEvent, GameController, HttpTransport};
use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// Log file used while the terminal is in raw mode.
pub const LOG_FILE: &str = "tictactoe_client.log";

/// Runs the interactive terminal client until the user quits.
///
/// Logging must not go to the terminal while it is in raw mode; the binary
/// sends it to [`LOG_FILE`].
pub async fn run_tui(config: ClientConfig) -> Result<()> {
    info!(server_url = %config.server_url(), "Starting tic-tac-toe TUI");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_event_loop(&mut terminal, &config).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = ?err, "Event loop error");
    }

    res
}

/// Single-task loop: controller events and terminal input, one at a time.
#[instrument(skip_all)]
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    config: &ClientConfig,
) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();

    let view = TerminalView::new(config.player_types().clone(), &config.default_players());
    let transport = Arc::new(HttpTransport::new(config.server_url()));
    let mut controller = GameController::new(view, transport, event_tx, config.timings());

    let reader = spawn_input_reader(input_tx);

    loop {
        terminal.draw(|f| ui::draw(f, controller.view()))?;

        tokio::select! {
            Some(event) = event_rx.recv() => controller.handle(event),
            input = input_rx.recv() => {
                let Some(input) = input else {
                    warn!("Input reader stopped");
                    break;
                };
                let Event::Key(key) = input else {
                    // Resize and friends only need a redraw.
                    continue;
                };
                match controller.view_mut().handle_key(key) {
                    KeyOutcome::Quit => {
                        info!("User quit");
                        break;
                    }
                    KeyOutcome::Action(action) => controller.handle(ClientEvent::User(action)),
                    KeyOutcome::Redraw | KeyOutcome::Ignored => {}
                }
            }
        }
    }

    drop(input_rx);
    if let Err(e) = reader.await {
        debug!(error = %e, "Input reader task ended abnormally");
    }
    Ok(())
}

/// Reads terminal events on a blocking thread until the receiver is dropped.
fn spawn_input_reader(input: mpsc::UnboundedSender<Event>) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !input.is_closed() {
            match event::poll(std::time::Duration::from_millis(100)) {
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if input.send(ev).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read terminal event");
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    warn!(error = %e, "Failed to poll terminal");
                    break;
                }
            }
        }
    })
}
