//! Tic-tac-toe client - plays games hosted by the tic-tac-toe web server
//!
//! The server owns the game: it renders every board as an HTML fragment and
//! computes the moves of its strategy players. This crate relays what the
//! user does and shows what the server answers.
//!
//! # Architecture
//!
//! - **Transport**: posts JSON requests and returns HTML fragments
//! - **Fragment**: decodes a fragment into typed flags and squares
//! - **Controller**: the lifecycle state machine and request choreography
//! - **View**: the surface the controller drives (terminal or console)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tictactoe_client::{ClientConfig, GameController, HttpTransport};
//! use tictactoe_client::console::ConsoleView;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::default();
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let view = ConsoleView::new(config.default_players());
//! let transport = Arc::new(HttpTransport::new(config.server_url()));
//! let mut controller = GameController::new(view, transport, tx, config.timings());
//! while let Some(event) = rx.recv().await {
//!     controller.handle(event);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod controller;
mod error;
mod fragment;
mod piece;
mod request;
mod session;
mod timer;
mod transport;
mod view;

// Front ends
pub mod console;
pub mod tui;

// Crate-level exports - Configuration
pub use config::{ClientConfig, PlayerTypeInfo, SERVER_URL_ENV};

// Crate-level exports - Errors
pub use error::{ConfigError, FragmentError};

// Crate-level exports - Game data
pub use fragment::{Cell, CellState, Fragment, Status};
pub use piece::{HUMAN, Piece, PlayerType, Players};
pub use session::{GameId, Session};

// Crate-level exports - Requests
pub use request::{Endpoint, GameRequest};
pub use transport::{HttpTransport, Transport, TransportError, TransportStatus};

// Crate-level exports - Controller
pub use controller::{ClientEvent, GameController, Phase, Timings, TurnAction};
pub use timer::Deferred;
pub use view::{Bindings, UserAction, View, WAITING_TEXT};
