//! Stateless rendering of a [`TerminalView`].

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::view::{BoardRegion, TerminalView};
use crate::view::Bindings;
use crate::{Cell, CellState, Piece};

/// Renders the whole screen.
pub fn draw(frame: &mut Frame, view: &TerminalView) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(9),    // Selection or board
            Constraint::Length(1), // Waiting
            Constraint::Length(1), // Error
            Constraint::Length(3), // Help
        ])
        .split(area);

    let title = Paragraph::new("Tic Tac Toe")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    if view.selection_visible {
        draw_selection(frame, chunks[1], view);
    } else if let Some(board) = &view.board {
        draw_board(frame, chunks[1], board, view);
    }

    if let Some(waiting) = &view.waiting {
        let line = Paragraph::new(waiting.as_str())
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center);
        frame.render_widget(line, chunks[2]);
    }

    if let Some(error) = &view.error {
        let line = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        frame.render_widget(line, chunks[3]);
    }

    let help = Paragraph::new(help_text(view.bindings()))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[4]);
}

fn help_text(bindings: Bindings) -> &'static str {
    match bindings {
        Bindings::None => "q: quit",
        Bindings::Selection => "↑/↓: field  ←/→: player type  Enter: play  q: quit",
        Bindings::EmptyCells => "1-9 or arrows + Enter: move  q: quit",
        Bindings::GameOver { offer_swap: true } => {
            "s: same pieces  w: swap pieces  d: different players  q: quit"
        }
        Bindings::GameOver { offer_swap: false } => "s: play again  d: different players  q: quit",
        Bindings::Reload => "r: back to player selection  q: quit",
    }
}

fn draw_selection(frame: &mut Frame, area: Rect, view: &TerminalView) {
    let form_area = center_rect(area, 60, 8);
    let dim = !view.selection_enabled;

    let mut lines = Vec::new();
    for (piece, field) in [(Piece::X, 0), (Piece::O, 1)] {
        let option = view.options.get(view.chosen[field]);
        let name = option.map(|o| o.name().as_str()).unwrap_or("?");
        let description = option.map(|o| o.description().as_str()).unwrap_or("");

        let mut style = Style::default().fg(Color::White);
        if piece == view.focus && !dim {
            style = style.bg(Color::Blue).add_modifier(Modifier::BOLD);
        }
        if dim {
            style = style.fg(Color::DarkGray);
        }

        lines.push(Line::from(vec![
            Span::raw(format!("  {}: ", piece.mark())),
            Span::styled(format!("◀ {} ▶", name), style),
            Span::styled(
                format!("  {}", description),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        lines.push(Line::from(""));
    }

    let form = Paragraph::new(lines).block(
        Block::default()
            .title("Select players")
            .borders(Borders::ALL),
    );
    frame.render_widget(form, form_area);
}

fn draw_board(frame: &mut Frame, area: Rect, board: &BoardRegion, view: &TerminalView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(11), Constraint::Length(1)])
        .split(area);

    let board_area = center_rect(chunks[0], 40, 11);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(board_area);

    let clickable = view.bindings() == Bindings::EmptyCells;
    for (row, start) in [(0, 0), (2, 3), (4, 6)] {
        draw_row(frame, rows[row], board, start, view.cursor, clickable);
    }
    draw_separator(frame, rows[1]);
    draw_separator(frame, rows[3]);

    let status = board.message.clone().unwrap_or_else(|| match board.turn {
        Some(piece) => format!("{} to move", piece.mark()),
        None => String::new(),
    });
    let status = Paragraph::new(status)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
    frame.render_widget(status, chunks[1]);
}

fn draw_row(
    frame: &mut Frame,
    area: Rect,
    board: &BoardRegion,
    start: usize,
    cursor: usize,
    clickable: bool,
) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(12),
            Constraint::Length(1),
            Constraint::Length(12),
            Constraint::Length(1),
            Constraint::Length(12),
        ])
        .split(area);

    for (col, offset) in [(0, 0), (2, 1), (4, 2)] {
        let index = start + offset;
        if let Some(cell) = board.cells.get(index) {
            draw_cell(frame, cols[col], cell, clickable && index == cursor, clickable);
        }
    }
    draw_separator_vertical(frame, cols[1]);
    draw_separator_vertical(frame, cols[3]);
}

fn draw_cell(frame: &mut Frame, area: Rect, cell: &Cell, under_cursor: bool, clickable: bool) {
    let mut style = match cell.state() {
        CellState::Empty if clickable => Style::default().fg(Color::Green),
        CellState::Empty => Style::default().fg(Color::DarkGray),
        CellState::Occupied(Piece::X) => Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        CellState::Occupied(Piece::O) => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    };
    if *cell.winner() {
        style = style.add_modifier(Modifier::REVERSED);
    }
    if under_cursor {
        style = style.bg(Color::White).fg(Color::Black);
    }

    let paragraph = Paragraph::new(Line::from(Span::styled(
        format!(" {} ", cell.label()),
        style,
    )))
    .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn draw_separator(frame: &mut Frame, area: Rect) {
    let sep = Paragraph::new("──────────────────────────────────────")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(sep, area);
}

fn draw_separator_vertical(frame: &mut Frame, area: Rect) {
    let sep = Paragraph::new("│").style(Style::default().fg(Color::DarkGray));
    frame.render_widget(sep, area);
}

fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vert[1])[1]
}
