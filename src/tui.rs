//! Terminal session management and frame rendering.
//!
//! This module owns the raw-mode/alternate-screen lifetime and projects the
//! application state into a frame: a two-line header, a fixed-width sidebar
//! listing every section and its launches with color-coded status labels, a
//! vertical divider, and the selected launch's log window. Drawing is only
//! ever triggered by the event loop; nothing here polls or re-renders on its
//! own.

use std::io::{self, Stdout};

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::{Frame, Terminal};

use crate::ansi::styled_spans;
use crate::app::App;
use crate::launch::{LaunchState, LaunchStatus};

pub type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

const SIDEBAR_WIDTH: u16 = 30;

/// Enables raw mode, enters the alternate screen, and grabs the mouse.
pub fn init_terminal() -> io::Result<TuiTerminal> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restores the terminal to its original state.
pub fn restore_terminal(mut terminal: TuiTerminal) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Draws the current application state to the terminal.
pub fn draw(app: &mut App, terminal: &mut TuiTerminal) -> io::Result<()> {
    terminal.draw(|frame| {
        let area = frame.size();
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);
        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
            .split(vertical[1]);

        render_header(app, frame, vertical[0]);
        render_sidebar(app, frame, main[0]);
        render_log(app, frame, main[1]);
        render_footer(frame, vertical[2]);
    })?;
    Ok(())
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let name = app.selected_state().config.name.clone();
    let rule_width = (area.width as usize).saturating_sub(SIDEBAR_WIDTH as usize + 1);
    let title = Line::from(vec![
        Span::styled(
            pad_string("Commands", SIDEBAR_WIDTH as usize),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
    ]);
    let rule = Line::from(Span::styled(
        format!(
            "{}┼{}",
            "─".repeat(SIDEBAR_WIDTH as usize),
            "─".repeat(rule_width)
        ),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Text::from(vec![title, rule])), area);
}

fn render_sidebar(app: &App, frame: &mut Frame, area: Rect) {
    let mut items = Vec::new();
    let mut last_section: Option<&str> = None;
    for (idx, launch) in app.launches.iter().enumerate() {
        let section = launch.config.section.as_str();
        if last_section != Some(section) {
            items.push(ListItem::new(Line::from(Span::styled(
                format!("▼ {}", section),
                Style::default().fg(Color::DarkGray),
            ))));
            last_section = Some(section);
        }
        items.push(launch_item(launch, idx == app.selected, area.width));
    }
    frame.render_widget(List::new(items), area);
}

fn launch_item(launch: &LaunchState, selected: bool, width: u16) -> ListItem<'static> {
    let (marker, name_style) = if selected {
        (
            Span::styled("▶ ", Style::default().fg(Color::Cyan)),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (Span::raw("  "), Style::default().fg(Color::Gray))
    };
    let name = pad_string(&launch.config.name, width.saturating_sub(2) as usize);
    let mut text = Text::default();
    text.lines
        .push(Line::from(vec![marker, Span::styled(name, name_style)]));
    text.lines.push(Line::from(Span::styled(
        format!("  {}", launch.status.label()),
        status_style(launch.status).add_modifier(Modifier::ITALIC),
    )));
    text.lines.push(Line::from(Span::styled(
        "─".repeat(width as usize),
        Style::default().fg(Color::DarkGray),
    )));
    ListItem::new(text)
}

fn render_log(app: &mut App, frame: &mut Frame, area: Rect) {
    let divider = Block::default()
        .borders(Borders::LEFT)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = divider.inner(area);
    app.set_log_view_height(inner.height as usize);

    let state = app.selected_state();
    if state.log.is_empty() {
        let placeholder = format!(
            "Command '{}' has not yet been run, to start press ENTER",
            state.config.command
        );
        let paragraph = Paragraph::new(placeholder)
            .style(Style::default().fg(Color::DarkGray))
            .block(divider);
        frame.render_widget(paragraph, area);
        return;
    }

    let window = state
        .log
        .visible_window(inner.height as usize, state.log.scroll());
    let lines: Vec<Line<'static>> = window
        .into_iter()
        .map(|line| Line::from(truncate_spans(styled_spans(line), inner.width as usize)))
        .collect();
    frame.render_widget(Paragraph::new(Text::from(lines)).block(divider), area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let help = " ESC quit │ ↑/↓ select │ ENTER start/restart │ CTRL-C stop │ \
                k/j scroll │ PgUp/PgDn page │ End tail │ d dump log";
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn status_style(status: LaunchStatus) -> Style {
    match status {
        LaunchStatus::Running => Style::default().fg(Color::Green),
        LaunchStatus::Starting => Style::default().fg(Color::Yellow),
        LaunchStatus::Failed | LaunchStatus::Stopped => Style::default().fg(Color::Red),
        LaunchStatus::NotStarted | LaunchStatus::Finished => Style::default().fg(Color::DarkGray),
    }
}

// Pad to exactly `len` display cells, truncating when over.
fn pad_string(text: &str, len: usize) -> String {
    let count = text.chars().count();
    if count > len {
        text.chars().take(len).collect()
    } else {
        format!("{}{}", text, " ".repeat(len - count))
    }
}

fn truncate_spans(spans: Vec<Span<'static>>, max: usize) -> Vec<Span<'static>> {
    if max == 0 {
        return Vec::new();
    }
    let total: usize = spans.iter().map(|span| span.content.chars().count()).sum();
    if total <= max {
        return spans;
    }
    let mut remaining = max.saturating_sub(1);
    let mut out = Vec::new();
    for span in spans {
        if remaining == 0 {
            break;
        }
        let count = span.content.chars().count();
        if count <= remaining {
            remaining -= count;
            out.push(span);
        } else {
            let clipped: String = span.content.chars().take(remaining).collect();
            out.push(Span::styled(clipped, span.style));
            remaining = 0;
        }
    }
    if let Some(last) = out.last_mut() {
        let mut content = last.content.to_string();
        content.push('~');
        last.content = content.into();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_string_pads_and_truncates() {
        assert_eq!(pad_string("ab", 4), "ab  ");
        assert_eq!(pad_string("abcdef", 4), "abcd");
    }

    #[test]
    fn status_colors_follow_the_lifecycle() {
        assert_eq!(status_style(LaunchStatus::Running).fg, Some(Color::Green));
        assert_eq!(status_style(LaunchStatus::Starting).fg, Some(Color::Yellow));
        assert_eq!(status_style(LaunchStatus::Failed).fg, Some(Color::Red));
        assert_eq!(status_style(LaunchStatus::Stopped).fg, Some(Color::Red));
        assert_eq!(
            status_style(LaunchStatus::Finished).fg,
            Some(Color::DarkGray)
        );
    }

    #[test]
    fn truncate_spans_clips_and_marks() {
        let spans = vec![Span::raw("abc"), Span::raw("def")];
        let clipped = truncate_spans(spans, 4);
        let text: String = clipped.iter().map(|s| s.content.to_string()).collect();
        assert_eq!(text, "abc~");

        let untouched = truncate_spans(vec![Span::raw("ab")], 4);
        assert_eq!(untouched.len(), 1);
        assert_eq!(untouched[0].content, "ab");
    }
}
