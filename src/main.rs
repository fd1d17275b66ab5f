//! multilaunch: launch a set of named shell commands and watch their logs.
//!
//! This is the entry point. It loads the JSON launch list, sets up the
//! terminal, and runs the single event loop that serializes keyboard, mouse,
//! and child-output events. On quit every live child is terminated before the
//! terminal is restored.

mod ansi;
mod app;
mod config;
mod events;
mod launch;
mod output;
mod supervisor;
mod tui;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tokio::sync::mpsc;

use crate::app::{App, AppAction};
use crate::events::Event;

/// Command-line interface definition.
#[derive(Debug, Parser)]
#[command(
    name = "multilaunch",
    version,
    about = "Launch a set of shell commands and watch their logs in a TUI"
)]
struct Cli {
    /// Path to a JSON array of {name, command, cwd, startedWhen?, section}.
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Config failures are fatal and must be reported before the terminal is
    // switched into raw mode.
    let configs = config::load_config(&cli.config)?;
    if configs.is_empty() {
        bail!("no launches defined in {}", cli.config.display());
    }

    let (event_tx, mut event_rx) = mpsc::channel(256);
    let mut app = App::new(configs, event_tx.clone());
    let mut terminal = tui::init_terminal()?;
    spawn_input_listener(event_tx);

    let mut ticker = tokio::time::interval(Duration::from_millis(150));
    let mut result = Ok(());
    if let Err(err) = tui::draw(&mut app, &mut terminal) {
        result = Err(err.into());
        app.should_quit = true;
    }

    while !app.should_quit {
        let redraw = tokio::select! {
            Some(event) = event_rx.recv() => match event {
                Event::Output { id, lines } => app.on_output(id, lines),
                Event::Key(key) => {
                    match app.handle_key(key) {
                        AppAction::None => false,
                        AppAction::Redraw => true,
                        AppAction::Launch(id) => app.launch(id),
                        AppAction::Stop(id) => app.stop(id).await,
                        AppAction::DumpLog(id) => app.dump_log(id).await,
                        AppAction::Quit => {
                            app.should_quit = true;
                            false
                        }
                    }
                }
                Event::Mouse(mouse) => match app.handle_mouse(mouse) {
                    AppAction::Redraw => true,
                    _ => false,
                },
                Event::Resize { .. } => {
                    let _ = terminal.autoresize();
                    true
                }
            },
            _ = ticker.tick() => app.poll_exits(),
        };

        if app.should_quit {
            break;
        }
        if redraw {
            if let Err(err) = tui::draw(&mut app, &mut terminal) {
                result = Err(err.into());
                break;
            }
        }
    }

    app.shutdown_all().await;
    tui::restore_terminal(terminal)?;
    result
}

// Crossterm's blocking reader lives on its own thread; events are forwarded
// into the async loop over the same channel the supervisor writes to.
fn spawn_input_listener(tx: mpsc::Sender<Event>) {
    std::thread::spawn(move || loop {
        if crossterm::event::poll(Duration::from_millis(100)).unwrap_or(false) {
            match crossterm::event::read() {
                Ok(crossterm::event::Event::Key(key)) => {
                    if tx.blocking_send(Event::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(crossterm::event::Event::Mouse(mouse)) => {
                    if tx.blocking_send(Event::Mouse(mouse)).is_err() {
                        break;
                    }
                }
                Ok(crossterm::event::Event::Resize(width, height)) => {
                    if tx.blocking_send(Event::Resize { width, height }).is_err() {
                        break;
                    }
                }
                _ => {}
            }
        }
    });
}
