//! Application state and input dispatch.
//!
//! The `App` owns the ordered launch registry, the selection cursor, and the
//! supervisor. All mutation happens here, driven by the single event loop in
//! `main.rs`: keyboard and mouse events come through `handle_key` and
//! `handle_mouse`, process output through `on_output`, and exits through
//! `poll_exits`. Every path reports whether the frame needs redrawing.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::LaunchConfig;
use crate::events::Event;
use crate::launch::{LaunchState, LaunchStatus};
use crate::output::{sanitize_text, LogBuffer};
use crate::supervisor::{terminate_child, Supervisor};

const SCROLL_STEP: isize = 1;

/// Action resulting from one input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    /// Nothing happened; skip the redraw.
    None,
    /// State changed; redraw the frame.
    Redraw,
    /// Start or relaunch a launch.
    Launch(usize),
    /// Terminate a launch's live process.
    Stop(usize),
    /// Dump a launch's log to a file.
    DumpLog(usize),
    /// Tear down every live process and exit.
    Quit,
}

/// The launch registry plus the selection cursor and dispatch logic.
pub struct App {
    pub launches: Vec<LaunchState>,
    pub selected: usize,
    pub should_quit: bool,
    log_view_height: usize,
    supervisor: Supervisor,
}

impl App {
    /// Builds the registry from configuration. The list must be non-empty.
    pub fn new(configs: Vec<LaunchConfig>, event_tx: mpsc::Sender<Event>) -> Self {
        let launches = configs.into_iter().map(LaunchState::new).collect();
        Self {
            launches,
            selected: 0,
            should_quit: false,
            log_view_height: 0,
            supervisor: Supervisor::new(event_tx),
        }
    }

    pub fn selected_state(&self) -> &LaunchState {
        &self.launches[self.selected]
    }

    /// Moves the selection cursor circularly and re-pins the newly selected
    /// launch's log view to its tail.
    pub fn select_next(&mut self, direction: isize) -> usize {
        let len = self.launches.len() as isize;
        self.selected = (self.selected as isize + direction).rem_euclid(len) as usize;
        self.launches[self.selected].log.reset_scroll();
        self.selected
    }

    /// Records the height of the log pane, used for page scrolling.
    pub fn set_log_view_height(&mut self, height: usize) {
        self.log_view_height = height;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return AppAction::Stop(self.selected);
        }
        match key.code {
            KeyCode::Up => {
                self.select_next(-1);
                AppAction::Redraw
            }
            KeyCode::Down => {
                self.select_next(1);
                AppAction::Redraw
            }
            KeyCode::Enter => AppAction::Launch(self.selected),
            KeyCode::Esc => AppAction::Quit,
            KeyCode::Char('d') | KeyCode::Char('D') => AppAction::DumpLog(self.selected),
            KeyCode::Char('k') => self.scroll_action(SCROLL_STEP),
            KeyCode::Char('j') => self.scroll_action(-SCROLL_STEP),
            KeyCode::PageUp => self.scroll_action(self.page_step()),
            KeyCode::PageDown => self.scroll_action(-self.page_step()),
            KeyCode::End => {
                if self.launches[self.selected].log.reset_scroll() {
                    AppAction::Redraw
                } else {
                    AppAction::None
                }
            }
            _ => AppAction::None,
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> AppAction {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_action(SCROLL_STEP),
            MouseEventKind::ScrollDown => self.scroll_action(-SCROLL_STEP),
            _ => AppAction::None,
        }
    }

    fn scroll_action(&mut self, delta: isize) -> AppAction {
        if self.launches[self.selected].log.scroll_by(delta) {
            AppAction::Redraw
        } else {
            AppAction::None
        }
    }

    fn page_step(&self) -> isize {
        self.log_view_height.max(1) as isize
    }

    /// Starts or relaunches a launch. A launch with a live process is left
    /// alone: callers must stop it first.
    pub fn launch(&mut self, id: usize) -> bool {
        let Some(state) = self.launches.get_mut(id) else {
            return false;
        };
        if state.child.is_some() {
            return false;
        }
        state.status = LaunchStatus::Starting;
        state.exit_code = None;
        state.log.reset_scroll();
        let config = state.config.clone();
        let banner = format!("running '{}' from {}", config.command, config.cwd);
        self.on_output(id, vec![banner]);
        match self.supervisor.spawn(id, &config) {
            Ok(child) => self.launches[id].child = Some(child),
            Err(err) => {
                self.launches[id].status = LaunchStatus::Failed;
                let line = format!("failed to start '{}': {}", config.command, err);
                self.on_output(id, vec![line]);
            }
        }
        true
    }

    /// Terminates a launch's live process. No-op when nothing is running.
    pub async fn stop(&mut self, id: usize) -> bool {
        let Some(state) = self.launches.get_mut(id) else {
            return false;
        };
        let Some(child) = state.child.take() else {
            return false;
        };
        let name = state.config.name.clone();
        if let Err(err) = terminate_child(child).await {
            eprintln!("failed to terminate {}: {}", name, err);
        }
        let state = &mut self.launches[id];
        state.status = LaunchStatus::Stopped;
        state.log.reset_scroll();
        self.on_output(
            id,
            vec![
                String::new(),
                "Process was stopped, to restart, press ENTER".to_string(),
            ],
        );
        true
    }

    /// Appends a batch of output lines to a launch's log.
    ///
    /// While the launch is still starting, the batch doubles as the readiness
    /// probe: it flips the status to `Running` when the `startedWhen` marker
    /// appears in it, or unconditionally when no marker is configured.
    pub fn on_output(&mut self, id: usize, lines: Vec<String>) -> bool {
        if lines.is_empty() {
            return false;
        }
        let Some(state) = self.launches.get_mut(id) else {
            return false;
        };
        let mut redraw = id == self.selected;
        if matches!(state.status, LaunchStatus::NotStarted | LaunchStatus::Starting) {
            let running = match &state.config.started_when {
                None => true,
                Some(marker) => lines.iter().any(|line| line.contains(marker)),
            };
            if running {
                state.status = LaunchStatus::Running;
                redraw = true;
            }
        }
        state.log.append(lines);
        redraw
    }

    /// Records a process exit observed by `poll_exits`.
    pub fn on_exited(&mut self, id: usize, code: Option<i32>) -> bool {
        let Some(state) = self.launches.get_mut(id) else {
            return false;
        };
        state.child = None;
        state.exit_code = code;
        state.status = if code == Some(0) {
            LaunchStatus::Finished
        } else {
            LaunchStatus::Failed
        };
        let command = state.config.command.clone();
        let line = match code {
            Some(code) => format!("{} exited with code {}", command, code),
            None => format!("{} exited with code unknown", command),
        };
        self.on_output(id, vec![line]);
        true
    }

    /// Checks every live child for an exit. Called from the event-loop ticker.
    pub fn poll_exits(&mut self) -> bool {
        let mut redraw = false;
        for id in 0..self.launches.len() {
            let Some(child) = self.launches[id].child.as_mut() else {
                continue;
            };
            match child.try_wait() {
                Ok(Some(status)) => {
                    self.launches[id].child = None;
                    self.on_exited(id, status.code());
                    redraw = true;
                }
                Ok(None) => {}
                Err(err) => {
                    self.launches[id].child = None;
                    self.launches[id].status = LaunchStatus::Failed;
                    self.on_output(id, vec![format!("process error: {}", err)]);
                    redraw = true;
                }
            }
        }
        redraw
    }

    /// Writes the selected launch's escape-stripped log to `./<name>.log`.
    ///
    /// On success a confirmation line with the resolved absolute path is
    /// appended to the live log. Write failures currently produce no feedback.
    pub async fn dump_log(&mut self, id: usize) -> bool {
        let Some(state) = self.launches.get(id) else {
            return false;
        };
        let path = PathBuf::from(format!("{}.log", state.config.name));
        let contents = dump_contents(&state.log);
        if tokio::fs::write(&path, contents).await.is_err() {
            return false;
        }
        let resolved = tokio::fs::canonicalize(&path).await.unwrap_or(path);
        self.on_output(id, vec![format!("log saved to {}", resolved.display())]);
        true
    }

    /// Terminates every still-live process concurrently and waits for all of
    /// them before returning.
    pub async fn shutdown_all(&mut self) {
        let mut terminations = JoinSet::new();
        for state in &mut self.launches {
            if let Some(child) = state.child.take() {
                let name = state.config.name.clone();
                terminations.spawn(async move { (name, terminate_child(child).await) });
            }
        }
        while let Some(joined) = terminations.join_next().await {
            match joined {
                Ok((name, Err(err))) => eprintln!("failed to terminate {}: {}", name, err),
                Ok((_, Ok(()))) => {}
                Err(err) => eprintln!("termination task failed: {}", err),
            }
        }
    }
}

fn dump_contents(log: &LogBuffer) -> String {
    log.iter()
        .map(|line| sanitize_text(line))
        .collect::<Vec<_>>()
        .join("\n")
}
