//! Child process execution and termination.
//!
//! The `Supervisor` spawns one external command per launch, attaches reader
//! tasks that forward raw output chunks into the application's event channel
//! as line batches, and provides the group-termination primitive used by
//! stop and shutdown.

use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::config::LaunchConfig;
use crate::events::Event;
use crate::output::split_chunk_lines;

/// Spawns child processes and wires their output into the event channel.
pub struct Supervisor {
    event_tx: mpsc::Sender<Event>,
}

impl Supervisor {
    pub fn new(event_tx: mpsc::Sender<Event>) -> Self {
        Self { event_tx }
    }

    /// Spawns the launch's command and attaches a reader task per stream.
    ///
    /// The command runs through the platform shell so pipes and operators
    /// work, with `FORCE_COLOR` set so children keep colorizing their output.
    /// Spawn errors (missing cwd and the like) are returned to the caller,
    /// which records them against the launch instead of propagating.
    pub fn spawn(&self, id: usize, config: &LaunchConfig) -> std::io::Result<Child> {
        let mut command = shell_command(&config.command);
        command.current_dir(&config.cwd);
        command.env("FORCE_COLOR", "true");
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command.kill_on_drop(true);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
            command.creation_flags(CREATE_NEW_PROCESS_GROUP);
        }

        #[cfg(unix)]
        unsafe {
            command.pre_exec(|| {
                let _ = libc::setpgid(0, 0);
                Ok(())
            });
        }

        let mut child = command.spawn()?;
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(read_stream(id, stdout, self.event_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(read_stream(id, stderr, self.event_tx.clone()));
        }
        Ok(child)
    }
}

/// Builds the shell invocation for a configured command line.
///
/// The line is split on whitespace and rejoined before being handed to the
/// shell; quoting is not supported.
#[cfg(unix)]
fn shell_command(command_line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(normalize_command_line(command_line));
    command
}

#[cfg(not(unix))]
fn shell_command(command_line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(normalize_command_line(command_line));
    command
}

fn normalize_command_line(command_line: &str) -> String {
    command_line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Signals the child's process group, then force-kills and awaits the exit.
///
/// No timeout is imposed on the wait; a child that ignores the kill blocks
/// its caller.
pub async fn terminate_child(mut child: Child) -> std::io::Result<()> {
    if let Some(pid) = child.id() {
        signal_process_group(pid);
    }
    child.kill().await
}

#[cfg(unix)]
fn signal_process_group(pid: u32) {
    unsafe {
        let pid = pid as i32;
        let _ = libc::kill(-pid, libc::SIGTERM);
        let _ = libc::kill(pid, libc::SIGTERM);
    }
}

#[cfg(windows)]
fn signal_process_group(pid: u32) {
    use windows_sys::Win32::System::Console::{GenerateConsoleCtrlEvent, CTRL_BREAK_EVENT};
    unsafe {
        let _ = GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, pid);
    }
}

#[cfg(all(not(unix), not(windows)))]
fn signal_process_group(_pid: u32) {}

// Reads raw chunks rather than buffered lines: each chunk is split into lines
// as-is, so a chunk ending mid-line yields that fragment as its own line.
async fn read_stream<R>(id: usize, mut reader: R, tx: mpsc::Sender<Event>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]);
                let lines = split_chunk_lines(&chunk);
                if lines.is_empty() {
                    continue;
                }
                if tx.send(Event::Output { id, lines }).await.is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_is_whitespace_normalized() {
        assert_eq!(normalize_command_line("echo   hello\tworld"), "echo hello world");
        assert_eq!(normalize_command_line("cargo run | grep warn"), "cargo run | grep warn");
    }
}
