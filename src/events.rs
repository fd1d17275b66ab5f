//! Event definitions for the application event loop.
//!
//! Every source of asynchrony — keyboard, mouse, terminal resize, and child
//! process output — is funnelled through one `Event` channel so that a single
//! consumer serializes all state mutation.

use crossterm::event::{KeyEvent, MouseEvent};

/// Represents an event in the application's main event loop.
#[derive(Debug, Clone)]
pub enum Event {
    /// A batch of output lines read from one chunk of a child's stdout or stderr.
    Output { id: usize, lines: Vec<String> },
    /// A keyboard event received from the user.
    Key(KeyEvent),
    /// A mouse event received from the user.
    Mouse(MouseEvent),
    /// The terminal window was resized.
    Resize { width: u16, height: u16 },
}
