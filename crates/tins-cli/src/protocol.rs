//! Line protocol shared by stdin and the TCP remote.
//!
//! ```text
//! set h        press the key 'h'
//! res h        release it
//! set semicolon
//! quit         stdin only: stop playing
//! ```

use thiserror::Error;
use tins_synth::{ControlBridge, ControlError};

/// One decoded control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLine {
    /// Press a key.
    Set(char),
    /// Release a key.
    Res(char),
    /// Stop the session.
    Quit,
}

/// Why a line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty line")]
    Empty,
    #[error("expected `<verb> <key>`, got {0} words")]
    WrongArity(usize),
    #[error("unknown verb '{0}'")]
    UnknownVerb(String),
    #[error("key '{0}' is not a single character")]
    BadKey(String),
}

/// Decode a key name: one character, or `semicolon` / `apostrophe`.
pub fn parse_key(name: &str) -> Result<char, ProtocolError> {
    match name {
        "semicolon" => return Ok(';'),
        "apostrophe" => return Ok('\''),
        _ => {}
    }
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ProtocolError::BadKey(name.to_string())),
    }
}

impl ControlLine {
    /// Parse one line. Surrounding whitespace is ignored.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => Err(ProtocolError::Empty),
            ["quit"] => Ok(ControlLine::Quit),
            ["set", key] => parse_key(key).map(ControlLine::Set),
            ["res", key] => parse_key(key).map(ControlLine::Res),
            [verb, _] => Err(ProtocolError::UnknownVerb((*verb).to_string())),
            [verb] if !matches!(*verb, "set" | "res") => {
                Err(ProtocolError::UnknownVerb((*verb).to_string()))
            }
            other => Err(ProtocolError::WrongArity(other.len())),
        }
    }

    /// Forward a key line to the bridge. `Quit` is the caller's business.
    pub fn apply(self, bridge: &ControlBridge) -> Result<(), ControlError> {
        match self {
            ControlLine::Set(key) => bridge.set_key(key, true),
            ControlLine::Res(key) => bridge.set_key(key, false),
            ControlLine::Quit => Ok(()),
        }
    }
}

/// Parse and apply one line, logging anything that goes wrong.
///
/// Returns `true` when the line asks to quit.
pub fn handle_line(line: &str, bridge: &ControlBridge, source: &str) -> bool {
    let command = match ControlLine::parse(line) {
        Ok(command) => command,
        Err(ProtocolError::Empty) => return false,
        Err(err) => {
            tracing::warn!(source, line = line.trim(), error = %err, "malformed control line");
            return false;
        }
    };
    if command == ControlLine::Quit {
        return true;
    }
    match command.apply(bridge) {
        Ok(()) => tracing::debug!(source, ?command, "control line applied"),
        Err(ControlError::QueueFull) => {
            tracing::warn!(source, ?command, "control queue full, event dropped");
        }
        Err(err) => tracing::warn!(source, ?command, error = %err, "control line rejected"),
    }
    false
}
