//! The control command protocol exchanged between the tunnel server and the
//! tunnel client.
//!
//! This is a minimal, line-oriented protocol: every command is a single
//! character followed by `\n`, except for the [`Command::CountConn`] reply
//! and the single-byte [`Command::Ok`] acknowledgement after
//! [`Command::StartTransport`], both of which are written without a
//! trailing newline. See [`read_commands`] for how the reader copes with
//! that asymmetry.

mod command;
mod error;
mod frame;

pub use command::Command;
pub use error::ProtoError;
pub use frame::{read_commands, write_command, write_raw};

use std::time::Duration;

/// Maximum length of a single command, including its trailing newline.
pub const MAX_COMMAND_LEN: usize = 512;

/// Deadline for writing a single command.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for reading the next batch of commands.
pub const READ_TIMEOUT: Duration = Duration::from_secs(60);
