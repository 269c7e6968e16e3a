//! Command shell around the metronome
//!
//! Parses user input, keeps one engine per session and reports outcomes as
//! [`Status`] codes that [`Messages`] renders in the configured language.

mod command;
mod messages;
mod session;

pub use command::{parse_command, validate_bpm_input, Command, InputError, QUIT_COMMAND, STOP_COMMAND};
pub use messages::{Language, Messages, Status};
pub use session::{failure_status, Reply, Session};
