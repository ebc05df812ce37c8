//! The notificationd line protocol.
//!
//! Clients write newline terminated commands. The server answers with lines
//! that start with `+` (success), `-` (failure) or `$` (an event pushed to
//! consuming clients), optionally preceded by a numeric request id.

pub mod reply;

use std::fmt;
use std::io::{BufRead, Read};

use crate::error::ClientError;
use crate::identity::LoginIdentity;

pub use reply::{Reply, Sign};

/// Longest server line accepted, terminator included
pub const MAX_LINE_LEN: usize = 8 * 1024;

/// Prefix of the acknowledgement that ends a send
pub const SEND_ACK: &str = "+SEND";

/// A command line sent to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	Login(LoginIdentity),
	Title(String),
	Body(String),
	/// `BODY RST`: drop the body lines sent so far
	BodyReset,
	/// Drop everything sent since the last `SEND`
	Reset,
	Send,
	Consume,
	ConsumeOff,
	History,
	Version,
	Who,
	Quit,
}

impl fmt::Display for Command {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Command::Login(identity) => write!(f, "LOGIN {}", identity),
			Command::Title(title) => write!(f, "TITLE: {}", title),
			Command::Body(line) => write!(f, "BODY: {}", line),
			Command::BodyReset => f.write_str("BODY RST"),
			Command::Reset => f.write_str("RESET"),
			Command::Send => f.write_str("SEND"),
			Command::Consume => f.write_str("CONSUME"),
			Command::ConsumeOff => f.write_str("CONSUME off"),
			Command::History => f.write_str("HISTORY"),
			Command::Version => f.write_str("VERSION"),
			Command::Who => f.write_str("WHO"),
			Command::Quit => f.write_str("QUIT"),
		}
	}
}

impl Command {
	/// The command as it goes on the wire
	pub fn to_line(&self) -> String {
		format!("{}\n", self)
	}
}

/// How the send read loop treats a server line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
	Error(String),
	Accepted(String),
	Info(String),
}

impl ServerLine {
	pub fn classify(line: &str) -> Self {
		let text = strip_terminator(line).to_string();
		if text.starts_with('-') {
			ServerLine::Error(text)
		} else if text.starts_with(SEND_ACK) {
			ServerLine::Accepted(text)
		} else {
			ServerLine::Info(text)
		}
	}

	pub fn is_terminal(&self) -> bool {
		!matches!(self, ServerLine::Info(_))
	}
}

pub fn strip_terminator(line: &str) -> &str {
	line.trim_end_matches(|c: char| c == '\r' || c == '\n')
}

/// Read one line from the server. `Ok(None)` means end of stream.
///
/// A final line without terminator is still returned. Lines longer than
/// [`MAX_LINE_LEN`] are rejected instead of buffered.
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, ClientError> {
	let mut buffer = Vec::new();
	let read = reader
		.by_ref()
		.take(MAX_LINE_LEN as u64 + 1)
		.read_until(b'\n', &mut buffer)
		.map_err(|e| ClientError::from_io("reading from server", e))?;

	if read == 0 {
		return Ok(None);
	}

	if buffer.len() > MAX_LINE_LEN {
		return Err(ClientError::Protocol(format!(
			"server line exceeds {} bytes",
			MAX_LINE_LEN
		)));
	}

	let line = String::from_utf8_lossy(&buffer);
	Ok(Some(strip_terminator(&line).to_string()))
}
