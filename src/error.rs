use std::io;

use crate::config::Endpoint;

/// Errors returned by the notificationd client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
	#[error("failed to connect to {endpoint}: {source}")]
	Connection {
		endpoint: Endpoint,
		#[source]
		source: io::Error,
	},

	/// The server answered with a `-` line. Carries that line.
	#[error("server error: {0}")]
	Server(String),

	#[error("connection closed unexpectedly")]
	UnexpectedClose,

	#[error("timed out while {operation}")]
	Timeout { operation: &'static str },

	#[error("protocol error: {0}")]
	Protocol(String),

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("configuration error: {0}")]
	Config(String),

	#[error(transparent)]
	Io(#[from] io::Error),
}

impl ClientError {
	/// Returns `true` when the error was caused by what the server sent back
	/// rather than by the transport or local input.
	pub fn is_terminal_reply(&self) -> bool {
		matches!(self, Self::Server(_) | Self::UnexpectedClose)
	}

	/// Map an I/O error raised while `operation` was in progress. Socket
	/// timeouts surface as `WouldBlock` on unix and `TimedOut` on windows.
	pub(crate) fn from_io(operation: &'static str, err: io::Error) -> Self {
		match err.kind() {
			io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout { operation },
			io::ErrorKind::UnexpectedEof => Self::UnexpectedClose,
			_ => Self::Io(err),
		}
	}
}
