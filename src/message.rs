use std::time::Duration;

use chrono::{DateTime, Local};

use crate::error::ClientError;

/// A notification to send: a title and an optional body, one entry per line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
	pub title: String,
	pub body: Vec<String>,
}

impl Message {
	pub fn new(title: &str) -> Self {
		Message {
			title: title.to_string(),
			body: Vec::new(),
		}
	}

	pub fn with_body<I, S>(mut self, lines: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.body.extend(lines.into_iter().map(Into::into));
		self
	}

	pub fn push_line(&mut self, line: &str) {
		self.body.push(line.to_string());
	}

	/// Every field is sent as one protocol line
	pub fn validate(&self) -> Result<(), ClientError> {
		check_line("title", &self.title)?;
		for (index, line) in self.body.iter().enumerate() {
			check_line(&format!("body line {}", index + 1), line)?;
		}
		Ok(())
	}
}

pub(crate) fn check_line(name: &str, value: &str) -> Result<(), ClientError> {
	if value.contains(|c: char| c == '\r' || c == '\n') {
		return Err(ClientError::InvalidInput(format!(
			"{} must not contain line breaks",
			name
		)));
	}
	Ok(())
}

/// Receipt of an accepted send
#[derive(Debug, Clone)]
pub struct Delivery {
	/// Number of consumers the server broadcast to, when it reported one
	pub recipients: Option<u32>,
	/// Informational lines seen before the acknowledgement
	pub info: Vec<String>,
	pub accepted_at: DateTime<Local>,
	pub elapsed: Duration,
}

/// A notification pushed to a consuming client or read back from history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
	pub id: Option<u64>,
	pub user: Option<String>,
	/// Only history entries carry the time the server stored them
	pub timestamp: Option<String>,
	pub title: Option<String>,
	pub tags: Vec<String>,
	pub body: Vec<String>,
}

impl Notification {
	/// Body lines joined the way a desktop notification shows them
	pub fn body_text(&self) -> String {
		self.body.join("\n")
	}
}

/// Name and version the server reports for `VERSION`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVersion {
	pub name: String,
	pub version: String,
}

/// One connected client as listed by `WHO`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
	pub login: String,
	pub consuming: bool,
	pub address: Option<String>,
}
