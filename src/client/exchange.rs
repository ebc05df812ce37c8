use std::io::{BufRead, Write};
use std::time::Instant;

use chrono::Local;
use log::{debug, info, warn};

use crate::error::ClientError;
use crate::identity::LoginIdentity;
use crate::message::{Delivery, Message};
use crate::protocol::{self, Command, Reply, ServerLine, Sign};

/// One send exchange over any line transport
pub struct Exchange<R, W> {
	reader: R,
	writer: W,
}

/// The command sequence for a send, in wire order
pub fn send_commands(identity: &LoginIdentity, message: &Message) -> Vec<Command> {
	let mut commands = Vec::with_capacity(message.body.len() + 3);
	commands.push(Command::Login(identity.clone()));
	commands.push(Command::Title(message.title.clone()));
	commands.extend(message.body.iter().cloned().map(Command::Body));
	commands.push(Command::Send);
	commands
}

impl<R: BufRead, W: Write> Exchange<R, W> {
	pub fn new(reader: R, writer: W) -> Self {
		Exchange { reader, writer }
	}

	/// Log in, transmit `message` and wait for the server's verdict
	pub fn send(
		&mut self,
		identity: &LoginIdentity,
		message: &Message,
	) -> Result<Delivery, ClientError> {
		identity.validate()?;
		message.validate()?;

		let started = Instant::now();
		self.write_commands(&send_commands(identity, message))?;
		self.await_acknowledgement(started)
	}

	/// Write all commands in one go and flush
	pub fn write_commands(&mut self, commands: &[Command]) -> Result<(), ClientError> {
		let mut payload = String::new();
		for command in commands {
			debug!("> {}", command);
			payload.push_str(&command.to_line());
		}

		self.writer
			.write_all(payload.as_bytes())
			.and_then(|_| self.writer.flush())
			.map_err(|e| ClientError::from_io("writing to server", e))
	}

	/// Read until `+SEND` or a `-` line. Everything else is informational.
	pub fn await_acknowledgement(&mut self, started: Instant) -> Result<Delivery, ClientError> {
		let mut info = Vec::new();

		while let Some(line) = protocol::read_line(&mut self.reader)? {
			debug!("< {}", line);

			match ServerLine::classify(&line) {
				ServerLine::Error(text) => return Err(ClientError::Server(text)),
				ServerLine::Accepted(text) => {
					let recipients = text
						.parse::<Reply>()
						.ok()
						.and_then(|reply| reply.arguments.into_iter().next())
						.and_then(|n| n.parse::<u32>().ok());

					let delivery = Delivery {
						recipients,
						info,
						accepted_at: Local::now(),
						elapsed: started.elapsed(),
					};
					info!(
						"Notification accepted after {:?} ({} recipient(s))",
						delivery.elapsed,
						delivery.recipients.map_or("unknown".to_string(), |n| n.to_string())
					);
					return Ok(delivery);
				}
				ServerLine::Info(text) => info.push(text),
			}
		}

		Err(ClientError::UnexpectedClose)
	}

	/// Read replies until `handle` returns a value.
	///
	/// A `-` line ends the wait with [`ClientError::Server`]. Events and lines
	/// that do not parse are skipped.
	pub fn await_reply<T, F>(&mut self, mut handle: F) -> Result<T, ClientError>
	where
		F: FnMut(Reply) -> Option<T>,
	{
		while let Some(line) = protocol::read_line(&mut self.reader)? {
			debug!("< {}", line);

			let reply = match line.parse::<Reply>() {
				Ok(reply) => reply,
				Err(_) => {
					warn!("Skipping unparsable line {:?}", line);
					continue;
				}
			};

			match reply.sign {
				Some(Sign::Failure) => return Err(ClientError::Server(line)),
				Some(Sign::Event) => continue,
				_ => {}
			}

			if let Some(value) = handle(reply) {
				return Ok(value);
			}
		}

		Err(ClientError::UnexpectedClose)
	}

	pub fn into_inner(self) -> (R, W) {
		(self.reader, self.writer)
	}
}
