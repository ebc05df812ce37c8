use log::{debug, info, warn};
use std::io::{BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::error::ClientError;
use crate::identity::LoginIdentity;
use crate::message::Notification;
use crate::protocol::{self, Command, Reply, Sign};

/// A connection in consume mode. Iterating yields the notifications the
/// server broadcasts until it closes the connection.
pub struct Subscription {
	reader: BufReader<TcpStream>,
	assembler: EventAssembler,
	finished: bool,
}

impl Subscription {
	/// Log in on `stream`, enable consume mode and wait for the server to confirm it
	pub(crate) fn start(
		stream: TcpStream,
		identity: &LoginIdentity,
		idle_timeout: Option<Duration>,
	) -> Result<Self, ClientError> {
		let mut subscription = Subscription {
			reader: BufReader::new(stream),
			assembler: EventAssembler::default(),
			finished: false,
		};

		subscription.write(&[Command::Login(identity.clone()), Command::Consume])?;
		subscription.await_consume()?;

		subscription.reader.get_ref().set_read_timeout(idle_timeout)?;
		info!("Consuming notifications as {}", identity);
		Ok(subscription)
	}

	fn write(&mut self, commands: &[Command]) -> Result<(), ClientError> {
		let payload: String = commands.iter().map(Command::to_line).collect();
		for command in commands {
			debug!("> {}", command);
		}

		let mut stream = self.reader.get_ref();
		stream
			.write_all(payload.as_bytes())
			.and_then(|_| stream.flush())
			.map_err(|e| ClientError::from_io("writing to server", e))
	}

	fn await_consume(&mut self) -> Result<(), ClientError> {
		loop {
			let line = protocol::read_line(&mut self.reader)?.ok_or(ClientError::UnexpectedClose)?;
			debug!("< {}", line);

			if line.starts_with('-') {
				return Err(ClientError::Server(line));
			}

			match line.parse::<Reply>() {
				Ok(reply) if reply.is(Sign::Success, "CONSUME") => return Ok(()),
				Ok(_) => {}
				Err(_) => warn!("Skipping unparsable line {:?}", line),
			}
		}
	}

	/// Tell the server we are leaving and close the connection
	pub fn close(mut self) -> Result<(), ClientError> {
		self.finished = true;
		self.write(&[Command::Quit])
	}
}

impl Iterator for Subscription {
	type Item = Result<Notification, ClientError>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.finished {
			return None;
		}

		loop {
			let line = match protocol::read_line(&mut self.reader) {
				Ok(Some(line)) => line,
				Ok(None) => {
					self.finished = true;
					if self.assembler.in_progress() {
						return Some(Err(ClientError::UnexpectedClose));
					}
					info!("Server closed the subscription");
					return None;
				}
				Err(e) => {
					self.finished = true;
					return Some(Err(e));
				}
			};
			debug!("< {}", line);

			if line.starts_with('-') {
				return Some(Err(ClientError::Server(line)));
			}

			match line.parse::<Reply>() {
				Ok(reply) => {
					if let Some(notification) = self.assembler.feed(reply) {
						return Some(Ok(notification));
					}
				}
				Err(_) => warn!("Skipping unparsable line {:?}", line),
			}
		}
	}
}

/// Collects `$NOTIFY_START` .. `$NOTIFY_END` event blocks
#[derive(Debug, Default)]
pub(crate) struct EventAssembler {
	current: Option<Notification>,
}

impl EventAssembler {
	pub(crate) fn in_progress(&self) -> bool {
		self.current.is_some()
	}

	pub(crate) fn feed(&mut self, reply: Reply) -> Option<Notification> {
		if reply.sign != Some(Sign::Event) {
			debug!("Ignoring reply {}", reply.command);
			return None;
		}

		match reply.command_upper().as_str() {
			"NOTIFY_START" => {
				if self.current.is_some() {
					warn!("Notification started before the previous one ended, dropping it");
				}
				self.current = Some(Notification {
					user: reply.arguments.first().cloned(),
					id: reply.arguments.get(1).and_then(|id| id.parse().ok()),
					..Notification::default()
				});
				None
			}
			"TITLE" => {
				if let Some(current) = &mut self.current {
					current.title = reply.trailing;
				}
				None
			}
			"TAGS" => {
				if let Some(current) = &mut self.current {
					current.tags = reply
						.trailing
						.unwrap_or_default()
						.split_whitespace()
						.map(String::from)
						.collect();
				}
				None
			}
			"BODY" => {
				if let Some(current) = &mut self.current {
					current.body.push(reply.trailing.unwrap_or_default());
				}
				None
			}
			"NOTIFY_END" => {
				let notification = self.current.take()?;
				let end_id = reply.arguments.first().and_then(|id| id.parse::<u64>().ok());
				if end_id.is_some() && end_id != notification.id {
					warn!(
						"Notification {:?} ended with id {:?}",
						notification.id, end_id
					);
				}
				Some(notification)
			}
			other => {
				debug!("Ignoring event {}", other);
				None
			}
		}
	}
}
