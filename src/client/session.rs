use log::{debug, info};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Instant;

use crate::client::exchange::{send_commands, Exchange};
use crate::error::ClientError;
use crate::identity::LoginIdentity;
use crate::message::{check_line, Delivery, Message, Notification, Peer, ServerVersion};
use crate::protocol::{Command, Reply, Sign};

/// A session over a plain TCP connection
pub type TcpSession = Session<BufReader<TcpStream>, TcpStream>;

/// A logged in connection that stays open across commands.
///
/// `TITLE`, `BODY` and the reset commands get no reply when they succeed, so a
/// failure they cause shows up on the next call that waits for the server.
pub struct Session<R, W> {
	exchange: Exchange<R, W>,
	identity: LoginIdentity,
}

impl<R: BufRead, W: Write> Session<R, W> {
	/// Send `LOGIN` and wait for the welcome
	pub fn open(reader: R, writer: W, identity: &LoginIdentity) -> Result<Self, ClientError> {
		identity.validate()?;

		let mut exchange = Exchange::new(reader, writer);
		exchange.write_commands(&[Command::Login(identity.clone())])?;
		exchange.await_reply(|reply| reply.is(Sign::Success, "LOGIN").then_some(()))?;

		info!("Logged in as {}", identity);
		Ok(Session {
			exchange,
			identity: identity.clone(),
		})
	}

	pub fn identity(&self) -> &LoginIdentity {
		&self.identity
	}

	pub fn title(&mut self, title: &str) -> Result<(), ClientError> {
		check_line("title", title)?;
		self.exchange.write_commands(&[Command::Title(title.to_string())])
	}

	pub fn body_line(&mut self, line: &str) -> Result<(), ClientError> {
		check_line("body line", line)?;
		self.exchange.write_commands(&[Command::Body(line.to_string())])
	}

	/// Forget the body lines sent since the last `SEND`, keep the title
	pub fn reset_body(&mut self) -> Result<(), ClientError> {
		self.exchange.write_commands(&[Command::BodyReset])
	}

	/// Forget everything sent since the last `SEND`
	pub fn reset(&mut self) -> Result<(), ClientError> {
		self.exchange.write_commands(&[Command::Reset])
	}

	/// Broadcast what has been staged with [`title`](Self::title) and
	/// [`body_line`](Self::body_line)
	pub fn send(&mut self) -> Result<Delivery, ClientError> {
		let started = Instant::now();
		self.exchange.write_commands(&[Command::Send])?;
		self.exchange.await_acknowledgement(started)
	}

	/// Stage and send a whole message. Anything staged before is dropped.
	pub fn send_message(&mut self, message: &Message) -> Result<Delivery, ClientError> {
		message.validate()?;

		let started = Instant::now();
		let mut commands = vec![Command::Reset];
		// Skip the LOGIN a one-shot send starts with
		commands.extend(send_commands(&self.identity, message).into_iter().skip(1));
		self.exchange.write_commands(&commands)?;
		self.exchange.await_acknowledgement(started)
	}

	/// Switch consume mode on or off. While on, the server interleaves
	/// `$` events with replies; this session skips them.
	pub fn set_consume(&mut self, on: bool) -> Result<(), ClientError> {
		let command = if on { Command::Consume } else { Command::ConsumeOff };
		self.exchange.write_commands(&[command])?;
		self.exchange
			.await_reply(|reply| reply.is(Sign::Success, "CONSUME").then_some(()))
	}

	pub fn version(&mut self) -> Result<ServerVersion, ClientError> {
		self.exchange.write_commands(&[Command::Version])?;
		self.exchange.await_reply(|reply| {
			if !reply.is(Sign::Success, "VERSION") {
				return None;
			}
			let mut arguments = reply.arguments.into_iter();
			Some(ServerVersion {
				name: arguments.next().unwrap_or_default(),
				version: arguments.next().unwrap_or_default(),
			})
		})
	}

	/// Clients connected to the server, this one included
	pub fn who(&mut self) -> Result<Vec<Peer>, ClientError> {
		self.exchange.write_commands(&[Command::Who])?;

		let mut peers = Vec::new();
		self.exchange.await_reply(|reply| {
			if !reply.is(Sign::Success, "WHO") {
				return None;
			}
			let end = reply.arguments.len() == 1 && reply.arguments[0] == "END";
			if end && reply.trailing.is_none() {
				return Some(());
			}
			let mut arguments = reply.arguments.into_iter();
			let login = arguments.next()?;
			peers.push(Peer {
				login,
				consuming: arguments.any(|flag| flag.eq_ignore_ascii_case("CONSUME")),
				address: reply.trailing,
			});
			None
		})?;

		Ok(peers)
	}

	/// Notifications the server has stored, oldest first.
	///
	/// `HISTORY` has no end marker, so a `VERSION` is sent right behind it and
	/// its reply closes the listing.
	pub fn history(&mut self) -> Result<Vec<Notification>, ClientError> {
		self.exchange.write_commands(&[Command::History, Command::Version])?;

		let mut collector = HistoryCollector::default();
		let result = self.exchange.await_reply(|reply| {
			if reply.is(Sign::Success, "VERSION") {
				return Some(());
			}
			collector.feed(reply);
			None
		});

		match result {
			Ok(()) => Ok(collector.finish()),
			Err(ClientError::Server(line)) => {
				// Consume the VERSION reply so the next call starts clean
				self.exchange
					.await_reply(|reply| reply.is(Sign::Success, "VERSION").then_some(()))?;
				Err(ClientError::Server(line))
			}
			Err(e) => Err(e),
		}
	}

	/// Send `QUIT`. The server closes the connection.
	pub fn quit(mut self) -> Result<(), ClientError> {
		debug!("Leaving session of {}", self.identity);
		self.exchange.write_commands(&[Command::Quit])
	}

	pub fn into_inner(self) -> (R, W) {
		self.exchange.into_inner()
	}
}

/// Groups `+HISTORY` lines into notifications
#[derive(Debug, Default)]
pub(crate) struct HistoryCollector {
	entries: Vec<Notification>,
}

impl HistoryCollector {
	pub(crate) fn feed(&mut self, reply: Reply) {
		if !reply.is(Sign::Success, "HISTORY") {
			debug!("Ignoring reply {} while reading history", reply.command);
			return;
		}

		let first = match reply.arguments.first() {
			Some(first) => first.as_str(),
			None => return,
		};

		if let Ok(id) = first.parse::<u64>() {
			self.entries.push(Notification {
				id: Some(id),
				user: reply.arguments.get(1).cloned(),
				timestamp: reply.trailing,
				..Notification::default()
			});
			return;
		}

		let current = match self.entries.last_mut() {
			Some(current) => current,
			None => {
				debug!("History field {} before any entry", first);
				return;
			}
		};

		match first {
			"TITLE" => current.title = reply.trailing,
			"TAGS" => {
				current.tags = reply
					.trailing
					.unwrap_or_default()
					.split_whitespace()
					.map(String::from)
					.collect()
			}
			"BODY" => current.body.push(reply.trailing.unwrap_or_default()),
			other => debug!("Ignoring history field {}", other),
		}
	}

	pub(crate) fn finish(self) -> Vec<Notification> {
		self.entries
	}
}
