#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use notification_client::{ClientConfig, LoginIdentity};

/// What the scripted server does on each connection
#[derive(Clone)]
pub struct Script {
	/// Each step reads that many lines, then writes the raw replies
	pub steps: Vec<(usize, String)>,
	/// Keep reading until the client closes instead of hanging up
	pub hold_open: bool,
}

impl Script {
	pub fn reply(expect_lines: usize, replies: &str) -> Self {
		Script {
			steps: vec![(expect_lines, replies.to_string())],
			hold_open: false,
		}
	}

	/// Another round once the previous replies are written
	pub fn then(mut self, expect_lines: usize, replies: &str) -> Self {
		self.steps.push((expect_lines, replies.to_string()));
		self
	}

	pub fn hold_open(mut self) -> Self {
		self.hold_open = true;
		self
	}
}

/// What the server saw on one connection
#[derive(Debug)]
pub struct Session {
	pub lines: Vec<String>,
	pub client_closed: bool,
}

/// A notificationd stand-in that plays the same script to `connections` clients in turn
pub struct ScriptedServer {
	pub port: u16,
	handle: JoinHandle<Vec<Session>>,
}

impl ScriptedServer {
	pub fn start(script: Script) -> Self {
		Self::start_many(script, 1)
	}

	pub fn start_many(script: Script, connections: usize) -> Self {
		let listener = TcpListener::bind("127.0.0.1:0").expect("bind scripted server");
		let port = listener.local_addr().expect("local addr").port();

		let handle = thread::spawn(move || {
			(0..connections)
				.map(|_| {
					let (stream, _) = listener.accept().expect("accept");
					play(stream, &script)
				})
				.collect()
		});

		ScriptedServer { port, handle }
	}

	pub fn config(&self) -> ClientConfig {
		ClientConfig::new("127.0.0.1", self.port).with_timeout(Duration::from_secs(2))
	}

	pub fn sessions(self) -> Vec<Session> {
		self.handle.join().expect("scripted server panicked")
	}
}

fn play(stream: TcpStream, script: &Script) -> Session {
	stream
		.set_read_timeout(Some(Duration::from_secs(5)))
		.expect("server read timeout");
	let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
	let mut writer = stream;

	let mut lines = Vec::new();
	for (expect_lines, replies) in &script.steps {
		for _ in 0..*expect_lines {
			match read(&mut reader) {
				Some(line) => lines.push(line),
				None => {
					return Session {
						lines,
						client_closed: true,
					}
				}
			}
		}

		writer.write_all(replies.as_bytes()).expect("write replies");
		writer.flush().expect("flush replies");
	}

	let mut client_closed = false;
	if script.hold_open {
		loop {
			let mut line = String::new();
			match reader.read_line(&mut line) {
				Ok(0) => {
					client_closed = true;
					break;
				}
				Ok(_) => lines.push(line.trim_end().to_string()),
				Err(_) => break,
			}
		}
	}

	Session {
		lines,
		client_closed,
	}
}

fn read(reader: &mut BufReader<TcpStream>) -> Option<String> {
	let mut line = String::new();
	match reader.read_line(&mut line) {
		Ok(0) | Err(_) => None,
		Ok(_) => Some(line.trim_end_matches('\n').to_string()),
	}
}

pub fn identity() -> LoginIdentity {
	LoginIdentity::new("tester", "ci-host").expect("valid identity")
}
