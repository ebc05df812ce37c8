use std::env;
use std::process;

use notification_client::{ClientConfig, ClientError, Message, NotificationClient, SystemIdentity};

fn main() {
	env_logger::init();

	let host = env::var("HOST").unwrap_or_else(|_| "localhost".to_string());
	let client = NotificationClient::new(ClientConfig::new(&host, 6606));

	let message = Message::new("Rust notificationd client test");

	match client.send(&SystemIdentity, &message) {
		Ok(_) => {}
		Err(ClientError::Server(line)) => {
			eprintln!("Error {}", line);
			process::exit(1);
		}
		Err(ClientError::UnexpectedClose) => {
			eprintln!("Connection closed unexpectedly");
			process::exit(2);
		}
		Err(e) => {
			eprintln!("{}", e);
			process::exit(3);
		}
	}
}
