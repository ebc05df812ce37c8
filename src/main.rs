use log::{error, info};
use notification_client::{ClientError, Message, NotificationClient, SystemIdentity};
use std::env;
use std::process;

// Exit codes
const EXIT_SERVER_ERROR: i32 = 1;
const EXIT_UNEXPECTED_CLOSE: i32 = 2;
const EXIT_FAILURE: i32 = 3;

fn main() {
	env_logger::init();

	// Parse command line arguments
	let args: Vec<String> = env::args().collect();
	let program = args.first().map(String::as_str).unwrap_or("notificationd-send");

	if args.len() < 2 {
		eprintln!("Usage: {} <title> [body line]...", program);
		eprintln!("  title: Notification title");
		eprintln!("  body line: (Optional) Body lines, one argument per line");
		eprintln!("Environment:");
		eprintln!("  NOTIFICATIOND_HOST or HOST: Server host (default: localhost)");
		eprintln!("  NOTIFICATIOND_PORT: Server port (default: 6606)");
		eprintln!("  NOTIFICATIOND_TIMEOUT: Connect/read/write timeout in seconds (default: 5)");
		eprintln!("  NOTIFICATIOND_CONFIG: Path to a JSON config file");
		process::exit(EXIT_FAILURE);
	}

	let message = Message::new(&args[1]).with_body(args[2..].iter().cloned());

	let client = match NotificationClient::from_env() {
		Ok(client) => client,
		Err(e) => {
			error!("Failed to load configuration: {}", e);
			eprintln!("{}", e);
			process::exit(EXIT_FAILURE);
		}
	};

	match client.send(&SystemIdentity, &message) {
		Ok(delivery) => {
			info!(
				"Delivered {:?} to {} at {}",
				message.title,
				client.config().endpoint,
				delivery.accepted_at.format("%Y-%m-%d %H:%M:%S")
			);
		}
		Err(e) => process::exit(report(&e)),
	}
}

// Print the failure the way the protocol reports it and pick an exit code
fn report(err: &ClientError) -> i32 {
	error!("Send failed: {}", err);
	match err {
		ClientError::Server(line) => {
			eprintln!("Error {}", line);
			EXIT_SERVER_ERROR
		}
		ClientError::UnexpectedClose => {
			eprintln!("Connection closed unexpectedly");
			EXIT_UNEXPECTED_CLOSE
		}
		other => {
			eprintln!("{}", other);
			EXIT_FAILURE
		}
	}
}
