use log::{error, info, warn};
use notification_client::{ClientError, NotificationClient, SystemIdentity};
use std::env;
use std::process;

fn main() {
	env_logger::init();

	let args: Vec<String> = env::args().collect();
	if args.len() > 1 {
		println!("Usage: {}", args[0]);
		println!("  Prints every notification broadcast by the server until it disconnects.");
		println!("  Uses the same NOTIFICATIOND_* environment as notificationd-send.");
		return;
	}

	let client = match NotificationClient::from_env() {
		Ok(client) => client,
		Err(e) => {
			error!("Failed to load configuration: {}", e);
			process::exit(3);
		}
	};

	let subscription = match client.subscribe(&SystemIdentity) {
		Ok(subscription) => subscription,
		Err(e) => {
			error!("Failed to subscribe: {}", e);
			process::exit(3);
		}
	};

	info!("Listening on {}", client.config().endpoint);

	for item in subscription {
		match item {
			Ok(notification) => {
				println!(
					"[{}] {}: {}",
					notification.id.map_or("?".to_string(), |id| id.to_string()),
					notification.user.as_deref().unwrap_or("notificationd"),
					notification.title.as_deref().unwrap_or("")
				);
				if !notification.tags.is_empty() {
					println!("  tags: {}", notification.tags.join(" "));
				}
				for line in &notification.body {
					println!("  {}", line);
				}
			}
			Err(ClientError::Server(line)) => warn!("Server error: {}", line),
			Err(e) => {
				error!("Subscription ended: {}", e);
				process::exit(2);
			}
		}
	}
}
