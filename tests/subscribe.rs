mod support;

use std::time::Duration;

use notification_client::{ClientError, NotificationClient};
use support::{identity, Script, ScriptedServer};

const HANDSHAKE: &str = "+LOGIN : Welcome tester@ci-host\r\n+CONSUME on\r\n";

#[test]
fn yields_broadcast_notifications() {
	let replies = format!(
		"{}$NOTIFY_START alice@box 4\r\n$TITLE: Disk almost full\r\n$TAGS: disk warn\r\n$BODY: /var at 93%\r\n$NOTIFY_END 4\r\n$NOTIFY_START bob@box 5\r\n$NOTIFY_END 5\r\n",
		HANDSHAKE
	);
	let server = ScriptedServer::start(Script::reply(2, &replies));
	let client = NotificationClient::new(server.config());

	let notifications: Vec<_> = client
		.subscribe(&identity())
		.expect("subscribed")
		.collect::<Result<_, _>>()
		.expect("clean stream");

	assert_eq!(notifications.len(), 2);
	assert_eq!(notifications[0].id, Some(4));
	assert_eq!(notifications[0].user.as_deref(), Some("alice@box"));
	assert_eq!(notifications[0].title.as_deref(), Some("Disk almost full"));
	assert_eq!(notifications[0].tags, vec!["disk", "warn"]);
	assert_eq!(notifications[0].body_text(), "/var at 93%");
	assert_eq!(notifications[1].user.as_deref(), Some("bob@box"));

	let sessions = server.sessions();
	assert_eq!(sessions[0].lines, vec!["LOGIN tester@ci-host", "CONSUME"]);
}

#[test]
fn close_inside_a_notification() {
	let replies = format!("{}$NOTIFY_START alice@box 9\r\n$TITLE: cut\r\n", HANDSHAKE);
	let server = ScriptedServer::start(Script::reply(2, &replies));
	let client = NotificationClient::new(server.config());

	let mut subscription = client.subscribe(&identity()).expect("subscribed");
	assert!(matches!(subscription.next(), Some(Err(ClientError::UnexpectedClose))));
	assert!(subscription.next().is_none());
	server.sessions();
}

#[test]
fn rejected_consume() {
	let server = ScriptedServer::start(Script::reply(
		2,
		"-LOGIN MISSING_ARG\r\n",
	));
	let client = NotificationClient::new(server.config());

	match client.subscribe(&identity()) {
		Err(ClientError::Server(line)) => assert_eq!(line, "-LOGIN MISSING_ARG"),
		Err(e) => panic!("unexpected error {}", e),
		Ok(_) => panic!("subscription should have been rejected"),
	}
	server.sessions();
}

#[test]
fn close_sends_quit() {
	let server = ScriptedServer::start(Script::reply(2, HANDSHAKE).hold_open());
	let client = NotificationClient::new(server.config());

	let subscription = client.subscribe(&identity()).expect("subscribed");
	subscription.close().expect("quit written");

	let sessions = server.sessions();
	assert_eq!(sessions[0].lines, vec!["LOGIN tester@ci-host", "CONSUME", "QUIT"]);
	assert!(sessions[0].client_closed);
}

#[test]
fn idle_subscription_times_out() {
	let server = ScriptedServer::start(Script::reply(2, HANDSHAKE).hold_open());
	let config = server.config().with_idle_timeout(Some(Duration::from_millis(300)));
	let client = NotificationClient::new(config);

	let mut subscription = client.subscribe(&identity()).expect("subscribed");
	assert!(matches!(subscription.next(), Some(Err(ClientError::Timeout { .. }))));
	assert!(subscription.next().is_none());
	drop(subscription);

	let sessions = server.sessions();
	assert!(sessions[0].client_closed);
}
