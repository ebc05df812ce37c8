mod support;

use std::net::TcpListener;
use std::time::{Duration, Instant};

use notification_client::{ClientConfig, ClientError, Message, NotificationClient};
use support::{identity, Script, ScriptedServer};

#[test]
fn sends_login_title_send_in_order() {
	let server = ScriptedServer::start(Script::reply(3, "+LOGIN : Welcome tester@ci-host\r\n+SEND 0\r\n"));
	let client = NotificationClient::new(server.config());

	let delivery = client
		.send(&identity(), &Message::new("Ruby notificationd client test"))
		.expect("accepted");
	assert_eq!(delivery.recipients, Some(0));
	assert_eq!(delivery.info, vec!["+LOGIN : Welcome tester@ci-host"]);

	let sessions = server.sessions();
	assert_eq!(
		sessions[0].lines,
		vec![
			"LOGIN tester@ci-host",
			"TITLE: Ruby notificationd client test",
			"SEND"
		]
	);
}

#[test]
fn sends_body_lines() {
	let server = ScriptedServer::start(Script::reply(5, "+SEND 2\n"));
	let client = NotificationClient::new(server.config());

	let message = Message::new("Deploy").with_body(["api: ok", "web: ok"]);
	let delivery = client.send(&identity(), &message).expect("accepted");
	assert_eq!(delivery.recipients, Some(2));

	let sessions = server.sessions();
	assert_eq!(&sessions[0].lines[2..], ["BODY: api: ok", "BODY: web: ok", "SEND"]);
}

#[test]
fn server_error_is_reported() {
	let server = ScriptedServer::start(Script::reply(
		3,
		"-LOGIN ALREADY_LOGGED_IN : You are already logged in as x. Please reconnect.\r\n+SEND 1\r\n",
	));
	let client = NotificationClient::new(server.config());

	match client.send(&identity(), &Message::new("t")) {
		Err(ClientError::Server(line)) => assert!(line.starts_with("-LOGIN ALREADY_LOGGED_IN")),
		other => panic!("expected server error, got {:?}", other),
	}
	server.sessions();
}

#[test]
fn close_before_acknowledgement() {
	let server = ScriptedServer::start(Script::reply(3, "+LOGIN : Welcome\r\n"));
	let client = NotificationClient::new(server.config());

	let result = client.send(&identity(), &Message::new("t"));
	assert!(matches!(result, Err(ClientError::UnexpectedClose)));
	server.sessions();
}

#[test]
fn silent_server_times_out_and_connection_is_closed() {
	let server = ScriptedServer::start(Script::reply(3, "").hold_open());
	let mut config = server.config();
	config.read_timeout = Duration::from_millis(300);
	let client = NotificationClient::new(config);

	let started = Instant::now();
	let result = client.send(&identity(), &Message::new("t"));
	assert!(matches!(result, Err(ClientError::Timeout { .. })), "got {:?}", result);
	assert!(started.elapsed() < Duration::from_secs(4));

	let sessions = server.sessions();
	assert!(sessions[0].client_closed);
	assert_eq!(sessions[0].lines.len(), 3);
}

#[test]
fn refused_connection() {
	let port = {
		let listener = TcpListener::bind("127.0.0.1:0").unwrap();
		listener.local_addr().unwrap().port()
	};
	let client = NotificationClient::new(ClientConfig::new("127.0.0.1", port));

	let result = client.send(&identity(), &Message::new("t"));
	match result {
		Err(ClientError::Connection { endpoint, .. }) => assert_eq!(endpoint.port, port),
		other => panic!("expected connection error, got {:?}", other),
	}
}

#[test]
fn repeated_exchange_gives_same_result() {
	let server = ScriptedServer::start_many(Script::reply(3, "+LOGIN : Welcome\r\n+SEND 1\r\n"), 2);
	let client = NotificationClient::new(server.config());
	let message = Message::new("twice");

	let first = client.send(&identity(), &message).expect("first accepted");
	let second = client.send(&identity(), &message).expect("second accepted");
	assert_eq!(first.recipients, second.recipients);
	assert_eq!(first.info, second.info);

	let sessions = server.sessions();
	assert_eq!(sessions[0].lines, sessions[1].lines);
}

#[test]
fn invalid_input_never_connects() {
	// Nothing listens here; validation must fail first
	let client = NotificationClient::new(ClientConfig::new("127.0.0.1", 9));
	let result = client.send(&identity(), &Message::new("bad\ntitle"));
	assert!(matches!(result, Err(ClientError::InvalidInput(_))));
}
