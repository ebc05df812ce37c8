use log::{debug, info};
use std::io::{self, BufReader, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Instant;

use crate::client::exchange::Exchange;
use crate::client::session::{Session, TcpSession};
use crate::client::subscription::Subscription;
use crate::config::{ClientConfig, Endpoint};
use crate::error::ClientError;
use crate::identity::IdentityProvider;
use crate::message::{Delivery, Message, Notification, Peer, ServerVersion};

/// Blocking notificationd client. Every operation opens its own connection.
#[derive(Debug, Clone)]
pub struct NotificationClient {
	config: ClientConfig,
}

impl NotificationClient {
	/// Create a new client
	pub fn new(config: ClientConfig) -> Self {
		NotificationClient { config }
	}

	/// Create a client from the config file and environment
	pub fn from_env() -> Result<Self, ClientError> {
		Ok(Self::new(ClientConfig::load()?))
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Send one notification and wait for the server to accept it.
	///
	/// The connection is closed when this returns, whatever the outcome.
	pub fn send<P>(&self, identity: &P, message: &Message) -> Result<Delivery, ClientError>
	where
		P: IdentityProvider + ?Sized,
	{
		let identity = identity.identity()?;
		message.validate()?;

		let started = Instant::now();
		let stream = self.connect()?;

		let mut exchange = Exchange::new(BufReader::new(&stream), &stream);
		let result = exchange.send(&identity, message);

		debug!(
			"Exchange with {} finished after {:?}",
			self.config.endpoint,
			started.elapsed()
		);
		result
	}

	/// Log in and switch the connection to consume mode
	pub fn subscribe<P>(&self, identity: &P) -> Result<Subscription, ClientError>
	where
		P: IdentityProvider + ?Sized,
	{
		let identity = identity.identity()?;
		let stream = self.connect()?;
		Subscription::start(stream, &identity, self.config.idle_timeout)
	}

	/// Log in and keep the connection open for further commands
	pub fn open<P>(&self, identity: &P) -> Result<TcpSession, ClientError>
	where
		P: IdentityProvider + ?Sized,
	{
		let identity = identity.identity()?;
		let stream = self.connect()?;
		let writer = stream.try_clone()?;
		Session::open(BufReader::new(stream), writer, &identity)
	}

	pub fn version<P>(&self, identity: &P) -> Result<ServerVersion, ClientError>
	where
		P: IdentityProvider + ?Sized,
	{
		self.with_session(identity, TcpSession::version)
	}

	/// Clients currently connected to the server
	pub fn who<P>(&self, identity: &P) -> Result<Vec<Peer>, ClientError>
	where
		P: IdentityProvider + ?Sized,
	{
		self.with_session(identity, TcpSession::who)
	}

	/// Notifications stored by the server
	pub fn history<P>(&self, identity: &P) -> Result<Vec<Notification>, ClientError>
	where
		P: IdentityProvider + ?Sized,
	{
		self.with_session(identity, TcpSession::history)
	}

	fn with_session<P, T, F>(&self, identity: &P, query: F) -> Result<T, ClientError>
	where
		P: IdentityProvider + ?Sized,
		F: FnOnce(&mut TcpSession) -> Result<T, ClientError>,
	{
		let mut session = self.open(identity)?;
		let result = query(&mut session)?;
		if let Err(e) = session.quit() {
			debug!("Failed to say goodbye to {}: {}", self.config.endpoint, e);
		}
		Ok(result)
	}

	/// Open a stream to the configured endpoint with all timeouts applied
	pub(crate) fn connect(&self) -> Result<TcpStream, ClientError> {
		let endpoint = &self.config.endpoint;

		let addrs = (endpoint.host.as_str(), endpoint.port)
			.to_socket_addrs()
			.map_err(|e| ClientError::Connection {
				endpoint: endpoint.clone(),
				source: e,
			})?;

		let mut last_error = None;
		for addr in addrs {
			match TcpStream::connect_timeout(&addr, self.config.connect_timeout) {
				Ok(stream) => {
					stream.set_read_timeout(Some(self.config.read_timeout))?;
					stream.set_write_timeout(Some(self.config.write_timeout))?;
					if let Err(e) = stream.set_nodelay(true) {
						debug!("Failed to set TCP_NODELAY: {}", e);
					}

					info!("Connected to notificationd at {} ({})", endpoint, addr);
					return Ok(stream);
				}
				Err(e) => {
					debug!("Connecting to {} failed: {}", addr, e);
					last_error = Some(e);
				}
			}
		}

		Err(connect_failure(endpoint, last_error))
	}
}

/// The error for a connect that never succeeded, from the last attempt's error
fn connect_failure(endpoint: &Endpoint, last_error: Option<io::Error>) -> ClientError {
	match last_error {
		Some(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
			ClientError::Timeout {
				operation: "connecting",
			}
		}
		Some(e) => ClientError::Connection {
			endpoint: endpoint.clone(),
			source: e,
		},
		None => ClientError::Connection {
			endpoint: endpoint.clone(),
			source: io::Error::new(ErrorKind::NotFound, "host resolved to no addresses"),
		},
	}
}
