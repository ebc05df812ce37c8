use std::fmt;
use std::io;

use log::debug;
use nix::unistd::{self, Uid, User};

use crate::error::ClientError;

/// The `user@host` pair a client logs in as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginIdentity {
	pub user: String,
	pub host: String,
}

impl LoginIdentity {
	pub fn new(user: &str, host: &str) -> Result<Self, ClientError> {
		let identity = LoginIdentity {
			user: user.to_string(),
			host: host.to_string(),
		};
		identity.validate()?;
		Ok(identity)
	}

	/// Both parts end up as a single space separated argument of `LOGIN`
	pub fn validate(&self) -> Result<(), ClientError> {
		check_part("user", &self.user)?;
		check_part("host", &self.host)?;
		if self.user.contains('@') {
			return Err(ClientError::InvalidInput(format!(
				"user {:?} must not contain '@'",
				self.user
			)));
		}
		Ok(())
	}
}

fn check_part(name: &str, value: &str) -> Result<(), ClientError> {
	if value.is_empty() {
		return Err(ClientError::InvalidInput(format!("{} must not be empty", name)));
	}
	if value.chars().any(char::is_whitespace) {
		return Err(ClientError::InvalidInput(format!(
			"{} {:?} must not contain whitespace",
			name, value
		)));
	}
	// The server reads everything after ':' as trailing text
	if value.contains(':') {
		return Err(ClientError::InvalidInput(format!(
			"{} {:?} must not contain ':'",
			name, value
		)));
	}
	Ok(())
}

impl fmt::Display for LoginIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}@{}", self.user, self.host)
	}
}

/// Supplies the identity used for `LOGIN`
pub trait IdentityProvider {
	fn identity(&self) -> Result<LoginIdentity, ClientError>;
}

impl IdentityProvider for LoginIdentity {
	fn identity(&self) -> Result<LoginIdentity, ClientError> {
		self.validate()?;
		Ok(self.clone())
	}
}

/// Derives the identity from the running process: the account name of the
/// real uid and the kernel hostname.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemIdentity;

impl SystemIdentity {
	fn user() -> String {
		let uid = unistd::getuid();
		let name = match User::from_uid(uid) {
			Ok(user) => user.map(|u| u.name),
			Err(e) => {
				debug!("Looking up uid {} failed: {}", uid, e);
				None
			}
		};
		account_name(name, uid)
	}

	fn hostname() -> Result<String, ClientError> {
		let hostname = unistd::gethostname().map_err(io::Error::from)?;
		Ok(hostname.to_string_lossy().into_owned())
	}
}

// Accounts missing from the user database log in by numeric uid
fn account_name(name: Option<String>, uid: Uid) -> String {
	name.unwrap_or_else(|| uid.to_string())
}

impl IdentityProvider for SystemIdentity {
	fn identity(&self) -> Result<LoginIdentity, ClientError> {
		LoginIdentity::new(&Self::user(), &Self::hostname()?)
	}
}
