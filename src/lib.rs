// Export modules
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod message;
pub mod protocol;

// Re-export main types
pub use client::{Exchange, NotificationClient, Session, Subscription, TcpSession};
pub use config::{ClientConfig, Endpoint};
pub use error::ClientError;
pub use identity::{IdentityProvider, LoginIdentity, SystemIdentity};
pub use message::{Delivery, Message, Notification, Peer, ServerVersion};
