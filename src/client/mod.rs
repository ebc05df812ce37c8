// Export client modules
pub mod client;
pub mod exchange;
pub mod session;
pub mod subscription;

// Re-export main types
pub use client::NotificationClient;
pub use exchange::Exchange;
pub use session::{Session, TcpSession};
pub use subscription::Subscription;
