pub mod client;
pub mod connect;
pub mod session;

pub use client::{TradeLockerClient, DEMO_API_URL, LIVE_API_URL};
pub use connect::{connect_with_retry, Credentials, ConnectError, RetryPolicy};
pub use session::TradeLockerSession;
