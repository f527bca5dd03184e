pub mod handlers;
pub mod server;

pub use handlers::{SignalAck, StrategyContext};
pub use server::RelayServer;
