pub mod config;
pub mod config_loader;
pub mod resolver;
pub mod traits;
pub mod types;

pub use config::{AppConfig, BrokerConfig, RelayConfig, ServerConfig};
pub use config_loader::ConfigLoader;
pub use resolver::{resolve_intent, size_lot, Resolution};
pub use traits::BrokerSession;
pub use types::{
    BrokerError, ComputedOrder, DealId, Direction, InvertFlag, LotSpec, SignalAction, SignalError,
    SignalPayload, StrategyId,
};
