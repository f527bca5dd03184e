pub mod balance;
pub mod close;
pub mod queue;
pub mod registry;

pub use balance::{run_balance_refresher, BalanceCache, BalanceSnapshot};
pub use close::close_all;
pub use queue::{spawn_open_worker, ExecutionHandle, OpenRequest};
pub use registry::{PositionKey, PositionRegistry};
