use crate::types::{BrokerError, ComputedOrder, DealId};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// An authenticated brokerage session. One session may be shared by all
/// strategies or held per-strategy; the relay only assumes the operations
/// below are safe to call concurrently.
#[async_trait]
pub trait BrokerSession: Send + Sync {
    /// Queries the current account balance.
    async fn balance(&self) -> Result<Decimal, BrokerError>;

    /// Submits a market open and returns the broker's deal identifier.
    async fn open_position(&self, order: &ComputedOrder) -> Result<DealId, BrokerError>;

    /// Closes one previously opened deal.
    async fn close_position(&self, deal: &DealId) -> Result<(), BrokerError>;
}
