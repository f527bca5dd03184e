use order_relay_core::{DealId, StrategyId};
use std::collections::HashMap;
use tokio::sync::RwLock;

pub type PositionKey = (StrategyId, String);

/// In-memory record of the deal ids this relay believes are open, keyed by
/// (strategy, instrument). This is relay-local bookkeeping only: it is
/// never reconciled against the broker's own position list, so positions
/// closed out-of-band drift until the next close signal fails on them.
///
/// The lock is held only for map mutation, never across a broker call.
pub struct PositionRegistry {
    positions: RwLock<HashMap<PositionKey, Vec<DealId>>>,
}

impl Default for PositionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            positions: RwLock::new(HashMap::new()),
        }
    }

    /// Appends a confirmed deal id, creating the entry if absent.
    pub async fn record_open(&self, strategy: StrategyId, symbol: &str, deal: DealId) {
        let mut positions = self.positions.write().await;
        positions
            .entry((strategy, symbol.to_string()))
            .or_default()
            .push(deal);
    }

    /// Snapshot of the deal ids tracked for one key, oldest first.
    pub async fn tracked_deals(&self, strategy: StrategyId, symbol: &str) -> Vec<DealId> {
        let positions = self.positions.read().await;
        positions
            .get(&(strategy, symbol.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Removes one deal id after the broker confirmed its close. Returns
    /// whether the id was present. Empty entries are pruned.
    pub async fn remove_deal(&self, strategy: StrategyId, symbol: &str, deal: &DealId) -> bool {
        let mut positions = self.positions.write().await;
        let key = (strategy, symbol.to_string());
        let Some(deals) = positions.get_mut(&key) else {
            return false;
        };
        let before = deals.len();
        deals.retain(|d| d != deal);
        let removed = deals.len() < before;
        if deals.is_empty() {
            positions.remove(&key);
        }
        removed
    }

    /// Total deal ids tracked across all keys.
    pub async fn open_count(&self) -> usize {
        let positions = self.positions.read().await;
        positions.values().map(Vec::len).sum()
    }
}
