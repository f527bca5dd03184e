use crate::registry::PositionRegistry;
use order_relay_core::{BrokerSession, StrategyId};

/// Closes every deal tracked for (strategy, symbol), directly against the
/// broker — closes bypass the open queue on purpose: each one targets an
/// already-known deal id, so there is no sizing race to serialize, and a
/// failing close must not stall the open pipeline.
///
/// A deal id leaves the registry only after the broker confirms its close;
/// failures keep it tracked so the next close signal retries it. Returns
/// how many deals were confirmed closed.
pub async fn close_all(
    session: &dyn BrokerSession,
    registry: &PositionRegistry,
    strategy: StrategyId,
    symbol: &str,
) -> usize {
    let deals = registry.tracked_deals(strategy, symbol).await;
    if deals.is_empty() {
        tracing::info!(strategy, symbol, "close signal with nothing tracked, no-op");
        return 0;
    }

    let mut closed = 0;
    for deal in deals {
        match session.close_position(&deal).await {
            Ok(()) => {
                registry.remove_deal(strategy, symbol, &deal).await;
                closed += 1;
                tracing::info!(strategy, symbol, %deal, "position closed");
            }
            Err(e) => {
                tracing::warn!(
                    strategy,
                    symbol,
                    %deal,
                    error = %e,
                    "close rejected, deal stays tracked for retry"
                );
            }
        }
    }
    closed
}
