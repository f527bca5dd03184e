use chrono::{DateTime, Utc};
use order_relay_core::BrokerSession;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Last-known balance plus when it was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub balance: Decimal,
    pub refreshed_at: DateTime<Utc>,
}

/// Process-wide last-known account balance.
///
/// Built on a watch channel: the refresher is the single writer and every
/// reader gets a lock-free snapshot of whatever is cached. Staleness is
/// bounded by the refresh interval; readers never wait for a fresher value.
pub struct BalanceCache {
    tx: watch::Sender<BalanceSnapshot>,
}

impl BalanceCache {
    #[must_use]
    pub fn new(initial: Decimal) -> Self {
        let (tx, _rx) = watch::channel(BalanceSnapshot {
            balance: initial,
            refreshed_at: Utc::now(),
        });
        Self { tx }
    }

    #[must_use]
    pub fn current(&self) -> BalanceSnapshot {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.tx.borrow().balance
    }

    pub fn publish(&self, balance: Decimal) {
        self.tx.send_replace(BalanceSnapshot {
            balance,
            refreshed_at: Utc::now(),
        });
    }
}

/// Long-lived refresh loop. On success the cached value is overwritten and
/// old→new logged; on failure the previous value is retained. This task
/// never exits on its own and never takes a lock the request path needs.
pub async fn run_balance_refresher(
    session: Arc<dyn BrokerSession>,
    cache: Arc<BalanceCache>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    // the cache is primed at startup; skip the interval's immediate tick
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match session.balance().await {
            Ok(new_balance) => {
                let old = cache.balance();
                cache.publish(new_balance);
                tracing::info!(%old, %new_balance, "balance refreshed");
            }
            Err(e) => {
                tracing::warn!(error = %e, retained = %cache.balance(), "balance refresh failed, keeping cached value");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn publish_overwrites_snapshot() {
        let cache = BalanceCache::new(dec!(5000));
        assert_eq!(cache.balance(), dec!(5000));
        cache.publish(dec!(5250.50));
        assert_eq!(cache.balance(), dec!(5250.50));
        assert_eq!(cache.current().balance, dec!(5250.50));
    }
}
