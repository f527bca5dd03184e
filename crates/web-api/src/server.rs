use crate::handlers::{self, StrategyContext};
use axum::{routing::post, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// HTTP front of the relay: one POST route per registered strategy, each
/// bound at startup to its own [`StrategyContext`].
pub struct RelayServer {
    strategies: Vec<(String, Arc<StrategyContext>)>,
}

impl RelayServer {
    #[must_use]
    pub const fn new(strategies: Vec<(String, Arc<StrategyContext>)>) -> Self {
        Self { strategies }
    }

    pub fn router(&self) -> Router {
        let mut router = Router::new();
        for (route, ctx) in &self.strategies {
            let ctx = ctx.clone();
            tracing::info!(strategy = ctx.id, route = %route, "registering signal endpoint");
            router = router.route(
                route,
                post(move |body: String| handlers::ingest(ctx.clone(), body)),
            );
        }
        router.layer(TraceLayer::new_for_http())
    }

    /// Starts the ingestion server listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or
    /// serve requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("signal ingestion listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::SignalAck;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use order_relay_core::{BrokerError, BrokerSession, ComputedOrder, DealId};
    use order_relay_execution::{spawn_open_worker, BalanceCache, PositionRegistry};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use tower::ServiceExt;

    struct NullBroker;

    #[async_trait]
    impl BrokerSession for NullBroker {
        async fn balance(&self) -> Result<Decimal, BrokerError> {
            Ok(dec!(10000))
        }

        async fn open_position(&self, _order: &ComputedOrder) -> Result<DealId, BrokerError> {
            Ok(DealId("deal-1".to_string()))
        }

        async fn close_position(&self, _deal: &DealId) -> Result<(), BrokerError> {
            Ok(())
        }
    }

    fn test_server(registry: Arc<PositionRegistry>) -> RelayServer {
        let session: Arc<dyn BrokerSession> = Arc::new(NullBroker);
        let (queue, _worker) = spawn_open_worker(session.clone(), registry.clone(), 16);
        let ctx = Arc::new(StrategyContext {
            id: 3,
            session,
            balance: Arc::new(BalanceCache::new(dec!(10000))),
            registry,
            queue,
        });
        RelayServer::new(vec![("/strategy-3".to_string(), ctx)])
    }

    async fn post_signal(server: &RelayServer, body: &str) -> (StatusCode, SignalAck) {
        let response = server
            .router()
            .oneshot(
                Request::post("/strategy-3")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn valid_open_signal_is_acknowledged_and_executed() {
        let registry = Arc::new(PositionRegistry::new());
        let server = test_server(registry.clone());

        let (status, ack) =
            post_signal(&server, "EURUSD\nBUY\n0.01/1000\n50\n30\nopen\nNonInvert").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack.status, "received");
        assert_eq!(ack.strategy, 3);

        // the open runs off the serving path; give the worker a beat
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(registry.tracked_deals(3, "EURUSD").await.len(), 1);
    }

    #[tokio::test]
    async fn malformed_signal_still_gets_a_2xx_ack() {
        let registry = Arc::new(PositionRegistry::new());
        let server = test_server(registry.clone());

        let (status, ack) = post_signal(&server, "not a signal at all").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack.status, "received");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(registry.open_count().await, 0);
    }
}
