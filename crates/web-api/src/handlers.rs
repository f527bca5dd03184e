use axum::Json;
use order_relay_core::{
    resolve_intent, BrokerSession, Resolution, SignalPayload, StrategyId,
};
use order_relay_execution::{
    close_all, BalanceCache, ExecutionHandle, OpenRequest, PositionRegistry,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything one strategy endpoint needs to turn a webhook body into
/// broker calls. Shared behind `Arc`; the session may itself be shared
/// across strategies.
pub struct StrategyContext {
    pub id: StrategyId,
    pub session: Arc<dyn BrokerSession>,
    pub balance: Arc<BalanceCache>,
    pub registry: Arc<PositionRegistry>,
    pub queue: ExecutionHandle,
}

/// The acknowledgment every signal gets, success or not. The signal source
/// has no error-handling contract, so failures surface in logs only.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignalAck {
    pub status: String,
    pub strategy: StrategyId,
}

/// Ingestion handler: acknowledge immediately, do the work off-path.
pub async fn ingest(ctx: Arc<StrategyContext>, body: String) -> Json<SignalAck> {
    let strategy = ctx.id;
    tokio::spawn(handle_signal(ctx, body));
    Json(SignalAck {
        status: "received".to_string(),
        strategy,
    })
}

async fn handle_signal(ctx: Arc<StrategyContext>, body: String) {
    let payload = match SignalPayload::parse(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(strategy = ctx.id, error = %e, "discarding malformed signal");
            return;
        }
    };

    match resolve_intent(&payload, ctx.balance.balance()) {
        Ok(Resolution::Open(order)) => {
            let symbol = order.symbol.clone();
            if let Err(e) = ctx
                .queue
                .submit(OpenRequest {
                    strategy: ctx.id,
                    order,
                })
                .await
            {
                tracing::error!(strategy = ctx.id, %symbol, error = %e, "open queue unavailable");
            }
        }
        Ok(Resolution::Close { symbol }) => {
            close_all(ctx.session.as_ref(), &ctx.registry, ctx.id, &symbol).await;
        }
        Ok(Resolution::Unsupported(action)) => {
            tracing::warn!(strategy = ctx.id, action, "unsupported action, discarding signal");
        }
        Err(e) => {
            tracing::warn!(strategy = ctx.id, error = %e, "discarding invalid signal");
        }
    }
}
