use crate::client::{ApiError, TradeLockerClient};
use async_trait::async_trait;
use order_relay_core::{BrokerError, BrokerSession, ComputedOrder, DealId};
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;

impl From<ApiError> for BrokerError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::RateLimited => Self::Rejected("rate limited".to_string()),
            ApiError::Status { status, body } => Self::Rejected(format!("{status}: {body}")),
            ApiError::Transport(e) => Self::Transport(e.to_string()),
        }
    }
}

/// Authenticated TradeLocker session bound to one account.
pub struct TradeLockerSession {
    client: TradeLockerClient,
    token: String,
    account_id: String,
    account_num: String,
}

impl TradeLockerSession {
    #[must_use]
    pub const fn new(
        client: TradeLockerClient,
        token: String,
        account_id: String,
        account_num: String,
    ) -> Self {
        Self {
            client,
            token,
            account_id,
            account_num,
        }
    }
}

fn decimal_field(value: &serde_json::Value, field: &str) -> Result<Decimal, BrokerError> {
    let raw = value
        .get(field)
        .ok_or_else(|| BrokerError::Rejected(format!("missing {field} in response")))?;
    // the API serializes money sometimes as a string, sometimes as a number
    if let Some(s) = raw.as_str() {
        return Decimal::from_str(s)
            .map_err(|_| BrokerError::Rejected(format!("unparsable {field}: {s}")));
    }
    raw.as_f64()
        .and_then(|f| Decimal::try_from(f).ok())
        .ok_or_else(|| BrokerError::Rejected(format!("unparsable {field}: {raw}")))
}

#[async_trait]
impl BrokerSession for TradeLockerSession {
    async fn balance(&self) -> Result<Decimal, BrokerError> {
        let endpoint = format!("/trade/accounts/{}/state", self.account_id);
        let response = self
            .client
            .get(&endpoint, &self.token, &self.account_num)
            .await?;
        let state = response
            .get("d")
            .ok_or_else(|| BrokerError::Rejected("missing account state body".to_string()))?;
        decimal_field(state, "projectedBalance")
    }

    async fn open_position(&self, order: &ComputedOrder) -> Result<DealId, BrokerError> {
        let endpoint = format!("/trade/accounts/{}/orders", self.account_id);
        let body = json!({
            "instrument": order.symbol,
            "qty": order.lot.to_string(),
            "side": order.direction.to_string(),
            "type": "market",
            "validity": "IOC",
            "stopLoss": order.stop_loss,
            "stopLossType": "offset",
            "takeProfit": order.take_profit,
            "takeProfitType": "offset",
        });
        let response = self
            .client
            .post(&endpoint, &self.token, &self.account_num, body)
            .await?;

        let deal_id = response
            .get("d")
            .and_then(|d| d.get("orderId"))
            .map(|id| match id.as_str() {
                Some(s) => s.to_string(),
                None => id.to_string(),
            })
            .ok_or_else(|| BrokerError::Rejected("missing orderId in open response".to_string()))?;

        Ok(DealId(deal_id))
    }

    async fn close_position(&self, deal: &DealId) -> Result<(), BrokerError> {
        let endpoint = format!("/trade/positions/{deal}");
        self.client
            .delete(&endpoint, &self.token, &self.account_num)
            .await?;
        Ok(())
    }
}
