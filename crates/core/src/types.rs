use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Strategy identifier, assigned sequentially at startup.
pub type StrategyId = u32;

/// Broker-assigned handle for one open position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DealId(pub String);

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Payload validation failure. Any of these means the signal is discarded
/// whole; there is no partial intent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("expected 7 payload fields, got {0}")]
    FieldCount(usize),
    #[error("unrecognized direction: {0:?}")]
    Direction(String),
    #[error("malformed lot spec (expected \"<miniLot>/<perBalance>\"): {0:?}")]
    LotSpec(String),
    #[error("non-numeric {field} distance: {value:?}")]
    Distance { field: &'static str, value: String },
    #[error("unrecognized invert flag: {0:?}")]
    InvertFlag(String),
    #[error("lot sizing overflowed for spec {mini_lot}/{per_balance}")]
    Sizing {
        mini_lot: Decimal,
        per_balance: Decimal,
    },
}

/// Execution failure reported by the broker collaborator.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker rejected request: {0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl FromStr for Direction {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            _ => Err(SignalError::Direction(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Sell => f.write_str("sell"),
        }
    }
}

/// What the signal asks the relay to do. Anything other than open/close is
/// recognized but unsupported and gets discarded downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalAction {
    Open,
    Close,
    Other(String),
}

impl From<&str> for SignalAction {
    fn from(s: &str) -> Self {
        match s {
            "open" => Self::Open,
            "close" => Self::Close,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvertFlag {
    Invert,
    NonInvert,
}

impl FromStr for InvertFlag {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Invert" => Ok(Self::Invert),
            "NonInvert" => Ok(Self::NonInvert),
            _ => Err(SignalError::InvertFlag(s.to_string())),
        }
    }
}

/// Lot-sizing spec: trade `mini_lot` lots for every `per_balance` of
/// account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotSpec {
    pub mini_lot: Decimal,
    pub per_balance: Decimal,
}

impl FromStr for LotSpec {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SignalError::LotSpec(s.to_string());
        let (mini, per) = s.split_once('/').ok_or_else(malformed)?;
        let mini_lot = Decimal::from_str(mini.trim()).map_err(|_| malformed())?;
        let per_balance = Decimal::from_str(per.trim()).map_err(|_| malformed())?;
        if mini_lot <= Decimal::ZERO || per_balance <= Decimal::ZERO {
            return Err(malformed());
        }
        Ok(Self {
            mini_lot,
            per_balance,
        })
    }
}

/// Validated signal payload, parsed from the 7-line webhook body.
///
/// The invert flag stays raw here: it only has to parse for `open`
/// signals, and the resolver is where that distinction lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalPayload {
    pub symbol: String,
    pub direction: Direction,
    pub lot_spec: LotSpec,
    pub take_profit: i64,
    pub stop_loss: i64,
    pub action: SignalAction,
    pub invert_raw: String,
}

impl SignalPayload {
    /// Parses the newline-delimited webhook body into a payload.
    ///
    /// # Errors
    /// Returns a [`SignalError`] on a field-count mismatch, an
    /// unrecognized direction, an unparsable lot spec, or non-numeric
    /// TP/SL distances.
    pub fn parse(body: &str) -> Result<Self, SignalError> {
        let fields: Vec<&str> = body.trim_end().lines().map(str::trim).collect();
        if fields.len() != 7 {
            return Err(SignalError::FieldCount(fields.len()));
        }

        let take_profit = fields[3].parse::<i64>().map_err(|_| SignalError::Distance {
            field: "take-profit",
            value: fields[3].to_string(),
        })?;
        let stop_loss = fields[4].parse::<i64>().map_err(|_| SignalError::Distance {
            field: "stop-loss",
            value: fields[4].to_string(),
        })?;

        Ok(Self {
            symbol: fields[0].to_string(),
            direction: fields[1].parse()?,
            lot_spec: fields[2].parse()?,
            take_profit,
            stop_loss,
            action: SignalAction::from(fields[5]),
            invert_raw: fields[6].to_string(),
        })
    }
}

/// A sized, direction-resolved order ready for submission to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedOrder {
    pub symbol: String,
    pub direction: Direction,
    pub lot: Decimal,
    pub stop_loss: i64,
    pub take_profit: i64,
}
