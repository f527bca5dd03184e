use crate::types::{
    ComputedOrder, InvertFlag, LotSpec, SignalAction, SignalError, SignalPayload,
};
use rust_decimal::{Decimal, RoundingStrategy};

/// Smallest lot the broker will accept; computed sizes below this are
/// floored up to it rather than rejected.
#[must_use]
pub fn min_lot() -> Decimal {
    Decimal::new(1, 3)
}

/// Sizes a lot from the cached balance: `(balance / per_balance) * mini_lot`,
/// rounded to 3 decimal places and floored at the minimum tradable size.
///
/// # Errors
/// Returns [`SignalError::Sizing`] when the arithmetic overflows `Decimal`.
/// A syntactically valid lot spec can still carry absurd magnitudes, and the
/// webhook body is untrusted input; overflow has to be a logged validation
/// failure, never a panic.
pub fn size_lot(balance: Decimal, spec: &LotSpec) -> Result<Decimal, SignalError> {
    let lot = balance
        .checked_div(spec.per_balance)
        .and_then(|scaled| scaled.checked_mul(spec.mini_lot))
        .ok_or(SignalError::Sizing {
            mini_lot: spec.mini_lot,
            per_balance: spec.per_balance,
        })?
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero);
    Ok(lot.max(min_lot()))
}

/// Outcome of resolving a validated payload against the cached balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Submit this sized order through the execution queue.
    Open(ComputedOrder),
    /// Close every tracked deal for (strategy, symbol).
    Close { symbol: String },
    /// Recognized but unsupported action; log and drop.
    Unsupported(String),
}

/// Pure intent resolution: no I/O, no locks, no clock.
///
/// For opens this applies the invert transform and sizes the lot from the
/// balance snapshot handed in by the caller. An unrecognized invert flag is
/// a hard validation error, but only for opens — closes never consult it.
///
/// # Errors
/// Returns [`SignalError::InvertFlag`] when an open payload carries an
/// invert flag that is neither `Invert` nor `NonInvert`.
pub fn resolve_intent(payload: &SignalPayload, balance: Decimal) -> Result<Resolution, SignalError> {
    match &payload.action {
        SignalAction::Close => Ok(Resolution::Close {
            symbol: payload.symbol.clone(),
        }),
        SignalAction::Open => {
            let direction = match payload.invert_raw.parse::<InvertFlag>()? {
                InvertFlag::Invert => payload.direction.opposite(),
                InvertFlag::NonInvert => payload.direction,
            };
            Ok(Resolution::Open(ComputedOrder {
                symbol: payload.symbol.clone(),
                direction,
                lot: size_lot(balance, &payload.lot_spec)?,
                stop_loss: payload.stop_loss,
                take_profit: payload.take_profit,
            }))
        }
        SignalAction::Other(other) => Ok(Resolution::Unsupported(other.clone())),
    }
}
