//! Proportional copy sizing
//!
//! Buys scale the counterparty's notional by the ratio of our balance to
//! theirs. Sells close the same fraction of our position that the
//! counterparty closed of theirs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::order::OrderRequest;
use crate::common::types::Side;

/// Smallest buy the venue accepts, in USDC
pub const MIN_BUY_USDC: Decimal = dec!(1);

/// Smallest sell worth placing, in shares
pub const MIN_SELL_SHARES: Decimal = dec!(1);

#[derive(Debug, Clone, PartialEq)]
pub enum SizingDecision {
    Buy { usdc_amount: Decimal },
    Sell { shares: Decimal },
    Skip { reason: String },
}

impl SizingDecision {
    fn skip(reason: impl Into<String>) -> Self {
        SizingDecision::Skip {
            reason: reason.into(),
        }
    }
}

pub fn size_order(request: &OrderRequest) -> SizingDecision {
    match request.side {
        Side::Buy => size_buy(request),
        Side::Sell => size_sell(request),
    }
}

fn size_buy(request: &OrderRequest) -> SizingDecision {
    let notional = request.order.usdc_size;
    let denominator = request.counterparty_balance + notional;
    if denominator <= Decimal::ZERO || request.own_balance <= Decimal::ZERO {
        return SizingDecision::skip("no balance to size a buy against");
    }

    let ratio = request.own_balance / denominator;
    let amount = (notional * ratio).min(request.own_balance).round_dp(2);
    if amount < MIN_BUY_USDC {
        return SizingDecision::skip(format!(
            "buy of ${} is below the ${} minimum",
            amount, MIN_BUY_USDC
        ));
    }
    SizingDecision::Buy {
        usdc_amount: amount,
    }
}

fn size_sell(request: &OrderRequest) -> SizingDecision {
    let own_shares = match &request.own_position {
        Some(position) if position.size > Decimal::ZERO => position.size,
        _ => return SizingDecision::skip("no position to sell"),
    };

    let shares = match &request.counterparty_position {
        // Counterparty closed out entirely: follow them out.
        None => own_shares,
        Some(position) => {
            let sold = request.order.size;
            let before = position.size + sold;
            if before <= Decimal::ZERO {
                own_shares
            } else {
                own_shares * (sold / before)
            }
        }
    }
    .min(own_shares)
    .round_dp(2);

    if shares < MIN_SELL_SHARES {
        return SizingDecision::skip(format!(
            "sell of {} shares is below the {} share minimum",
            shares, MIN_SELL_SHARES
        ));
    }
    SizingDecision::Sell { shares }
}
