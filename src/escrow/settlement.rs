// Pot / fee / payout arithmetic for a single player's settlement

use rust_decimal::Decimal;

use crate::config::DrawPolicy;
use crate::types::{GameResult, SettlementResult};

pub fn pot(stake: Decimal) -> Decimal {
    stake * Decimal::TWO
}

pub fn platform_fee(stake: Decimal, fee_rate: Decimal) -> Decimal {
    pot(stake) * fee_rate
}

/// Settlement from the reporting player's point of view.
///
/// A win pays `pot - fee`; a loss pays nothing (the stake was taken at lock
/// time) but still reports the match fee. Draws follow `draw_policy`: with
/// `RefundStake` the stake comes back fee-free, with `SplitPot` each side gets
/// half of `pot - fee` and carries half of the fee.
pub fn compute_settlement(
    stake: Decimal,
    fee_rate: Decimal,
    result: GameResult,
    draw_policy: DrawPolicy,
) -> SettlementResult {
    let pot = pot(stake);
    let fee = platform_fee(stake, fee_rate);

    let (payout, fee) = match result {
        GameResult::Win => (pot - fee, fee),
        GameResult::Loss => (Decimal::ZERO, fee),
        GameResult::Draw => match draw_policy {
            DrawPolicy::RefundStake => (stake, Decimal::ZERO),
            DrawPolicy::SplitPot => ((pot - fee) / Decimal::TWO, fee / Decimal::TWO),
        },
    };

    SettlementResult {
        payout,
        fee,
        net_profit: payout - stake,
    }
}

/// Winner payout and platform fee for the whole match. On a draw the payout
/// is what each player receives.
pub fn match_totals(
    stake: Decimal,
    fee_rate: Decimal,
    is_draw: bool,
    draw_policy: DrawPolicy,
) -> (Decimal, Decimal) {
    let pot = pot(stake);
    let fee = platform_fee(stake, fee_rate);

    match (is_draw, draw_policy) {
        (false, _) => (pot - fee, fee),
        (true, DrawPolicy::RefundStake) => (stake, Decimal::ZERO),
        (true, DrawPolicy::SplitPot) => ((pot - fee) / Decimal::TWO, fee),
    }
}
