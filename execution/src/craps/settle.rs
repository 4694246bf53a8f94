use super::payout::{calculate_bet_payout, Resolution, Roll};
use crapsvault_types::craps::{
    checked_add, AmountTable, BetBatch, CrapsError, EpochOutcome, SlotOutcome,
};
use tracing::debug;

/// Apply finalized outcomes to every open slot of a batch.
///
/// Outcomes must be in epoch order; ones at or before the batch's last settled
/// epoch are skipped. Returns the slots resolved by this call.
pub fn settle_batch(
    batch: &mut BetBatch,
    outcomes: &[EpochOutcome],
    amounts: &AmountTable,
) -> Result<Vec<(u8, SlotOutcome)>, CrapsError> {
    let mut resolved = Vec::new();
    for outcome in outcomes {
        if outcome.epoch <= batch.last_settled_epoch() {
            continue;
        }
        let roll = Roll::from(outcome);
        let open: Vec<u8> = batch.open_slots().collect();
        for slot in open {
            let Some(packed) = batch.packed_bet(slot) else {
                continue;
            };
            let (bet, amount) = amounts.decode_bet(packed)?;
            let target = batch.target(slot).unwrap_or_default();
            let result = match calculate_bet_payout(bet, amount, target, &roll, &outcome.bonus)? {
                Resolution::Working { target: next } => {
                    if next != target {
                        batch.set_target(slot, next)?;
                    }
                    continue;
                }
                Resolution::Win { winnings } => SlotOutcome::Win {
                    total_return: checked_add(amount, winnings, "slot return")?,
                },
                Resolution::Push => SlotOutcome::Push { returned: amount },
                Resolution::Lose => SlotOutcome::Lose,
            };
            debug!(
                epoch = outcome.epoch,
                slot,
                ?bet,
                amount,
                ?result,
                "resolved wager"
            );
            batch.resolve(slot, result)?;
            resolved.push((slot, result));
        }
        batch.advance_outcome(outcome.epoch);
    }
    Ok(resolved)
}
