//! Table progression: phase and point changes, the shooter-hand bonus tracker,
//! and the windows in which each wager may be placed.

use crapsvault_types::craps::{
    BetBatch, BetType, BonusScope, BonusState, CrapsError, Phase, PhaseError, PhaseEvent, Table,
    POINT_NUMBERS,
};

pub fn is_point_number(total: u8) -> bool {
    POINT_NUMBERS.contains(&total)
}

/// Index of a point number in [POINT_NUMBERS] (also its Fire bit).
pub fn point_index(total: u8) -> Option<usize> {
    POINT_NUMBERS.iter().position(|p| *p == total)
}

/// Bit recording a total toward All Tall Small (none for 7).
pub fn ats_bit_for_total(total: u8) -> u16 {
    match total {
        2..=6 => 1 << (total - 2),
        8..=12 => 1 << (total - 3),
        _ => 0,
    }
}

fn hard_index(total: u8) -> Option<usize> {
    match total {
        4 => Some(0),
        6 => Some(1),
        8 => Some(2),
        10 => Some(3),
        _ => None,
    }
}

/// Apply a roll to the table.
///
/// Returns the phase event and the bonus tracker as of this roll, before the
/// resets the roll triggers (a seven clears seven-scoped progress, a seven-out
/// starts a new hand).
pub fn advance_table(table: &mut Table, die1: u8, die2: u8) -> (PhaseEvent, BonusState) {
    let total = die1 + die2;
    let bonus = &mut table.bonus;
    bonus.rolls_in_hand = bonus.rolls_in_hand.saturating_add(1);
    bonus.rolls_since_seven = bonus.rolls_since_seven.saturating_add(1);
    bonus.ats_mask |= ats_bit_for_total(total);
    if die1 == die2 {
        bonus.doubles_mask |= 1 << (die1 - 1);
        if let Some(i) = hard_index(total) {
            bonus.hard_counts[i] = bonus.hard_counts[i].saturating_add(1);
        }
    }
    if total != 7 {
        let i = (total - 2) as usize;
        bonus.repeater_counts[i] = bonus.repeater_counts[i].saturating_add(1);
    }

    let event = match table.phase {
        Phase::ComeOut if is_point_number(total) => {
            table.phase = Phase::Point;
            table.point = total;
            PhaseEvent::PointEstablished(total)
        }
        Phase::ComeOut => {
            if total == 7 || total == 11 {
                bonus.pass_wins = bonus.pass_wins.saturating_add(1);
            }
            PhaseEvent::None
        }
        Phase::Point if total == table.point => {
            let point = table.point;
            table.phase = Phase::ComeOut;
            table.point = 0;
            bonus.pass_wins = bonus.pass_wins.saturating_add(1);
            bonus.points_made = bonus.points_made.saturating_add(1);
            if let Some(i) = point_index(point) {
                bonus.made_points_mask |= 1 << i;
                bonus.point_made_counts[i] = bonus.point_made_counts[i].saturating_add(1);
            }
            PhaseEvent::PointMade(point)
        }
        Phase::Point if total == 7 => {
            table.phase = Phase::ComeOut;
            table.point = 0;
            PhaseEvent::SevenOut
        }
        Phase::Point => PhaseEvent::None,
    };

    let snapshot = *bonus;
    if total == 7 {
        bonus.rolls_since_seven = 0;
        bonus.doubles_mask = 0;
        bonus.repeater_counts = [0; 11];
        bonus.hard_counts = [0; 4];
    }
    if event == PhaseEvent::SevenOut {
        *bonus = BonusState {
            hand: bonus.hand + 1,
            ..BonusState::default()
        };
    }
    (event, snapshot)
}

fn not_allowed(bet: BetType, reason: &'static str) -> CrapsError {
    PhaseError::BetNotAllowed { bet, reason }.into()
}

/// Validate that `bet` may be placed now and return the slot's initial target.
pub fn placement_target(
    bet: BetType,
    table: &Table,
    batch: Option<&BetBatch>,
) -> Result<u8, CrapsError> {
    let point_on = table.phase == Phase::Point;
    match bet {
        BetType::Pass | BetType::DontPass if point_on => {
            Err(not_allowed(bet, "line bets are only taken on the come-out"))
        }
        BetType::Come | BetType::DontCome if !point_on => {
            Err(not_allowed(bet, "come bets need a point"))
        }
        BetType::Muggsy if point_on => Err(not_allowed(bet, "muggsy is only taken on the come-out")),
        BetType::OddsPass | BetType::OddsDontPass => {
            if !point_on {
                return Err(not_allowed(bet, "odds need a point"));
            }
            Ok(table.point)
        }
        BetType::OddsCome | BetType::OddsDontCome => {
            if !point_on {
                return Err(not_allowed(bet, "odds need a point"));
            }
            let contract = if bet == BetType::OddsCome {
                BetType::Come
            } else {
                BetType::DontCome
            };
            if !has_pending_contract(batch, contract) {
                return Err(not_allowed(bet, "no matching come bet in this batch"));
            }
            Ok(0)
        }
        _ => match bet.bonus_scope() {
            Some(BonusScope::Hand) if table.bonus.rolls_in_hand != 0 => {
                Err(not_allowed(bet, "only before the shooter's first roll"))
            }
            Some(BonusScope::Seven) if table.bonus.rolls_since_seven != 0 => {
                Err(not_allowed(bet, "only before the first roll after a seven"))
            }
            _ => Ok(0),
        },
    }
}

fn has_pending_contract(batch: Option<&BetBatch>, contract: BetType) -> bool {
    let Some(batch) = batch else {
        return false;
    };
    batch.bets().any(|(slot, packed)| {
        packed.bet_type() == Ok(contract)
            && !batch.is_resolved(slot)
            && batch.target(slot) == Some(0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ats_bits() {
        assert_eq!(ats_bit_for_total(2), 1);
        assert_eq!(ats_bit_for_total(6), 1 << 4);
        assert_eq!(ats_bit_for_total(7), 0);
        assert_eq!(ats_bit_for_total(8), 1 << 5);
        assert_eq!(ats_bit_for_total(12), 1 << 9);
    }

    #[test]
    fn test_point_cycle() {
        let mut table = Table::default();
        let (event, _) = advance_table(&mut table, 2, 4);
        assert_eq!(event, PhaseEvent::PointEstablished(6));
        assert_eq!((table.phase, table.point), (Phase::Point, 6));

        let (event, _) = advance_table(&mut table, 5, 4);
        assert_eq!(event, PhaseEvent::None);

        let (event, snapshot) = advance_table(&mut table, 3, 3);
        assert_eq!(event, PhaseEvent::PointMade(6));
        assert_eq!(table.phase, Phase::ComeOut);
        assert_eq!(snapshot.points_made, 1);
        assert_eq!(snapshot.made_points_mask, 0b100);
        assert_eq!(snapshot.pass_wins, 1);
        assert_eq!(snapshot.hard_counts, [0, 1, 0, 0]);
        assert_eq!(snapshot.rolls_in_hand, 3);
    }

    #[test]
    fn test_seven_out_starts_new_hand() {
        let mut table = Table::default();
        advance_table(&mut table, 2, 2);
        advance_table(&mut table, 1, 1);
        let (event, snapshot) = advance_table(&mut table, 3, 4);
        assert_eq!(event, PhaseEvent::SevenOut);

        // snapshot keeps the hand's progress
        assert_eq!(snapshot.rolls_in_hand, 3);
        assert_eq!(snapshot.doubles_mask, 0b11);
        assert_eq!(snapshot.ats_mask, 0b101);

        assert_eq!(table.bonus.hand, 1);
        assert_eq!(table.bonus.rolls_in_hand, 0);
        assert_eq!(table.bonus.rolls_since_seven, 0);
        assert_eq!(table.bonus.ats_mask, 0);
        assert_eq!(table.point, 0);
    }

    #[test]
    fn test_come_out_seven_resets_seven_scope_only() {
        let mut table = Table::default();
        advance_table(&mut table, 1, 1);
        let (event, _) = advance_table(&mut table, 5, 2);
        assert_eq!(event, PhaseEvent::None);
        assert_eq!(table.bonus.rolls_since_seven, 0);
        assert_eq!(table.bonus.doubles_mask, 0);
        assert_eq!(table.bonus.repeater_counts, [0; 11]);
        assert_eq!(table.bonus.rolls_in_hand, 2);
        assert_eq!(table.bonus.pass_wins, 1);
        assert_eq!(table.bonus.ats_mask, 1);
    }

    #[test]
    fn test_placement_windows() {
        let mut table = Table::default();
        assert_eq!(placement_target(BetType::Pass, &table, None), Ok(0));
        assert!(placement_target(BetType::Come, &table, None).is_err());
        assert!(placement_target(BetType::OddsPass, &table, None).is_err());
        assert_eq!(placement_target(BetType::Fire, &table, None), Ok(0));

        advance_table(&mut table, 4, 5);
        assert!(placement_target(BetType::Pass, &table, None).is_err());
        assert!(placement_target(BetType::Muggsy, &table, None).is_err());
        assert_eq!(placement_target(BetType::OddsPass, &table, None), Ok(9));
        assert_eq!(placement_target(BetType::Come, &table, None), Ok(0));
        assert!(placement_target(BetType::Fire, &table, None).is_err());
        assert!(placement_target(BetType::Repeater4, &table, None).is_err());
        assert_eq!(placement_target(BetType::Field, &table, None), Ok(0));
    }

    #[test]
    fn test_come_odds_need_contract() {
        use commonware_cryptography::{ed25519::PrivateKey, PrivateKeyExt, Signer};
        use crapsvault_types::craps::encode_bet;

        let mut table = Table::default();
        advance_table(&mut table, 4, 4);
        let mut batch = BetBatch::new(PrivateKey::from_seed(1).public_key(), 2, 0);
        assert!(placement_target(BetType::OddsCome, &table, Some(&batch)).is_err());

        let packed = encode_bet(BetType::Come as u8, 10).unwrap();
        batch.push(packed, 10, 0).unwrap();
        assert_eq!(
            placement_target(BetType::OddsCome, &table, Some(&batch)),
            Ok(0)
        );
        assert!(placement_target(BetType::OddsDontCome, &table, Some(&batch)).is_err());
    }
}
