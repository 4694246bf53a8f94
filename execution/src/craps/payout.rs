//! Wager evaluation against a single roll.
//!
//! Every rule is expressed in terms of the roll, the slot's target (the
//! number a multi-roll wager is riding on, `0` before its first roll) and the
//! bonus tracker snapshot taken with the roll. Winnings exclude the stake and
//! fractional winnings truncate.

use super::table::is_point_number;
use crapsvault_types::craps::{
    ArithmeticError, BetCategory, BetType, BonusState, CrapsError, EncodingError, EpochOutcome,
    Phase, ATS_ALL_MASK, ATS_ALL_PAYOUT, ATS_SMALL_MASK, ATS_SMALL_PAYOUT, ATS_TALL_MASK,
    ATS_TALL_PAYOUT, DIFFERENT_DOUBLES_PAYOUTS, EVEN_MONEY, FIELD_DOUBLE, FIRE_PAYOUTS, HARD_4_10,
    HARD_6_8, HOT_ROLLER_PAYOUTS, MUGGSY_COME_OUT_PAYOUT, MUGGSY_POINT_SEVEN_PAYOUT,
    NEXT_PAYOUT_BY_WAYS, PLACE_2_12, PLACE_3_11, PLACE_4_10, PLACE_5_9, PLACE_6_8, POINT_NUMBERS,
    REPEATER_PAYOUTS, REPEATER_REQUIRED, REPLAY_FOUR_OR_MORE, REPLAY_THREE_4_10, REPLAY_THREE_5_9,
    REPLAY_THREE_6_8, RIDE_LINE_PAYOUTS, TRUE_ODDS_4_10, TRUE_ODDS_5_9, TRUE_ODDS_6_8,
    TWICE_HARD_PAYOUT, WAYS,
};

/// Dice plus the phase and point in force when they were thrown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roll {
    pub die1: u8,
    pub die2: u8,
    pub phase: Phase,
    pub point: u8,
}

impl Roll {
    pub fn total(&self) -> u8 {
        self.die1 + self.die2
    }

    pub fn is_hard(&self) -> bool {
        self.die1 == self.die2
    }

    pub fn is_seven_out(&self) -> bool {
        self.phase == Phase::Point && self.total() == 7
    }
}

impl From<&EpochOutcome> for Roll {
    fn from(outcome: &EpochOutcome) -> Self {
        Self {
            die1: outcome.die1,
            die2: outcome.die2,
            phase: outcome.phase,
            point: outcome.point,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Still riding on `target`.
    Working { target: u8 },
    Win { winnings: u64 },
    Push,
    Lose,
}

/// `amount * num / den`, truncated.
fn ratio(amount: u64, (num, den): (u64, u64)) -> Result<u64, CrapsError> {
    amount
        .checked_mul(num)
        .map(|v| v / den)
        .ok_or(ArithmeticError::Overflow("winnings").into())
}

fn to_one(amount: u64, multiplier: u64) -> Result<Resolution, CrapsError> {
    Ok(Resolution::Win {
        winnings: ratio(amount, (multiplier, 1))?,
    })
}

fn win(amount: u64, odds: (u64, u64)) -> Result<Resolution, CrapsError> {
    Ok(Resolution::Win {
        winnings: ratio(amount, odds)?,
    })
}

fn place_odds(number: u8) -> (u64, u64) {
    match number {
        4 | 10 => PLACE_4_10,
        5 | 9 => PLACE_5_9,
        6 | 8 => PLACE_6_8,
        3 | 11 => PLACE_3_11,
        _ => PLACE_2_12,
    }
}

fn true_odds(point: u8) -> (u64, u64) {
    match point {
        4 | 10 => TRUE_ODDS_4_10,
        5 | 9 => TRUE_ODDS_5_9,
        _ => TRUE_ODDS_6_8,
    }
}

fn reversed((num, den): (u64, u64)) -> (u64, u64) {
    (den, num)
}

/// Evaluate one wager against one roll.
pub fn calculate_bet_payout(
    bet: BetType,
    amount: u64,
    target: u8,
    roll: &Roll,
    bonus: &BonusState,
) -> Result<Resolution, CrapsError> {
    let total = roll.total();
    match bet.category() {
        BetCategory::Line => {
            let right_way = matches!(bet, BetType::Pass | BetType::Come);
            line_resolution(right_way, amount, target, total)
        }
        BetCategory::Field => match total {
            2 | 12 => win(amount, FIELD_DOUBLE),
            3 | 4 | 9 | 10 | 11 => win(amount, EVEN_MONEY),
            _ => Ok(Resolution::Lose),
        },
        BetCategory::Yes => {
            let number = bet.number().unwrap_or_default();
            if total == number {
                win(amount, place_odds(number))
            } else if total == 7 {
                Ok(Resolution::Lose)
            } else {
                Ok(Resolution::Working { target: number })
            }
        }
        BetCategory::No => {
            let number = bet.number().unwrap_or_default();
            if total == 7 {
                win(amount, reversed(place_odds(number)))
            } else if total == number {
                Ok(Resolution::Lose)
            } else {
                Ok(Resolution::Working { target: number })
            }
        }
        BetCategory::Hardway => {
            let number = bet.number().unwrap_or_default();
            if total == number && roll.is_hard() {
                let odds = if number == 4 || number == 10 {
                    HARD_4_10
                } else {
                    HARD_6_8
                };
                win(amount, odds)
            } else if total == number || total == 7 {
                Ok(Resolution::Lose)
            } else {
                Ok(Resolution::Working { target: number })
            }
        }
        BetCategory::Odds => odds_resolution(bet, amount, target, total),
        BetCategory::Next => {
            if Some(total) == bet.number() {
                to_one(amount, NEXT_PAYOUT_BY_WAYS[WAYS[total as usize] as usize])
            } else {
                Ok(Resolution::Lose)
            }
        }
        BetCategory::Repeater => {
            let number = bet.number().unwrap_or_default();
            let i = (number - 2) as usize;
            if bonus.repeater_counts[i] >= REPEATER_REQUIRED[i] {
                to_one(amount, REPEATER_PAYOUTS[i])
            } else if total == 7 {
                Ok(Resolution::Lose)
            } else {
                Ok(Resolution::Working { target: number })
            }
        }
        BetCategory::Bonus => bonus_resolution(bet, amount, target, roll, bonus),
    }
}

/// Pass and come (right way) or don't pass and don't come (wrong way).
fn line_resolution(
    right_way: bool,
    amount: u64,
    target: u8,
    total: u8,
) -> Result<Resolution, CrapsError> {
    if target == 0 {
        return match (total, right_way) {
            (7 | 11, true) | (2 | 3, false) => win(amount, EVEN_MONEY),
            (2 | 3 | 12, true) | (7 | 11, false) => Ok(Resolution::Lose),
            (12, false) => Ok(Resolution::Push),
            _ => Ok(Resolution::Working { target: total }),
        };
    }
    match (total == target, total == 7) {
        (true, _) if right_way => win(amount, EVEN_MONEY),
        (true, _) => Ok(Resolution::Lose),
        (_, true) if right_way => Ok(Resolution::Lose),
        (_, true) => win(amount, EVEN_MONEY),
        _ => Ok(Resolution::Working { target }),
    }
}

fn odds_resolution(
    bet: BetType,
    amount: u64,
    target: u8,
    total: u8,
) -> Result<Resolution, CrapsError> {
    let right_way = matches!(bet, BetType::OddsPass | BetType::OddsCome);
    if target == 0 {
        // Come odds wait on the come bet's first roll.
        return Ok(if is_point_number(total) {
            Resolution::Working { target: total }
        } else {
            Resolution::Push
        });
    }
    let odds = true_odds(target);
    if total == target {
        if right_way {
            win(amount, odds)
        } else {
            Ok(Resolution::Lose)
        }
    } else if total == 7 {
        if right_way {
            Ok(Resolution::Lose)
        } else {
            win(amount, reversed(odds))
        }
    } else {
        Ok(Resolution::Working { target })
    }
}

fn replay_multiplier(bonus: &BonusState) -> u64 {
    let mut best = 0;
    for (i, count) in bonus.point_made_counts.iter().enumerate() {
        let multiplier = match (*count, POINT_NUMBERS[i]) {
            (4..=u8::MAX, _) => REPLAY_FOUR_OR_MORE,
            (3, 4 | 10) => REPLAY_THREE_4_10,
            (3, 5 | 9) => REPLAY_THREE_5_9,
            (3, _) => REPLAY_THREE_6_8,
            _ => 0,
        };
        best = best.max(multiplier);
    }
    best
}

fn bonus_resolution(
    bet: BetType,
    amount: u64,
    target: u8,
    roll: &Roll,
    bonus: &BonusState,
) -> Result<Resolution, CrapsError> {
    let total = roll.total();
    let pending = || Ok(Resolution::Working { target: 0 });
    let at_seven_out = |multiplier: u64| {
        if !roll.is_seven_out() {
            pending()
        } else if multiplier == 0 {
            Ok(Resolution::Lose)
        } else {
            to_one(amount, multiplier)
        }
    };
    match bet {
        BetType::Fire => {
            at_seven_out(FIRE_PAYOUTS[bonus.made_points_mask.count_ones() as usize])
        }
        BetType::HotRoller => {
            let made = (bonus.points_made as usize).min(HOT_ROLLER_PAYOUTS.len() - 1);
            at_seven_out(HOT_ROLLER_PAYOUTS[made])
        }
        BetType::RideLine => {
            let wins = (bonus.pass_wins as usize).min(RIDE_LINE_PAYOUTS.len() - 1);
            at_seven_out(RIDE_LINE_PAYOUTS[wins])
        }
        BetType::Replay => at_seven_out(replay_multiplier(bonus)),
        BetType::AtsSmall | BetType::AtsTall | BetType::AtsAll => {
            let (mask, multiplier) = match bet {
                BetType::AtsSmall => (ATS_SMALL_MASK, ATS_SMALL_PAYOUT),
                BetType::AtsTall => (ATS_TALL_MASK, ATS_TALL_PAYOUT),
                _ => (ATS_ALL_MASK, ATS_ALL_PAYOUT),
            };
            if bonus.ats_mask & mask == mask {
                to_one(amount, multiplier)
            } else if roll.is_seven_out() {
                Ok(Resolution::Lose)
            } else {
                pending()
            }
        }
        BetType::TwiceHard => {
            if bonus.hard_counts.iter().any(|c| *c >= 2) {
                to_one(amount, TWICE_HARD_PAYOUT)
            } else if total == 7 {
                Ok(Resolution::Lose)
            } else {
                pending()
            }
        }
        BetType::DifferentDoubles => {
            let distinct = bonus.doubles_mask.count_ones() as usize;
            if distinct == 6 {
                to_one(amount, DIFFERENT_DOUBLES_PAYOUTS[6])
            } else if total == 7 {
                match DIFFERENT_DOUBLES_PAYOUTS[distinct] {
                    0 => Ok(Resolution::Lose),
                    multiplier => to_one(amount, multiplier),
                }
            } else {
                pending()
            }
        }
        BetType::Muggsy => {
            if target == 0 {
                if total == 7 {
                    to_one(amount, MUGGSY_COME_OUT_PAYOUT)
                } else if is_point_number(total) {
                    Ok(Resolution::Working { target: total })
                } else {
                    Ok(Resolution::Lose)
                }
            } else if total == 7 {
                to_one(amount, MUGGSY_POINT_SEVEN_PAYOUT)
            } else {
                Ok(Resolution::Lose)
            }
        }
        _ => Err(EncodingError::InvalidBetType(bet as u8).into()),
    }
}
