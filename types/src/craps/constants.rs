/// Maximum wagers a player may place in one epoch.
pub const MAX_BETS_PER_BATCH: usize = 16;

/// Maximum entropy sources an epoch can hold.
pub const MAX_ENTROPY_SOURCES: usize = 15;

/// Minimum entropy sources required before a roll can be finalized.
/// Raised from 5 to 10 to increase the cost of manipulating enough sources.
pub const MIN_ENTROPY_SOURCES: u8 = 10;

/// Length of an entropy value (and of each mixing block).
pub const ENTROPY_LEN: usize = 32;

/// Bytes of expanded entropy available to dice derivation.
pub const ENTROPY_BLOCK_LEN: usize = 128;

/// Domain separator mixed into every finalized roll.
pub const DICE_DOMAIN: &[u8] = b"_CRAPSVAULT_DICE";

/// Epochs a fully claimed batch is retained before it may be closed.
pub const DEFAULT_RETENTION_EPOCHS: u64 = 10;

/// Denominator for ratio limits expressed in basis points.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Largest share of the treasury balance a single disbursement may take (80%).
pub const DEFAULT_MAX_PAYOUT_RATIO_BPS: u16 = 8_000;

/// Share of the epoch-start balance that must remain after a disbursement (20%).
pub const DEFAULT_RESERVE_FLOOR_BPS: u16 = 2_000;

/// Default cap on a single payout or withdrawal.
pub const DEFAULT_MAX_SINGLE_DISBURSEMENT: u64 = 1_000_000;

/// Default cap on disbursements within one window.
pub const DEFAULT_MAX_HOURLY_DISBURSEMENT: u64 = 5_000_000;

/// Length of the rolling disbursement window in seconds.
pub const ONE_HOUR: u64 = 60 * 60;

/// Width of one disbursement bucket in seconds.
pub const WINDOW_BUCKET_SECONDS: u64 = 60;

/// Buckets spanning the rolling window.
pub const WINDOW_BUCKETS: usize = (ONE_HOUR / WINDOW_BUCKET_SECONDS) as usize;

/// Number of ways to roll each total with 2d6.
pub const WAYS: [u8; 13] = [0, 0, 1, 2, 3, 4, 5, 6, 5, 4, 3, 2, 1];
//                          0  1  2  3  4  5  6  7  8  9 10 11 12

/// Point numbers in the order used by per-point counters and the Fire mask.
pub const POINT_NUMBERS: [u8; 6] = [4, 5, 6, 8, 9, 10];

/// Line, come and field bets pay even money.
pub const EVEN_MONEY: (u64, u64) = (1, 1);

/// Field pays double on 2 and 12.
pub const FIELD_DOUBLE: (u64, u64) = (2, 1);

// Place (YES) payouts by number.
pub const PLACE_4_10: (u64, u64) = (9, 5);
pub const PLACE_5_9: (u64, u64) = (7, 5);
pub const PLACE_6_8: (u64, u64) = (7, 6);
pub const PLACE_3_11: (u64, u64) = (5, 2);
pub const PLACE_2_12: (u64, u64) = (5, 1);

// True odds behind a point.
pub const TRUE_ODDS_4_10: (u64, u64) = (2, 1);
pub const TRUE_ODDS_5_9: (u64, u64) = (3, 2);
pub const TRUE_ODDS_6_8: (u64, u64) = (6, 5);

// Hardway payouts.
pub const HARD_4_10: (u64, u64) = (7, 1);
pub const HARD_6_8: (u64, u64) = (9, 1);

/// NEXT (one-roll hop) payouts ("to 1") indexed by the number of ways to roll the total.
pub const NEXT_PAYOUT_BY_WAYS: [u64; 7] = [0, 30, 15, 10, 7, 5, 4];

/// Fire bet pay table ("to 1") by distinct points made: 4 -> 24, 5 -> 249, 6 -> 999.
pub const FIRE_PAYOUTS: [u64; 7] = [0, 0, 0, 0, 24, 249, 999];

// All Tall Small pay table ("to 1").
pub const ATS_SMALL_PAYOUT: u64 = 34;
pub const ATS_TALL_PAYOUT: u64 = 34;
pub const ATS_ALL_PAYOUT: u64 = 175;

// ATS progress bits: totals 2..6 => bits 0..4, 8..12 => bits 5..9.
pub const ATS_SMALL_MASK: u16 = 0b00000_11111;
pub const ATS_TALL_MASK: u16 = 0b11111_00000;
pub const ATS_ALL_MASK: u16 = ATS_SMALL_MASK | ATS_TALL_MASK;

/// Repeater payouts ("to 1") indexed by `total - 2`.
pub const REPEATER_PAYOUTS: [u64; 11] = [40, 50, 65, 80, 90, 0, 90, 80, 65, 50, 40];

/// Times each total must repeat before a seven, indexed by `total - 2`.
pub const REPEATER_REQUIRED: [u8; 11] = [2, 3, 4, 5, 6, 0, 6, 5, 4, 3, 2];

/// Hot Roller pay table ("to 1") by points made in the hand; seven or more pay the last entry.
pub const HOT_ROLLER_PAYOUTS: [u64; 8] = [0, 0, 1, 3, 7, 15, 30, 60];

/// Twice Hard pays when the same hardway is rolled twice before a seven.
pub const TWICE_HARD_PAYOUT: u64 = 6;

/// Ride the Line pay table ("to 1") by pass-line wins in the hand; six or more pay the last entry.
pub const RIDE_LINE_PAYOUTS: [u64; 7] = [0, 0, 0, 2, 4, 8, 15];

// Muggsy pays 2:1 on a come-out seven and 3:1 on a seven right after a point is set.
pub const MUGGSY_COME_OUT_PAYOUT: u64 = 2;
pub const MUGGSY_POINT_SEVEN_PAYOUT: u64 = 3;

// Replay pays on the same point made three times (by number) or four times.
pub const REPLAY_THREE_4_10: u64 = 120;
pub const REPLAY_THREE_5_9: u64 = 95;
pub const REPLAY_THREE_6_8: u64 = 70;
pub const REPLAY_FOUR_OR_MORE: u64 = 1_000;

/// Different Doubles pay table ("to 1") by distinct doubles rolled before a seven.
pub const DIFFERENT_DOUBLES_PAYOUTS: [u64; 7] = [0, 0, 0, 4, 8, 15, 100];

/// Maximum length of an error message carried in an event.
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 256;
