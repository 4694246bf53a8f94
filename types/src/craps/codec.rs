//! Packing of (bet type, stake) into a single `u16`.
//!
//! The high 6 bits hold the [BetType] and the low 10 bits hold an index into an
//! [AmountTable]. Stakes are not a continuous range: the table is split into
//! tiers whose step grows with the stake, so every valid stake has exactly one
//! index and any other value is rejected instead of rounded.

use super::{BetType, EncodingError};
use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const BET_TYPE_SHIFT: u32 = 10;
pub const AMOUNT_INDEX_MASK: u16 = 0x3FF;
pub const MAX_BET_TYPE: u8 = 63;

/// Largest number of stakes that fit in the index bits.
pub const AMOUNT_INDEX_CAPACITY: usize = 1 << BET_TYPE_SHIFT;

/// One tier of stakes: every multiple of `step` above the previous tier's `end`, up to `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountTier {
    pub end: u64,
    pub step: u64,
}

/// The production stake tiers (768 stakes from 1 to 100_000).
pub const DEFAULT_TIERS: [AmountTier; 10] = [
    AmountTier { end: 100, step: 1 },
    AmountTier { end: 500, step: 5 },
    AmountTier { end: 1_500, step: 10 },
    AmountTier { end: 5_000, step: 25 },
    AmountTier { end: 10_000, step: 50 },
    AmountTier { end: 20_000, step: 100 },
    AmountTier { end: 40_000, step: 250 },
    AmountTier { end: 60_000, step: 500 },
    AmountTier { end: 80_000, step: 1_000 },
    AmountTier { end: 100_000, step: 2_500 },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Tier {
    /// Exclusive lower bound.
    start: u64,
    end: u64,
    step: u64,
    first_index: u16,
    len: u16,
}

/// Bijective mapping between valid stakes and 10-bit indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AmountTable {
    tiers: Vec<Tier>,
    len: u16,
}

impl AmountTable {
    /// Build a table from tier rows, rejecting rows that would make the mapping ambiguous.
    pub fn new(rows: &[AmountTier]) -> Result<Self, EncodingError> {
        if rows.is_empty() {
            return Err(EncodingError::InvalidTierTable("no tiers"));
        }
        let mut start = 0u64;
        let mut total = 0usize;
        for row in rows {
            if row.step == 0 {
                return Err(EncodingError::InvalidTierTable("zero step"));
            }
            if row.end <= start {
                return Err(EncodingError::InvalidTierTable("tier ends must increase"));
            }
            let width = row.end - start;
            if width % row.step != 0 {
                return Err(EncodingError::InvalidTierTable(
                    "step must divide the tier width",
                ));
            }
            total = total.saturating_add((width / row.step) as usize);
            if total > AMOUNT_INDEX_CAPACITY {
                return Err(EncodingError::InvalidTierTable("too many stakes"));
            }
            start = row.end;
        }
        Ok(Self::build(rows))
    }

    /// The table described by [DEFAULT_TIERS].
    pub fn standard() -> Self {
        Self::build(&DEFAULT_TIERS)
    }

    fn build(rows: &[AmountTier]) -> Self {
        let mut tiers = Vec::with_capacity(rows.len());
        let mut start = 0u64;
        let mut first_index = 0u16;
        for row in rows {
            let len = ((row.end - start) / row.step) as u16;
            tiers.push(Tier {
                start,
                end: row.end,
                step: row.step,
                first_index,
                len,
            });
            first_index += len;
            start = row.end;
        }
        Self {
            tiers,
            len: first_index,
        }
    }

    /// Number of valid stakes.
    pub fn len(&self) -> u16 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Smallest valid stake.
    pub fn min_amount(&self) -> u64 {
        self.tiers.first().map(|t| t.start + t.step).unwrap_or(0)
    }

    /// Largest valid stake.
    pub fn max_amount(&self) -> u64 {
        self.tiers.last().map(|t| t.end).unwrap_or(0)
    }

    pub fn encode_amount(&self, amount: u64) -> Result<u16, EncodingError> {
        let tier = self
            .tiers
            .iter()
            .find(|t| amount > t.start && amount <= t.end)
            .ok_or(EncodingError::InvalidAmount(amount))?;
        let offset = amount - tier.start;
        if offset % tier.step != 0 {
            return Err(EncodingError::InvalidAmount(amount));
        }
        Ok(tier.first_index + (offset / tier.step - 1) as u16)
    }

    pub fn decode_amount(&self, index: u16) -> Result<u64, EncodingError> {
        let tier = self
            .tiers
            .iter()
            .find(|t| index >= t.first_index && index < t.first_index + t.len)
            .ok_or(EncodingError::InvalidIndex(index))?;
        let k = (index - tier.first_index) as u64 + 1;
        Ok(tier.start + k * tier.step)
    }

    pub fn encode_bet(&self, bet_type: u8, amount: u64) -> Result<PackedBet, EncodingError> {
        if bet_type > MAX_BET_TYPE {
            return Err(EncodingError::InvalidBetType(bet_type));
        }
        let index = self.encode_amount(amount)?;
        Ok(PackedBet(
            ((bet_type as u16) << BET_TYPE_SHIFT) | (index & AMOUNT_INDEX_MASK),
        ))
    }

    pub fn decode_bet(&self, packed: PackedBet) -> Result<(BetType, u64), EncodingError> {
        let bet_type = packed.bet_type()?;
        let amount = self.decode_amount(packed.amount_index())?;
        Ok((bet_type, amount))
    }

    /// Every valid stake in ascending order.
    pub fn amounts(&self) -> impl Iterator<Item = u64> + '_ {
        self.tiers
            .iter()
            .flat_map(|t| (1..=t.len as u64).map(move |k| t.start + k * t.step))
    }
}

impl Default for AmountTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Shared instance of the standard table.
pub fn standard_table() -> &'static AmountTable {
    static TABLE: OnceLock<AmountTable> = OnceLock::new();
    TABLE.get_or_init(AmountTable::standard)
}

pub fn encode_amount(amount: u64) -> Result<u16, EncodingError> {
    standard_table().encode_amount(amount)
}

pub fn decode_amount(index: u16) -> Result<u64, EncodingError> {
    standard_table().decode_amount(index)
}

pub fn encode_bet(bet_type: u8, amount: u64) -> Result<PackedBet, EncodingError> {
    standard_table().encode_bet(bet_type, amount)
}

pub fn decode_bet(packed: PackedBet) -> Result<(BetType, u64), EncodingError> {
    standard_table().decode_bet(packed)
}

/// A wager packed into 16 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PackedBet(u16);

impl PackedBet {
    pub fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u16 {
        self.0
    }

    pub fn bet_type(&self) -> Result<BetType, EncodingError> {
        let tag = (self.0 >> BET_TYPE_SHIFT) as u8;
        BetType::try_from(tag).map_err(|_| EncodingError::InvalidBetType(tag))
    }

    pub fn amount_index(&self) -> u16 {
        self.0 & AMOUNT_INDEX_MASK
    }
}

impl Write for PackedBet {
    fn write(&self, writer: &mut impl BufMut) {
        self.0.write(writer);
    }
}

impl Read for PackedBet {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self(u16::read(reader)?))
    }
}

impl FixedSize for PackedBet {
    const SIZE: usize = u16::SIZE;
}
