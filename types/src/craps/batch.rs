//! Per-player, per-epoch wager ledger.
//!
//! A batch holds up to [MAX_BETS_PER_BATCH] packed wagers and tracks each slot
//! through four bitmasks:
//!
//! - `resolved`: the slot's outcome is known.
//! - `realizable`: the slot returns funds (a win or a push).
//! - `winning`: the slot won.
//! - `settled`: the slot's return has been claimed.
//!
//! Every mutation preserves `settled ⊆ realizable ⊆ resolved`,
//! `winning ⊆ realizable` and keeps all bits below `bet_count`.

use super::{
    checked_add, rng::read_bytes, CapacityError, ClaimError, CrapsError, PackedBet,
    MAX_BETS_PER_BATCH,
};
use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;

const RESERVED_LEN: usize = 31;

/// How a slot resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotOutcome {
    Lose,
    /// Stake returned.
    Push { returned: u64 },
    /// Stake plus winnings.
    Win { total_return: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BetBatch {
    player: PublicKey,
    epoch: u64,
    bet_count: u8,
    resolved: u16,
    realizable: u16,
    settled: u16,
    winning: u16,
    packed_bets: [PackedBet; MAX_BETS_PER_BATCH],
    individual_payouts: [u64; MAX_BETS_PER_BATCH],
    total_amount: u64,
    payout_total: u64,
    claimed_total: u64,
    last_settled_epoch: u64,
    targets: [u8; MAX_BETS_PER_BATCH],
    created_at: u64,
}

impl BetBatch {
    pub fn new(player: PublicKey, epoch: u64, created_at: u64) -> Self {
        Self {
            player,
            epoch,
            bet_count: 0,
            resolved: 0,
            realizable: 0,
            settled: 0,
            winning: 0,
            packed_bets: [PackedBet::default(); MAX_BETS_PER_BATCH],
            individual_payouts: [0; MAX_BETS_PER_BATCH],
            total_amount: 0,
            payout_total: 0,
            claimed_total: 0,
            last_settled_epoch: epoch.saturating_sub(1),
            targets: [0; MAX_BETS_PER_BATCH],
            created_at,
        }
    }

    pub fn player(&self) -> &PublicKey {
        &self.player
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn bet_count(&self) -> u8 {
        self.bet_count
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn payout_total(&self) -> u64 {
        self.payout_total
    }

    pub fn claimed_total(&self) -> u64 {
        self.claimed_total
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Most recent epoch outcome applied to this batch.
    pub fn last_settled_epoch(&self) -> u64 {
        self.last_settled_epoch
    }

    pub fn resolved_mask(&self) -> u16 {
        self.resolved
    }

    pub fn realizable_mask(&self) -> u16 {
        self.realizable
    }

    pub fn settled_mask(&self) -> u16 {
        self.settled
    }

    pub fn winning_mask(&self) -> u16 {
        self.winning
    }

    /// Bits for every occupied slot.
    pub fn placed_mask(&self) -> u16 {
        ((1u32 << self.bet_count) - 1) as u16
    }

    pub fn is_resolved(&self, slot: u8) -> bool {
        bit(self.resolved, slot)
    }

    pub fn is_realizable(&self, slot: u8) -> bool {
        bit(self.realizable, slot)
    }

    pub fn is_settled(&self, slot: u8) -> bool {
        bit(self.settled, slot)
    }

    pub fn is_winning(&self, slot: u8) -> bool {
        bit(self.winning, slot)
    }

    pub fn packed_bet(&self, slot: u8) -> Option<PackedBet> {
        (slot < self.bet_count).then(|| self.packed_bets[slot as usize])
    }

    pub fn target(&self, slot: u8) -> Option<u8> {
        (slot < self.bet_count).then(|| self.targets[slot as usize])
    }

    pub fn payout(&self, slot: u8) -> Option<u64> {
        (slot < self.bet_count).then(|| self.individual_payouts[slot as usize])
    }

    /// Occupied slots in placement order.
    pub fn bets(&self) -> impl Iterator<Item = (u8, PackedBet)> + '_ {
        self.packed_bets[..self.bet_count as usize]
            .iter()
            .enumerate()
            .map(|(i, p)| (i as u8, *p))
    }

    /// Occupied slots whose outcome is still open.
    pub fn open_slots(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.bet_count).filter(|slot| !self.is_resolved(*slot))
    }

    /// Append a wager, returning its slot.
    pub fn push(&mut self, packed: PackedBet, amount: u64, target: u8) -> Result<u8, CrapsError> {
        if self.bet_count as usize >= MAX_BETS_PER_BATCH {
            return Err(CapacityError::MaxBetsReached(MAX_BETS_PER_BATCH).into());
        }
        self.total_amount = checked_add(self.total_amount, amount, "batch total_amount")?;
        let slot = self.bet_count;
        self.packed_bets[slot as usize] = packed;
        self.targets[slot as usize] = target;
        self.bet_count += 1;
        Ok(slot)
    }

    /// Record the governing number of a multi-roll wager (for example a travelled come bet).
    pub fn set_target(&mut self, slot: u8, target: u8) -> Result<(), CrapsError> {
        self.open_slot(slot)?;
        self.targets[slot as usize] = target;
        Ok(())
    }

    pub fn resolve(&mut self, slot: u8, outcome: SlotOutcome) -> Result<(), CrapsError> {
        self.open_slot(slot)?;
        let flag = 1u16 << slot;
        let (payout, realizable, winning) = match outcome {
            SlotOutcome::Lose => (0, false, false),
            SlotOutcome::Push { returned } => (returned, true, false),
            SlotOutcome::Win { total_return } => (total_return, true, true),
        };
        self.payout_total = checked_add(self.payout_total, payout, "batch payout_total")?;
        if realizable {
            self.realizable |= flag;
        }
        if winning {
            self.winning |= flag;
        }
        self.individual_payouts[slot as usize] = payout;
        self.resolved |= flag;
        debug_assert!(self.check_invariants());
        Ok(())
    }

    /// Amount a claim on `slot` would pay.
    pub fn claimable(&self, slot: u8) -> Result<u64, CrapsError> {
        if slot >= self.bet_count {
            return Err(ClaimError::InvalidSlot(slot).into());
        }
        if !self.is_realizable(slot) || self.is_settled(slot) {
            return Err(ClaimError::NothingToClaim(slot).into());
        }
        Ok(self.individual_payouts[slot as usize])
    }

    /// Mark a realizable slot as paid, returning the amount.
    pub fn mark_settled(&mut self, slot: u8) -> Result<u64, CrapsError> {
        let amount = self.claimable(slot)?;
        self.claimed_total = checked_add(self.claimed_total, amount, "batch claimed_total")?;
        self.settled |= 1 << slot;
        debug_assert!(self.check_invariants());
        Ok(amount)
    }

    pub fn advance_outcome(&mut self, epoch: u64) {
        self.last_settled_epoch = self.last_settled_epoch.max(epoch);
    }

    /// Every wager is resolved and every return is claimed.
    pub fn is_fully_settled(&self) -> bool {
        self.resolved == self.placed_mask() && self.settled == self.realizable
    }

    pub fn check_invariants(&self) -> bool {
        let placed = self.placed_mask();
        self.bet_count as usize <= MAX_BETS_PER_BATCH
            && self.resolved & !placed == 0
            && self.realizable & !self.resolved == 0
            && self.settled & !self.realizable == 0
            && self.winning & !self.realizable == 0
            && self.claimed_total <= self.payout_total
    }

    fn open_slot(&self, slot: u8) -> Result<(), CrapsError> {
        if slot >= self.bet_count {
            return Err(ClaimError::InvalidSlot(slot).into());
        }
        if self.is_resolved(slot) {
            return Err(ClaimError::AlreadyResolved(slot).into());
        }
        Ok(())
    }
}

fn bit(mask: u16, slot: u8) -> bool {
    slot < 16 && mask & (1 << slot) != 0
}

impl Write for BetBatch {
    fn write(&self, writer: &mut impl BufMut) {
        self.player.write(writer);
        self.epoch.write(writer);
        self.bet_count.write(writer);
        self.resolved.write(writer);
        self.realizable.write(writer);
        self.settled.write(writer);
        self.winning.write(writer);
        for packed in &self.packed_bets {
            packed.write(writer);
        }
        for payout in &self.individual_payouts {
            payout.write(writer);
        }
        self.total_amount.write(writer);
        self.payout_total.write(writer);
        self.claimed_total.write(writer);
        self.last_settled_epoch.write(writer);
        writer.put_slice(&self.targets);
        self.created_at.write(writer);
        writer.put_slice(&[0u8; RESERVED_LEN]);
    }
}

impl Read for BetBatch {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let player = PublicKey::read(reader)?;
        let epoch = u64::read(reader)?;
        let bet_count = u8::read(reader)?;
        if bet_count as usize > MAX_BETS_PER_BATCH {
            return Err(Error::Invalid("BetBatch", "too many bets"));
        }
        let resolved = u16::read(reader)?;
        let realizable = u16::read(reader)?;
        let settled = u16::read(reader)?;
        let winning = u16::read(reader)?;
        let mut packed_bets = [PackedBet::default(); MAX_BETS_PER_BATCH];
        for packed in packed_bets.iter_mut() {
            *packed = PackedBet::read(reader)?;
        }
        let mut individual_payouts = [0u64; MAX_BETS_PER_BATCH];
        for payout in individual_payouts.iter_mut() {
            *payout = u64::read(reader)?;
        }
        let batch = Self {
            player,
            epoch,
            bet_count,
            resolved,
            realizable,
            settled,
            winning,
            packed_bets,
            individual_payouts,
            total_amount: u64::read(reader)?,
            payout_total: u64::read(reader)?,
            claimed_total: u64::read(reader)?,
            last_settled_epoch: u64::read(reader)?,
            targets: read_bytes(reader)?,
            created_at: u64::read(reader)?,
        };
        let _reserved: [u8; RESERVED_LEN] = read_bytes(reader)?;
        if !batch.check_invariants() {
            return Err(Error::Invalid("BetBatch", "inconsistent slot masks"));
        }
        Ok(batch)
    }
}

impl FixedSize for BetBatch {
    const SIZE: usize = PublicKey::SIZE
        + u64::SIZE
        + u8::SIZE
        + 4 * u16::SIZE
        + MAX_BETS_PER_BATCH * PackedBet::SIZE
        + MAX_BETS_PER_BATCH * u64::SIZE
        + 4 * u64::SIZE
        + MAX_BETS_PER_BATCH
        + u64::SIZE
        + RESERVED_LEN;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::craps::{encode_bet, BetType};
    use commonware_codec::{DecodeExt, Encode};
    use commonware_cryptography::{ed25519::PrivateKey, PrivateKeyExt, Signer};

    fn player() -> PublicKey {
        PrivateKey::from_seed(7).public_key()
    }

    fn batch_with(bets: &[(BetType, u64)]) -> BetBatch {
        let mut batch = BetBatch::new(player(), 3, 1_000);
        for (bet, amount) in bets {
            let packed = encode_bet(*bet as u8, *amount).unwrap();
            batch.push(packed, *amount, 0).unwrap();
        }
        batch
    }

    #[test]
    fn test_size() {
        assert_eq!(BetBatch::SIZE, 296);
        let batch = batch_with(&[(BetType::Pass, 100)]);
        assert_eq!(batch.encode().len(), 296);
    }

    #[test]
    fn test_capacity() {
        let mut batch = batch_with(&[(BetType::Field, 10); 16]);
        assert_eq!(batch.total_amount(), 160);
        let packed = encode_bet(BetType::Field as u8, 10).unwrap();
        assert_eq!(
            batch.push(packed, 10, 0),
            Err(CrapsError::Capacity(CapacityError::MaxBetsReached(16)))
        );
        assert_eq!(batch.placed_mask(), u16::MAX);
    }

    #[test]
    fn test_lifecycle_masks() {
        let mut batch = batch_with(&[
            (BetType::Pass, 100),
            (BetType::DontPass, 100),
            (BetType::Field, 50),
            (BetType::Hard4, 10),
        ]);
        assert_eq!(batch.resolved_mask(), 0);

        batch.resolve(0, SlotOutcome::Win { total_return: 200 }).unwrap();
        batch.resolve(1, SlotOutcome::Lose).unwrap();
        batch.resolve(2, SlotOutcome::Push { returned: 50 }).unwrap();

        assert_eq!(batch.resolved_mask(), 0b0111);
        assert_eq!(batch.realizable_mask(), 0b0101);
        assert_eq!(batch.winning_mask(), 0b0001);
        assert_eq!(batch.payout_total(), 250);
        assert_eq!(batch.open_slots().collect::<Vec<_>>(), vec![3]);
        assert!(!batch.is_fully_settled());

        assert_eq!(
            batch.resolve(0, SlotOutcome::Lose),
            Err(CrapsError::Claim(ClaimError::AlreadyResolved(0)))
        );

        assert_eq!(batch.mark_settled(0), Ok(200));
        assert_eq!(batch.mark_settled(2), Ok(50));
        assert_eq!(batch.claimed_total(), 250);
        batch.resolve(3, SlotOutcome::Lose).unwrap();
        assert!(batch.is_fully_settled());
        assert!(batch.check_invariants());
    }

    #[test]
    fn test_resolve_overflow_leaves_slot_open() {
        let mut batch = batch_with(&[(BetType::Field, 10), (BetType::Field, 10)]);
        batch
            .resolve(0, SlotOutcome::Win { total_return: u64::MAX })
            .unwrap();
        let before = batch.clone();

        assert!(matches!(
            batch.resolve(1, SlotOutcome::Win { total_return: 1 }),
            Err(CrapsError::Arithmetic(_))
        ));
        assert_eq!(batch, before);
        assert_eq!(batch.realizable_mask(), 0b01);
        assert_eq!(batch.winning_mask(), 0b01);
        assert_eq!(batch.open_slots().collect::<Vec<_>>(), vec![1]);
        assert!(batch.check_invariants());

        // the slot can still lose
        batch.resolve(1, SlotOutcome::Lose).unwrap();
        assert!(batch.check_invariants());
    }

    #[test]
    fn test_claim_errors() {
        let mut batch = batch_with(&[(BetType::Pass, 100), (BetType::Field, 10)]);
        assert_eq!(
            batch.mark_settled(0),
            Err(CrapsError::Claim(ClaimError::NothingToClaim(0)))
        );
        batch.resolve(1, SlotOutcome::Lose).unwrap();
        assert_eq!(
            batch.mark_settled(1),
            Err(CrapsError::Claim(ClaimError::NothingToClaim(1)))
        );
        assert_eq!(
            batch.mark_settled(5),
            Err(CrapsError::Claim(ClaimError::InvalidSlot(5)))
        );
        batch.resolve(0, SlotOutcome::Win { total_return: 200 }).unwrap();
        batch.mark_settled(0).unwrap();
        assert_eq!(
            batch.mark_settled(0),
            Err(CrapsError::Claim(ClaimError::NothingToClaim(0)))
        );
    }

    #[test]
    fn test_decode_preserves_state() {
        let mut batch = batch_with(&[(BetType::Come, 25), (BetType::Next7, 20)]);
        batch.set_target(0, 6).unwrap();
        batch.resolve(1, SlotOutcome::Win { total_return: 100 }).unwrap();
        batch.advance_outcome(3);

        let decoded = BetBatch::decode(batch.encode()).unwrap();
        assert_eq!(decoded, batch);
        assert_eq!(decoded.target(0), Some(6));
        assert_eq!(decoded.last_settled_epoch(), 3);
    }

    #[test]
    fn test_decode_rejects_inconsistent_masks() {
        let batch = batch_with(&[(BetType::Pass, 100)]);
        let mut encoded = batch.encode().to_vec();
        // realizable bit without the resolved bit
        let realizable_offset = 32 + 8 + 1 + 2;
        encoded[realizable_offset + 1] = 1;
        assert!(BetBatch::decode(&encoded[..]).is_err());
    }
}
