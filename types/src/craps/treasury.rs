use super::{
    checked_add, checked_sub, rng::read_bytes, CircuitBreakerError, CrapsError, BPS_DENOMINATOR,
    DEFAULT_MAX_HOURLY_DISBURSEMENT, DEFAULT_MAX_PAYOUT_RATIO_BPS, DEFAULT_MAX_SINGLE_DISBURSEMENT,
    DEFAULT_RESERVE_FLOOR_BPS, WINDOW_BUCKETS, WINDOW_BUCKET_SECONDS,
};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;
use serde::{Deserialize, Serialize};

/// Disbursement limits enforced on every payout and withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreasuryLimits {
    pub max_single_disbursement: u64,
    pub max_hourly_disbursement: u64,
    pub max_payout_ratio_bps: u16,
    pub reserve_floor_bps: u16,
}

impl Default for TreasuryLimits {
    fn default() -> Self {
        Self {
            max_single_disbursement: DEFAULT_MAX_SINGLE_DISBURSEMENT,
            max_hourly_disbursement: DEFAULT_MAX_HOURLY_DISBURSEMENT,
            max_payout_ratio_bps: DEFAULT_MAX_PAYOUT_RATIO_BPS,
            reserve_floor_bps: DEFAULT_RESERVE_FLOOR_BPS,
        }
    }
}

impl TreasuryLimits {
    pub fn validate(&self) -> Result<(), CrapsError> {
        let denominator = BPS_DENOMINATOR as u16;
        if self.max_single_disbursement == 0 || self.max_hourly_disbursement == 0 {
            return Err(CircuitBreakerError::InvalidLimits("caps must be non-zero").into());
        }
        if self.max_single_disbursement > self.max_hourly_disbursement {
            return Err(
                CircuitBreakerError::InvalidLimits("single cap exceeds the hourly cap").into(),
            );
        }
        if self.max_payout_ratio_bps == 0 || self.max_payout_ratio_bps > denominator {
            return Err(CircuitBreakerError::InvalidLimits("payout ratio out of range").into());
        }
        if self.reserve_floor_bps > denominator {
            return Err(CircuitBreakerError::InvalidLimits("reserve floor out of range").into());
        }
        Ok(())
    }
}

impl Write for TreasuryLimits {
    fn write(&self, writer: &mut impl BufMut) {
        self.max_single_disbursement.write(writer);
        self.max_hourly_disbursement.write(writer);
        self.max_payout_ratio_bps.write(writer);
        self.reserve_floor_bps.write(writer);
    }
}

impl Read for TreasuryLimits {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            max_single_disbursement: u64::read(reader)?,
            max_hourly_disbursement: u64::read(reader)?,
            max_payout_ratio_bps: u16::read(reader)?,
            reserve_floor_bps: u16::read(reader)?,
        })
    }
}

impl FixedSize for TreasuryLimits {
    const SIZE: usize = u64::SIZE + u64::SIZE + u16::SIZE + u16::SIZE;
}

/// Disbursed amount within one minute of the rolling window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowBucket {
    pub minute: u64,
    pub amount: u64,
}

impl Write for WindowBucket {
    fn write(&self, writer: &mut impl BufMut) {
        self.minute.write(writer);
        self.amount.write(writer);
    }
}

impl Read for WindowBucket {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            minute: u64::read(reader)?,
            amount: u64::read(reader)?,
        })
    }
}

impl FixedSize for WindowBucket {
    const SIZE: usize = u64::SIZE + u64::SIZE;
}

/// Rolling hourly record of disbursements, one bucket per minute.
///
/// Bucket `minute % WINDOW_BUCKETS` holds the amount disbursed during that
/// minute. A bucket counts toward [DisbursementWindow::disbursed] while its
/// minute is one of the last [WINDOW_BUCKETS] minutes, so every disbursement
/// in `(now - ONE_HOUR, now]` is counted (plus, at most, the rest of the
/// oldest minute).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisbursementWindow {
    buckets: [WindowBucket; WINDOW_BUCKETS],
}

impl Default for DisbursementWindow {
    fn default() -> Self {
        Self {
            buckets: [WindowBucket::default(); WINDOW_BUCKETS],
        }
    }
}

impl DisbursementWindow {
    fn minute(now: u64) -> u64 {
        now / WINDOW_BUCKET_SECONDS
    }

    /// Amount disbursed over the hour ending at `now`.
    pub fn disbursed(&self, now: u64) -> u64 {
        let current = Self::minute(now);
        let oldest = current.saturating_sub(WINDOW_BUCKETS as u64 - 1);
        self.buckets
            .iter()
            .filter(|bucket| (oldest..=current).contains(&bucket.minute))
            .fold(0u64, |total, bucket| total.saturating_add(bucket.amount))
    }

    /// Add `amount` to the bucket for `now`, recycling it if it holds an older minute.
    pub fn record(&mut self, now: u64, amount: u64) -> Result<(), CrapsError> {
        let minute = Self::minute(now);
        let bucket = &mut self.buckets[(minute % WINDOW_BUCKETS as u64) as usize];
        let base = if bucket.minute == minute {
            bucket.amount
        } else {
            0
        };
        let amount = checked_add(base, amount, "window_disbursed")?;
        *bucket = WindowBucket { minute, amount };
        Ok(())
    }
}

impl Write for DisbursementWindow {
    fn write(&self, writer: &mut impl BufMut) {
        for bucket in &self.buckets {
            bucket.write(writer);
        }
    }
}

impl Read for DisbursementWindow {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let mut window = Self::default();
        for bucket in window.buckets.iter_mut() {
            *bucket = WindowBucket::read(reader)?;
        }
        Ok(window)
    }
}

impl FixedSize for DisbursementWindow {
    const SIZE: usize = WINDOW_BUCKETS * WindowBucket::SIZE;
}

/// The shared bankroll every payout is drawn from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Treasury {
    pub authority: PublicKey,
    pub mint: [u8; 32],
    pub vault: [u8; 32],
    pub total_deposits: u64,
    pub total_withdrawals: u64,
    pub total_payouts: u64,
    pub total_wagered: u64,
    pub limits: TreasuryLimits,
    pub window: DisbursementWindow,
    pub epoch_start_balance: u64,
    pub halted: bool,
}

impl Treasury {
    pub fn new(authority: PublicKey, mint: [u8; 32], vault: [u8; 32], limits: TreasuryLimits) -> Self {
        Self {
            authority,
            mint,
            vault,
            total_deposits: 0,
            total_withdrawals: 0,
            total_payouts: 0,
            total_wagered: 0,
            limits,
            window: DisbursementWindow::default(),
            epoch_start_balance: 0,
            halted: false,
        }
    }

    /// Funds currently held: deposits and wagers in, withdrawals and payouts out.
    pub fn balance(&self) -> Result<u64, CrapsError> {
        let inflow = checked_add(self.total_deposits, self.total_wagered, "treasury inflow")?;
        let outflow = checked_add(
            self.total_withdrawals,
            self.total_payouts,
            "treasury outflow",
        )?;
        checked_sub(inflow, outflow, "treasury balance")
    }

    pub fn is_authority(&self, key: &PublicKey) -> bool {
        &self.authority == key
    }
}

impl Write for Treasury {
    fn write(&self, writer: &mut impl BufMut) {
        self.authority.write(writer);
        writer.put_slice(&self.mint);
        writer.put_slice(&self.vault);
        self.total_deposits.write(writer);
        self.total_withdrawals.write(writer);
        self.total_payouts.write(writer);
        self.total_wagered.write(writer);
        self.limits.write(writer);
        self.window.write(writer);
        self.epoch_start_balance.write(writer);
        self.halted.write(writer);
    }
}

impl Read for Treasury {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            authority: PublicKey::read(reader)?,
            mint: read_bytes(reader)?,
            vault: read_bytes(reader)?,
            total_deposits: u64::read(reader)?,
            total_withdrawals: u64::read(reader)?,
            total_payouts: u64::read(reader)?,
            total_wagered: u64::read(reader)?,
            limits: TreasuryLimits::read(reader)?,
            window: DisbursementWindow::read(reader)?,
            epoch_start_balance: u64::read(reader)?,
            halted: bool::read(reader)?,
        })
    }
}

impl FixedSize for Treasury {
    const SIZE: usize = PublicKey::SIZE
        + 32
        + 32
        + 4 * u64::SIZE
        + TreasuryLimits::SIZE
        + DisbursementWindow::SIZE
        + u64::SIZE
        + bool::SIZE;
}

/// Authority-only controls over the treasury.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmergencyKind {
    Halt,
    Resume,
    UpdateLimits(TreasuryLimits),
    TransferAuthority(PublicKey),
}

impl Write for EmergencyKind {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Halt => 0u8.write(writer),
            Self::Resume => 1u8.write(writer),
            Self::UpdateLimits(limits) => {
                2u8.write(writer);
                limits.write(writer);
            }
            Self::TransferAuthority(key) => {
                3u8.write(writer);
                key.write(writer);
            }
        }
    }
}

impl Read for EmergencyKind {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::Halt),
            1 => Ok(Self::Resume),
            2 => Ok(Self::UpdateLimits(TreasuryLimits::read(reader)?)),
            3 => Ok(Self::TransferAuthority(PublicKey::read(reader)?)),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl EncodeSize for EmergencyKind {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Halt | Self::Resume => 0,
                Self::UpdateLimits(_) => TreasuryLimits::SIZE,
                Self::TransferAuthority(_) => PublicKey::SIZE,
            }
    }
}
