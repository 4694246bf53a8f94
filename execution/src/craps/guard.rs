//! Circuit breaker in front of every treasury disbursement.
//!
//! Checks run in a fixed order and the first failure wins: halted, single
//! transaction cap, hourly cap, payout ratio, reserve floor. Nothing is
//! mutated unless every check passes.

use commonware_cryptography::ed25519::PublicKey;
use crapsvault_types::craps::{
    checked_add, AuthorityError, CircuitBreakerError, CrapsError, EmergencyKind, Treasury,
    BPS_DENOMINATOR,
};
use tracing::{info, warn};

/// Where a disbursement goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disbursement {
    Payout,
    Withdrawal,
}

pub fn check_disbursement(treasury: &Treasury, amount: u64, now: u64) -> Result<(), CrapsError> {
    let limits = &treasury.limits;
    if treasury.halted {
        return Err(CircuitBreakerError::Halted.into());
    }
    if amount > limits.max_single_disbursement {
        return Err(CircuitBreakerError::SingleTransactionCap {
            amount,
            cap: limits.max_single_disbursement,
        }
        .into());
    }
    let remaining = limits
        .max_hourly_disbursement
        .saturating_sub(treasury.window.disbursed(now));
    if amount > remaining {
        return Err(CircuitBreakerError::HourlyCap { amount, remaining }.into());
    }
    let balance = treasury.balance()?;
    if (amount as u128) * (BPS_DENOMINATOR as u128)
        > (balance as u128) * (limits.max_payout_ratio_bps as u128)
    {
        return Err(CircuitBreakerError::PayoutRatio {
            amount,
            balance,
            max_bps: limits.max_payout_ratio_bps,
        }
        .into());
    }
    let floor = ((treasury.epoch_start_balance as u128) * (limits.reserve_floor_bps as u128)
        / (BPS_DENOMINATOR as u128)) as u64;
    let remaining = balance.saturating_sub(amount);
    if remaining < floor {
        return Err(CircuitBreakerError::ReserveFloor { remaining, floor }.into());
    }
    Ok(())
}

/// Validate and record a disbursement against the window and running totals.
pub fn disburse(
    treasury: &mut Treasury,
    amount: u64,
    now: u64,
    kind: Disbursement,
) -> Result<(), CrapsError> {
    if let Err(err) = check_disbursement(treasury, amount, now) {
        warn!(amount, ?kind, %err, "disbursement blocked");
        return Err(err);
    }
    let mut window = treasury.window;
    window.record(now, amount)?;
    let total = match kind {
        Disbursement::Payout => checked_add(treasury.total_payouts, amount, "total_payouts")?,
        Disbursement::Withdrawal => {
            checked_add(treasury.total_withdrawals, amount, "total_withdrawals")?
        }
    };

    treasury.window = window;
    match kind {
        Disbursement::Payout => treasury.total_payouts = total,
        Disbursement::Withdrawal => treasury.total_withdrawals = total,
    }
    Ok(())
}

/// Apply an authority-only control.
pub fn apply_emergency(
    treasury: &mut Treasury,
    caller: &PublicKey,
    kind: &EmergencyKind,
) -> Result<(), CrapsError> {
    if !treasury.is_authority(caller) {
        return Err(AuthorityError::Unauthorized("emergency operation").into());
    }
    match kind {
        EmergencyKind::Halt => treasury.halted = true,
        EmergencyKind::Resume => treasury.halted = false,
        EmergencyKind::UpdateLimits(limits) => {
            limits.validate()?;
            treasury.limits = *limits;
        }
        EmergencyKind::TransferAuthority(key) => treasury.authority = key.clone(),
    }
    info!(?kind, halted = treasury.halted, "treasury control applied");
    Ok(())
}
