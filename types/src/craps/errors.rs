//! Error taxonomy for every table operation.
//!
//! Each kind of failure lives in its own enum so callers can match on the
//! category they care about. [CrapsError] wraps them and assigns each variant a
//! stable numeric code (`kind * 100 + variant`) that is carried in error events.

use super::{BetType, RngPhase};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("amount {0} is not a valid stake")]
    InvalidAmount(u64),
    #[error("bet type {0} is out of range")]
    InvalidBetType(u8),
    #[error("amount index {0} is out of range")]
    InvalidIndex(u16),
    #[error("invalid amount tier table: {0}")]
    InvalidTierTable(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    #[error("table has not been initialized")]
    NotInitialized,
    #[error("operation requires the betting phase (currently {0:?})")]
    NotBetting(RngPhase),
    #[error("operation requires the collecting phase (currently {0:?})")]
    NotCollecting(RngPhase),
    #[error("epoch {0} has no finalized outcome")]
    NotFinalized(u64),
    #[error("{bet:?} cannot be placed now: {reason}")]
    BetNotAllowed { bet: BetType, reason: &'static str },
    #[error("batch for epoch {epoch} cannot be closed yet: {reason}")]
    BatchNotClosable { epoch: u64, reason: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapacityError {
    #[error("bet batch already holds the maximum of {0} wagers")]
    MaxBetsReached(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntropyError {
    #[error("entropy source at slot {0} was already consumed")]
    DuplicateEntropySource(u64),
    #[error("entropy source at slot {0} is predictable")]
    PredictableEntropySource(u64),
    /// Too few sources, or the mixed block yielded no accepted dice pair.
    #[error("insufficient entropy: {collected} sources collected, {required} required")]
    InsufficientEntropy { collected: u8, required: u8 },
    #[error("entropy buffer is full ({0} sources)")]
    EntropyBufferFull(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("{0} overflowed")]
    Overflow(&'static str),
    #[error("{0} underflowed")]
    Underflow(&'static str),
    #[error("insufficient balance: {available} available, {required} required")]
    InsufficientBalance { available: u64, required: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    #[error("caller is not the table authority ({0})")]
    Unauthorized(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitBreakerError {
    #[error("treasury is halted")]
    Halted,
    #[error("disbursement {amount} exceeds the single transaction cap {cap}")]
    SingleTransactionCap { amount: u64, cap: u64 },
    #[error("disbursement {amount} exceeds the hourly remainder {remaining}")]
    HourlyCap { amount: u64, remaining: u64 },
    #[error("disbursement {amount} exceeds {max_bps} bps of balance {balance}")]
    PayoutRatio { amount: u64, balance: u64, max_bps: u16 },
    #[error("disbursement would leave {remaining}, below the reserve floor {floor}")]
    ReserveFloor { remaining: u64, floor: u64 },
    #[error("invalid treasury limits: {0}")]
    InvalidLimits(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("no batch exists for epoch {0}")]
    BatchNotFound(u64),
    #[error("slot {0} does not hold a wager")]
    InvalidSlot(u8),
    #[error("slot {0} has nothing to claim")]
    NothingToClaim(u8),
    #[error("slot {0} is already resolved")]
    AlreadyResolved(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrapsError {
    #[error("encoding: {0}")]
    Encoding(#[from] EncodingError),
    #[error("phase: {0}")]
    Phase(#[from] PhaseError),
    #[error("capacity: {0}")]
    Capacity(#[from] CapacityError),
    #[error("entropy: {0}")]
    Entropy(#[from] EntropyError),
    #[error("arithmetic: {0}")]
    Arithmetic(#[from] ArithmeticError),
    #[error("authority: {0}")]
    Authority(#[from] AuthorityError),
    #[error("circuit breaker: {0}")]
    CircuitBreaker(#[from] CircuitBreakerError),
    #[error("claim: {0}")]
    Claim(#[from] ClaimError),
}

impl CrapsError {
    pub fn code(&self) -> u16 {
        let (kind, variant) = match self {
            Self::Encoding(e) => (
                1,
                match e {
                    EncodingError::InvalidAmount(_) => 1,
                    EncodingError::InvalidBetType(_) => 2,
                    EncodingError::InvalidIndex(_) => 3,
                    EncodingError::InvalidTierTable(_) => 4,
                },
            ),
            Self::Phase(e) => (
                2,
                match e {
                    PhaseError::NotInitialized => 1,
                    PhaseError::NotBetting(_) => 2,
                    PhaseError::NotCollecting(_) => 3,
                    PhaseError::NotFinalized(_) => 4,
                    PhaseError::BetNotAllowed { .. } => 5,
                    PhaseError::BatchNotClosable { .. } => 6,
                },
            ),
            Self::Capacity(e) => (
                3,
                match e {
                    CapacityError::MaxBetsReached(_) => 1,
                },
            ),
            Self::Entropy(e) => (
                4,
                match e {
                    EntropyError::DuplicateEntropySource(_) => 1,
                    EntropyError::PredictableEntropySource(_) => 2,
                    EntropyError::InsufficientEntropy { .. } => 3,
                    EntropyError::EntropyBufferFull(_) => 4,
                },
            ),
            Self::Arithmetic(e) => (
                5,
                match e {
                    ArithmeticError::Overflow(_) => 1,
                    ArithmeticError::Underflow(_) => 2,
                    ArithmeticError::InsufficientBalance { .. } => 3,
                },
            ),
            Self::Authority(e) => (
                6,
                match e {
                    AuthorityError::Unauthorized(_) => 1,
                },
            ),
            Self::CircuitBreaker(e) => (
                7,
                match e {
                    CircuitBreakerError::Halted => 1,
                    CircuitBreakerError::SingleTransactionCap { .. } => 2,
                    CircuitBreakerError::HourlyCap { .. } => 3,
                    CircuitBreakerError::PayoutRatio { .. } => 4,
                    CircuitBreakerError::ReserveFloor { .. } => 5,
                    CircuitBreakerError::InvalidLimits(_) => 6,
                },
            ),
            Self::Claim(e) => (
                8,
                match e {
                    ClaimError::BatchNotFound(_) => 1,
                    ClaimError::InvalidSlot(_) => 2,
                    ClaimError::NothingToClaim(_) => 3,
                    ClaimError::AlreadyResolved(_) => 4,
                },
            ),
        };
        kind * 100 + variant
    }
}

/// Checked addition that reports which counter overflowed.
pub fn checked_add(a: u64, b: u64, counter: &'static str) -> Result<u64, CrapsError> {
    a.checked_add(b)
        .ok_or(CrapsError::Arithmetic(ArithmeticError::Overflow(counter)))
}

/// Checked subtraction that reports which counter underflowed.
pub fn checked_sub(a: u64, b: u64, counter: &'static str) -> Result<u64, CrapsError> {
    a.checked_sub(b)
        .ok_or(CrapsError::Arithmetic(ArithmeticError::Underflow(counter)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_grouped_by_kind() {
        assert_eq!(CrapsError::from(EncodingError::InvalidAmount(102)).code(), 101);
        assert_eq!(CrapsError::from(CapacityError::MaxBetsReached(16)).code(), 301);
        assert_eq!(
            CrapsError::from(CircuitBreakerError::ReserveFloor {
                remaining: 1,
                floor: 2
            })
            .code(),
            705
        );
        assert_eq!(CrapsError::from(ClaimError::NothingToClaim(3)).code(), 803);
        assert_eq!(
            CrapsError::from(EntropyError::EntropyBufferFull(15)).code(),
            404
        );
    }

    #[test]
    fn test_messages_are_readable() {
        let err = CrapsError::from(EntropyError::InsufficientEntropy {
            collected: 4,
            required: 10,
        });
        assert_eq!(
            err.to_string(),
            "entropy: insufficient entropy: 4 sources collected, 10 required"
        );
    }

    #[test]
    fn test_checked_helpers() {
        assert_eq!(checked_add(1, 2, "total"), Ok(3));
        assert_eq!(
            checked_add(u64::MAX, 1, "total"),
            Err(CrapsError::Arithmetic(ArithmeticError::Overflow("total")))
        );
        assert_eq!(
            checked_sub(1, 2, "balance"),
            Err(CrapsError::Arithmetic(ArithmeticError::Underflow("balance")))
        );
    }
}
