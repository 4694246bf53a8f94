//! Commit-reveal dice for one epoch.
//!
//! An epoch moves Betting -> Collecting -> Finalized. Entropy sources are
//! accepted only while collecting, in strictly increasing slot order, and the
//! dice are derived from a SHA-256 mix of every source once enough have been
//! collected.

use commonware_cryptography::{sha256::Sha256, Hasher};
use crapsvault_types::craps::{
    CrapsError, EngineConfig, EntropyError, EntropySource, PhaseError, RngPhase, RngState,
    DICE_DOMAIN, ENTROPY_BLOCK_LEN, ENTROPY_LEN, MAX_ENTROPY_SOURCES,
};

/// Open betting. Advances the epoch when the previous one was finalized (or
/// none exists) and restarts the current epoch otherwise. A restart keeps the
/// discarded sources' slots consumed.
pub fn start_betting_phase(previous: Option<&RngState>, now: u64) -> RngState {
    let (epoch, slot_floor) = match previous {
        None => (1, 0),
        Some(state) if state.phase == RngPhase::Finalized => (state.epoch + 1, 0),
        Some(state) => (
            state.epoch,
            state
                .last_slot()
                .map_or(state.slot_floor, |last| last.saturating_add(1)),
        ),
    };
    RngState {
        epoch,
        phase: RngPhase::Betting,
        phase_started_at: now,
        slot_floor,
        sources: Vec::new(),
        dice: [0, 0],
    }
}

pub fn close_betting(state: &mut RngState, now: u64) -> Result<(), CrapsError> {
    if state.phase != RngPhase::Betting {
        return Err(PhaseError::NotBetting(state.phase).into());
    }
    state.phase = RngPhase::Collecting;
    state.phase_started_at = now;
    Ok(())
}

/// Append an entropy source, returning the new source count.
pub fn collect_entropy_source(
    state: &mut RngState,
    source: EntropySource,
) -> Result<u8, CrapsError> {
    if state.phase != RngPhase::Collecting {
        return Err(PhaseError::NotCollecting(state.phase).into());
    }
    if state.sources.len() >= MAX_ENTROPY_SOURCES {
        return Err(EntropyError::EntropyBufferFull(MAX_ENTROPY_SOURCES).into());
    }
    if source.is_predictable() {
        return Err(EntropyError::PredictableEntropySource(source.slot).into());
    }
    let stale = !state.accepts_slot(source.slot);
    let reused = state.sources.iter().any(|s| s.value == source.value);
    if stale || reused {
        return Err(EntropyError::DuplicateEntropySource(source.slot).into());
    }
    state.sources.push(source);
    Ok(state.hash_count())
}

/// Fix the epoch's dice.
pub fn finalize(
    state: &mut RngState,
    config: &EngineConfig,
    required: u8,
) -> Result<(u8, u8), CrapsError> {
    if state.phase != RngPhase::Collecting {
        return Err(PhaseError::NotCollecting(state.phase).into());
    }
    let required = config.required_sources(required);
    if state.hash_count() < required {
        return Err(EntropyError::InsufficientEntropy {
            collected: state.hash_count(),
            required,
        }
        .into());
    }
    let seed = mix_entropy(state.epoch, &state.sources);
    let (die1, die2) = EntropyBlock::expand(seed).roll_dice().ok_or(
        EntropyError::InsufficientEntropy {
            collected: state.hash_count(),
            required,
        },
    )?;
    state.dice = [die1, die2];
    state.phase = RngPhase::Finalized;
    Ok((die1, die2))
}

/// Domain-separated digest of every source in collection order.
pub fn mix_entropy(epoch: u64, sources: &[EntropySource]) -> [u8; ENTROPY_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(DICE_DOMAIN);
    hasher.update(&epoch.to_be_bytes());
    for source in sources {
        hasher.update(&source.slot.to_be_bytes());
        hasher.update(&source.value);
    }
    hasher.finalize().0
}

/// Finite byte stream used for rejection-sampled dice.
pub struct EntropyBlock {
    bytes: [u8; ENTROPY_BLOCK_LEN],
    index: usize,
}

impl EntropyBlock {
    /// Expand a seed with a SHA-256 chain: `seed || H(seed) || H(H(seed)) || ...`.
    pub fn expand(seed: [u8; ENTROPY_LEN]) -> Self {
        let mut bytes = [0u8; ENTROPY_BLOCK_LEN];
        let mut link = seed;
        for chunk in bytes.chunks_mut(ENTROPY_LEN) {
            chunk.copy_from_slice(&link[..chunk.len()]);
            let mut hasher = Sha256::new();
            hasher.update(&link);
            link = hasher.finalize().0;
        }
        Self { bytes, index: 0 }
    }

    pub fn from_bytes(bytes: [u8; ENTROPY_BLOCK_LEN]) -> Self {
        Self { bytes, index: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        ENTROPY_BLOCK_LEN - self.index
    }

    fn next_pair(&mut self) -> Option<(u8, u8)> {
        if self.remaining() < 2 {
            return None;
        }
        let pair = (self.bytes[self.index], self.bytes[self.index + 1]);
        self.index += 2;
        Some(pair)
    }

    /// Take byte pairs until both map (`byte % 8`) below 6. `None` once the
    /// block runs out.
    pub fn roll_dice(&mut self) -> Option<(u8, u8)> {
        while let Some((a, b)) = self.next_pair() {
            let (a, b) = (a % 8, b % 8);
            if a < 6 && b < 6 {
                return Some((a + 1, b + 1));
            }
        }
        None
    }
}
