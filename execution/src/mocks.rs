use crate::{seed_genesis, state_transition, Memory, State};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    PrivateKeyExt, Signer,
};
use crapsvault_types::{
    craps::{EngineConfig, EntropySource, Treasury, TreasuryLimits, ENTROPY_LEN},
    execution::{Instruction, Key, Output, Transaction, Value},
};
use rand::{rngs::StdRng, RngCore, SeedableRng};

/// Wall-clock seconds used as "now" by tests.
pub const TEST_NOW: u64 = 1_700_000_000;

/// Creates an account keypair for Ed25519 signatures used by users
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let mut rng = StdRng::seed_from_u64(seed);
    let private = PrivateKey::from_rng(&mut rng);
    let public = private.public_key();
    (private, public)
}

/// Creates `count` distinct, non-zero entropy sources at consecutive slots.
pub fn create_entropy_sources(seed: u64, first_slot: u64, count: usize) -> Vec<EntropySource> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count as u64)
        .map(|i| {
            let mut value = [0u8; ENTROPY_LEN];
            rng.fill_bytes(&mut value);
            value[0] |= 1;
            EntropySource::new(first_slot + i, value)
        })
        .collect()
}

/// In-memory table with a funded treasury and funded players.
pub struct Genesis {
    pub state: Memory,
    pub authority: (PrivateKey, PublicKey),
    pub players: Vec<(PrivateKey, PublicKey)>,
}

/// Seeds a treasury holding `funds` (authority key from seed 0) and one
/// player per entry of `balances` (keys from seeds 1, 2, ...).
pub async fn create_genesis(funds: u64, balances: &[u64]) -> Genesis {
    let authority = create_account_keypair(0);
    let players: Vec<_> = (1..=balances.len() as u64)
        .map(create_account_keypair)
        .collect();

    let mut treasury = Treasury::new(
        authority.1.clone(),
        [1; 32],
        [2; 32],
        TreasuryLimits::default(),
    );
    treasury.total_deposits = funds;
    let opening: Vec<_> = players
        .iter()
        .zip(balances)
        .map(|((_, public), amount)| (public.clone(), *amount))
        .collect();

    let mut state = Memory::default();
    seed_genesis(&mut state, treasury, &opening).await;
    Genesis {
        state,
        authority,
        players,
    }
}

/// Authority instructions that run one full epoch: open, close, collect, finalize.
///
/// `slot` is the first entropy slot to use; the next unused slot is returned.
pub fn roll_epoch(
    authority: &PrivateKey,
    nonce: &mut u64,
    seed: u64,
    slot: u64,
    sources: usize,
) -> (Vec<Transaction>, u64) {
    let mut instructions = vec![Instruction::StartBettingPhase, Instruction::CloseBetting];
    instructions.extend(
        create_entropy_sources(seed, slot, sources)
            .into_iter()
            .map(Instruction::CollectEntropy),
    );
    instructions.push(Instruction::FinalizeRng {
        required: sources as u8,
    });
    let txs = instructions
        .into_iter()
        .map(|instruction| {
            let tx = Transaction::sign(authority, *nonce, instruction);
            *nonce += 1;
            tx
        })
        .collect();
    (txs, slot + sources as u64)
}

/// Executes a block at the next height and returns its outputs.
pub async fn execute_block<S: State>(
    state: &mut S,
    events: &mut Vec<Output>,
    now: u64,
    txs: Vec<Transaction>,
) -> Vec<Output> {
    let height = match state.get(&Key::Commit).await {
        Some(Value::Commit { height, .. }) => height + 1,
        _ => 1,
    };
    let result = state_transition::execute_state_transition(
        state,
        events,
        &EngineConfig::default(),
        height,
        now,
        txs,
    )
    .await;
    events[result.events_start as usize..result.events_end as usize].to_vec()
}
