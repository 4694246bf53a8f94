use crate::{Layer, State};
use commonware_cryptography::ed25519::PublicKey;
use crapsvault_types::{
    craps::EngineConfig,
    execution::{Key, Output, Transaction, Value, MAX_BLOCK_TRANSACTIONS},
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Result of executing a block's state transition
pub struct StateTransitionResult {
    pub height: u64,
    pub events_start: u64,
    pub events_end: u64,
    /// Map of public keys to their next expected nonce after processing
    pub processed_nonces: BTreeMap<PublicKey, u64>,
}

/// Execute state transition for a block
///
/// Only the next expected height is processed; any other height leaves state
/// and events untouched. Outputs are appended to `events` followed by a
/// commit marker, then the staged writes are applied to `state` together
/// with the new commit height.
pub async fn execute_state_transition<S: State>(
    state: &mut S,
    events: &mut Vec<Output>,
    config: &EngineConfig,
    height: u64,
    now: u64,
    mut transactions: Vec<Transaction>,
) -> StateTransitionResult {
    let state_height = match state.get(&Key::Commit).await {
        Some(Value::Commit { height, .. }) => height,
        _ => 0,
    };
    let events_start = events.len() as u64;
    if height != state_height + 1 {
        warn!(height, state_height, "skipping block at unexpected height");
        return StateTransitionResult {
            height: state_height,
            events_start,
            events_end: events_start,
            processed_nonces: BTreeMap::new(),
        };
    }

    if transactions.len() > MAX_BLOCK_TRANSACTIONS {
        warn!(
            height,
            count = transactions.len(),
            max = MAX_BLOCK_TRANSACTIONS,
            "truncating oversized block"
        );
        transactions.truncate(MAX_BLOCK_TRANSACTIONS);
    }

    let mut layer = Layer::new(state, now, *config);
    let (outputs, processed_nonces) = layer.execute(transactions).await;
    let changes = layer.commit();

    events.extend(outputs);
    events.push(Output::Commit {
        height,
        start: events_start,
    });
    state.apply(changes).await;
    state
        .insert(
            Key::Commit,
            Value::Commit {
                height,
                start: events_start,
            },
        )
        .await;

    let events_end = events.len() as u64;
    debug!(height, events_start, events_end, "committed block");
    StateTransitionResult {
        height,
        events_start,
        events_end,
        processed_nonces,
    }
}
