use commonware_cryptography::ed25519::PublicKey;
use crapsvault_types::{
    craps::{
        AuthorityError, BetBatch, ClaimError, CrapsError, EngineConfig, EpochOutcome, PhaseError,
        RngPhase, RngState, Table, Treasury, MAX_ERROR_MESSAGE_LENGTH,
    },
    execution::{Event, Instruction, Key, Output, Transaction, Value},
};
use std::collections::BTreeMap;
use tracing::warn;

use crate::state::{
    load_account, validate_and_increment_nonce, verify_signature, PrepareError, State, Status,
};

mod handlers;

/// Outcome of a single instruction handler.
type Handled = Result<Vec<Event>, CrapsError>;

pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,

    now: u64,
    config: EngineConfig,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, now: u64, config: EngineConfig) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),

            now,
            config,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    fn remove(&mut self, key: Key) {
        self.pending.insert(key, Status::Delete);
    }

    async fn prepare(&mut self, transaction: &Transaction) -> Result<(), PrepareError> {
        verify_signature(transaction)?;
        let mut account = load_account(self, &transaction.public).await;
        validate_and_increment_nonce(&mut account, transaction.nonce)?;
        self.insert(
            Key::Account(transaction.public.clone()),
            Value::Account(account),
        );

        Ok(())
    }

    /// Run one instruction. A failed instruction leaves no staged writes
    /// behind and yields a single error event.
    async fn apply(&mut self, transaction: &Transaction) -> Vec<Event> {
        let checkpoint = self.pending.clone();
        let public = &transaction.public;
        let result = match &transaction.instruction {
            // Wagers
            Instruction::PlaceBet { bet_type, amount } => {
                self.handle_place_bet(public, *bet_type, *amount).await
            }
            Instruction::SettleBets { epoch } => self.handle_settle_bets(public, *epoch).await,
            Instruction::ClaimPayout { epoch, slot } => {
                self.handle_claim_payout(public, *epoch, *slot).await
            }
            Instruction::CloseBatch { epoch } => self.handle_close_batch(public, *epoch).await,

            // Randomness
            Instruction::StartBettingPhase => self.handle_start_betting(public).await,
            Instruction::CloseBetting => self.handle_close_betting(public).await,
            Instruction::CollectEntropy(source) => {
                self.handle_collect_entropy(public, *source).await
            }
            Instruction::FinalizeRng { required } => {
                self.handle_finalize_rng(public, *required).await
            }

            // Treasury
            Instruction::Deposit { amount } => self.handle_deposit(public, *amount).await,
            Instruction::Withdraw { amount } => self.handle_withdraw(public, *amount).await,
            Instruction::Emergency(kind) => self.handle_emergency(public, kind).await,
        };

        match result {
            Ok(events) => events,
            Err(err) => {
                self.pending = checkpoint;
                warn!(player = ?public, code = err.code(), %err, "rejected instruction");
                vec![Event::Error {
                    player: public.clone(),
                    code: err.code(),
                    message: error_message(&err),
                }]
            }
        }
    }

    async fn treasury(&self) -> Result<Treasury, CrapsError> {
        match self.get(&Key::Treasury).await {
            Some(Value::Treasury(treasury)) => Ok(treasury),
            _ => Err(PhaseError::NotInitialized.into()),
        }
    }

    /// Load the treasury and check that `public` is its authority.
    async fn authorized_treasury(
        &self,
        public: &PublicKey,
        operation: &'static str,
    ) -> Result<Treasury, CrapsError> {
        let treasury = self.treasury().await?;
        if !treasury.is_authority(public) {
            return Err(AuthorityError::Unauthorized(operation).into());
        }
        Ok(treasury)
    }

    async fn rng_state(&self) -> Option<RngState> {
        match self.get(&Key::Rng).await {
            Some(Value::Rng(rng)) => Some(rng),
            _ => None,
        }
    }

    async fn current_rng(&self) -> Result<RngState, CrapsError> {
        self.rng_state()
            .await
            .ok_or_else(|| PhaseError::NotInitialized.into())
    }

    /// Most recent epoch whose dice are fixed.
    async fn latest_finalized_epoch(&self) -> Option<u64> {
        let rng = self.rng_state().await?;
        match rng.phase {
            RngPhase::Finalized => Some(rng.epoch),
            _ => rng.epoch.checked_sub(1).filter(|epoch| *epoch > 0),
        }
    }

    async fn table(&self) -> Table {
        match self.get(&Key::Table).await {
            Some(Value::Table(table)) => table,
            _ => Table::default(),
        }
    }

    async fn outcome(&self, epoch: u64) -> Option<EpochOutcome> {
        match self.get(&Key::Outcome(epoch)).await {
            Some(Value::Outcome(outcome)) => Some(outcome),
            _ => None,
        }
    }

    async fn batch(&self, public: &PublicKey, epoch: u64) -> Option<BetBatch> {
        match self.get(&Key::BetBatch(public.clone(), epoch)).await {
            Some(Value::BetBatch(batch)) => Some(batch),
            _ => None,
        }
    }

    async fn existing_batch(&self, public: &PublicKey, epoch: u64) -> Result<BetBatch, CrapsError> {
        self.batch(public, epoch)
            .await
            .ok_or_else(|| ClaimError::BatchNotFound(epoch).into())
    }

    async fn balance(&self, public: &PublicKey) -> u64 {
        match self.get(&Key::Balance(public.clone())).await {
            Some(Value::Balance(amount)) => amount,
            _ => 0,
        }
    }

    pub async fn execute(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> (Vec<Output>, BTreeMap<PublicKey, u64>) {
        let mut processed_nonces = BTreeMap::new();
        let mut outputs = Vec::new();

        for tx in transactions {
            if let Err(err) = self.prepare(&tx).await {
                warn!(player = ?tx.public, ?err, "skipping transaction");
                continue;
            }
            processed_nonces.insert(tx.public.clone(), tx.nonce.saturating_add(1));
            outputs.extend(self.apply(&tx).await.into_iter().map(Output::Event));
            outputs.push(Output::Transaction(tx));
        }

        (outputs, processed_nonces)
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Option<Value> {
        match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await,
        }
    }

    async fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    async fn delete(&mut self, key: &Key) {
        self.pending.insert(key.clone(), Status::Delete);
    }
}

/// Render an error for an event, cut to the longest message the event codec accepts.
fn error_message(err: &CrapsError) -> String {
    let mut message = err.to_string();
    if message.len() > MAX_ERROR_MESSAGE_LENGTH {
        let mut end = MAX_ERROR_MESSAGE_LENGTH;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        message.truncate(end);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mocks::{create_account_keypair, create_genesis, TEST_NOW},
        Memory,
    };
    use commonware_runtime::{deterministic::Runner, Runner as _};
    use crapsvault_types::craps::{BetType, EncodingError, EntropySource, Phase};

    #[test]
    fn test_nonce_validation() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            let mut layer = Layer::new(&state, TEST_NOW, EngineConfig::default());

            let (signer, _) = create_account_keypair(1);

            // Wrong nonce should fail
            let tx = Transaction::sign(&signer, 1, Instruction::Deposit { amount: 10 });
            assert_eq!(
                layer.prepare(&tx).await,
                Err(PrepareError::NonceMismatch {
                    expected: 0,
                    got: 1
                })
            );

            // Correct nonce should succeed
            let tx = Transaction::sign(&signer, 0, Instruction::Deposit { amount: 10 });
            assert!(layer.prepare(&tx).await.is_ok());

            // Replay is rejected
            assert!(layer.prepare(&tx).await.is_err());

            let _ = layer.commit();
        });
    }

    #[test]
    fn test_tampered_transaction_is_skipped() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            let mut layer = Layer::new(&state, TEST_NOW, EngineConfig::default());
            let (signer, _) = create_account_keypair(1);

            let mut tx = Transaction::sign(&signer, 0, Instruction::Deposit { amount: 10 });
            tx.instruction = Instruction::Deposit { amount: 10_000 };
            let (outputs, nonces) = layer.execute(vec![tx]).await;
            assert!(outputs.is_empty());
            assert!(nonces.is_empty());
        });
    }

    #[test]
    fn test_table_operations_require_authority() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let genesis = create_genesis(100_000, &[500]).await;
            let mut layer = Layer::new(&genesis.state, TEST_NOW, EngineConfig::default());
            let (player, public) = &genesis.players[0];

            let tx = Transaction::sign(player, 0, Instruction::StartBettingPhase);
            layer.prepare(&tx).await.unwrap();
            let events = layer.apply(&tx).await;
            assert_eq!(
                events,
                vec![Event::Error {
                    player: public.clone(),
                    code: 601,
                    message: "authority: caller is not the table authority (start betting)"
                        .to_string(),
                }]
            );
            assert!(layer.get(&Key::Rng).await.is_none());

            // The nonce still advanced
            assert_eq!(load_account(&layer, public).await.nonce, 1);
        });
    }

    #[test]
    fn test_failed_instruction_discards_its_writes() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let genesis = create_genesis(100_000, &[500]).await;
            let mut layer = Layer::new(&genesis.state, TEST_NOW, EngineConfig::default());
            let (authority, _) = &genesis.authority;
            let (player, public) = &genesis.players[0];

            let tx = Transaction::sign(authority, 0, Instruction::StartBettingPhase);
            layer.prepare(&tx).await.unwrap();
            layer.apply(&tx).await;

            // 102 is not a representable stake; nothing may be debited
            let tx = Transaction::sign(
                player,
                0,
                Instruction::PlaceBet {
                    bet_type: BetType::Field as u8,
                    amount: 102,
                },
            );
            layer.prepare(&tx).await.unwrap();
            let events = layer.apply(&tx).await;
            let expected = CrapsError::from(EncodingError::InvalidAmount(102));
            assert_eq!(
                events,
                vec![Event::Error {
                    player: public.clone(),
                    code: expected.code(),
                    message: expected.to_string(),
                }]
            );
            assert_eq!(layer.balance(public).await, 500);
            assert!(layer.batch(public, 1).await.is_none());
        });
    }

    #[test]
    fn test_entropy_rejected_while_betting() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let genesis = create_genesis(100_000, &[]).await;
            let mut layer = Layer::new(&genesis.state, TEST_NOW, EngineConfig::default());
            let (authority, public) = &genesis.authority;

            let tx = Transaction::sign(authority, 0, Instruction::StartBettingPhase);
            layer.prepare(&tx).await.unwrap();
            assert_eq!(
                layer.apply(&tx).await,
                vec![Event::BettingStarted {
                    epoch: 1,
                    started_at: TEST_NOW
                }]
            );
            assert_eq!(layer.table().await.phase, Phase::ComeOut);

            let tx = Transaction::sign(
                authority,
                1,
                Instruction::CollectEntropy(EntropySource::new(1, [7; 32])),
            );
            layer.prepare(&tx).await.unwrap();
            let events = layer.apply(&tx).await;
            assert!(matches!(
                &events[..],
                [Event::Error { player, code: 203, .. }] if player == public
            ));
        });
    }

    #[test]
    fn test_error_message_is_bounded() {
        let err = CrapsError::from(PhaseError::NotInitialized);
        assert_eq!(error_message(&err), err.to_string());

        let detail: &'static str = "é".repeat(200).leak();
        let err = CrapsError::from(EncodingError::InvalidTierTable(detail));
        let message = error_message(&err);
        assert!(message.len() <= MAX_ERROR_MESSAGE_LENGTH);
        assert!(message.len() >= MAX_ERROR_MESSAGE_LENGTH - 1);
        assert!(err.to_string().starts_with(&message));
    }
}
