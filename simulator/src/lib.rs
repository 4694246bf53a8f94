//! Plays a crapsvault table end to end against in-memory state.
//!
//! An authority drives the randomness phases with ChaCha-derived entropy while
//! simulated players place random wagers, settle, claim and close batches.

use commonware_codec::Encode;
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    sha256::Sha256,
    Hasher, PrivateKeyExt, Signer,
};
use commonware_utils::hex;
use crapsvault_execution::{
    balance, seed_genesis, state_transition::execute_state_transition, Memory, State,
};
use crapsvault_types::{
    craps::{
        standard_table, BetType, CrapsError, EngineConfig, EntropySource, Treasury,
        TreasuryLimits, DEFAULT_RETENTION_EPOCHS, ENTROPY_LEN, MAX_BETS_PER_BATCH,
        MAX_ENTROPY_SOURCES, MIN_ENTROPY_SOURCES,
    },
    execution::{Event, Instruction, Key, Output, Transaction, Value},
};
use rand::{seq::SliceRandom, Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, str::FromStr};
use thiserror::Error;
use tracing::{debug, info, warn, Level};

/// Seconds between simulated blocks.
const BLOCK_TIME: u64 = 5;

/// Largest stake a simulated player risks, as a fraction of their balance.
const STAKE_DIVISOR: u64 = 20;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PlayerConfig {
    pub seed: u64,
    pub balance: u64,
}

/// Configuration for a [Simulator] run.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub authority_seed: u64,
    pub treasury_funds: u64,
    pub players: Vec<PlayerConfig>,
    #[serde(default)]
    pub limits: TreasuryLimits,

    #[serde(default = "default_min_entropy_sources")]
    pub min_entropy_sources: u8,
    #[serde(default = "default_retention_epochs")]
    pub retention_epochs: u64,

    pub epochs: u64,
    #[serde(default = "default_min_entropy_sources")]
    pub entropy_sources: u8,
    pub entropy_seed: u64,
    #[serde(default = "default_bets_per_epoch")]
    pub bets_per_epoch: u8,
    pub start_time: u64,
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("entropy_sources ({requested}) is below the required minimum ({minimum})")]
    InsufficientEntropy { requested: u8, minimum: u8 },
    #[error("entropy_sources must be at most {max} (got {value})")]
    TooManySources { value: u8, max: usize },
    #[error("bets_per_epoch must be at most {max} (got {value})")]
    TooManyBets { value: u8, max: usize },
    #[error("player seed {seed} is used more than once")]
    DuplicateSeed { seed: u64 },
    #[error("invalid treasury limits")]
    InvalidLimits(#[source] CrapsError),
}

pub struct ValidatedConfig {
    pub authority: PrivateKey,
    pub players: Vec<(PrivateKey, u64)>,
    pub treasury: Treasury,
    pub engine: EngineConfig,

    pub epochs: u64,
    pub entropy_sources: u8,
    pub entropy_seed: u64,
    pub bets_per_epoch: u8,
    pub start_time: u64,
    pub log_level: Level,
}

fn default_min_entropy_sources() -> u8 {
    MIN_ENTROPY_SOURCES
}

fn default_retention_epochs() -> u64 {
    DEFAULT_RETENTION_EPOCHS
}

fn default_bets_per_epoch() -> u8 {
    3
}

/// Stable 32-byte identifier derived from a label.
fn derive_id(authority: &PublicKey, label: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(&authority.encode());
    hasher.update(label);
    hasher.finalize().0
}

impl Config {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.epochs == 0 {
            return Err(ConfigError::InvalidNonZero {
                field: "epochs",
                value: self.epochs,
            });
        }
        if self.players.is_empty() {
            return Err(ConfigError::InvalidNonZero {
                field: "players",
                value: 0,
            });
        }
        let engine = EngineConfig {
            min_entropy_sources: self.min_entropy_sources,
            retention_epochs: self.retention_epochs,
        };
        let minimum = engine.required_sources(0);
        if self.entropy_sources < minimum {
            return Err(ConfigError::InsufficientEntropy {
                requested: self.entropy_sources,
                minimum,
            });
        }
        if self.entropy_sources as usize > MAX_ENTROPY_SOURCES {
            return Err(ConfigError::TooManySources {
                value: self.entropy_sources,
                max: MAX_ENTROPY_SOURCES,
            });
        }
        if self.bets_per_epoch as usize > MAX_BETS_PER_BATCH {
            return Err(ConfigError::TooManyBets {
                value: self.bets_per_epoch,
                max: MAX_BETS_PER_BATCH,
            });
        }
        self.limits.validate().map_err(ConfigError::InvalidLimits)?;

        let mut players = Vec::with_capacity(self.players.len());
        for (i, player) in self.players.iter().enumerate() {
            let reused = player.seed == self.authority_seed
                || self.players[..i].iter().any(|p| p.seed == player.seed);
            if reused {
                return Err(ConfigError::DuplicateSeed { seed: player.seed });
            }
            players.push((PrivateKey::from_seed(player.seed), player.balance));
        }

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        let authority = PrivateKey::from_seed(self.authority_seed);
        let public = authority.public_key();
        let mut treasury = Treasury::new(
            public.clone(),
            derive_id(&public, b"mint"),
            derive_id(&public, b"vault"),
            self.limits,
        );
        treasury.total_deposits = self.treasury_funds;

        Ok(ValidatedConfig {
            authority,
            players,
            treasury,
            engine,
            epochs: self.epochs,
            entropy_sources: self.entropy_sources,
            entropy_seed: self.entropy_seed,
            bets_per_epoch: self.bets_per_epoch,
            start_time: self.start_time,
            log_level,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PlayerSummary {
    pub public_key: String,
    pub balance: u64,
    pub bets_placed: u64,
    pub bets_won: u64,
    pub claimed: u64,
    pub rejected: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TreasurySummary {
    pub balance: u64,
    pub total_deposits: u64,
    pub total_withdrawals: u64,
    pub total_payouts: u64,
    pub total_wagered: u64,
    pub halted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub epochs: u64,
    pub height: u64,
    /// Number of rolls per dice total (2 through 12).
    pub totals: BTreeMap<u8, u64>,
    pub treasury: TreasurySummary,
    pub players: Vec<PlayerSummary>,
}

struct Player {
    signer: PrivateKey,
    public: PublicKey,
    nonce: u64,
    /// Batches not yet closed, by epoch.
    batches: Vec<u64>,
    stats: PlayerSummary,
}

pub struct Simulator {
    state: Memory,
    events: Vec<Output>,
    engine: EngineConfig,

    authority: PrivateKey,
    authority_nonce: u64,
    players: Vec<Player>,

    rng: ChaCha20Rng,
    entropy_sources: u8,
    bets_per_epoch: u8,
    epochs: u64,
    slot: u64,
    now: u64,
    height: u64,
    totals: BTreeMap<u8, u64>,
}

impl Simulator {
    /// Seed the treasury and player balances.
    pub async fn new(config: ValidatedConfig) -> Self {
        let opening: Vec<_> = config
            .players
            .iter()
            .map(|(signer, amount)| (signer.public_key(), *amount))
            .collect();
        let mut state = Memory::default();
        seed_genesis(&mut state, config.treasury, &opening).await;

        let players = config
            .players
            .into_iter()
            .map(|(signer, _)| {
                let public = signer.public_key();
                Player {
                    stats: PlayerSummary {
                        public_key: hex(&public.encode()),
                        ..Default::default()
                    },
                    signer,
                    public,
                    nonce: 0,
                    batches: Vec::new(),
                }
            })
            .collect();

        Self {
            state,
            events: Vec::new(),
            engine: config.engine,
            authority: config.authority,
            authority_nonce: 0,
            players,
            rng: ChaCha20Rng::seed_from_u64(config.entropy_seed),
            entropy_sources: config.entropy_sources,
            bets_per_epoch: config.bets_per_epoch,
            epochs: config.epochs,
            slot: 1,
            now: config.start_time,
            height: 0,
            totals: BTreeMap::new(),
        }
    }

    fn authority_tx(&mut self, instruction: Instruction) -> Transaction {
        let tx = Transaction::sign(&self.authority, self.authority_nonce, instruction);
        self.authority_nonce += 1;
        tx
    }

    fn player_tx(&mut self, i: usize, instruction: Instruction) -> Transaction {
        let player = &mut self.players[i];
        let tx = Transaction::sign(&player.signer, player.nonce, instruction);
        player.nonce += 1;
        tx
    }

    fn player_index(&self, public: &PublicKey) -> Option<usize> {
        self.players.iter().position(|p| &p.public == public)
    }

    /// Execute one block and fold its events into the running statistics.
    async fn block(&mut self, txs: Vec<Transaction>) -> Vec<Event> {
        self.height += 1;
        self.now += BLOCK_TIME;
        let result = execute_state_transition(
            &mut self.state,
            &mut self.events,
            &self.engine,
            self.height,
            self.now,
            txs,
        )
        .await;

        let events: Vec<Event> = self.events[result.events_start as usize..]
            .iter()
            .filter_map(|output| match output {
                Output::Event(event) => Some(event.clone()),
                _ => None,
            })
            .collect();
        for event in &events {
            self.record(event);
        }
        events
    }

    fn record(&mut self, event: &Event) {
        match event {
            Event::BetPlaced { player, epoch, .. } => {
                if let Some(i) = self.player_index(player) {
                    let player = &mut self.players[i];
                    player.stats.bets_placed += 1;
                    if !player.batches.contains(epoch) {
                        player.batches.push(*epoch);
                    }
                }
            }
            Event::BetResolved {
                player, won: true, ..
            } => {
                if let Some(i) = self.player_index(player) {
                    self.players[i].stats.bets_won += 1;
                }
            }
            Event::PayoutClaimed { player, amount, .. } => {
                if let Some(i) = self.player_index(player) {
                    self.players[i].stats.claimed += amount;
                }
            }
            Event::BatchClosed { player, epoch } => {
                if let Some(i) = self.player_index(player) {
                    self.players[i].batches.retain(|e| e != epoch);
                }
            }
            Event::RngFinalized { outcome } => {
                *self.totals.entry(outcome.total()).or_default() += 1;
            }
            Event::Error {
                player,
                code,
                message,
            } => {
                debug!(?player, code, reason = %message, "instruction rejected");
                if let Some(i) = self.player_index(player) {
                    self.players[i].stats.rejected += 1;
                }
            }
            _ => {}
        }
    }

    fn entropy_source(&mut self) -> EntropySource {
        let mut value = [0u8; ENTROPY_LEN];
        while value.iter().all(|b| *b == 0) {
            self.rng.fill_bytes(&mut value);
        }
        let source = EntropySource::new(self.slot, value);
        self.slot += 1;
        source
    }

    /// Random wagers for one player, sized to their balance.
    async fn wagers(&mut self, i: usize) -> Vec<Transaction> {
        let available = balance(&self.state, &self.players[i].public).await;
        let cap = available / STAKE_DIVISOR;
        let amounts: Vec<u64> = standard_table()
            .amounts()
            .take_while(|amount| *amount <= cap)
            .collect();
        if amounts.is_empty() {
            return Vec::new();
        }

        let count = self.rng.gen_range(0..=self.bets_per_epoch);
        let mut txs = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let bet = *BetType::ALL.choose(&mut self.rng).unwrap_or(&BetType::Field);
            let amount = *amounts.choose(&mut self.rng).unwrap_or(&amounts[0]);
            txs.push(self.player_tx(
                i,
                Instruction::PlaceBet {
                    bet_type: bet as u8,
                    amount,
                },
            ));
        }
        txs
    }

    /// Settle open batches, then claim and close what is ready.
    async fn settle(&mut self, epoch: u64) {
        let mut txs = Vec::new();
        for i in 0..self.players.len() {
            for batch in self.players[i].batches.clone() {
                txs.push(self.player_tx(i, Instruction::SettleBets { epoch: batch }));
            }
        }
        self.block(txs).await;

        let mut txs = Vec::new();
        for i in 0..self.players.len() {
            for batch_epoch in self.players[i].batches.clone() {
                let key = Key::BetBatch(self.players[i].public.clone(), batch_epoch);
                let Some(Value::BetBatch(batch)) = self.state.get(&key).await else {
                    continue;
                };
                for slot in 0..batch.bet_count() {
                    if batch.is_realizable(slot) && !batch.is_settled(slot) {
                        txs.push(self.player_tx(
                            i,
                            Instruction::ClaimPayout {
                                epoch: batch_epoch,
                                slot,
                            },
                        ));
                    }
                }
                let open = batch.open_slots().next().is_some();
                if !open && epoch >= batch_epoch + self.engine.retention_epochs {
                    txs.push(self.player_tx(i, Instruction::CloseBatch { epoch: batch_epoch }));
                }
            }
        }
        self.block(txs).await;
    }

    async fn play_epoch(&mut self) -> Option<u64> {
        let start = self.authority_tx(Instruction::StartBettingPhase);
        self.block(vec![start]).await;

        let mut txs = Vec::new();
        for i in 0..self.players.len() {
            txs.extend(self.wagers(i).await);
        }
        self.block(txs).await;

        let mut txs = vec![self.authority_tx(Instruction::CloseBetting)];
        for _ in 0..self.entropy_sources {
            let source = self.entropy_source();
            txs.push(self.authority_tx(Instruction::CollectEntropy(source)));
        }
        txs.push(self.authority_tx(Instruction::FinalizeRng {
            required: self.entropy_sources,
        }));
        let epoch = self.block(txs).await.iter().find_map(|event| match event {
            Event::RngFinalized { outcome } => {
                info!(
                    epoch = outcome.epoch,
                    die1 = outcome.die1,
                    die2 = outcome.die2,
                    "rolled"
                );
                Some(outcome.epoch)
            }
            _ => None,
        })?;

        self.settle(epoch).await;
        Some(epoch)
    }

    /// Play every configured epoch and summarize the table.
    pub async fn run(&mut self) -> Summary {
        let mut played = 0;
        for _ in 0..self.epochs {
            match self.play_epoch().await {
                Some(_) => played += 1,
                None => warn!(height = self.height, "epoch did not finalize"),
            }
        }
        self.summary(played).await
    }

    async fn summary(&self, epochs: u64) -> Summary {
        let treasury = match self.state.get(&Key::Treasury).await {
            Some(Value::Treasury(treasury)) => treasury,
            _ => Treasury::new(self.authority.public_key(), [0; 32], [0; 32], Default::default()),
        };
        let mut players = Vec::with_capacity(self.players.len());
        for player in &self.players {
            players.push(PlayerSummary {
                balance: balance(&self.state, &player.public).await,
                ..player.stats.clone()
            });
        }
        Summary {
            epochs,
            height: self.height,
            totals: self.totals.clone(),
            treasury: TreasurySummary {
                balance: treasury.balance().unwrap_or_default(),
                total_deposits: treasury.total_deposits,
                total_withdrawals: treasury.total_withdrawals,
                total_payouts: treasury.total_payouts,
                total_wagered: treasury.total_wagered,
                halted: treasury.halted,
            },
            players,
        }
    }
}
