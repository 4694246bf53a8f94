use crate::craps::{
    BetBatch, BetType, EmergencyKind, EntropySource, EpochOutcome, RngState, Table, Treasury,
    MAX_ERROR_MESSAGE_LENGTH,
};
use bytes::{Buf, BufMut};
use commonware_codec::{Encode, EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{
    ed25519::{self, PublicKey},
    sha256::{Digest, Sha256},
    Digestible, Hasher, Signer, Verifier,
};
use commonware_utils::union;

pub const NAMESPACE: &[u8] = b"_CRAPSVAULT";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";
pub const MAX_BLOCK_TRANSACTIONS: usize = 500;

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::new();
        nonce.write(&mut payload);
        instruction.write(&mut payload);

        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        let signature = private.sign(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&nonce, &instruction),
        );

        Self {
            nonce,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&self.nonce, &self.instruction),
            &self.signature,
        )
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let nonce = u64::read(reader)?;
        let instruction = Instruction::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            nonce,
            instruction,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

impl Digestible for Transaction {
    type Digest = Digest;

    fn digest(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.nonce.to_be_bytes().as_ref());
        hasher.update(self.instruction.encode().as_ref());
        hasher.update(self.public.as_ref());
        // The signature is excluded: any valid signature authorizes the same transaction.
        hasher.finalize()
    }
}

/// Operations accepted by the table.
///
/// Table operations (`StartBettingPhase` through `FinalizeRng`), `Withdraw` and
/// `Emergency` must be signed by the treasury authority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Binary: [0] [betType:u8] [amount:u64 BE]
    PlaceBet { bet_type: u8, amount: u64 },

    /// Binary: [1]
    StartBettingPhase,

    /// Binary: [2]
    CloseBetting,

    /// Binary: [3] [slot:u64 BE] [value:32]
    CollectEntropy(EntropySource),

    /// Binary: [4] [required:u8]
    FinalizeRng { required: u8 },

    /// Binary: [5] [epoch:u64 BE]
    SettleBets { epoch: u64 },

    /// Binary: [6] [epoch:u64 BE] [slot:u8]
    ClaimPayout { epoch: u64, slot: u8 },

    /// Binary: [7] [epoch:u64 BE]
    CloseBatch { epoch: u64 },

    /// Binary: [8] [amount:u64 BE]
    Deposit { amount: u64 },

    /// Binary: [9] [amount:u64 BE]
    Withdraw { amount: u64 },

    /// Binary: [10] [kind...]
    Emergency(EmergencyKind),
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::PlaceBet { bet_type, amount } => {
                0u8.write(writer);
                bet_type.write(writer);
                amount.write(writer);
            }
            Self::StartBettingPhase => 1u8.write(writer),
            Self::CloseBetting => 2u8.write(writer),
            Self::CollectEntropy(source) => {
                3u8.write(writer);
                source.write(writer);
            }
            Self::FinalizeRng { required } => {
                4u8.write(writer);
                required.write(writer);
            }
            Self::SettleBets { epoch } => {
                5u8.write(writer);
                epoch.write(writer);
            }
            Self::ClaimPayout { epoch, slot } => {
                6u8.write(writer);
                epoch.write(writer);
                slot.write(writer);
            }
            Self::CloseBatch { epoch } => {
                7u8.write(writer);
                epoch.write(writer);
            }
            Self::Deposit { amount } => {
                8u8.write(writer);
                amount.write(writer);
            }
            Self::Withdraw { amount } => {
                9u8.write(writer);
                amount.write(writer);
            }
            Self::Emergency(kind) => {
                10u8.write(writer);
                kind.write(writer);
            }
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match u8::read(reader)? {
            0 => Self::PlaceBet {
                bet_type: u8::read(reader)?,
                amount: u64::read(reader)?,
            },
            1 => Self::StartBettingPhase,
            2 => Self::CloseBetting,
            3 => Self::CollectEntropy(EntropySource::read(reader)?),
            4 => Self::FinalizeRng {
                required: u8::read(reader)?,
            },
            5 => Self::SettleBets {
                epoch: u64::read(reader)?,
            },
            6 => Self::ClaimPayout {
                epoch: u64::read(reader)?,
                slot: u8::read(reader)?,
            },
            7 => Self::CloseBatch {
                epoch: u64::read(reader)?,
            },
            8 => Self::Deposit {
                amount: u64::read(reader)?,
            },
            9 => Self::Withdraw {
                amount: u64::read(reader)?,
            },
            10 => Self::Emergency(EmergencyKind::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::PlaceBet { .. } => u8::SIZE + u64::SIZE,
                Self::StartBettingPhase | Self::CloseBetting => 0,
                Self::CollectEntropy(_) => EntropySource::SIZE,
                Self::FinalizeRng { .. } => u8::SIZE,
                Self::SettleBets { .. } | Self::CloseBatch { .. } => u64::SIZE,
                Self::ClaimPayout { .. } => u64::SIZE + u8::SIZE,
                Self::Deposit { .. } | Self::Withdraw { .. } => u64::SIZE,
                Self::Emergency(kind) => kind.encode_size(),
            }
    }
}

/// Minimal account structure for transaction nonce tracking.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
        })
    }
}

impl FixedSize for Account {
    const SIZE: usize = u64::SIZE;
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    /// Nonce tracking (tag 0)
    Account(PublicKey),
    /// Token balance held outside the treasury (tag 1)
    Balance(PublicKey),

    // Table singletons (tags 10-12)
    Treasury,
    Table,
    Rng,

    // Per-epoch records (tags 20-21)
    Outcome(u64),
    BetBatch(PublicKey, u64),

    /// Last committed height (tag 30)
    Commit,
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }
            Self::Balance(pk) => {
                1u8.write(writer);
                pk.write(writer);
            }
            Self::Treasury => 10u8.write(writer),
            Self::Table => 11u8.write(writer),
            Self::Rng => 12u8.write(writer),
            Self::Outcome(epoch) => {
                20u8.write(writer);
                epoch.write(writer);
            }
            Self::BetBatch(pk, epoch) => {
                21u8.write(writer);
                pk.write(writer);
                epoch.write(writer);
            }
            Self::Commit => 30u8.write(writer),
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match u8::read(reader)? {
            0 => Self::Account(PublicKey::read(reader)?),
            1 => Self::Balance(PublicKey::read(reader)?),
            10 => Self::Treasury,
            11 => Self::Table,
            12 => Self::Rng,
            20 => Self::Outcome(u64::read(reader)?),
            21 => Self::BetBatch(PublicKey::read(reader)?, u64::read(reader)?),
            30 => Self::Commit,

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) | Self::Balance(_) => PublicKey::SIZE,
                Self::Treasury | Self::Table | Self::Rng | Self::Commit => 0,
                Self::Outcome(_) => u64::SIZE,
                Self::BetBatch(_, _) => PublicKey::SIZE + u64::SIZE,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Value {
    Account(Account),
    Balance(u64),
    Treasury(Treasury),
    Table(Table),
    Rng(RngState),
    Outcome(EpochOutcome),
    BetBatch(BetBatch),
    Commit { height: u64, start: u64 },
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }
            Self::Balance(amount) => {
                1u8.write(writer);
                amount.write(writer);
            }
            Self::Treasury(treasury) => {
                10u8.write(writer);
                treasury.write(writer);
            }
            Self::Table(table) => {
                11u8.write(writer);
                table.write(writer);
            }
            Self::Rng(rng) => {
                12u8.write(writer);
                rng.write(writer);
            }
            Self::Outcome(outcome) => {
                20u8.write(writer);
                outcome.write(writer);
            }
            Self::BetBatch(batch) => {
                21u8.write(writer);
                batch.write(writer);
            }
            Self::Commit { height, start } => {
                30u8.write(writer);
                height.write(writer);
                start.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Account(Account::read(reader)?),
            1 => Self::Balance(u64::read(reader)?),
            10 => Self::Treasury(Treasury::read(reader)?),
            11 => Self::Table(Table::read(reader)?),
            12 => Self::Rng(RngState::read(reader)?),
            20 => Self::Outcome(EpochOutcome::read(reader)?),
            21 => Self::BetBatch(BetBatch::read(reader)?),
            30 => Self::Commit {
                height: u64::read(reader)?,
                start: u64::read(reader)?,
            },

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) => Account::SIZE,
                Self::Balance(_) => u64::SIZE,
                Self::Treasury(_) => Treasury::SIZE,
                Self::Table(_) => Table::SIZE,
                Self::Rng(_) => RngState::SIZE,
                Self::Outcome(_) => EpochOutcome::SIZE,
                Self::BetBatch(_) => BetBatch::SIZE,
                Self::Commit { .. } => u64::SIZE + u64::SIZE,
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Event {
    // Wager events (tags 0-4)
    BetPlaced {
        player: PublicKey,
        epoch: u64,
        slot: u8,
        bet_type: BetType,
        amount: u64,
    },
    BetResolved {
        player: PublicKey,
        epoch: u64,
        slot: u8,
        won: bool,
        payout: u64,
    },
    BetsSettled {
        player: PublicKey,
        epoch: u64,
        through_epoch: u64,
        open_bets: u8,
    },
    PayoutClaimed {
        player: PublicKey,
        epoch: u64,
        slot: u8,
        amount: u64,
    },
    BatchClosed {
        player: PublicKey,
        epoch: u64,
    },

    // Randomness events (tags 10-13)
    BettingStarted {
        epoch: u64,
        started_at: u64,
    },
    BettingClosed {
        epoch: u64,
    },
    EntropyCollected {
        epoch: u64,
        slot: u64,
        count: u8,
    },
    RngFinalized {
        outcome: EpochOutcome,
    },

    // Treasury events (tags 20-22)
    Deposited {
        player: PublicKey,
        amount: u64,
    },
    Withdrawn {
        authority: PublicKey,
        amount: u64,
    },
    EmergencyApplied {
        kind: EmergencyKind,
    },

    /// Rejected operation (tag 30)
    Error {
        player: PublicKey,
        code: u16,
        message: String,
    },
}

fn write_message(message: &str, writer: &mut impl BufMut) {
    let bytes = message.as_bytes();
    (bytes.len() as u32).write(writer);
    writer.put_slice(bytes);
}

fn read_message(reader: &mut impl Buf) -> Result<String, Error> {
    let len = u32::read(reader)? as usize;
    if len > MAX_ERROR_MESSAGE_LENGTH {
        return Err(Error::Invalid("Event", "error message too long"));
    }
    if reader.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = vec![0u8; len];
    reader.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|_| Error::Invalid("Event", "invalid UTF-8 in error message"))
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::BetPlaced {
                player,
                epoch,
                slot,
                bet_type,
                amount,
            } => {
                0u8.write(writer);
                player.write(writer);
                epoch.write(writer);
                slot.write(writer);
                bet_type.write(writer);
                amount.write(writer);
            }
            Self::BetResolved {
                player,
                epoch,
                slot,
                won,
                payout,
            } => {
                1u8.write(writer);
                player.write(writer);
                epoch.write(writer);
                slot.write(writer);
                won.write(writer);
                payout.write(writer);
            }
            Self::BetsSettled {
                player,
                epoch,
                through_epoch,
                open_bets,
            } => {
                2u8.write(writer);
                player.write(writer);
                epoch.write(writer);
                through_epoch.write(writer);
                open_bets.write(writer);
            }
            Self::PayoutClaimed {
                player,
                epoch,
                slot,
                amount,
            } => {
                3u8.write(writer);
                player.write(writer);
                epoch.write(writer);
                slot.write(writer);
                amount.write(writer);
            }
            Self::BatchClosed { player, epoch } => {
                4u8.write(writer);
                player.write(writer);
                epoch.write(writer);
            }
            Self::BettingStarted { epoch, started_at } => {
                10u8.write(writer);
                epoch.write(writer);
                started_at.write(writer);
            }
            Self::BettingClosed { epoch } => {
                11u8.write(writer);
                epoch.write(writer);
            }
            Self::EntropyCollected { epoch, slot, count } => {
                12u8.write(writer);
                epoch.write(writer);
                slot.write(writer);
                count.write(writer);
            }
            Self::RngFinalized { outcome } => {
                13u8.write(writer);
                outcome.write(writer);
            }
            Self::Deposited { player, amount } => {
                20u8.write(writer);
                player.write(writer);
                amount.write(writer);
            }
            Self::Withdrawn { authority, amount } => {
                21u8.write(writer);
                authority.write(writer);
                amount.write(writer);
            }
            Self::EmergencyApplied { kind } => {
                22u8.write(writer);
                kind.write(writer);
            }
            Self::Error {
                player,
                code,
                message,
            } => {
                30u8.write(writer);
                player.write(writer);
                code.write(writer);
                write_message(message, writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match u8::read(reader)? {
            0 => Self::BetPlaced {
                player: PublicKey::read(reader)?,
                epoch: u64::read(reader)?,
                slot: u8::read(reader)?,
                bet_type: BetType::read(reader)?,
                amount: u64::read(reader)?,
            },
            1 => Self::BetResolved {
                player: PublicKey::read(reader)?,
                epoch: u64::read(reader)?,
                slot: u8::read(reader)?,
                won: bool::read(reader)?,
                payout: u64::read(reader)?,
            },
            2 => Self::BetsSettled {
                player: PublicKey::read(reader)?,
                epoch: u64::read(reader)?,
                through_epoch: u64::read(reader)?,
                open_bets: u8::read(reader)?,
            },
            3 => Self::PayoutClaimed {
                player: PublicKey::read(reader)?,
                epoch: u64::read(reader)?,
                slot: u8::read(reader)?,
                amount: u64::read(reader)?,
            },
            4 => Self::BatchClosed {
                player: PublicKey::read(reader)?,
                epoch: u64::read(reader)?,
            },
            10 => Self::BettingStarted {
                epoch: u64::read(reader)?,
                started_at: u64::read(reader)?,
            },
            11 => Self::BettingClosed {
                epoch: u64::read(reader)?,
            },
            12 => Self::EntropyCollected {
                epoch: u64::read(reader)?,
                slot: u64::read(reader)?,
                count: u8::read(reader)?,
            },
            13 => Self::RngFinalized {
                outcome: EpochOutcome::read(reader)?,
            },
            20 => Self::Deposited {
                player: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
            },
            21 => Self::Withdrawn {
                authority: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
            },
            22 => Self::EmergencyApplied {
                kind: EmergencyKind::read(reader)?,
            },
            30 => Self::Error {
                player: PublicKey::read(reader)?,
                code: u16::read(reader)?,
                message: read_message(reader)?,
            },

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::BetPlaced { .. } => {
                    PublicKey::SIZE + u64::SIZE + u8::SIZE + BetType::SIZE + u64::SIZE
                }
                Self::BetResolved { .. } => {
                    PublicKey::SIZE + u64::SIZE + u8::SIZE + bool::SIZE + u64::SIZE
                }
                Self::BetsSettled { .. } => PublicKey::SIZE + u64::SIZE + u64::SIZE + u8::SIZE,
                Self::PayoutClaimed { .. } => PublicKey::SIZE + u64::SIZE + u8::SIZE + u64::SIZE,
                Self::BatchClosed { .. } => PublicKey::SIZE + u64::SIZE,
                Self::BettingStarted { .. } => u64::SIZE + u64::SIZE,
                Self::BettingClosed { .. } => u64::SIZE,
                Self::EntropyCollected { .. } => u64::SIZE + u64::SIZE + u8::SIZE,
                Self::RngFinalized { .. } => EpochOutcome::SIZE,
                Self::Deposited { .. } | Self::Withdrawn { .. } => PublicKey::SIZE + u64::SIZE,
                Self::EmergencyApplied { kind } => kind.encode_size(),
                Self::Error { message, .. } => {
                    PublicKey::SIZE + u16::SIZE + u32::SIZE + message.len()
                }
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
    Commit { height: u64, start: u64 },
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
            Self::Commit { height, start } => {
                2u8.write(writer);
                height.write(writer);
                start.write(writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Event(Event::read(reader)?)),
            1 => Ok(Self::Transaction(Transaction::read(reader)?)),
            2 => Ok(Self::Commit {
                height: u64::read(reader)?,
                start: u64::read(reader)?,
            }),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Event(event) => event.encode_size(),
            Self::Transaction(transaction) => transaction.encode_size(),
            Self::Commit { height, start } => height.encode_size() + start.encode_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::craps::{TreasuryLimits, ENTROPY_LEN};
    use commonware_codec::DecodeExt;
    use commonware_cryptography::{ed25519::PrivateKey, PrivateKeyExt};

    #[test]
    fn test_transaction_signature() {
        let signer = PrivateKey::from_seed(42);
        let tx = Transaction::sign(
            &signer,
            3,
            Instruction::PlaceBet {
                bet_type: BetType::Pass as u8,
                amount: 100,
            },
        );
        assert!(tx.verify());

        let decoded = Transaction::decode(tx.encode()).unwrap();
        assert_eq!(decoded, tx);
        assert!(decoded.verify());

        let mut tampered = tx.clone();
        tampered.nonce = 4;
        assert!(!tampered.verify());
        assert_ne!(tampered.digest(), tx.digest());
    }

    #[test]
    fn test_instruction_sizes() {
        let key = PrivateKey::from_seed(1).public_key();
        let instructions = vec![
            Instruction::PlaceBet {
                bet_type: 4,
                amount: 50,
            },
            Instruction::StartBettingPhase,
            Instruction::CloseBetting,
            Instruction::CollectEntropy(EntropySource::new(9, [7; ENTROPY_LEN])),
            Instruction::FinalizeRng { required: 10 },
            Instruction::SettleBets { epoch: 2 },
            Instruction::ClaimPayout { epoch: 2, slot: 1 },
            Instruction::CloseBatch { epoch: 2 },
            Instruction::Deposit { amount: 1 },
            Instruction::Withdraw { amount: 1 },
            Instruction::Emergency(EmergencyKind::UpdateLimits(TreasuryLimits::default())),
            Instruction::Emergency(EmergencyKind::TransferAuthority(key)),
        ];
        for instruction in instructions {
            let encoded = instruction.encode();
            assert_eq!(encoded.len(), instruction.encode_size());
            assert_eq!(Instruction::decode(encoded).unwrap(), instruction);
        }
    }

    #[test]
    fn test_unknown_tags_rejected() {
        assert!(matches!(
            Instruction::decode(&[99u8][..]),
            Err(Error::InvalidEnum(99))
        ));
        assert!(matches!(Key::decode(&[2u8][..]), Err(Error::InvalidEnum(2))));
    }

    #[test]
    fn test_error_event_message_limit() {
        let player = PrivateKey::from_seed(5).public_key();
        let event = Event::Error {
            player: player.clone(),
            code: 705,
            message: "circuit breaker: reserve floor".to_string(),
        };
        let encoded = event.encode();
        assert_eq!(encoded.len(), event.encode_size());
        assert_eq!(Event::decode(encoded).unwrap(), event);

        let oversized = Event::Error {
            player,
            code: 1,
            message: "x".repeat(MAX_ERROR_MESSAGE_LENGTH + 1),
        };
        assert!(Event::decode(oversized.encode()).is_err());
    }
}
