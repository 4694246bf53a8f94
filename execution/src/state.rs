use commonware_cryptography::ed25519::PublicKey;
use crapsvault_types::{
    craps::Treasury,
    execution::{Account, Key, Transaction, Value},
};
use std::{collections::HashMap, future::Future};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrepareError {
    NonceMismatch { expected: u64, got: u64 },
    InvalidSignature,
}

pub trait State {
    fn get(&self, key: &Key) -> impl Future<Output = Option<Value>>;
    fn insert(&mut self, key: Key, value: Value) -> impl Future<Output = ()>;
    fn delete(&mut self, key: &Key) -> impl Future<Output = ()>;

    fn apply(&mut self, changes: Vec<(Key, Status)>) -> impl Future<Output = ()> {
        async {
            for (key, status) in changes {
                match status {
                    Status::Update(value) => self.insert(key, value).await,
                    Status::Delete => self.delete(&key).await,
                }
            }
        }
    }
}

#[derive(Default)]
pub struct Memory {
    state: HashMap<Key, Value>,
}

impl Memory {
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

impl State for Memory {
    async fn get(&self, key: &Key) -> Option<Value> {
        self.state.get(key).cloned()
    }

    async fn insert(&mut self, key: Key, value: Value) {
        self.state.insert(key, value);
    }

    async fn delete(&mut self, key: &Key) {
        self.state.remove(key);
    }
}

#[derive(Clone, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Status {
    Update(Value),
    Delete,
}

pub async fn nonce<S: State>(state: &S, public: &PublicKey) -> u64 {
    load_account(state, public).await.nonce
}

pub async fn balance<S: State>(state: &S, public: &PublicKey) -> u64 {
    match state.get(&Key::Balance(public.clone())).await {
        Some(Value::Balance(amount)) => amount,
        _ => 0,
    }
}

/// Write the treasury and the opening token balances.
///
/// The treasury's epoch-start balance is set to its funded balance so the
/// reserve floor applies from the first disbursement.
pub async fn seed_genesis<S: State>(
    state: &mut S,
    mut treasury: Treasury,
    balances: &[(PublicKey, u64)],
) {
    treasury.epoch_start_balance = treasury.balance().unwrap_or_default();
    state.insert(Key::Treasury, Value::Treasury(treasury)).await;
    for (public, amount) in balances {
        state
            .insert(Key::Balance(public.clone()), Value::Balance(*amount))
            .await;
    }
}

pub(crate) async fn load_account<S: State>(state: &S, public: &PublicKey) -> Account {
    match state.get(&Key::Account(public.clone())).await {
        Some(Value::Account(account)) => account,
        _ => Account::default(),
    }
}

pub(crate) fn validate_and_increment_nonce(
    account: &mut Account,
    provided_nonce: u64,
) -> Result<(), PrepareError> {
    if account.nonce != provided_nonce {
        return Err(PrepareError::NonceMismatch {
            expected: account.nonce,
            got: provided_nonce,
        });
    }
    account.nonce += 1;
    Ok(())
}

pub(crate) fn verify_signature(transaction: &Transaction) -> Result<(), PrepareError> {
    if !transaction.verify() {
        return Err(PrepareError::InvalidSignature);
    }
    Ok(())
}
