//! Deterministic execution of crapsvault table instructions over a key-value state.

pub mod craps;
pub mod state_transition;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

mod layer;

mod state;

pub use layer::Layer;
pub use state::{balance, nonce, seed_genesis, Memory, PrepareError, State, Status};
