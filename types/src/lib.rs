//! Records, codecs and instructions shared by the crapsvault execution layer and its clients.

pub mod craps;
pub mod execution;

pub use craps::{CrapsError, EngineConfig};
pub use execution::{Event, Instruction, Key, Output, Transaction, Value, NAMESPACE};
