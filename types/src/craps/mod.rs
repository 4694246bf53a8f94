mod batch;
mod bet;
mod codec;
mod config;
mod constants;
mod errors;
mod outcome;
mod rng;
mod treasury;

pub use batch::*;
pub use bet::*;
pub use codec::*;
pub use config::*;
pub use constants::*;
pub use errors::*;
pub use outcome::*;
pub use rng::*;
pub use treasury::*;

#[cfg(test)]
mod tests;
