//! Table rules: dice, game progression, payouts, settlement and the
//! treasury circuit breaker.

mod guard;
mod payout;
mod rng;
mod settle;
mod table;

pub use guard::*;
pub use payout::*;
pub use rng::*;
pub use settle::*;
pub use table::*;

#[cfg(test)]
mod integration_tests;
