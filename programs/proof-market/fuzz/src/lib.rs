//! Property-based fuzz testing library for the proof market
//!
//! Drives the program's auction, ledger, reward and stats helpers through
//! arbitrary operation sequences and checks the market invariants after
//! every step.
//!
//! # Usage
//!
//! ```bash
//! # Run all property-based tests
//! cargo test --release
//!
//! # Run the fuzz test runner
//! cargo run --release
//!
//! # Run with more iterations
//! PROPTEST_CASES=10000 cargo test --release
//! ```

pub mod arbitrary;
pub mod invariants;
pub mod scenarios;

pub use arbitrary::*;
pub use invariants::*;
pub use scenarios::*;

// Include fuzz targets as test modules
#[cfg(test)]
#[path = "../fuzz_targets/auction_ranking.rs"]
mod auction_ranking_tests;

#[cfg(test)]
#[path = "../fuzz_targets/request_lifecycle.rs"]
mod request_lifecycle_tests;

#[cfg(test)]
#[path = "../fuzz_targets/share_conservation.rs"]
mod share_conservation_tests;

#[cfg(test)]
#[path = "../fuzz_targets/slashing_scale.rs"]
mod slashing_scale_tests;

#[cfg(test)]
#[path = "../fuzz_targets/reward_accumulator.rs"]
mod reward_accumulator_tests;

#[cfg(test)]
#[path = "../fuzz_targets/epoch_stats.rs"]
mod epoch_stats_tests;
