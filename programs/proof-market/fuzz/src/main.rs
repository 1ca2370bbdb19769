//! Fuzz test runner for the proof market
//!
//! Run with: cargo run --release
//! Or: cargo test (for property-based tests)

use proof_market_fuzz::*;
use proptest::prelude::*;
use proptest::strategy::ValueTree;
use std::time::Instant;

fn main() {
    println!("=== Proof Market Fuzz Testing ===\n");

    let start = Instant::now();
    let mut total_tests = 0;
    let mut passed = 0;
    let mut failed = 0;

    println!("Running auction fuzz tests...");
    let (p, f) = run_fuzz::<AuctionInput>("auction", 200, |input| simulate_auction(input).0);
    passed += p;
    failed += f;
    total_tests += p + f;

    println!("Running request lifecycle fuzz tests...");
    let (p, f) = run_fuzz::<LifecycleInput>("request_lifecycle", 200, |input| {
        simulate_request_lifecycle(input).0
    });
    passed += p;
    failed += f;
    total_tests += p + f;

    println!("Running stake ledger fuzz tests...");
    let (p, f) = run_fuzz::<LedgerInput>("stake_ledger", 200, |input| simulate_ledger(input).0);
    passed += p;
    failed += f;
    total_tests += p + f;

    println!("Running emission fuzz tests...");
    let (p, f) = run_fuzz::<EmissionInput>("emission", 200, |input| simulate_emission(input).0);
    passed += p;
    failed += f;
    total_tests += p + f;

    println!("Running epoch stats fuzz tests...");
    let (p, f) = run_fuzz::<EpochInput>("epoch_stats", 200, |input| simulate_epochs(input).0);
    passed += p;
    failed += f;
    total_tests += p + f;

    println!("Running edge case tests...");
    let (p, f) = run_edge_case_tests();
    passed += p;
    failed += f;
    total_tests += p + f;

    let duration = start.elapsed();

    println!("\n=== Fuzz Testing Complete ===");
    println!("Total tests: {}", total_tests);
    println!("Passed: {}", passed);
    println!("Failed: {}", failed);
    println!("Duration: {:?}", duration);

    if failed > 0 {
        std::process::exit(1);
    }
}

fn run_fuzz<T>(name: &str, iterations: usize, simulate: impl Fn(&T) -> SimulationResult) -> (usize, usize)
where
    T: Arbitrary + std::fmt::Debug,
{
    let mut passed = 0;
    let mut failed = 0;

    let mut runner = proptest::test_runner::TestRunner::default();

    for i in 0..iterations {
        let input = any::<T>()
            .new_tree(&mut runner)
            .expect("Failed to generate fuzz input")
            .current();

        let result = simulate(&input);

        if result.is_invariant_violation() {
            println!("  [FAIL] Iteration {}: {:?}\n  Input: {:?}", i, result, input);
            failed += 1;
        } else {
            passed += 1;
        }
    }

    println!("  {}: {} passed, {} failed", name, passed, failed);
    (passed, failed)
}

fn run_edge_case_tests() -> (usize, usize) {
    let mut passed = 0;
    let mut failed = 0;

    let mut record = |label: &str, result: SimulationResult| {
        if result.is_invariant_violation() {
            println!("  [FAIL] {}: {:?}", label, result);
            failed += 1;
        } else {
            passed += 1;
        }
    };

    // Fee ceiling at the top of the range with every bid at the ceiling
    record(
        "ceiling-priced bids",
        simulate_auction(&AuctionInput {
            fee_ceiling: u64::MAX / 2,
            protocol_fee_bps: 1000,
            reveals: vec![u64::MAX / 2; 3],
        })
        .0,
    );

    // Zero-fee winner and runner-up
    record(
        "zero fees",
        simulate_auction(&AuctionInput {
            fee_ceiling: 1,
            protocol_fee_bps: 1000,
            reveals: vec![0, 0],
        })
        .0,
    );

    // Slash straight to just above the floor
    record(
        "slash to floor",
        simulate_slashing(1, &[8_999, 1], 10_000).0,
    );

    // Dust-sized stake receiving a large deposit
    record(
        "dust stake",
        simulate_ledger(&LedgerInput {
            min_self_stake: 0,
            commission_bps: 0,
            max_slash_bps: 10_000,
            unstake_delay: 0,
            ops: vec![
                LedgerOp::Stake { staker: 0, amount: 1 },
                LedgerOp::Deposit { amount: u64::MAX / 4 },
                LedgerOp::Claim { staker: 0 },
                LedgerOp::Stake { staker: 1, amount: 1_000_000_000_000 },
            ],
        })
        .0,
    );

    // Budget smaller than a single second of emission
    record(
        "tiny budget",
        simulate_emission(&EmissionInput {
            emission_rate: 1_000_000_000,
            budget: 1,
            steps: vec![(0, 0, 3), (0, 1, 1), (1, 2, 3), (1, 0, 0)],
        })
        .0,
    );

    println!("  edge_cases: {} passed, {} failed", passed, failed);
    (passed, failed)
}
