//! Fuzz target for session operation sequences.
//!
//! Interprets the input as a seed plus a list of operations (selections,
//! sends, remote traffic, reordered deliveries, connection drops, clock
//! advances) and applies them to a simulated session. Every standard
//! invariant must hold after every operation.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parlor_harness::{Operation, Simulation};

#[derive(Debug, Arbitrary)]
struct Input {
    seed: u64,
    operations: Vec<Operation>,
}

fuzz_target!(|input: Input| {
    let mut sim = Simulation::new(input.seed, &["general", "random", "dev"]);
    for op in input.operations.into_iter().take(256) {
        let label = format!("{op:?}");
        if let Err(violations) = sim.apply(op) {
            panic!("invariants violated after {label}: {violations:?}");
        }
    }
});
