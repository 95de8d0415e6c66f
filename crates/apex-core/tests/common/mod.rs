#![allow(dead_code)]

use apex_core::config::Config;
use apex_core::engine::{ManualClock, VisualizerEngine};

pub const SEED: u64 = 0x5eed_a9e1;

/// Engine on a manual clock, seeded so every run sees the same pulses.
pub fn seeded_engine() -> (VisualizerEngine<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let engine = VisualizerEngine::with_clock(&Config::default(), Some(SEED), clock.clone());
    (engine, clock)
}
