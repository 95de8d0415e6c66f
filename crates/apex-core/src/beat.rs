//! Beat tick: rate-limited random pulses that ring down geometrically.
//!
//! Nothing here listens to the audio. A pulse is a coin flip with a small
//! probability, allowed at most once per `min_gap_ms`, that sets every beat
//! level to the pulse intensity.

use rand::Rng;

use crate::config::BeatConfig;
use crate::levels::LevelStore;

/// Advance `beat_levels`, `beat_intensity` and `beat_phase` by one tick.
///
/// Returns `true` when a new pulse was registered on this tick.
pub fn advance<R: Rng>(
    store: &mut LevelStore,
    active: bool,
    now_ms: u64,
    cfg: &BeatConfig,
    rng: &mut R,
) -> bool {
    let mut fired = false;

    if active
        && gap_elapsed(store.last_beat_ms, now_ms, cfg.min_gap_ms)
        && rng.gen_bool(cfg.probability)
    {
        store.last_beat_ms = Some(now_ms);
        store.beat_intensity = cfg.pulse_intensity;
        store.beat_levels_mut().fill(cfg.pulse_intensity);
        fired = true;
    }

    store.beat_intensity = decay(store.beat_intensity, cfg.intensity_decay, cfg.epsilon);
    if active {
        store.beat_phase += store.beat_intensity * cfg.phase_rate;
    }

    for level in store.beat_levels_mut() {
        *level = decay(*level, cfg.level_decay, cfg.epsilon);
    }

    fired
}

fn gap_elapsed(last: Option<u64>, now_ms: u64, min_gap_ms: u64) -> bool {
    match last {
        None => true,
        Some(t) => now_ms.saturating_sub(t) >= min_gap_ms,
    }
}

fn decay(value: f32, factor: f32, epsilon: f32) -> f32 {
    let next = value * factor;
    if next < epsilon {
        0.0
    } else {
        next
    }
}

/// Beat ticks a pulse needs to ring down to exactly zero.
pub fn ring_down_ticks(cfg: &BeatConfig) -> usize {
    let mut value = cfg.pulse_intensity;
    let mut ticks = 0;
    while value > 0.0 {
        value = decay(value, cfg.intensity_decay, cfg.epsilon);
        ticks += 1;
    }
    ticks
}
