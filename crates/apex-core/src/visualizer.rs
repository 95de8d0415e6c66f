//! Visualizer tick: smoothed random walk with a travelling wave and a
//! peak-hold envelope follower.

use rand::Rng;

use crate::config::VisualizerConfig;
use crate::levels::LevelStore;

/// Distance at which a level is considered to have reached its target.
const SETTLE: f32 = 1e-4;

/// Advance `audio_levels` and `peak_levels` by one tick.
///
/// While `active` each index moves toward
/// `base + wave + jitter * random_scale + beat * beat_weight` (clamped to
/// `[floor, 1]`); otherwise it moves toward the floor. Levels follow the
/// target through exponential smoothing; peaks snap up to a rising level and
/// otherwise decay geometrically, never below the floor or the new level.
pub fn advance<R: Rng>(
    store: &mut LevelStore,
    active: bool,
    cfg: &VisualizerConfig,
    rng: &mut R,
) {
    let floor = store.floor();
    let phase = store.visualizer_phase;
    let (audio, peaks, beats) = store.audio_and_peaks_mut();

    for i in 0..audio.len() {
        let raw = if active {
            let wave = ((i as f32 + phase) * cfg.wave_frequency).sin() * cfg.wave_amplitude;
            let jitter = if cfg.random_range > 0.0 {
                rng.gen_range(-cfg.random_range..=cfg.random_range)
            } else {
                0.0
            };
            let beat = beats[i] * cfg.beat_weight;
            (cfg.base_playing + wave + jitter * cfg.random_scale + beat).clamp(floor, 1.0)
        } else {
            floor
        };

        // Rounding can park the level one ulp above its target forever.
        let mut smoothed = (raw + (audio[i] - raw) * cfg.alpha).clamp(floor, 1.0);
        if (smoothed - raw).abs() < SETTLE {
            smoothed = raw;
        }
        audio[i] = smoothed;

        peaks[i] = if smoothed > peaks[i] {
            smoothed
        } else {
            (peaks[i] * cfg.peak_decay).max(floor).max(smoothed)
        };
    }

    store.visualizer_phase += cfg.phase_step;
}
