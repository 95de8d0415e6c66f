//! Level state store: the per-bar animation state shared by the visualizer
//! and beat ticks.

use crate::config::VisualizerConfig;

/// Per-bar animation state.
///
/// The three arrays are parallel and have the same length for the life of
/// the store. They are sized and seeded with floor values at construction,
/// so a tick can never observe an empty or partially initialised store.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelStore {
    audio_levels: Vec<f32>,
    peak_levels: Vec<f32>,
    beat_levels: Vec<f32>,
    floor: f32,
    /// Drives the travelling wave; only ever grows.
    pub visualizer_phase: f32,
    /// Drives beat hue rotation; grows only while a beat rings.
    pub beat_phase: f32,
    pub beat_intensity: f32,
    /// Engine-clock milliseconds of the last registered pulse.
    pub last_beat_ms: Option<u64>,
}

impl LevelStore {
    pub fn new(array_len: usize, floor: f32) -> Self {
        let len = array_len.max(1);
        Self {
            audio_levels: vec![floor; len],
            peak_levels: vec![floor; len],
            beat_levels: vec![0.0; len],
            floor,
            visualizer_phase: 0.0,
            beat_phase: 0.0,
            beat_intensity: 0.0,
            last_beat_ms: None,
        }
    }

    pub fn from_config(cfg: &VisualizerConfig) -> Self {
        Self::new(cfg.array_len, cfg.floor)
    }

    pub fn len(&self) -> usize {
        self.audio_levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audio_levels.is_empty()
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }

    pub fn audio_levels(&self) -> &[f32] {
        &self.audio_levels
    }

    pub fn peak_levels(&self) -> &[f32] {
        &self.peak_levels
    }

    pub fn beat_levels(&self) -> &[f32] {
        &self.beat_levels
    }

    /// Mutable view of the audio and peak arrays together.
    pub(crate) fn audio_and_peaks_mut(&mut self) -> (&mut [f32], &mut [f32], &[f32]) {
        (
            &mut self.audio_levels,
            &mut self.peak_levels,
            &self.beat_levels,
        )
    }

    pub(crate) fn beat_levels_mut(&mut self) -> &mut [f32] {
        &mut self.beat_levels
    }

    /// Level, peak and beat at `index`, wrapping around the array length.
    pub fn sample(&self, index: usize) -> (f32, f32, f32) {
        let i = index % self.len();
        (self.audio_levels[i], self.peak_levels[i], self.beat_levels[i])
    }

    /// Put every value back at its rest state.
    pub fn reset(&mut self) {
        self.audio_levels.fill(self.floor);
        self.peak_levels.fill(self.floor);
        self.beat_levels.fill(0.0);
        self.beat_intensity = 0.0;
        self.last_beat_ms = None;
    }

    /// True when every array sits exactly on its rest value.
    pub fn at_rest(&self) -> bool {
        self.audio_levels.iter().all(|&v| v == self.floor)
            && self.peak_levels.iter().all(|&v| v == self.floor)
            && self.beat_levels.iter().all(|&v| v == 0.0)
            && self.beat_intensity == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_with_floor_values() {
        let store = LevelStore::new(16, 0.1);
        assert_eq!(store.len(), 16);
        assert!(store.audio_levels().iter().all(|&v| v == 0.1));
        assert!(store.peak_levels().iter().all(|&v| v == 0.1));
        assert!(store.beat_levels().iter().all(|&v| v == 0.0));
        assert_eq!(store.last_beat_ms, None);
        assert!(store.at_rest());
    }

    #[test]
    fn zero_length_is_padded_to_one() {
        let store = LevelStore::new(0, 0.1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.sample(5), (0.1, 0.1, 0.0));
    }

    #[test]
    fn sample_wraps_around() {
        let mut store = LevelStore::new(4, 0.1);
        store.beat_levels_mut()[1] = 0.5;
        assert_eq!(store.sample(5).2, 0.5);
    }

    #[test]
    fn reset_restores_rest_state_but_keeps_phases() {
        let mut store = LevelStore::new(4, 0.1);
        {
            let (audio, peaks, _) = store.audio_and_peaks_mut();
            audio[0] = 0.8;
            peaks[0] = 0.9;
        }
        store.beat_intensity = 0.5;
        store.beat_phase = 3.0;
        store.last_beat_ms = Some(42);
        assert!(!store.at_rest());

        store.reset();
        assert!(store.at_rest());
        assert_eq!(store.beat_phase, 3.0);
        assert_eq!(store.last_beat_ms, None);
    }
}
