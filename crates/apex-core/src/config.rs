use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::{ApexError, Result};
use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub visualizer: VisualizerConfig,
    #[serde(default)]
    pub beat: BeatConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub timers: TimerConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Shape of the level store and the smoothed random walk that drives it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Bars on screen.
    pub bar_count: usize,
    /// Length of the simulated level arrays (>= bar_count).
    pub array_len: usize,
    /// Stride used to sample the arrays for display.
    pub stride: usize,
    /// Resting level; no bar goes below it.
    pub floor: f32,
    pub base_playing: f32,
    pub wave_frequency: f32,
    pub wave_amplitude: f32,
    /// Jitter is drawn uniformly from `[-random_range, random_range]`.
    pub random_range: f32,
    pub random_scale: f32,
    pub beat_weight: f32,
    /// Smoothing weight kept from the previous level each tick.
    pub alpha: f32,
    /// Per-tick geometric decay of the peak hold.
    pub peak_decay: f32,
    pub phase_step: f32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            bar_count: 32,
            array_len: 64,
            stride: 7,
            floor: 0.1,
            base_playing: 0.35,
            wave_frequency: 0.3,
            wave_amplitude: 0.15,
            random_range: 0.5,
            random_scale: 0.35,
            beat_weight: 0.4,
            alpha: 0.75,
            peak_decay: 0.96,
            phase_step: 0.15,
        }
    }
}

/// Pseudo-beat pulse generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BeatConfig {
    /// Chance of a pulse on each eligible tick.
    pub probability: f64,
    pub min_gap_ms: u64,
    pub pulse_intensity: f32,
    pub intensity_decay: f32,
    pub level_decay: f32,
    /// Values below this snap to exactly zero.
    pub epsilon: f32,
    pub phase_rate: f32,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            probability: 0.04,
            min_gap_ms: 100,
            pulse_intensity: 0.9,
            intensity_decay: 0.8,
            level_decay: 0.85,
            epsilon: 0.01,
            phase_rate: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ColorPolicy {
    /// Two fixed colours alternating by bar parity.
    Alternating,
    /// Hue rotates per bar and with the beat phase.
    #[default]
    BeatHue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub color_policy: ColorPolicy,
    pub beat_height_weight: f32,
    /// Degrees of hue between neighbouring bars.
    pub hue_step: f32,
    /// Degrees of hue per unit of beat phase.
    pub hue_rate: f32,
    pub even_color: [u8; 3],
    pub odd_color: [u8; 3],
    pub peak_color: [u8; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            color_policy: ColorPolicy::BeatHue,
            beat_height_weight: 0.3,
            hue_step: 12.0,
            hue_rate: 40.0,
            even_color: [36, 255, 255],
            odd_color: [26, 160, 255],
            peak_color: [235, 235, 245],
        }
    }
}

/// Periods of the three scheduled tasks, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimerConfig {
    pub progress_ms: u64,
    pub visualizer_ms: u64,
    pub beat_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            progress_ms: 100,
            visualizer_ms: 30,
            beat_ms: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub default_volume: f32,
    pub seek_back_ms: i64,
    pub seek_forward_ms: i64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: 0.5,
            seek_back_ms: 5_000,
            seek_forward_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    /// Flat list of saved media paths, one per line.
    #[serde(default = "default_playlist_file")]
    pub playlist_file: PathBuf,
    /// Starting directory for the open prompt.
    #[serde(default = "platform::music_dir")]
    pub music_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            playlist_file: default_playlist_file(),
            music_dir: platform::music_dir(),
        }
    }
}

fn default_playlist_file() -> PathBuf {
    platform::data_dir().join("musiclist.txt")
}

fn check(ok: bool, msg: impl Into<String>) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(ApexError::Config(msg.into()))
    }
}

/// Upper bound on `visualizer.bar_count`; the panel lays bars out in `u16` cells.
pub const MAX_BAR_COUNT: usize = 1024;

fn unit_open(v: f32) -> bool {
    v > 0.0 && v < 1.0
}

impl Config {
    /// Load from the default location, writing the defaults on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        self.check_finite()?;

        let v = &self.visualizer;
        check(v.bar_count > 0, "visualizer.bar_count must be positive")?;
        check(
            v.bar_count <= MAX_BAR_COUNT,
            format!("visualizer.bar_count must be at most {}", MAX_BAR_COUNT),
        )?;
        check(
            v.array_len >= v.bar_count,
            format!(
                "visualizer.array_len ({}) must be >= bar_count ({})",
                v.array_len, v.bar_count
            ),
        )?;
        check(v.stride > 0, "visualizer.stride must be positive")?;
        check(
            v.floor > 0.0 && v.floor < 1.0,
            "visualizer.floor must lie in (0, 1)",
        )?;
        check(
            (0.0..1.0).contains(&v.alpha),
            "visualizer.alpha must lie in [0, 1)",
        )?;
        check(unit_open(v.peak_decay), "visualizer.peak_decay must lie in (0, 1)")?;
        check(v.random_range >= 0.0, "visualizer.random_range must not be negative")?;

        let b = &self.beat;
        check(
            (0.0..=1.0).contains(&b.probability),
            "beat.probability must lie in [0, 1]",
        )?;
        check(
            b.pulse_intensity > 0.0 && b.pulse_intensity <= 1.0,
            "beat.pulse_intensity must lie in (0, 1]",
        )?;
        check(unit_open(b.intensity_decay), "beat.intensity_decay must lie in (0, 1)")?;
        check(unit_open(b.level_decay), "beat.level_decay must lie in (0, 1)")?;
        check(b.epsilon > 0.0, "beat.epsilon must be positive")?;

        let t = &self.timers;
        check(
            t.progress_ms > 0 && t.visualizer_ms > 0 && t.beat_ms > 0,
            "timer periods must be positive",
        )?;
        Ok(())
    }

    /// NaN survives `clamp`, so every float tunable has to be rejected up front.
    fn check_finite(&self) -> Result<()> {
        let v = &self.visualizer;
        let b = &self.beat;
        let r = &self.render;
        let floats = [
            ("visualizer.floor", v.floor),
            ("visualizer.base_playing", v.base_playing),
            ("visualizer.wave_frequency", v.wave_frequency),
            ("visualizer.wave_amplitude", v.wave_amplitude),
            ("visualizer.random_range", v.random_range),
            ("visualizer.random_scale", v.random_scale),
            ("visualizer.beat_weight", v.beat_weight),
            ("visualizer.alpha", v.alpha),
            ("visualizer.peak_decay", v.peak_decay),
            ("visualizer.phase_step", v.phase_step),
            ("beat.pulse_intensity", b.pulse_intensity),
            ("beat.intensity_decay", b.intensity_decay),
            ("beat.level_decay", b.level_decay),
            ("beat.epsilon", b.epsilon),
            ("beat.phase_rate", b.phase_rate),
            ("render.beat_height_weight", r.beat_height_weight),
            ("render.hue_step", r.hue_step),
            ("render.hue_rate", r.hue_rate),
            ("player.default_volume", self.player.default_volume),
        ];
        for (name, value) in floats {
            check(value.is_finite(), format!("{} must be finite", name))?;
        }
        check(b.probability.is_finite(), "beat.probability must be finite")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timers.visualizer_ms, 30);
        assert_eq!(config.timers.beat_ms, 20);
        assert_eq!(config.beat.min_gap_ms, 100);
        assert_eq!(config.visualizer.floor, 0.1);
        assert!(config.paths.playlist_file.ends_with("musiclist.txt"));
    }

    #[test]
    fn rejects_array_shorter_than_bars() {
        let mut config = Config::default();
        config.visualizer.array_len = config.visualizer.bar_count - 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("array_len"));
    }

    #[test]
    fn rejects_non_decaying_constants() {
        let mut config = Config::default();
        config.visualizer.peak_decay = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.beat.intensity_decay = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timers.beat_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_oversized_bar_count() {
        let mut config = Config::default();
        config.visualizer.bar_count = MAX_BAR_COUNT + 1;
        config.visualizer.array_len = MAX_BAR_COUNT + 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bar_count"));

        config.visualizer.bar_count = MAX_BAR_COUNT;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_finite_tunables() {
        let mut config = Config::default();
        config.render.hue_rate = f32::INFINITY;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("render.hue_rate"));

        let mut config = Config::default();
        config.visualizer.base_playing = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_rejects_nan_and_inf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[visualizer]\nwave_amplitude = nan\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("wave_amplitude"));

        std::fs::write(&path, "[visualizer]\nrandom_range = inf\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("random_range"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let text = r#"
            [beat]
            probability = 0.1

            [render]
            color_policy = "alternating"
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.beat.probability, 0.1);
        assert_eq!(config.beat.min_gap_ms, 100);
        assert_eq!(config.render.color_policy, ColorPolicy::Alternating);
        assert_eq!(config.visualizer, VisualizerConfig::default());
    }

    #[test]
    fn load_from_writes_defaults_then_reads_them_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let first = Config::load_from(&path).unwrap();
        assert!(path.exists());

        let mut edited = first.clone();
        edited.timers.visualizer_ms = 40;
        edited.save_to(&path).unwrap();

        let second = Config::load_from(&path).unwrap();
        assert_eq!(second.timers.visualizer_ms, 40);
        assert_eq!(second.visualizer, first.visualizer);
    }

    #[test]
    fn load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[visualizer]\nalpha = 1.5\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ApexError::Config(_))
        ));
    }
}
