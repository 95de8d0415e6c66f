use crate::error::Result;

/// Read-only view of whatever is playing. The engine never drives it.
pub trait PositionSource {
    fn position_ms(&self) -> Result<i64>;
    fn duration_ms(&self) -> Result<i64>;
    fn is_playing(&self) -> Result<bool>;
}

/// One reading of the position source, taken once per progress tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub media_loaded: bool,
    pub playing: bool,
    pub position_ms: i64,
    pub duration_ms: i64,
}

impl PlaybackSnapshot {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Read the source. Any failure counts as "not playing" for this tick.
    pub fn sample<S: PositionSource + ?Sized>(source: &S, media_loaded: bool) -> Self {
        if !media_loaded {
            return Self::idle();
        }
        let read = || -> Result<Self> {
            Ok(Self {
                media_loaded,
                playing: source.is_playing()?,
                position_ms: source.position_ms()?.max(0),
                duration_ms: source.duration_ms()?.max(0),
            })
        };
        match read() {
            Ok(snap) => snap,
            Err(e) => {
                tracing::debug!("position source unavailable: {}", e);
                Self {
                    media_loaded,
                    ..Self::idle()
                }
            }
        }
    }

    /// Gate for the visualizer and beat ticks.
    pub fn is_active(&self) -> bool {
        self.media_loaded && self.playing
    }

    pub fn progress_ratio(&self) -> f64 {
        progress_ratio(self.position_ms, self.duration_ms)
    }

    pub fn time_label(&self) -> String {
        if !self.media_loaded {
            return IDLE_TIME_LABEL.to_string();
        }
        time_label(self.position_ms, self.duration_ms)
    }
}

pub const IDLE_TIME_LABEL: &str = "0:00 / 0:00";

pub fn progress_ratio(position_ms: i64, duration_ms: i64) -> f64 {
    if duration_ms <= 0 {
        return 0.0;
    }
    (position_ms as f64 / duration_ms as f64).clamp(0.0, 1.0)
}

/// `MM:SS`, minutes wrapping at the hour.
pub fn format_time(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    format!("{:02}:{:02}", (secs / 60) % 60, secs % 60)
}

pub fn time_label(position_ms: i64, duration_ms: i64) -> String {
    format!("{} / {}", format_time(position_ms), format_time(duration_ms))
}

/// Position for a click at `fraction` of the progress bar.
pub fn seek_target(fraction: f64, duration_ms: i64) -> i64 {
    if duration_ms <= 0 {
        return 0;
    }
    (fraction.clamp(0.0, 1.0) * duration_ms as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApexError;
    use std::cell::Cell;

    struct Fixed {
        pos: i64,
        dur: i64,
        playing: bool,
    }

    impl PositionSource for Fixed {
        fn position_ms(&self) -> Result<i64> {
            Ok(self.pos)
        }
        fn duration_ms(&self) -> Result<i64> {
            Ok(self.dur)
        }
        fn is_playing(&self) -> Result<bool> {
            Ok(self.playing)
        }
    }

    struct Broken {
        calls: Cell<u32>,
    }

    impl PositionSource for Broken {
        fn position_ms(&self) -> Result<i64> {
            self.calls.set(self.calls.get() + 1);
            Err(ApexError::Source("socket closed".into()))
        }
        fn duration_ms(&self) -> Result<i64> {
            Ok(10_000)
        }
        fn is_playing(&self) -> Result<bool> {
            Ok(true)
        }
    }

    #[test]
    fn zero_duration_gives_zero_ratio() {
        assert_eq!(progress_ratio(5_000, 0), 0.0);
        assert_eq!(progress_ratio(5_000, -1), 0.0);
        assert_eq!(progress_ratio(2_500, 10_000), 0.25);
        assert_eq!(progress_ratio(20_000, 10_000), 1.0);
    }

    #[test]
    fn source_error_reads_as_not_playing() {
        let src = Broken { calls: Cell::new(0) };
        let snap = PlaybackSnapshot::sample(&src, true);
        assert_eq!(src.calls.get(), 1);
        assert!(snap.media_loaded);
        assert!(!snap.playing);
        assert!(!snap.is_active());
    }

    #[test]
    fn unloaded_media_is_idle_without_touching_source() {
        let src = Broken { calls: Cell::new(0) };
        let snap = PlaybackSnapshot::sample(&src, false);
        assert_eq!(snap, PlaybackSnapshot::idle());
        assert_eq!(src.calls.get(), 0);
        assert_eq!(snap.time_label(), "0:00 / 0:00");
    }

    #[test]
    fn sample_reads_all_fields() {
        let src = Fixed {
            pos: 61_500,
            dur: 3_725_000,
            playing: true,
        };
        let snap = PlaybackSnapshot::sample(&src, true);
        assert!(snap.is_active());
        assert_eq!(snap.time_label(), "01:01 / 02:05");
    }

    #[test]
    fn time_formatting() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(59_999), "00:59");
        assert_eq!(format_time(600_000), "10:00");
        assert_eq!(format_time(-5), "00:00");
        assert_eq!(time_label(5_000, 185_000), "00:05 / 03:05");
    }

    #[test]
    fn seek_target_scales_and_clamps() {
        assert_eq!(seek_target(0.5, 200_000), 100_000);
        assert_eq!(seek_target(1.5, 200_000), 200_000);
        assert_eq!(seek_target(-0.2, 200_000), 0);
        assert_eq!(seek_target(0.5, 0), 0);
    }
}
