//! Bar render mapping: a pure function from the level store to per-bar draw
//! commands. Nothing here mutates the store, so a paint can happen at any
//! point between ticks and always shows the latest snapshot.

use crate::config::{ColorPolicy, RenderConfig, VisualizerConfig};
use crate::levels::LevelStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Rgb(c[0], c[1], c[2])
    }
}

/// One bar, in the caller's pixel units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarSpec {
    pub bar: usize,
    /// Index into the level arrays this bar samples.
    pub state_index: usize,
    pub height: f32,
    /// Height of the peak-hold tick, present only above the bar body.
    pub peak_height: Option<f32>,
    pub color: Rgb,
}

/// Map a display bar to a level-array index.
pub fn state_index(bar: usize, stride: usize, array_len: usize) -> usize {
    if array_len == 0 {
        return 0;
    }
    (bar.wrapping_mul(stride)) % array_len
}

/// Build draw commands for every bar.
///
/// `pixel_height` is the height of the bar slot; heights never exceed it.
/// While `active` is false the bars are drawn at rest regardless of what the
/// store holds.
pub fn render_bars(
    store: &LevelStore,
    active: bool,
    vis: &VisualizerConfig,
    cfg: &RenderConfig,
    pixel_height: f32,
) -> Vec<BarSpec> {
    let floor = store.floor();
    let pixel_height = pixel_height.max(0.0);

    (0..vis.bar_count)
        .map(|bar| {
            let idx = state_index(bar, vis.stride, store.len());
            let (level, peak, beat) = if active {
                store.sample(idx)
            } else {
                (floor, floor, 0.0)
            };

            let height = ((level + beat * cfg.beat_height_weight) * pixel_height).min(pixel_height);
            let peak_px = (peak * pixel_height).min(pixel_height);
            let peak_height = (peak_px > height).then_some(peak_px);

            let beat_phase = if active { store.beat_phase } else { 0.0 };
            BarSpec {
                bar,
                state_index: idx,
                height,
                peak_height,
                color: bar_color(bar, beat, beat_phase, cfg),
            }
        })
        .collect()
}

pub fn bar_color(bar: usize, beat: f32, beat_phase: f32, cfg: &RenderConfig) -> Rgb {
    match cfg.color_policy {
        ColorPolicy::Alternating => {
            if bar % 2 == 0 {
                cfg.even_color.into()
            } else {
                cfg.odd_color.into()
            }
        }
        ColorPolicy::BeatHue => {
            let hue = (bar as f32 * cfg.hue_step + beat_phase * cfg.hue_rate).rem_euclid(360.0);
            let strength = beat.clamp(0.0, 1.0);
            let saturation = 0.55 + 0.45 * strength;
            let value = 0.7 + 0.3 * strength;
            hsv_to_rgb(hue, saturation, value)
        }
    }
}

/// `h` in degrees, `s` and `v` in [0, 1].
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let h = h.rem_euclid(360.0);
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |f: f32| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb(to_u8(r), to_u8(g), to_u8(b))
}
