//! The visualizer engine: level store, tunables, random source and clock in
//! one owner, with a dirty flag the UI drains before painting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::beat;
use crate::config::{BeatConfig, Config, RenderConfig, VisualizerConfig};
use crate::levels::LevelStore;
use crate::render::{self, BarSpec};
use crate::visualizer;

/// Milliseconds since some fixed epoch.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall-clock time measured from construction.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::Relaxed);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

pub struct VisualizerEngine<C: Clock = MonotonicClock> {
    store: LevelStore,
    visualizer: VisualizerConfig,
    beat: BeatConfig,
    render: RenderConfig,
    rng: StdRng,
    clock: C,
    dirty: bool,
    pulses: u64,
}

impl VisualizerEngine<MonotonicClock> {
    /// Engine on the wall clock. `seed` pins the random source.
    pub fn new(config: &Config, seed: Option<u64>) -> Self {
        Self::with_clock(config, seed, MonotonicClock::new())
    }
}

impl<C: Clock> VisualizerEngine<C> {
    pub fn with_clock(config: &Config, seed: Option<u64>, clock: C) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            store: LevelStore::from_config(&config.visualizer),
            visualizer: config.visualizer.clone(),
            beat: config.beat.clone(),
            render: config.render.clone(),
            rng,
            clock,
            dirty: true,
            pulses: 0,
        }
    }

    pub fn store(&self) -> &LevelStore {
        &self.store
    }

    pub fn bar_count(&self) -> usize {
        self.visualizer.bar_count
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.render
    }

    /// Pulses registered since construction.
    pub fn pulse_count(&self) -> u64 {
        self.pulses
    }

    pub fn tick_visualizer(&mut self, active: bool) {
        visualizer::advance(&mut self.store, active, &self.visualizer, &mut self.rng);
        self.dirty = true;
    }

    /// Returns `true` when this tick registered a pulse.
    pub fn tick_beat(&mut self, active: bool) -> bool {
        let now = self.clock.now_ms();
        let fired = beat::advance(&mut self.store, active, now, &self.beat, &mut self.rng);
        if fired {
            self.pulses += 1;
            tracing::debug!(
                "beat pulse #{} at {}ms (phase {:.2})",
                self.pulses,
                now,
                self.store.beat_phase
            );
        }
        self.dirty = true;
        fired
    }

    pub fn bars(&self, active: bool, pixel_height: f32) -> Vec<BarSpec> {
        render::render_bars(
            &self.store,
            active,
            &self.visualizer,
            &self.render,
            pixel_height,
        )
    }

    /// Drop all motion, e.g. when new media is loaded.
    pub fn reset(&mut self) {
        self.store.reset();
        self.dirty = true;
    }

    /// Consume the pending repaint request, if any.
    pub fn take_repaint(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
