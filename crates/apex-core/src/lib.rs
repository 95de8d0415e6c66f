pub mod beat;
pub mod config;
pub mod engine;
pub mod error;
pub mod levels;
pub mod platform;
pub mod playback;
pub mod playlist;
pub mod render;
pub mod scheduler;
pub mod visualizer;

pub use config::Config;
pub use engine::VisualizerEngine;
pub use error::{ApexError, Result};
