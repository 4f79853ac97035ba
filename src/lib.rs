//! Batch video conversion core: encoder argument building, hardware
//! fallback, sequential batch orchestration, and debounced color-grading
//! previews around an external ffmpeg process.

pub mod cli;
pub mod config;
pub mod engine;
pub mod events;
pub mod upload;

pub use config::Config;
pub use events::{Event, Level, Reporter};
