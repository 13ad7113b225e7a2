//! Character art conversion engine for camscii.
//!
//! Plans the resize target, extracts per-pixel brightness, and maps it onto
//! a character ramp in parallel.

pub mod brightness;
pub mod mapper;
pub mod planner;

pub use brightness::{BrightnessBuffer, BrightnessStats};
pub use mapper::{CharacterMapper, RenderedFrame};
pub use planner::{DimensionPlanner, TargetSize};
