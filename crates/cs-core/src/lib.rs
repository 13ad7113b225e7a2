//! Configuration, types, and shared structures for camscii.
//!
//! This crate contains all shared types, traits, and configuration logic
//! used across the camscii workspace.

pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use charset::{CharacterRamp, LuminanceLut};
pub use config::RenderConfig;
pub use error::CoreError;
pub use frame::{FrameBuffer, TerminalGrid};

