//! Terminal output for camscii.
//!
//! Provides the terminal abstraction, the frame renderer, and per-stage timing.

pub mod perf;
pub mod renderer;
pub mod terminal;

pub use perf::{PerfMonitor, PerfSample, Stage};
pub use renderer::Renderer;
pub use terminal::{CrosstermTerminal, RecordingTerminal, Terminal, TerminalSession};
