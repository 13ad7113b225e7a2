//! Visual source modules for camscii (webcam, test pattern, still image).

pub mod image;
pub mod pattern;
pub mod resize;
pub mod webcam;

use std::path::PathBuf;

use cs_core::config::CaptureConfig;
use cs_core::traits::Source;

/// Which source feeds the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceSpec {
    /// Live camera through ffmpeg.
    Webcam(CaptureConfig),
    /// Animated test pattern of the given size.
    Pattern {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// Still image file.
    Still(PathBuf),
}

/// Fabrique la source choisie par l'utilisateur.
///
/// # Errors
/// Retourne une erreur si la caméra ne peut être ouverte ou l'image chargée.
///
/// # Example
/// ```
/// use cs_source::{open_source, SourceSpec};
/// let mut source = open_source(&SourceSpec::Pattern { width: 32, height: 16 }).unwrap();
/// let frame = source.next_frame().unwrap();
/// assert_eq!((frame.width, frame.height), (32, 16));
/// assert!(source.is_live());
/// ```
pub fn open_source(spec: &SourceSpec) -> anyhow::Result<Box<dyn Source>> {
    Ok(match spec {
        SourceSpec::Webcam(cfg) => Box::new(webcam::WebcamSource::open(cfg)?),
        SourceSpec::Pattern { width, height } => {
            Box::new(pattern::PatternSource::new(*width, *height))
        }
        SourceSpec::Still(path) => Box::new(image::StillSource::open(path)?),
    })
}
