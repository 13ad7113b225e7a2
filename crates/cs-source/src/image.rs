use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cs_core::error::CoreError;
use cs_core::frame::FrameBuffer;
use cs_core::traits::Source;

/// Source d'image statique. Retourne toujours la même frame.
///
/// # Example
/// ```no_run
/// use cs_source::image::StillSource;
/// use std::path::Path;
/// let source = StillSource::open(Path::new("test.png")).unwrap();
/// ```
pub struct StillSource {
    frame: Arc<FrameBuffer>,
}

impl StillSource {
    /// Load an image from disk and create a source.
    ///
    /// # Errors
    /// Returns an error if the image cannot be loaded or is empty.
    pub fn open(path: &Path) -> Result<Self> {
        let frame = load_image(path)?;
        log::info!(
            "image: {} ({}x{})",
            path.display(),
            frame.width,
            frame.height
        );
        Ok(Self::from_frame(frame))
    }

    /// Wrap an already decoded frame.
    #[must_use]
    pub fn from_frame(frame: FrameBuffer) -> Self {
        Self {
            frame: Arc::new(frame),
        }
    }
}

impl Source for StillSource {
    fn next_frame(&mut self) -> Result<Arc<FrameBuffer>, CoreError> {
        Ok(Arc::clone(&self.frame))
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// Décode une image (PNG, JPEG, BMP, GIF) en RGBA.
///
/// # Errors
/// Returns an error if the image cannot be loaded or has a zero dimension.
///
/// # Example
/// ```no_run
/// use cs_source::image::load_image;
/// use std::path::Path;
/// let frame = load_image(Path::new("test.png")).unwrap();
/// ```
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    let img = image::open(path)
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        anyhow::bail!("Image vide : {}", path.display());
    }
    Ok(FrameBuffer::from_rgba(width, height, rgba.into_raw())?)
}
