use anyhow::{Context, Result, bail};
use cs_core::frame::FrameBuffer;
use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, ResizeOptions, Resizer as FirResizer};

/// Resizer réutilisable wrappant fast_image_resize.
///
/// Pré-alloue le resizer pour zéro allocation en hot path.
///
/// # Example
/// ```
/// use cs_source::resize::Resizer;
/// let r = Resizer::new();
/// ```
pub struct Resizer {
    inner: FirResizer,
    options: ResizeOptions,
    /// Copie de la source (fast_image_resize veut un `&mut` sur l'image source).
    src_buf: Vec<u8>,
}

impl Resizer {
    /// Create a new resizer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new(),
            src_buf: Vec::new(),
        }
    }

    /// Resize `src` into `dst`. Dimensions of `dst` determine output size.
    ///
    /// # Errors
    /// Returns an error if either frame has a zero dimension or if the
    /// resize operation fails.
    ///
    /// # Example
    /// ```
    /// use cs_source::resize::Resizer;
    /// use cs_core::frame::FrameBuffer;
    /// let mut r = Resizer::new();
    /// let src = FrameBuffer::new(100, 50);
    /// let mut dst = FrameBuffer::new(40, 8);
    /// r.resize_into(&src, &mut dst).unwrap();
    /// assert_eq!(dst.data.len(), 40 * 8 * 4);
    /// ```
    pub fn resize_into(&mut self, src: &FrameBuffer, dst: &mut FrameBuffer) -> Result<()> {
        if src.is_empty() || dst.is_empty() {
            bail!(
                "Resize impossible : {}x{} -> {}x{}",
                src.width,
                src.height,
                dst.width,
                dst.height
            );
        }
        if src.width == dst.width && src.height == dst.height {
            dst.data.copy_from_slice(&src.data);
            return Ok(());
        }

        self.src_buf.clear();
        self.src_buf.extend_from_slice(&src.data);

        let src_image =
            Image::from_slice_u8(src.width, src.height, &mut self.src_buf, PixelType::U8x4)
                .context("Invalid source dimensions")?;

        let mut dst_image =
            Image::from_slice_u8(dst.width, dst.height, &mut dst.data, PixelType::U8x4)
                .context("Invalid destination dimensions")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("Resize failed")?;

        Ok(())
    }

    /// Resize `src` to `width`×`height`, reallocating `dst` only when the
    /// target size changed.
    ///
    /// # Errors
    /// Same as [`Resizer::resize_into`].
    pub fn resize_to(
        &mut self,
        src: &FrameBuffer,
        width: u32,
        height: u32,
        dst: &mut FrameBuffer,
    ) -> Result<()> {
        if dst.width != width || dst.height != height {
            *dst = FrameBuffer::new(width, height);
        }
        self.resize_into(src, dst)
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}
