use crate::error::CoreError;

/// Buffer de pixels réutilisable. Pré-alloué, jamais redimensionné en hot path.
///
/// Stocke les pixels en RGBA row-major, 4 bytes par pixel. Le canal alpha est
/// transporté tel quel mais ignoré par le pipeline.
///
/// # Example
/// ```
/// use cs_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer pré-alloué (noir transparent) aux dimensions données.
    ///
    /// # Example
    /// ```
    /// use cs_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(100, 50);
    /// assert_eq!(fb.width, 100);
    /// assert_eq!(fb.height, 50);
    /// assert_eq!(fb.data.len(), 100 * 50 * 4);
    /// ```
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Wrap raw RGBA bytes decoded elsewhere.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if `data` does not hold
    /// exactly `width × height × 4` bytes.
    ///
    /// # Example
    /// ```
    /// use cs_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::from_rgba(2, 1, vec![0; 8]).unwrap();
    /// assert_eq!(fb.width, 2);
    /// assert!(FrameBuffer::from_rgba(2, 2, vec![0; 8]).is_err());
    /// ```
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Paint every pixel with the same opaque color.
    ///
    /// # Example
    /// ```
    /// use cs_core::frame::FrameBuffer;
    /// let mut fb = FrameBuffer::new(3, 3);
    /// fb.fill(255, 255, 255);
    /// assert_eq!(fb.pixel(2, 2), (255, 255, 255, 255));
    /// ```
    pub fn fill(&mut self, r: u8, g: u8, b: u8) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[r, g, b, 255]);
        }
    }

    /// Accès au pixel (x, y) → (r, g, b, a).
    ///
    /// # Example
    /// ```
    /// use cs_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(10, 10);
    /// let (r, g, b, a) = fb.pixel(0, 0);
    /// assert_eq!((r, g, b, a), (0, 0, 0, 0));
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if idx + 3 >= self.data.len() {
            return (0, 0, 0, 0);
        }
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }

    /// Luminosité non pondérée : `round((r + g + b) / 3)`.
    ///
    /// # Example
    /// ```
    /// use cs_core::frame::FrameBuffer;
    /// let mut fb = FrameBuffer::new(1, 1);
    /// fb.data[..3].copy_from_slice(&[10, 20, 31]);
    /// assert_eq!(fb.brightness(0, 0), 20);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn brightness(&self, x: u32, y: u32) -> u8 {
        let (r, g, b, _) = self.pixel(x, y);
        rgb_brightness(r, g, b)
    }

    /// `true` if the frame holds no pixel at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Unweighted channel average, rounded to nearest.
///
/// `sum / 3` has a fractional part of 0, 1/3 or 2/3, so adding one before the
/// integer division rounds correctly without ties.
#[inline(always)]
#[must_use]
pub fn rgb_brightness(r: u8, g: u8, b: u8) -> u8 {
    ((u16::from(r) + u16::from(g) + u16::from(b) + 1) / 3) as u8
}

/// Taille courante de la grille de caractères du terminal.
///
/// # Example
/// ```
/// use cs_core::frame::TerminalGrid;
/// let grid = TerminalGrid::new(80, 24);
/// assert!(!grid.is_degenerate());
/// assert!(TerminalGrid::new(0, 24).is_degenerate());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TerminalGrid {
    /// Columns.
    pub width: u16,
    /// Rows.
    pub height: u16,
}

impl TerminalGrid {
    /// Build a grid from a `(columns, rows)` size.
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// A grid with a zero dimension cannot host a frame.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<(u16, u16)> for TerminalGrid {
    fn from((width, height): (u16, u16)) -> Self {
        Self { width, height }
    }
}
