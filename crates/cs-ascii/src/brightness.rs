use cs_core::error::CoreError;
use cs_core::frame::{FrameBuffer, TerminalGrid, rgb_brightness};

/// Summary of one brightness pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrightnessStats {
    /// Darkest sample.
    pub min: u8,
    /// Brightest sample.
    pub max: u8,
    /// `floor(sum / count)`. Informational only.
    pub average: u8,
}

/// Per-pixel brightness values in row-major order, reused across frames.
///
/// # Example
/// ```
/// use cs_ascii::brightness::BrightnessBuffer;
/// let buffer = BrightnessBuffer::new();
/// assert!(buffer.is_empty());
/// assert!(buffer.stats().is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct BrightnessBuffer {
    values: Vec<u8>,
    stride: usize,
    rows: usize,
    min: u8,
    max: u8,
    sum: u64,
}

impl BrightnessBuffer {
    /// Empty buffer; capacity grows on first use and is kept afterwards.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples, row-major.
    #[must_use]
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` if the last pass visited no pixel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Samples per row (visited column count).
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Visited row count.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Min / max / average of the last pass.
    ///
    /// # Errors
    /// [`CoreError::EmptyFrameBuffer`] if the pass visited no pixel; nothing
    /// is divided in that case.
    pub fn stats(&self) -> Result<BrightnessStats, CoreError> {
        if self.values.is_empty() {
            return Err(CoreError::EmptyFrameBuffer);
        }
        Ok(BrightnessStats {
            min: self.min,
            max: self.max,
            average: (self.sum / self.values.len() as u64) as u8,
        })
    }

    fn reset(&mut self, stride: usize, rows: usize) {
        self.values.clear();
        self.values.reserve(stride * rows);
        self.stride = stride;
        self.rows = rows;
        self.min = u8::MAX;
        self.max = u8::MIN;
        self.sum = 0;
    }

    #[inline(always)]
    fn push(&mut self, brightness: u8) {
        self.values.push(brightness);
        self.min = self.min.min(brightness);
        self.max = self.max.max(brightness);
        self.sum += u64::from(brightness);
    }
}

/// Visited `(columns, rows)` for a frame drawn on `grid`.
///
/// One trailing column and one trailing row of the drawable area are kept as
/// margin; the character stride downstream is exactly this column count.
///
/// # Example
/// ```
/// use cs_ascii::brightness::visited_extent;
/// use cs_core::frame::TerminalGrid;
/// assert_eq!(visited_extent(40, 8, TerminalGrid::new(40, 20)), (39, 7));
/// assert_eq!(visited_extent(40, 8, TerminalGrid::new(0, 20)), (0, 7));
/// ```
#[must_use]
pub fn visited_extent(frame_width: u32, frame_height: u32, grid: TerminalGrid) -> (usize, usize) {
    let cols = frame_width.min(u32::from(grid.width)).saturating_sub(1);
    let rows = frame_height.min(u32::from(grid.height)).saturating_sub(1);
    (cols as usize, rows as usize)
}

/// Extrait la luminosité de chaque pixel visité dans `buffer`.
///
/// Zéro allocation une fois le buffer dimensionné.
///
/// # Errors
/// [`CoreError::EmptyFrameBuffer`] if no pixel is visited (degenerate grid or
/// a zero-sized frame). `buffer` is left empty in that case.
///
/// # Example
/// ```
/// use cs_ascii::brightness::{extract_into, BrightnessBuffer};
/// use cs_core::frame::{FrameBuffer, TerminalGrid};
///
/// let mut frame = FrameBuffer::new(40, 8);
/// frame.fill(255, 255, 255);
/// let mut buffer = BrightnessBuffer::new();
/// let stats = extract_into(&frame, TerminalGrid::new(40, 20), &mut buffer).unwrap();
/// assert_eq!(buffer.len(), 273);
/// assert_eq!(stats.max, 255);
/// ```
pub fn extract_into(
    frame: &FrameBuffer,
    grid: TerminalGrid,
    buffer: &mut BrightnessBuffer,
) -> Result<BrightnessStats, CoreError> {
    let (cols, rows) = visited_extent(frame.width, frame.height, grid);
    if cols == 0 || rows == 0 {
        buffer.reset(0, 0);
        return Err(CoreError::EmptyFrameBuffer);
    }
    buffer.reset(cols, rows);

    let row_bytes = frame.width as usize * 4;
    for row in frame.data.chunks_exact(row_bytes).take(rows) {
        for px in row.chunks_exact(4).take(cols) {
            buffer.push(rgb_brightness(px[0], px[1], px[2]));
        }
    }

    buffer.stats()
}

/// Convenience for one-shot usage. DO NOT use in hot path.
///
/// # Errors
/// Same as [`extract_into`].
pub fn extract(frame: &FrameBuffer, grid: TerminalGrid) -> Result<BrightnessBuffer, CoreError> {
    let mut buffer = BrightnessBuffer::new();
    extract_into(frame, grid, &mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Frame whose pixel (x, y) has gray level `(x * 7 + y * 13) % 256`.
    fn gradient(width: u32, height: u32) -> FrameBuffer {
        let mut frame = FrameBuffer::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 7 + y * 13) % 256) as u8;
                let idx = ((y * width + x) * 4) as usize;
                frame.data[idx..idx + 4].copy_from_slice(&[v, v, v, 255]);
            }
        }
        frame
    }

    #[test]
    fn margin_excludes_last_row_and_column() {
        let frame = gradient(10, 6);
        let buffer = extract(&frame, TerminalGrid::new(10, 6)).unwrap();
        assert_eq!(buffer.stride(), 9);
        assert_eq!(buffer.rows(), 5);
        assert_eq!(buffer.len(), 45);
        // row-major order
        assert_eq!(buffer.values()[0], frame.brightness(0, 0));
        assert_eq!(buffer.values()[8], frame.brightness(8, 0));
        assert_eq!(buffer.values()[9], frame.brightness(0, 1));
        assert_eq!(buffer.values()[44], frame.brightness(8, 4));
    }

    #[test]
    fn bounded_by_smaller_of_frame_and_grid() {
        let frame = gradient(100, 100);
        let buffer = extract(&frame, TerminalGrid::new(12, 4)).unwrap();
        assert_eq!((buffer.stride(), buffer.rows()), (11, 3));

        let small = gradient(5, 3);
        let buffer = extract(&small, TerminalGrid::new(80, 24)).unwrap();
        assert_eq!((buffer.stride(), buffer.rows()), (4, 2));
    }

    #[test]
    fn uses_unweighted_channel_average() {
        let mut frame = FrameBuffer::new(2, 2);
        frame.data[..4].copy_from_slice(&[255, 0, 0, 255]);
        let buffer = extract(&frame, TerminalGrid::new(2, 2)).unwrap();
        assert_eq!(buffer.values(), &[85]);
    }

    #[test]
    fn degenerate_grid_is_empty_not_a_panic() {
        let frame = gradient(10, 10);
        let mut buffer = BrightnessBuffer::new();
        for grid in [
            TerminalGrid::new(0, 0),
            TerminalGrid::new(1, 10),
            TerminalGrid::new(10, 1),
        ] {
            assert_eq!(
                extract_into(&frame, grid, &mut buffer),
                Err(CoreError::EmptyFrameBuffer)
            );
            assert!(buffer.is_empty());
            assert_eq!(buffer.stats(), Err(CoreError::EmptyFrameBuffer));
        }
    }

    #[test]
    fn zero_sized_frame_is_empty() {
        let frame = FrameBuffer::new(0, 0);
        assert_eq!(
            extract(&frame, TerminalGrid::new(80, 24)).err(),
            Some(CoreError::EmptyFrameBuffer)
        );
    }

    #[test]
    fn buffer_is_reused_between_frames() {
        let mut buffer = BrightnessBuffer::new();
        extract_into(&gradient(50, 50), TerminalGrid::new(50, 50), &mut buffer).unwrap();
        let cap = buffer.values.capacity();
        extract_into(&gradient(20, 20), TerminalGrid::new(20, 20), &mut buffer).unwrap();
        assert_eq!(buffer.len(), 19 * 19);
        assert!(buffer.values.capacity() >= cap);
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        /// Frame of `width × height` pixels with arbitrary RGBA content.
        fn arb_frame() -> impl Strategy<Value = FrameBuffer> {
            (2u32..48, 2u32..48).prop_flat_map(|(w, h)| {
                prop::collection::vec(any::<u8>(), (w * h * 4) as usize)
                    .prop_map(move |data| FrameBuffer::from_rgba(w, h, data).unwrap())
            })
        }

        proptest! {
            #[test]
            fn stats_bound_every_sample(
                frame in arb_frame(),
                gw in 2u16..64,
                gh in 2u16..64,
            ) {
                let buffer = extract(&frame, TerminalGrid::new(gw, gh)).unwrap();
                let stats = buffer.stats().unwrap();
                for &v in buffer.values() {
                    prop_assert!(stats.min <= v && v <= stats.max);
                }
                prop_assert!(stats.min <= stats.average && stats.average <= stats.max);
                let expected = buffer.values().iter().map(|&v| u64::from(v)).sum::<u64>()
                    / buffer.len() as u64;
                prop_assert_eq!(u64::from(stats.average), expected);
            }
        }
    }
}
