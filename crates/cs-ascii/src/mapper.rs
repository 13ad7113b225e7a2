use cs_core::charset::{CharacterRamp, LuminanceLut};
use cs_core::error::CoreError;
use rayon::prelude::*;

use crate::brightness::BrightnessBuffer;

/// Line break injected after every full row.
pub const LINE_BREAK: char = '\n';

/// Output slots needed for `len` samples with `stride` samples per row.
///
/// # Example
/// ```
/// use cs_ascii::mapper::output_len;
/// assert_eq!(output_len(273, 39), 280);
/// assert_eq!(output_len(10, 4), 12);
/// assert_eq!(output_len(10, 0), 0);
/// ```
#[must_use]
pub fn output_len(len: usize, stride: usize) -> usize {
    if stride == 0 {
        return 0;
    }
    len + len / stride
}

/// Quantifie les luminosités en caractères, en parallèle.
///
/// Chaque ligne de sortie (`stride` caractères + son saut de ligne) est un
/// bloc disjoint du buffer pré-alloué : aucun verrou, et le résultat est
/// identique quel que soit le nombre de workers.
///
/// # Example
/// ```
/// use cs_ascii::mapper::CharacterMapper;
/// use cs_core::charset::CharacterRamp;
///
/// let mapper = CharacterMapper::new(CharacterRamp::resolve(2), 0).unwrap();
/// let mut out = Vec::new();
/// mapper.map_values_into(&[0, 255, 255, 0, 0, 255], 255, 3, &mut out);
/// assert_eq!(out.iter().collect::<String>(), " ##\n  #\n");
/// ```
pub struct CharacterMapper {
    ramp: CharacterRamp,
    /// Dedicated pool when a worker count is configured, else rayon's global pool.
    pool: Option<rayon::ThreadPool>,
}

impl CharacterMapper {
    /// Create a mapper for `ramp` running on `workers` threads (0 = global pool).
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the dedicated thread pool cannot be built.
    pub fn new(ramp: CharacterRamp, workers: usize) -> Result<Self, CoreError> {
        let pool = if workers == 0 {
            None
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("cs-map-{i}"))
                .build()
                .map_err(|e| CoreError::Config(format!("pool rayon : {e}")))?;
            Some(pool)
        };
        log::debug!(
            "mapper: ramp {} ({} chars), {} workers",
            ramp.scale(),
            ramp.len(),
            if workers == 0 { rayon::current_num_threads() } else { workers }
        );
        Ok(Self { ramp, pool })
    }

    /// Ramp in use.
    #[must_use]
    pub fn ramp(&self) -> &CharacterRamp {
        &self.ramp
    }

    /// Map a brightness pass into `out`, reusing its allocation.
    ///
    /// `out` ends up with `output_len(len, stride)` characters. An empty
    /// buffer leaves `out` empty.
    pub fn map_into(&self, buffer: &BrightnessBuffer, out: &mut Vec<char>) {
        let max = buffer.stats().map_or(0, |s| s.max);
        self.map_values_into(buffer.values(), max, buffer.stride(), out);
    }

    /// Map raw samples with an explicit maximum and row stride.
    pub fn map_values_into(&self, values: &[u8], max: u8, stride: usize, out: &mut Vec<char>) {
        out.clear();
        if values.is_empty() || stride == 0 {
            return;
        }

        let lut = LuminanceLut::normalized(&self.ramp, max);
        out.resize(output_len(values.len(), stride), ' ');

        match &self.pool {
            Some(pool) => pool.install(|| fill_rows(out, values, stride, &lut)),
            None => fill_rows(out, values, stride, &lut),
        }
    }
}

/// Full rows get `stride + 1` slots (the last one is the line break); a
/// trailing partial row gets exactly its own samples.
fn fill_rows(out: &mut [char], values: &[u8], stride: usize, lut: &LuminanceLut) {
    out.par_chunks_mut(stride + 1)
        .zip(values.par_chunks(stride))
        .for_each(|(dst, src)| {
            for (slot, &b) in dst.iter_mut().zip(src) {
                *slot = lut.map(b);
            }
            if dst.len() > src.len() {
                dst[src.len()] = LINE_BREAK;
            }
        });
}

/// Text handed to the terminal: mapped characters with the trailing line
/// break removed, so the last row never scrolls the screen.
///
/// # Example
/// ```
/// use cs_ascii::mapper::RenderedFrame;
/// let mut frame = RenderedFrame::new();
/// frame.assemble(&['#', '#', '\n', '#', '#', '\n']);
/// assert_eq!(frame.as_str(), "##\n##");
/// ```
#[derive(Clone, Debug, Default)]
pub struct RenderedFrame {
    text: String,
}

impl RenderedFrame {
    /// Empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the text from mapped characters, reusing the allocation.
    pub fn assemble(&mut self, mapped: &[char]) {
        self.text.clear();
        let end = if mapped.last() == Some(&LINE_BREAK) {
            mapped.len() - 1
        } else {
            mapped.len()
        };
        self.text.extend(&mapped[..end]);
    }

    /// Assembled text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// `true` if nothing was assembled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brightness::extract;
    use cs_core::charset::RAMP_TABLE;
    use cs_core::frame::{FrameBuffer, TerminalGrid};

    fn map(mapper: &CharacterMapper, values: &[u8], stride: usize) -> Vec<char> {
        let max = values.iter().copied().max().unwrap_or(0);
        let mut out = Vec::new();
        mapper.map_values_into(values, max, stride, &mut out);
        out
    }

    #[test]
    fn quantization_boundaries() {
        for (scale, _) in RAMP_TABLE {
            let ramp = CharacterRamp::resolve(scale);
            let mapper = CharacterMapper::new(ramp.clone(), 0).unwrap();
            let mut out = Vec::new();
            mapper.map_values_into(&[0, 200, 100], 200, 3, &mut out);
            assert_eq!(out[0], ramp.darkest());
            assert_eq!(out[1], ramp.brightest());
        }
    }

    #[test]
    fn all_black_frame_maps_to_darkest() {
        let mapper = CharacterMapper::new(CharacterRamp::resolve(32), 0).unwrap();
        let out = map(&mapper, &[0; 64], 8);
        assert!(out.iter().all(|&c| c == ' ' || c == LINE_BREAK));
        assert_eq!(out.iter().filter(|&&c| c == ' ').count(), 64);
    }

    #[test]
    fn white_frame_end_to_end() {
        let mut frame = FrameBuffer::new(40, 8);
        frame.fill(255, 255, 255);
        let buffer = extract(&frame, TerminalGrid::new(40, 20)).unwrap();
        assert_eq!(buffer.len(), 273);

        let mapper = CharacterMapper::new(CharacterRamp::resolve(2), 4).unwrap();
        let mut out = Vec::new();
        mapper.map_into(&buffer, &mut out);
        assert_eq!(out.iter().filter(|&&c| c == '#').count(), 273);
        assert_eq!(out.iter().filter(|&&c| c == LINE_BREAK).count(), 7);

        let mut rendered = RenderedFrame::new();
        rendered.assemble(&out);
        assert_eq!(rendered.as_str().matches('\n').count(), 6);
        assert!(rendered.as_str().lines().all(|l| l.len() == 39 && l.chars().all(|c| c == '#')));
    }

    #[test]
    fn empty_input_clears_output() {
        let mapper = CharacterMapper::new(CharacterRamp::resolve(4), 0).unwrap();
        let mut out = vec!['x'; 5];
        mapper.map_into(&BrightnessBuffer::new(), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn assemble_keeps_trailing_spaces() {
        let mut frame = RenderedFrame::new();
        frame.assemble(&['#', ' ', '\n', ' ', ' ']);
        assert_eq!(frame.as_str(), "# \n  ");
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn identical_for_any_worker_count(
                values in prop::collection::vec(any::<u8>(), 0..2000),
                stride in 1usize..64,
                workers in 1usize..8,
                scale in prop::sample::select(vec![2u8, 4, 5, 8, 16, 32]),
            ) {
                let single = CharacterMapper::new(CharacterRamp::resolve(scale), 1).unwrap();
                let reference = map(&single, &values, stride);

                let mapper = CharacterMapper::new(CharacterRamp::resolve(scale), workers).unwrap();
                let first = map(&mapper, &values, stride);
                prop_assert_eq!(&first, &reference);
                // idempotent over the same buffer
                prop_assert_eq!(map(&mapper, &values, stride), first);
            }

            #[test]
            fn line_break_after_every_full_row(
                values in prop::collection::vec(any::<u8>(), 1..1500),
                stride in 1usize..120,
            ) {
                let mapper = CharacterMapper::new(CharacterRamp::resolve(8), 0).unwrap();
                let out = map(&mapper, &values, stride);
                prop_assert_eq!(out.len(), output_len(values.len(), stride));
                prop_assert_eq!(
                    out.iter().filter(|&&c| c == LINE_BREAK).count(),
                    values.len() / stride
                );
                for (i, &c) in out.iter().enumerate() {
                    prop_assert_eq!(c == LINE_BREAK, (i + 1) % (stride + 1) == 0, "slot {}", i);
                }
            }
        }
    }
}
