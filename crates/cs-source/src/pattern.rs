use cs_core::error::CoreError;
use cs_core::frame::FrameBuffer;
use cs_core::traits::Source;
use rayon::prelude::*;
use std::sync::Arc;

/// Largeur d'une bande diagonale, en pixels.
const BAND_PERIOD: u32 = 64;

/// Décalage des bandes par frame, en pixels.
const BAND_SPEED: u32 = 2;

/// Mire animée : bandes diagonales qui défilent.
///
/// Déterministe (la frame `n` est toujours la même) et n'échoue jamais.
/// Sert à tourner sans caméra et dans les tests.
///
/// # Example
/// ```
/// use cs_core::traits::Source;
/// use cs_source::pattern::PatternSource;
///
/// let mut source = PatternSource::new(64, 32);
/// let frame = source.next_frame().unwrap();
/// assert_eq!((frame.width, frame.height), (64, 32));
/// ```
pub struct PatternSource {
    width: u32,
    height: u32,
    pool: Vec<Arc<FrameBuffer>>,
    frame_count: u64,
}

impl PatternSource {
    /// Mire de `width × height` pixels (au moins 1×1).
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let pool = (0..2).map(|_| Arc::new(FrameBuffer::new(width, height))).collect();
        Self {
            width,
            height,
            pool,
            frame_count: 0,
        }
    }

    /// Frames produites jusqu'ici.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Niveau de gris de la bande passant par `(x, y)` à l'instant `phase`.
#[inline(always)]
fn band_level(x: u32, y: u32, phase: u32) -> u8 {
    let pos = (x + y + phase) % BAND_PERIOD;
    // triangle 0 → 255 → 0 sur une période
    let half = BAND_PERIOD / 2;
    let tri = if pos < half { pos } else { BAND_PERIOD - pos };
    (tri * 255 / half).min(255) as u8
}

impl Source for PatternSource {
    fn next_frame(&mut self) -> Result<Arc<FrameBuffer>, CoreError> {
        let idx = match self.pool.iter().position(|a| Arc::strong_count(a) == 1) {
            Some(i) => i,
            None => {
                self.pool.push(Arc::new(FrameBuffer::new(self.width, self.height)));
                self.pool.len() - 1
            }
        };
        let Some(fb) = Arc::get_mut(&mut self.pool[idx]) else {
            return Err(CoreError::CaptureUnavailable("mire : pool saturé".to_string()));
        };

        let phase = ((self.frame_count * u64::from(BAND_SPEED)) % u64::from(BAND_PERIOD)) as u32;
        let width = self.width;
        fb.data
            .par_chunks_exact_mut(width as usize * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let v = band_level(x as u32, y as u32, phase);
                    px.copy_from_slice(&[v, v, v, 255]);
                }
            });

        self.frame_count += 1;
        Ok(Arc::clone(&self.pool[idx]))
    }

    fn is_live(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_per_frame_index() {
        let mut a = PatternSource::new(40, 10);
        let mut b = PatternSource::new(40, 10);
        for _ in 0..5 {
            assert_eq!(*a.next_frame().unwrap(), *b.next_frame().unwrap());
        }
        assert_eq!(a.frame_count(), 5);
    }

    #[test]
    fn pattern_moves_between_frames() {
        let mut source = PatternSource::new(40, 10);
        let first = source.next_frame().unwrap();
        let second = source.next_frame().unwrap();
        assert_ne!(first.data, second.data);
    }

    #[test]
    fn covers_full_brightness_range() {
        let mut source = PatternSource::new(128, 4);
        let frame = source.next_frame().unwrap();
        let levels: Vec<u8> = frame.data.chunks_exact(4).map(|p| p[0]).collect();
        assert_eq!(levels.iter().min(), Some(&0));
        assert_eq!(levels.iter().max(), Some(&255));
    }

    #[test]
    fn held_frames_are_not_overwritten() {
        let mut source = PatternSource::new(8, 8);
        let held: Vec<_> = (0..4).map(|_| source.next_frame().unwrap()).collect();
        assert_ne!(held[0].data, held[1].data);
    }

    #[test]
    fn zero_size_is_clamped() {
        let mut source = PatternSource::new(0, 0);
        let frame = source.next_frame().unwrap();
        assert_eq!((frame.width, frame.height), (1, 1));
        assert!(source.is_live());
    }
}
