use crate::error::CoreError;

/// 2 caractères: silhouette.
pub const RAMP_2: &str = " #";

/// 4 caractères.
pub const RAMP_4: &str = " .+#";

/// Blocs Unicode: pseudo-pixels.
pub const RAMP_5: &str = " ░▒▓█";

/// 8 caractères.
pub const RAMP_8: &str = " .:-=+*#";

/// 16 caractères.
pub const RAMP_16: &str = " .,:;irsXA253hMB";

/// 32 caractères: sous-échantillonnage régulier de la rampe Paul Bourke.
pub const RAMP_32: &str = " '^:I!>~-]}1(tjxucXJL0Zwdka*M8B$";

/// 10 caractères: rampe de repli, bon contraste.
pub const DEFAULT_RAMP: &str = " .:-=+*#%@";

/// Scale of the fallback ramp.
pub const DEFAULT_SCALE: u8 = 10;

/// Supported ramp scales and their characters, darkest first.
pub const RAMP_TABLE: [(u8, &str); 6] = [
    (2, RAMP_2),
    (4, RAMP_4),
    (5, RAMP_5),
    (8, RAMP_8),
    (16, RAMP_16),
    (32, RAMP_32),
];

/// Ordered palette of characters from darkest to brightest.
///
/// Built once per pipeline from the constant table; never mutated.
///
/// # Example
/// ```
/// use cs_core::charset::CharacterRamp;
/// let ramp = CharacterRamp::resolve(2);
/// assert_eq!(ramp.chars(), &[' ', '#']);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterRamp {
    scale: u8,
    chars: Vec<char>,
}

impl CharacterRamp {
    /// Look up a supported scale.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidRampScale`] for scales outside the table.
    ///
    /// # Example
    /// ```
    /// use cs_core::charset::CharacterRamp;
    /// assert_eq!(CharacterRamp::for_scale(8).unwrap().len(), 8);
    /// assert!(CharacterRamp::for_scale(3).is_err());
    /// ```
    pub fn for_scale(scale: u8) -> Result<Self, CoreError> {
        RAMP_TABLE
            .iter()
            .find(|(s, _)| *s == scale)
            .map(|(s, chars)| Self {
                scale: *s,
                chars: chars.chars().collect(),
            })
            .ok_or(CoreError::InvalidRampScale(scale))
    }

    /// Look up a scale, falling back to the default 10-character ramp.
    ///
    /// The default scale itself resolves silently; any other unknown scale
    /// is logged once here, at construction.
    ///
    /// # Example
    /// ```
    /// use cs_core::charset::{CharacterRamp, DEFAULT_RAMP};
    /// let ramp = CharacterRamp::resolve(7);
    /// assert!(ramp.is_fallback());
    /// assert_eq!(ramp.chars().iter().collect::<String>(), DEFAULT_RAMP);
    /// ```
    #[must_use]
    pub fn resolve(scale: u8) -> Self {
        match Self::for_scale(scale) {
            Ok(ramp) => ramp,
            Err(e) => {
                if scale != DEFAULT_SCALE {
                    log::warn!("{e}, utilisation de la rampe par défaut");
                }
                Self::fallback()
            }
        }
    }

    /// The default 10-character ramp.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            chars: DEFAULT_RAMP.chars().collect(),
        }
    }

    /// Characters, darkest first.
    #[inline(always)]
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Number of characters (always ≥ 2).
    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Never true; ramps carry at least two characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Scale this ramp was resolved to.
    #[must_use]
    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// `true` if this is the fallback ramp.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.scale == DEFAULT_SCALE
    }

    /// Darkest character.
    #[must_use]
    pub fn darkest(&self) -> char {
        self.chars[0]
    }

    /// Brightest character.
    #[must_use]
    pub fn brightest(&self) -> char {
        self.chars[self.chars.len() - 1]
    }
}

impl Default for CharacterRamp {
    fn default() -> Self {
        Self::fallback()
    }
}

/// Lookup table mapping brightness [0..255] → character, normalized against
/// a frame maximum.
///
/// Rebuilt once per frame (256 entries, on the stack) so the per-pixel cost
/// stays a single indexed load.
///
/// # Example
/// ```
/// use cs_core::charset::{CharacterRamp, LuminanceLut};
/// let ramp = CharacterRamp::resolve(4);
/// let lut = LuminanceLut::normalized(&ramp, 200);
/// assert_eq!(lut.map(0), ' ');
/// assert_eq!(lut.map(200), '#');
/// ```
#[derive(Clone, Copy)]
pub struct LuminanceLut {
    lut: [char; 256],
}

impl LuminanceLut {
    /// Build the table for `ramp` with brightness normalized to `max`.
    ///
    /// Entry `b` is `ramp[floor(b × (len − 1) / max(max, 1))]`, clamped to the
    /// last character for values above `max`.
    #[must_use]
    pub fn normalized(ramp: &CharacterRamp, max: u8) -> Self {
        let chars = ramp.chars();
        let last = chars.len() - 1;
        let effective_max = usize::from(max.max(1));
        let mut lut = [chars[0]; 256];
        for (b, slot) in lut.iter_mut().enumerate() {
            *slot = chars[(b * last / effective_max).min(last)];
        }
        Self { lut }
    }

    /// Map a brightness value to a character.
    #[inline(always)]
    #[must_use]
    pub fn map(&self, brightness: u8) -> char {
        self.lut[brightness as usize]
    }
}
