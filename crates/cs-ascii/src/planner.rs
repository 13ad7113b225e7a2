use cs_core::config::DEFAULT_ASPECT_CORRECTION;
use cs_core::error::CoreError;
use cs_core::frame::TerminalGrid;

/// Target raster size computed for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetSize {
    /// Width in pixels (== terminal columns).
    pub width: u32,
    /// Height in pixels, aspect-corrected.
    pub height: u32,
    /// `source_width / terminal_width`.
    pub scale_factor: f64,
}

impl TargetSize {
    /// `true` if the target raster holds no pixel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Calcule la taille cible du raster à partir de la source et de la grille.
///
/// Les cellules terminal sont plus hautes que larges : la hauteur cible est
/// divisée par le facteur de correction en plus du facteur d'échelle.
///
/// # Example
/// ```
/// use cs_ascii::planner::DimensionPlanner;
/// use cs_core::frame::TerminalGrid;
///
/// let planner = DimensionPlanner::default();
/// let target = planner.plan((100, 50), TerminalGrid::new(40, 20)).unwrap();
/// assert_eq!((target.width, target.height), (40, 8));
/// assert!((target.scale_factor - 2.5).abs() < 1e-9);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct DimensionPlanner {
    aspect_correction: f64,
}

impl DimensionPlanner {
    /// Create a planner with the given cell aspect correction (height / width).
    #[must_use]
    pub fn new(aspect_correction: f32) -> Self {
        let aspect = if aspect_correction.is_finite() && aspect_correction > 0.0 {
            aspect_correction
        } else {
            DEFAULT_ASPECT_CORRECTION
        };
        Self {
            aspect_correction: f64::from(aspect),
        }
    }

    /// Cell aspect correction in use.
    #[must_use]
    pub fn aspect_correction(&self) -> f64 {
        self.aspect_correction
    }

    /// Plan the resize target for a source of `(width, height)` pixels.
    ///
    /// # Errors
    /// - [`CoreError::PreconditionFailure`] if the grid has a zero dimension
    ///   (checked before any division).
    /// - [`CoreError::InvalidDimensions`] if the source has a zero dimension.
    pub fn plan(&self, source: (u32, u32), grid: TerminalGrid) -> Result<TargetSize, CoreError> {
        if grid.is_degenerate() {
            return Err(CoreError::PreconditionFailure {
                width: grid.width,
                height: grid.height,
            });
        }
        let (source_width, source_height) = source;
        if source_width == 0 || source_height == 0 {
            return Err(CoreError::InvalidDimensions {
                width: source_width,
                height: source_height,
            });
        }

        let scale_factor = f64::from(source_width) / f64::from(grid.width);
        let width = (f64::from(source_width) / scale_factor).round();
        let height = (f64::from(source_height) / (scale_factor * self.aspect_correction)).round();

        Ok(TargetSize {
            width: width.max(0.0) as u32,
            height: height.max(0.0) as u32,
            scale_factor,
        })
    }
}

impl Default for DimensionPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_ASPECT_CORRECTION)
    }
}
