use thiserror::Error;

/// Errors originating from the core module.
///
/// Only `CaptureClosed` is meant to end the render loop; every other variant
/// is handled inside a single iteration (skip the frame, retry on the next).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// The terminal grid has a zero dimension; nothing can be planned for it.
    #[error("Grille terminal inutilisable : {width}×{height}")]
    PreconditionFailure {
        /// Terminal width in cells.
        width: u16,
        /// Terminal height in cells.
        height: u16,
    },

    /// The brightness pass visited zero pixels.
    #[error("Buffer de luminance vide")]
    EmptyFrameBuffer,

    /// Requested ramp scale is not one of the supported sizes.
    #[error("Échelle de caractères non supportée : {0}")]
    InvalidRampScale(u8),

    /// The capture device did not deliver a frame this time.
    #[error("Capture indisponible : {0}")]
    CaptureUnavailable(String),

    /// The capture device is gone for good.
    #[error("Capture terminée : la source ne produira plus de frames")]
    CaptureClosed,
}

impl CoreError {
    /// `true` if the render loop can skip the current frame and try again.
    ///
    /// # Example
    /// ```
    /// use cs_core::error::CoreError;
    /// assert!(CoreError::EmptyFrameBuffer.is_recoverable());
    /// assert!(!CoreError::CaptureClosed.is_recoverable());
    /// ```
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::CaptureClosed | Self::Config(_) | Self::InvalidDimensions { .. }
        )
    }
}
