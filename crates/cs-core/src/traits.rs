use std::sync::Arc;

use crate::error::CoreError;
use crate::frame::FrameBuffer;

/// Fournit des frames visuelles au pipeline.
///
/// Implémenté par : `WebcamSource`, `PatternSource`, `StillSource`.
///
/// # Example
/// ```
/// use cs_core::traits::Source;
/// use cs_core::frame::FrameBuffer;
/// use cs_core::error::CoreError;
/// use std::sync::Arc;
///
/// struct DummySource;
/// impl Source for DummySource {
///     fn next_frame(&mut self) -> Result<Arc<FrameBuffer>, CoreError> {
///         Err(CoreError::CaptureClosed)
///     }
///     fn is_live(&self) -> bool { false }
/// }
/// ```
pub trait Source: Send + 'static {
    /// Retourne la prochaine frame disponible.
    ///
    /// Peut bloquer jusqu'au timeout de la source.
    ///
    /// # Errors
    /// - [`CoreError::CaptureUnavailable`] : pas de frame cette fois, réessayer.
    /// - [`CoreError::CaptureClosed`] : la source ne produira plus rien.
    fn next_frame(&mut self) -> Result<Arc<FrameBuffer>, CoreError>;

    /// Indique si la source est infinie (webcam, motif) ou statique (image).
    ///
    /// Une source statique n'est redessinée que si la grille change.
    fn is_live(&self) -> bool;
}
