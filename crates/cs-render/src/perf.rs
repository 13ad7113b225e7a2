use std::fmt::Write as _;
use std::time::{Duration, Instant};

/// Étape chronométrée d'une itération.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Capture, décodage et resize.
    Resize,
    /// Extraction de luminance.
    Brightness,
    /// Quantification en caractères.
    Mapping,
    /// Écriture terminal.
    Write,
}

/// Durées de la dernière itération.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PerfSample {
    /// Capture + resize.
    pub resize: Duration,
    /// Brightness pass.
    pub brightness: Duration,
    /// Character mapping.
    pub mapping: Duration,
    /// Terminal write.
    pub write: Duration,
    /// Time since the end of the previous iteration.
    pub interval: Duration,
}

impl PerfSample {
    /// Durée d'une étape.
    #[must_use]
    pub fn stage(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Resize => self.resize,
            Stage::Brightness => self.brightness,
            Stage::Mapping => self.mapping,
            Stage::Write => self.write,
        }
    }

    /// `1000 / interval_ms`, 0 when the interval is zero.
    ///
    /// # Example
    /// ```
    /// use cs_render::perf::PerfSample;
    /// use std::time::Duration;
    /// let sample = PerfSample { interval: Duration::from_millis(40), ..PerfSample::default() };
    /// assert!((sample.fps() - 25.0).abs() < 1e-9);
    /// assert_eq!(PerfSample::default().fps(), 0.0);
    /// ```
    #[must_use]
    pub fn fps(&self) -> f64 {
        let ms = self.interval.as_secs_f64() * 1000.0;
        if ms > 0.0 { 1000.0 / ms } else { 0.0 }
    }

    fn set(&mut self, stage: Stage, elapsed: Duration) {
        match stage {
            Stage::Resize => self.resize = elapsed,
            Stage::Brightness => self.brightness = elapsed,
            Stage::Mapping => self.mapping = elapsed,
            Stage::Write => self.write = elapsed,
        }
    }
}

/// Chronométrage par étape + intervalle entre frames.
///
/// Deux horloges : l'une remise à zéro après chaque étape, l'autre à la toute
/// fin de l'itération. Seul le dernier échantillon complet est exposé.
///
/// # Example
/// ```
/// use cs_render::perf::{PerfMonitor, Stage};
/// let mut perf = PerfMonitor::new();
/// perf.begin_frame();
/// perf.end_stage(Stage::Resize);
/// perf.end_frame();
/// assert!(perf.latest().fps() >= 0.0);
/// ```
#[derive(Debug)]
pub struct PerfMonitor {
    frame_timer: Instant,
    stage_timer: Instant,
    current: PerfSample,
    latest: PerfSample,
}

impl PerfMonitor {
    /// Create a monitor; both timers start now.
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            frame_timer: now,
            stage_timer: now,
            current: PerfSample::default(),
            latest: PerfSample::default(),
        }
    }

    /// Restart the stage timer at the top of an iteration.
    pub fn begin_frame(&mut self) {
        self.stage_timer = Instant::now();
    }

    /// Record the time since the previous stage ended, then restart the stage timer.
    pub fn end_stage(&mut self, stage: Stage) {
        let now = Instant::now();
        self.current.set(stage, now.duration_since(self.stage_timer));
        self.stage_timer = now;
    }

    /// Close the iteration: record the frame interval and publish the sample.
    pub fn end_frame(&mut self) {
        let now = Instant::now();
        self.current.interval = now.duration_since(self.frame_timer);
        self.frame_timer = now;
        self.latest = self.current;
        self.current = PerfSample::default();
    }

    /// Dernier échantillon complet.
    #[must_use]
    pub fn latest(&self) -> &PerfSample {
        &self.latest
    }
}

impl Default for PerfMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Écrit la ligne de statut dans `out` (vidé d'abord, allocation réutilisée).
///
/// `input` = taille source, `output` = taille du raster redimensionné.
///
/// # Example
/// ```
/// use cs_render::perf::{write_status, PerfSample};
/// use std::time::Duration;
///
/// let sample = PerfSample {
///     resize: Duration::from_micros(1200),
///     brightness: Duration::from_micros(310),
///     mapping: Duration::from_micros(220),
///     write: Duration::from_micros(850),
///     interval: Duration::from_millis(40),
/// };
/// let mut status = String::new();
/// write_status(&mut status, &sample, (640, 480), (80, 19));
/// assert_eq!(
///     status,
///     "camscii | 25.00 fps | in 640x480 | out 80x19 | resize 1.20ms | bright 0.31ms | map 0.22ms | write 0.85ms"
/// );
/// ```
pub fn write_status(out: &mut String, sample: &PerfSample, input: (u32, u32), output: (u32, u32)) {
    out.clear();
    // Écrire dans une String ne peut pas échouer.
    let _ = write!(
        out,
        "camscii | {:.2} fps | in {}x{} | out {}x{} | resize {:.2}ms | bright {:.2}ms | map {:.2}ms | write {:.2}ms",
        sample.fps(),
        input.0,
        input.1,
        output.0,
        output.1,
        millis(sample.resize),
        millis(sample.brightness),
        millis(sample.mapping),
        millis(sample.write),
    );
}
