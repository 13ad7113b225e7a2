use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cs_ascii::brightness::{BrightnessBuffer, extract_into};
use cs_ascii::mapper::{CharacterMapper, RenderedFrame};
use cs_ascii::planner::DimensionPlanner;
use cs_core::charset::CharacterRamp;
use cs_core::config::RenderConfig;
use cs_core::error::CoreError;
use cs_core::frame::{FrameBuffer, TerminalGrid};
use cs_core::traits::Source;
use cs_render::perf::{PerfMonitor, Stage, write_status};
use cs_render::renderer::Renderer;
use cs_render::terminal::Terminal;
use cs_source::resize::Resizer;

/// État transmis d'une itération à la suivante.
///
/// `previous_grid` est la grille du dernier frame dessiné ; une grille
/// dégénérée l'oublie pour forcer un effacement au retour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopState {
    /// Grid the last frame was drawn on.
    pub previous_grid: Option<TerminalGrid>,
    /// Consecutive `CaptureUnavailable` results.
    pub consecutive_failures: u32,
}

/// Why the loop stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The cancellation flag was set.
    Cancelled,
    /// The source will never produce another frame.
    CaptureClosed,
    /// Too many consecutive capture misses.
    TooManyFailures(u32),
}

/// Result of one iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IterationOutcome {
    /// A frame reached the terminal.
    Drawn {
        /// The screen was cleared first (grid changed).
        cleared: bool,
    },
    /// Nothing drawn this time; the next iteration retries.
    Skipped(CoreError),
    /// Static source on an unchanged grid: the screen is already up to date.
    Unchanged,
    /// The loop must end.
    Stop(StopReason),
}

/// Bilan de `run`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames written to the terminal.
    pub frames_drawn: u64,
    /// Iterations that drew nothing.
    pub frames_skipped: u64,
    /// Iterations left alone because a static source had nothing new.
    pub frames_unchanged: u64,
    /// Why the loop ended.
    pub stop: StopReason,
}

/// Chaîne complète : source → planner → resize → luminance → caractères → terminal.
///
/// Tous les buffers intermédiaires vivent ici et sont réutilisés d'une
/// itération à l'autre ; une seule frame en vol à la fois.
pub struct Pipeline<T: Terminal> {
    source: Box<dyn Source>,
    planner: DimensionPlanner,
    resizer: Resizer,
    resized: FrameBuffer,
    brightness: BrightnessBuffer,
    mapper: CharacterMapper,
    mapped: Vec<char>,
    rendered: RenderedFrame,
    renderer: Renderer<T>,
    perf: PerfMonitor,
    status: String,
    /// Source and raster sizes of the last drawn frame, for the status line.
    sizes: ((u32, u32), (u32, u32)),
    max_failures: u32,
    frame_period: Duration,
}

impl<T: Terminal> Pipeline<T> {
    /// Assemble the pipeline from a config.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the mapper thread pool cannot be built.
    pub fn new(
        source: Box<dyn Source>,
        renderer: Renderer<T>,
        config: &RenderConfig,
    ) -> Result<Self, CoreError> {
        let ramp = CharacterRamp::resolve(config.ramp_scale);
        let mapper = CharacterMapper::new(ramp, config.workers)?;
        let fps = config.capture.fps.max(1);
        Ok(Self {
            source,
            planner: DimensionPlanner::new(config.aspect_correction),
            resizer: Resizer::new(),
            resized: FrameBuffer::new(0, 0),
            brightness: BrightnessBuffer::new(),
            mapper,
            mapped: Vec::new(),
            rendered: RenderedFrame::new(),
            renderer,
            perf: PerfMonitor::new(),
            status: String::new(),
            sizes: ((0, 0), (0, 0)),
            max_failures: config.capture.max_failures,
            frame_period: Duration::from_secs(1) / fps,
        })
    }

    /// Run one iteration and hand back the updated state.
    ///
    /// Every iteration closes its perf sample, drawn or not, so the next
    /// interval is measured from here. The status line is pushed after the
    /// frame and describes that same frame.
    ///
    /// # Errors
    /// Only terminal I/O errors; everything else is an [`IterationOutcome`].
    pub fn run_iteration(&mut self, state: LoopState) -> Result<(IterationOutcome, LoopState)> {
        self.perf.begin_frame();
        let stepped = self.step(state);
        self.perf.end_frame();

        let (outcome, state) = stepped?;
        if matches!(outcome, IterationOutcome::Drawn { .. }) {
            let (input, output) = self.sizes;
            write_status(&mut self.status, self.perf.latest(), input, output);
            self.renderer
                .set_status(&self.status)
                .context("Écriture du statut impossible")?;
        }
        Ok((outcome, state))
    }

    fn step(&mut self, state: LoopState) -> Result<(IterationOutcome, LoopState)> {
        let mut state = state;

        // === Grille terminal ===
        let grid = self
            .renderer
            .grid()
            .context("Impossible de lire la taille du terminal")?;
        if grid.is_degenerate() {
            state.previous_grid = None;
            let err = CoreError::PreconditionFailure {
                width: grid.width,
                height: grid.height,
            };
            return Ok((IterationOutcome::Skipped(err), state));
        }
        if !self.source.is_live() && state.previous_grid == Some(grid) {
            return Ok((IterationOutcome::Unchanged, state));
        }

        // === Capture ===
        let frame = match self.source.next_frame() {
            Ok(frame) => {
                state.consecutive_failures = 0;
                frame
            }
            Err(CoreError::CaptureClosed) => {
                return Ok((IterationOutcome::Stop(StopReason::CaptureClosed), state));
            }
            Err(e) => {
                state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                if self.max_failures > 0 && state.consecutive_failures >= self.max_failures {
                    let stop = StopReason::TooManyFailures(state.consecutive_failures);
                    return Ok((IterationOutcome::Stop(stop), state));
                }
                log::warn!(
                    "capture manquée ({}/{}): {e}",
                    state.consecutive_failures,
                    self.max_failures
                );
                return Ok((IterationOutcome::Skipped(e), state));
            }
        };

        // === Planification + resize ===
        let target = match self.planner.plan((frame.width, frame.height), grid) {
            Ok(target) if target.is_empty() => {
                return Ok((IterationOutcome::Skipped(CoreError::EmptyFrameBuffer), state));
            }
            Ok(target) => target,
            Err(e) => return Ok((IterationOutcome::Skipped(e), state)),
        };
        if let Err(e) =
            self.resizer
                .resize_to(&frame, target.width, target.height, &mut self.resized)
        {
            log::warn!("resize {}x{}: {e:#}", target.width, target.height);
            let err = CoreError::InvalidDimensions {
                width: target.width,
                height: target.height,
            };
            return Ok((IterationOutcome::Skipped(err), state));
        }
        self.perf.end_stage(Stage::Resize);

        // === Luminance ===
        if let Err(e) = extract_into(&self.resized, grid, &mut self.brightness) {
            return Ok((IterationOutcome::Skipped(e), state));
        }
        self.perf.end_stage(Stage::Brightness);

        // === Caractères ===
        self.mapper.map_into(&self.brightness, &mut self.mapped);
        self.rendered.assemble(&self.mapped);
        self.perf.end_stage(Stage::Mapping);

        // === Écriture ===
        let cleared = self
            .renderer
            .draw(self.rendered.as_str(), grid, state.previous_grid)
            .context("Écriture terminal impossible")?;
        self.perf.end_stage(Stage::Write);

        self.sizes = ((frame.width, frame.height), (target.width, target.height));
        state.previous_grid = Some(grid);
        Ok((IterationOutcome::Drawn { cleared }, state))
    }

    /// Boucle jusqu'à `cancel` ou une fin de capture.
    ///
    /// `cancel` est lu une fois par itération, jamais au milieu d'une frame.
    ///
    /// # Errors
    /// Terminal I/O errors end the loop.
    pub fn run(&mut self, cancel: &AtomicBool) -> Result<RunSummary> {
        let mut state = LoopState::default();
        let mut frames_drawn = 0u64;
        let mut frames_skipped = 0u64;
        let mut frames_unchanged = 0u64;

        let stop = loop {
            if cancel.load(Ordering::SeqCst) {
                break StopReason::Cancelled;
            }
            let started = Instant::now();

            let (outcome, next) = self.run_iteration(state)?;
            state = next;
            match outcome {
                IterationOutcome::Drawn { .. } => frames_drawn += 1,
                IterationOutcome::Skipped(reason) => {
                    frames_skipped += 1;
                    log::debug!("frame ignorée : {reason}");
                }
                IterationOutcome::Unchanged => frames_unchanged += 1,
                IterationOutcome::Stop(reason) => break reason,
            }

            // Source statique ou terminal vide : ne pas tourner à vide.
            if let Some(remaining) = self.frame_period.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        };

        match &stop {
            StopReason::Cancelled => log::info!("boucle arrêtée (annulation)"),
            StopReason::CaptureClosed => log::error!("boucle arrêtée : capture terminée"),
            StopReason::TooManyFailures(n) => {
                log::error!("boucle arrêtée : {n} captures manquées d'affilée");
            }
        }
        log::info!(
            "{frames_drawn} frames dessinées, {frames_skipped} ignorées, {frames_unchanged} inchangées"
        );

        Ok(RunSummary {
            frames_drawn,
            frames_skipped,
            frames_unchanged,
            stop,
        })
    }

    /// Dernier frame assemblé.
    #[must_use]
    pub fn rendered(&self) -> &RenderedFrame {
        &self.rendered
    }

    /// Dernière passe de luminance.
    #[must_use]
    pub fn brightness(&self) -> &BrightnessBuffer {
        &self.brightness
    }

    /// Dernière ligne de statut.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Chronométrage des itérations.
    #[must_use]
    pub fn perf(&self) -> &PerfMonitor {
        &self.perf
    }

    /// Renderer (et son terminal).
    #[must_use]
    pub fn renderer(&self) -> &Renderer<T> {
        &self.renderer
    }

    /// Renderer, mutable (tests : simuler un resize).
    pub fn renderer_mut(&mut self) -> &mut Renderer<T> {
        &mut self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_render::terminal::{RecordingTerminal, TermOp};
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Source scriptée : rejoue une liste de résultats puis se ferme.
    struct Scripted {
        script: VecDeque<Result<Arc<FrameBuffer>, CoreError>>,
        live: bool,
    }

    impl Source for Scripted {
        fn next_frame(&mut self) -> Result<Arc<FrameBuffer>, CoreError> {
            self.script.pop_front().unwrap_or(Err(CoreError::CaptureClosed))
        }
        fn is_live(&self) -> bool {
            self.live
        }
    }

    fn white() -> Arc<FrameBuffer> {
        let mut frame = FrameBuffer::new(100, 50);
        frame.fill(255, 255, 255);
        Arc::new(frame)
    }

    fn config(max_failures: u32) -> RenderConfig {
        let mut config = RenderConfig {
            ramp_scale: 2,
            ..RenderConfig::default()
        };
        config.capture.max_failures = max_failures;
        config.capture.fps = 120;
        config
    }

    fn build(
        script: Vec<Result<Arc<FrameBuffer>, CoreError>>,
        max_failures: u32,
        live: bool,
    ) -> Pipeline<RecordingTerminal> {
        let renderer = Renderer::new(RecordingTerminal::new(40, 20), true);
        let source = Scripted {
            script: script.into(),
            live,
        };
        Pipeline::new(Box::new(source), renderer, &config(max_failures)).unwrap()
    }

    fn pipeline(
        script: Vec<Result<Arc<FrameBuffer>, CoreError>>,
        max_failures: u32,
    ) -> Pipeline<RecordingTerminal> {
        build(script, max_failures, true)
    }

    fn miss() -> Result<Arc<FrameBuffer>, CoreError> {
        Err(CoreError::CaptureUnavailable("timeout".to_string()))
    }

    #[test]
    fn white_source_renders_all_hashes() {
        let mut p = pipeline(vec![Ok(white())], 0);
        let (outcome, state) = p.run_iteration(LoopState::default()).unwrap();
        assert_eq!(outcome, IterationOutcome::Drawn { cleared: true });
        assert_eq!(state.previous_grid, Some(TerminalGrid::new(40, 20)));

        assert_eq!(p.brightness().len(), 273);
        let text = p.rendered().as_str();
        assert_eq!(text.matches('\n').count(), 6);
        assert_eq!(text.chars().filter(|&c| c == '#').count(), 273);
        assert!(p.status().starts_with("camscii | "));
        assert!(p.status().contains("in 100x50 | out 40x8"));
    }

    #[test]
    fn second_frame_same_grid_does_not_clear() {
        let mut p = pipeline(vec![Ok(white()), Ok(white())], 0);
        let (_, state) = p.run_iteration(LoopState::default()).unwrap();
        let (outcome, _) = p.run_iteration(state).unwrap();
        assert_eq!(outcome, IterationOutcome::Drawn { cleared: false });
        assert_eq!(p.renderer().terminal().clear_count(), 1);
    }

    #[test]
    fn resize_between_frames_clears() {
        let mut p = pipeline(vec![Ok(white()), Ok(white())], 0);
        let (_, state) = p.run_iteration(LoopState::default()).unwrap();
        p.renderer_mut().terminal_mut().resize(60, 20);
        let (outcome, state) = p.run_iteration(state).unwrap();
        assert_eq!(outcome, IterationOutcome::Drawn { cleared: true });
        assert_eq!(state.previous_grid, Some(TerminalGrid::new(60, 20)));
    }

    #[test]
    fn zero_terminal_skips_without_drawing() {
        let mut p = pipeline(vec![Ok(white())], 0);
        p.renderer_mut().terminal_mut().resize(0, 20);
        let (outcome, state) = p.run_iteration(LoopState::default()).unwrap();
        assert_eq!(
            outcome,
            IterationOutcome::Skipped(CoreError::PreconditionFailure {
                width: 0,
                height: 20
            })
        );
        assert_eq!(state.previous_grid, None);
        assert!(p.renderer().terminal().ops().is_empty());
    }

    #[test]
    fn capture_misses_reset_on_success() {
        let mut p = pipeline(vec![miss(), miss(), Ok(white())], 5);
        let (outcome, state) = p.run_iteration(LoopState::default()).unwrap();
        assert!(matches!(outcome, IterationOutcome::Skipped(CoreError::CaptureUnavailable(_))));
        let (_, state) = p.run_iteration(state).unwrap();
        assert_eq!(state.consecutive_failures, 2);
        let (outcome, state) = p.run_iteration(state).unwrap();
        assert!(matches!(outcome, IterationOutcome::Drawn { .. }));
        assert_eq!(state.consecutive_failures, 0);
    }

    #[test]
    fn gives_up_after_max_failures() {
        let mut p = pipeline(vec![miss(), miss(), miss()], 3);
        let summary = p.run(&AtomicBool::new(false)).unwrap();
        assert_eq!(summary.stop, StopReason::TooManyFailures(3));
        assert_eq!(summary.frames_skipped, 2);
        assert_eq!(summary.frames_drawn, 0);
    }

    #[test]
    fn closed_capture_ends_run() {
        let mut p = pipeline(vec![Ok(white()), Ok(white())], 0);
        let summary = p.run(&AtomicBool::new(false)).unwrap();
        assert_eq!(summary.stop, StopReason::CaptureClosed);
        assert_eq!(summary.frames_drawn, 2);
    }

    #[test]
    fn cancel_is_checked_before_any_iteration() {
        let mut p = pipeline(vec![Ok(white())], 0);
        let summary = p.run(&AtomicBool::new(true)).unwrap();
        assert_eq!(summary.stop, StopReason::Cancelled);
        assert_eq!(summary.frames_drawn, 0);
        assert!(p.renderer().terminal().ops().is_empty());
    }

    #[test]
    fn black_frame_is_drawn_with_darkest_char() {
        let mut p = pipeline(vec![Ok(Arc::new(FrameBuffer::new(100, 50)))], 0);
        let (outcome, _) = p.run_iteration(LoopState::default()).unwrap();
        assert!(matches!(outcome, IterationOutcome::Drawn { .. }));
        assert!(p.rendered().as_str().chars().all(|c| c == ' ' || c == '\n'));
    }

    #[test]
    fn status_describes_the_frame_just_drawn() {
        let mut p = pipeline(vec![Ok(white())], 0);
        p.run_iteration(LoopState::default()).unwrap();

        let mut expected = String::new();
        write_status(&mut expected, p.perf().latest(), (100, 50), (40, 8));
        assert_eq!(p.status(), expected);
        assert!(p.perf().latest().resize > Duration::ZERO);

        let ops = p.renderer().terminal().ops();
        assert_eq!(ops[ops.len() - 2], TermOp::Title(expected));
        assert_eq!(ops[ops.len() - 1], TermOp::Flush);
    }

    #[test]
    fn skipped_iteration_restarts_frame_interval() {
        let mut p = pipeline(vec![Ok(white()), miss(), Ok(white())], 0);
        let (_, state) = p.run_iteration(LoopState::default()).unwrap();
        thread::sleep(Duration::from_millis(60));

        let (outcome, state) = p.run_iteration(state).unwrap();
        assert!(matches!(outcome, IterationOutcome::Skipped(_)));
        assert!(p.perf().latest().interval >= Duration::from_millis(60));

        let (outcome, _) = p.run_iteration(state).unwrap();
        assert!(matches!(outcome, IterationOutcome::Drawn { .. }));
        assert!(p.perf().latest().interval < Duration::from_millis(60));
    }

    #[test]
    fn still_source_redraws_only_on_resize() {
        let mut p = build(vec![Ok(white()), Ok(white())], 0, false);
        let (outcome, state) = p.run_iteration(LoopState::default()).unwrap();
        assert_eq!(outcome, IterationOutcome::Drawn { cleared: true });
        let drawn_ops = p.renderer().terminal().ops().len();

        let (outcome, state) = p.run_iteration(state).unwrap();
        assert_eq!(outcome, IterationOutcome::Unchanged);
        assert_eq!(p.renderer().terminal().ops().len(), drawn_ops);

        p.renderer_mut().terminal_mut().resize(60, 20);
        let (outcome, _) = p.run_iteration(state).unwrap();
        assert_eq!(outcome, IterationOutcome::Drawn { cleared: true });
        assert_eq!(p.renderer().terminal().clear_count(), 2);
    }
}
