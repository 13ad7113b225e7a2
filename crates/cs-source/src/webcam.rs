// Capture webcam via ffmpeg en subprocess (std::process::Command).
// Prérequis : `ffmpeg` accessible dans le PATH.
//
// Architecture :
//   - `ffmpeg_args`         : ligne de commande selon la plateforme
//   - `WebcamSource::open`  : lance ffmpeg + le thread de lecture
//   - `capture_loop`        : lit des frames RGBA brutes, les pousse dans le canal
//   - `find_or_create_slot` : pool Arc<FrameBuffer> zero-alloc

use anyhow::{Context, Result};
use flume::{Receiver, RecvTimeoutError, Sender, TrySendError};
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cs_core::config::CaptureConfig;
use cs_core::error::CoreError;
use cs_core::frame::FrameBuffer;
use cs_core::traits::Source;

/// Capacité du canal de frames.
const CHANNEL_CAPACITY: usize = 3;

/// Taille du pool de frames pré-allouées.
/// Doit être > capacité du canal (3) pour garantir un slot libre sans allocation.
const POOL_SIZE: usize = 6;

/// Format d'entrée ffmpeg de la plateforme courante.
#[must_use]
pub fn input_format() -> &'static str {
    if cfg!(target_os = "macos") {
        "avfoundation"
    } else if cfg!(target_os = "windows") {
        "dshow"
    } else {
        "v4l2"
    }
}

/// Nom de périphérique tel que ffmpeg l'attend.
///
/// Sur Linux un index nu devient `/dev/videoN` ; sur Windows le nom est
/// préfixé par `video=`.
#[must_use]
pub fn device_input(device: &str) -> String {
    match input_format() {
        "v4l2" if !device.is_empty() && device.bytes().all(|b| b.is_ascii_digit()) => {
            format!("/dev/video{device}")
        }
        "dshow" => format!("video={device}"),
        _ => device.to_string(),
    }
}

/// Arguments ffmpeg : capture caméra → RGBA brut `width × height` sur stdout.
///
/// # Example
/// ```
/// use cs_core::config::CaptureConfig;
/// use cs_source::webcam::ffmpeg_args;
///
/// let args = ffmpeg_args(&CaptureConfig::default());
/// assert!(args.windows(2).any(|w| w == ["-pix_fmt", "rgba"]));
/// assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
/// ```
#[must_use]
pub fn ffmpeg_args(cfg: &CaptureConfig) -> Vec<String> {
    let fps = cfg.fps.to_string();
    let size = format!("{}x{}", cfg.width, cfg.height);
    let scale = format!("scale={}:{}:flags=bilinear", cfg.width, cfg.height);
    [
        "-f",
        input_format(),
        "-framerate",
        &fps,
        "-video_size",
        &size,
        "-i",
        &device_input(&cfg.device),
        "-vf",
        &scale, // taille de sortie garantie même si la caméra l'ignore
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-an",
        "-hide_banner",
        "-loglevel",
        "error",
        "pipe:1",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

/// Source webcam. Les frames arrivent d'un thread dédié via un canal borné.
///
/// Dropper la source tue ffmpeg et attend la fin du thread.
///
/// # Example
/// ```no_run
/// use cs_core::config::CaptureConfig;
/// use cs_core::traits::Source;
/// use cs_source::webcam::WebcamSource;
///
/// let mut cam = WebcamSource::open(&CaptureConfig::default()).unwrap();
/// let frame = cam.next_frame();
/// ```
pub struct WebcamSource {
    frame_rx: Receiver<Arc<FrameBuffer>>,
    child: Child,
    handle: Option<thread::JoinHandle<()>>,
    timeout: Duration,
}

impl WebcamSource {
    /// Lance ffmpeg et le thread de capture.
    ///
    /// # Errors
    /// Retourne une erreur si ffmpeg est introuvable ou si le thread ne peut
    /// pas être créé.
    pub fn open(cfg: &CaptureConfig) -> Result<Self> {
        let mut child = Command::new("ffmpeg")
            .args(ffmpeg_args(cfg))
            .stdout(Stdio::piped())
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context(
                "Impossible de lancer ffmpeg. Vérifiez que ffmpeg est installé et dans le PATH.",
            )?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            anyhow::bail!("ffmpeg lancé sans stdout");
        };

        let (frame_tx, frame_rx) = flume::bounded(CHANNEL_CAPACITY);
        let (w, h) = (cfg.width, cfg.height);
        let spawned = thread::Builder::new()
            .name("cs-capture".to_string())
            .spawn(move || capture_loop(stdout, w, h, &frame_tx));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e).context("Impossible de spawner le thread de capture");
            }
        };

        log::info!(
            "webcam: {} {} @ {w}x{h} {}fps",
            input_format(),
            device_input(&cfg.device),
            cfg.fps
        );

        Ok(Self {
            frame_rx,
            child,
            handle: Some(handle),
            timeout: Duration::from_millis(cfg.timeout_ms),
        })
    }
}

impl Source for WebcamSource {
    fn next_frame(&mut self) -> Result<Arc<FrameBuffer>, CoreError> {
        receive_frame(&self.frame_rx, self.timeout)
    }

    fn is_live(&self) -> bool {
        true
    }
}

impl Drop for WebcamSource {
    fn drop(&mut self) {
        // Tuer ffmpeg ferme le pipe : le thread lit EOF et sort.
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::warn!("webcam: le thread de capture a paniqué");
        }
        log::info!("webcam: capture arrêtée");
    }
}

/// Attend une frame au plus `timeout`.
///
/// # Errors
/// - [`CoreError::CaptureUnavailable`] si rien n'arrive à temps.
/// - [`CoreError::CaptureClosed`] si le thread de capture est terminé.
pub fn receive_frame(
    rx: &Receiver<Arc<FrameBuffer>>,
    timeout: Duration,
) -> Result<Arc<FrameBuffer>, CoreError> {
    match rx.recv_timeout(timeout) {
        Ok(frame) => Ok(frame),
        Err(RecvTimeoutError::Timeout) => Err(CoreError::CaptureUnavailable(format!(
            "aucune frame en {} ms",
            timeout.as_millis()
        ))),
        Err(RecvTimeoutError::Disconnected) => Err(CoreError::CaptureClosed),
    }
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// # Errors
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF avant complétion,
/// `Err` sur erreur I/O fatale.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false), // EOF
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Trouve ou crée un slot libre dans le pool.
///
/// Invariant : retourne un index `i` tel que `Arc::strong_count(&pool[i]) == 1`.
/// Si tous les slots sont pris, alloue un nouveau slot (cas exceptionnel).
fn find_or_create_slot(pool: &mut Vec<Arc<FrameBuffer>>, w: u32, h: u32) -> usize {
    if let Some(i) = pool.iter().position(|a| Arc::strong_count(a) == 1) {
        i
    } else {
        pool.push(Arc::new(FrameBuffer::new(w, h)));
        pool.len() - 1
    }
}

/// Boucle du thread de capture : une frame RGBA `w × h` par lecture.
///
/// Canal plein → la frame est abandonnée (on ne bloque jamais ffmpeg).
/// Se termine sur EOF, erreur de lecture ou récepteur disparu ; `frame_tx`
/// est alors droppé et le récepteur voit le canal fermé.
pub fn capture_loop<R: Read>(mut reader: R, w: u32, h: u32, frame_tx: &Sender<Arc<FrameBuffer>>) {
    let mut pool: Vec<Arc<FrameBuffer>> = (0..POOL_SIZE)
        .map(|_| Arc::new(FrameBuffer::new(w, h)))
        .collect();
    let mut captured = 0u64;
    let mut dropped = 0u64;

    loop {
        let idx = find_or_create_slot(&mut pool, w, h);
        // Arc::get_mut réussit ssi strong_count == 1 (garanti par find_or_create_slot)
        let Some(fb) = Arc::get_mut(&mut pool[idx]) else {
            continue;
        };

        match read_exact_or_eof(&mut reader, &mut fb.data) {
            Ok(true) => {
                captured += 1;
                match frame_tx.try_send(Arc::clone(&pool[idx])) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        dropped += 1;
                        log::debug!("capture: canal plein, frame abandonnée");
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            Ok(false) => {
                log::info!("capture: fin du flux ffmpeg");
                break;
            }
            Err(e) => {
                log::warn!("capture: erreur lecture pipe: {e}");
                break;
            }
        }
    }
    log::info!("capture: {captured} frames lues, {dropped} abandonnées");
}
