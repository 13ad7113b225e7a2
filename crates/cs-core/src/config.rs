use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Facteur de correction de l'aspect des cellules terminal (hauteur / largeur).
pub const DEFAULT_ASPECT_CORRECTION: f32 = 2.5;

/// Configuration complète du rendu et de la capture.
///
/// Chargée depuis TOML par [`parse_config`]. Chaque champ a une valeur par
/// défaut saine.
///
/// # Example
/// ```
/// use cs_core::config::RenderConfig;
/// let config = RenderConfig::default();
/// assert_eq!(config.ramp_scale, 10);
/// assert_eq!(config.capture.fps, 30);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    // === Rendu ===
    /// Taille de la rampe de caractères (2, 4, 5, 8, 16, 32 ; sinon rampe par défaut).
    pub ramp_scale: u8,
    /// Correction d'aspect des cellules (typiquement 2.5).
    pub aspect_correction: f32,
    /// Workers du mapping parallèle. 0 = pool rayon global.
    pub workers: usize,
    /// Pousser la ligne de statut dans le titre du terminal.
    pub show_status: bool,

    // === Capture ===
    /// Paramètres du périphérique de capture.
    pub capture: CaptureConfig,
}

/// Capture device parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Device selector: `/dev/video<N>` index on Linux, index on macOS, name on Windows.
    pub device: String,
    /// Requested capture width in pixels.
    pub width: u32,
    /// Requested capture height in pixels.
    pub height: u32,
    /// Requested capture rate.
    pub fps: u32,
    /// How long one iteration waits for a frame before skipping.
    pub timeout_ms: u64,
    /// Consecutive missed frames tolerated before the loop gives up. 0 = never.
    pub max_failures: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: "0".to_string(),
            width: 640,
            height: 480,
            fps: 30,
            timeout_ms: 1000,
            max_failures: 100,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ramp_scale: crate::charset::DEFAULT_SCALE,
            aspect_correction: DEFAULT_ASPECT_CORRECTION,
            workers: 0,
            show_status: true,
            capture: CaptureConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    ///
    /// `ramp_scale` is left alone: unsupported scales are resolved to the
    /// default ramp when the ramp is built.
    pub fn clamp_all(&mut self) {
        if !self.aspect_correction.is_finite() {
            self.aspect_correction = DEFAULT_ASPECT_CORRECTION;
        }
        self.aspect_correction = self.aspect_correction.clamp(1.0, 4.0);
        self.workers = self.workers.min(256);
        self.capture.width = self.capture.width.clamp(16, 3840);
        self.capture.height = self.capture.height.clamp(16, 2160);
        self.capture.fps = self.capture.fps.clamp(1, 120);
        self.capture.timeout_ms = self.capture.timeout_ms.clamp(10, 60_000);
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    render: Option<RenderSection>,
    capture: Option<CaptureSection>,
}

/// Render section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct RenderSection {
    ramp_scale: Option<u8>,
    aspect_correction: Option<f32>,
    workers: Option<usize>,
    show_status: Option<bool>,
}

/// Capture section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct CaptureSection {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
    timeout_ms: Option<u64>,
    max_failures: Option<u32>,
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML for this schema.
///
/// # Example
/// ```
/// use cs_core::config::parse_config;
/// let config = parse_config("[render]\nramp_scale = 2\n").unwrap();
/// assert_eq!(config.ramp_scale, 2);
/// assert_eq!(config.capture.width, 640);
/// ```
pub fn parse_config(content: &str) -> Result<RenderConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = RenderConfig::default();

    if let Some(r) = file.render {
        if let Some(v) = r.ramp_scale {
            config.ramp_scale = v;
        }
        if let Some(v) = r.aspect_correction {
            config.aspect_correction = v;
        }
        if let Some(v) = r.workers {
            config.workers = v;
        }
        if let Some(v) = r.show_status {
            config.show_status = v;
        }
    }

    if let Some(c) = file.capture {
        if let Some(v) = c.device {
            config.capture.device = v;
        }
        if let Some(v) = c.width {
            config.capture.width = v;
        }
        if let Some(v) = c.height {
            config.capture.height = v;
        }
        if let Some(v) = c.fps {
            config.capture.fps = v;
        }
        if let Some(v) = c.timeout_ms {
            config.capture.timeout_ms = v;
        }
        if let Some(v) = c.max_failures {
            config.capture.max_failures = v;
        }
    }

    config.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use cs_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<RenderConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, RenderConfig::default());
    }

    #[test]
    fn partial_sections_override_only_given_fields() {
        let config = parse_config(
            "[render]\nworkers = 4\n\n[capture]\ndevice = \"/dev/video2\"\nfps = 60\n",
        )
        .unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.capture.device, "/dev/video2");
        assert_eq!(config.capture.fps, 60);
        assert_eq!(config.capture.width, 640);
        assert!(config.show_status);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = parse_config(
            "[render]\naspect_correction = 12.0\n\n[capture]\nwidth = 1\nfps = 0\ntimeout_ms = 1\n",
        )
        .unwrap();
        assert!((config.aspect_correction - 4.0).abs() < f32::EPSILON);
        assert_eq!(config.capture.width, 16);
        assert_eq!(config.capture.fps, 1);
        assert_eq!(config.capture.timeout_ms, 10);
    }

    #[test]
    fn unsupported_ramp_scale_is_kept_for_later_fallback() {
        let config = parse_config("[render]\nramp_scale = 7\n").unwrap();
        assert_eq!(config.ramp_scale, 7);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(parse_config("[render\nramp_scale = ").is_err());
        assert!(parse_config("[render]\nramp_scale = \"big\"\n").is_err());
    }

    #[test]
    fn load_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[render]\nramp_scale = 16\nshow_status = false").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.ramp_scale, 16);
        assert!(!config.show_status);
    }

    #[test]
    fn load_config_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(&dir.path().join("absent.toml")).is_err());
    }
}
