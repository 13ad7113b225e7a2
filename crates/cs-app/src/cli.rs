use std::path::PathBuf;

use clap::Parser;
use cs_core::config::RenderConfig;
use cs_source::SourceSpec;

/// camscii: webcam en direct rendue en caractères dans le terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Périphérique de capture (index ou nom, selon la plateforme).
    #[arg(long)]
    pub device: Option<String>,

    /// Mire animée à la place de la webcam.
    #[arg(long, default_value_t = false)]
    pub pattern: bool,

    /// Image fixe à la place de la webcam (PNG, JPEG, BMP, GIF).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Taille de la rampe de caractères : 2, 4, 5, 8, 16 ou 32.
    #[arg(long)]
    pub scale: Option<u8>,

    /// Threads de quantification (0 = pool global rayon).
    #[arg(long)]
    pub workers: Option<usize>,

    /// FPS de capture.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Ne pas afficher le statut dans le titre du terminal.
    #[arg(long, default_value_t = false)]
    pub no_status: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Écrire les logs dans ce fichier. Sans lui, les logs sur stderr sont
    /// coupés pendant le rendu.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Validate that at most one non-webcam source is provided.
    ///
    /// # Errors
    /// Returns an error if both `--pattern` and `--image` are given.
    pub fn validate_source(&self) -> anyhow::Result<()> {
        if self.pattern && self.image.is_some() {
            anyhow::bail!("Une seule source à la fois : --pattern OU --image (défaut : webcam).");
        }
        Ok(())
    }

    /// Apply command-line overrides on top of the loaded config, then clamp.
    pub fn apply_overrides(&self, config: &mut RenderConfig) {
        if let Some(ref device) = self.device {
            config.capture.device.clone_from(device);
        }
        if let Some(scale) = self.scale {
            config.ramp_scale = scale;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(fps) = self.fps {
            config.capture.fps = fps;
        }
        if self.no_status {
            config.show_status = false;
        }
        config.clamp_all();
    }

    /// Source selected by the flags. The pattern uses the capture size.
    #[must_use]
    pub fn source_spec(&self, config: &RenderConfig) -> SourceSpec {
        if let Some(ref path) = self.image {
            SourceSpec::Still(path.clone())
        } else if self.pattern {
            SourceSpec::Pattern {
                width: config.capture.width,
                height: config.capture.height,
            }
        } else {
            SourceSpec::Webcam(config.capture.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("camscii").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_to_webcam() {
        let cli = parse(&[]);
        assert!(cli.validate_source().is_ok());
        let config = RenderConfig::default();
        assert_eq!(
            cli.source_spec(&config),
            SourceSpec::Webcam(config.capture.clone())
        );
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn pattern_and_image_are_exclusive() {
        let cli = parse(&["--pattern", "--image", "x.png"]);
        assert!(cli.validate_source().is_err());
    }

    #[test]
    fn overrides_are_clamped() {
        let cli = parse(&["--scale", "2", "--workers", "999", "--fps", "0", "--no-status"]);
        let mut config = RenderConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.ramp_scale, 2);
        assert_eq!(config.workers, 256);
        assert_eq!(config.capture.fps, 1);
        assert!(!config.show_status);
    }

    #[test]
    fn pattern_uses_capture_size() {
        let cli = parse(&["--pattern", "--device", "2"]);
        let mut config = RenderConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.capture.device, "2");
        assert_eq!(
            cli.source_spec(&config),
            SourceSpec::Pattern {
                width: 640,
                height: 480
            }
        );
    }
}
