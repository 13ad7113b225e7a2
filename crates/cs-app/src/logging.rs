use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;

/// env_logger au niveau demandé ; `file` détourne la sortie de stderr.
///
/// # Errors
/// Returns an error if the log file cannot be created.
pub fn init_logging(level: &str, file: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level.parse().unwrap_or(LevelFilter::Warn));
    if let Some(path) = file {
        let file = File::create(path)
            .with_context(|| format!("Impossible de créer {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

/// Coupe les logs tant que le rendu occupe l'écran, sauf s'ils partent dans
/// un fichier. Le niveau précédent revient au drop.
///
/// # Example
/// ```
/// use cs_app::logging::SessionLogGuard;
/// use log::LevelFilter;
///
/// log::set_max_level(LevelFilter::Info);
/// {
///     let _guard = SessionLogGuard::engage(false);
///     assert_eq!(log::max_level(), LevelFilter::Off);
/// }
/// assert_eq!(log::max_level(), LevelFilter::Info);
/// ```
#[derive(Debug)]
pub struct SessionLogGuard {
    restore: Option<LevelFilter>,
}

impl SessionLogGuard {
    /// Silence logging unless it is `to_file`.
    #[must_use]
    pub fn engage(to_file: bool) -> Self {
        if to_file {
            return Self { restore: None };
        }
        let previous = log::max_level();
        log::set_max_level(LevelFilter::Off);
        Self {
            restore: Some(previous),
        }
    }
}

impl Drop for SessionLogGuard {
    fn drop(&mut self) {
        if let Some(level) = self.restore {
            log::set_max_level(level);
        }
    }
}
