use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use cs_app::cli::Cli;
use cs_app::logging::{SessionLogGuard, init_logging};
use cs_app::pipeline::{Pipeline, StopReason};
use cs_core::config::RenderConfig;
use cs_render::renderer::Renderer;
use cs_render::terminal::{CrosstermTerminal, TerminalSession};

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = Cli::parse();

    // 2. Initialiser le logging
    init_logging(&cli.log_level, cli.log_file.as_deref())?;

    // 3. Valider la source
    cli.validate_source()?;

    // 4. Charger la config + overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config);

    // 5. Ouvrir la source
    let source = cs_source::open_source(&cli.source_spec(&config))?;

    // 6. Ctrl-C → arrêt propre à la prochaine itération
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst))
            .context("Impossible d'installer le handler Ctrl-C")?;
    }

    // 7. Pipeline
    let renderer = Renderer::new(CrosstermTerminal::stdout(), config.show_status);
    let mut pipeline = Pipeline::new(source, renderer, &config)?;

    // 8. Boucle principale dans l'écran alternatif
    let quiet = SessionLogGuard::engage(cli.log_file.is_some());
    let session = TerminalSession::start().context("Initialisation du terminal impossible")?;
    let result = pipeline.run(&cancel);

    // 9. Restaurer le terminal (TOUJOURS, même en cas d'erreur)
    drop(session);
    drop(quiet);
    drop(pipeline);

    let summary = result?;
    match summary.stop {
        StopReason::Cancelled => Ok(()),
        StopReason::CaptureClosed => {
            anyhow::bail!(
                "La capture s'est arrêtée après {} frames.",
                summary.frames_drawn
            )
        }
        StopReason::TooManyFailures(n) => {
            anyhow::bail!("Abandon : {n} captures manquées d'affilée.")
        }
    }
}

/// Config depuis `--config`, ou défauts si le fichier n'existe pas.
fn resolve_config(cli: &Cli) -> Result<RenderConfig> {
    if cli.config.exists() {
        cs_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(RenderConfig::default())
    }
}
