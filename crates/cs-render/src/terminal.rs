use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::Print;
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
};
use crossterm::{execute, queue};

/// Surface de sortie du renderer.
///
/// Implémenté par : [`CrosstermTerminal`] (production), [`RecordingTerminal`] (tests).
pub trait Terminal {
    /// Taille courante en cellules `(colonnes, lignes)`.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the size cannot be queried.
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Efface tout l'écran.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    fn clear(&mut self) -> io::Result<()>;

    /// Place le curseur en `(x, y)`, origine en haut à gauche.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    fn move_to(&mut self, x: u16, y: u16) -> io::Result<()>;

    /// Écrit du texte à la position du curseur.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    fn write_text(&mut self, text: &str) -> io::Result<()>;

    /// Remplace le titre de la fenêtre.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    fn set_title(&mut self, title: &str) -> io::Result<()>;

    /// Pousse tout ce qui a été mis en file.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    fn flush(&mut self) -> io::Result<()>;
}

/// Terminal crossterm. Les commandes sont mises en file (`queue!`) et
/// partent en un seul `flush` par frame.
///
/// Pas de raw mode : le `'\n'` reste traduit en retour chariot par le tty,
/// et ctrl-c arrive comme un signal.
///
/// # Example
/// ```
/// use cs_render::terminal::{CrosstermTerminal, Terminal};
/// let mut term = CrosstermTerminal::new(Vec::new());
/// term.write_text("ab").unwrap();
/// term.flush().unwrap();
/// assert!(term.into_inner().ends_with(b"ab"));
/// ```
pub struct CrosstermTerminal<W: Write> {
    out: W,
}

impl<W: Write> CrosstermTerminal<W> {
    /// Wrap a writer.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl CrosstermTerminal<Stdout> {
    /// Terminal sur stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Terminal for CrosstermTerminal<W> {
    fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    fn clear(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All))
    }

    fn move_to(&mut self, x: u16, y: u16) -> io::Result<()> {
        queue!(self.out, MoveTo(x, y))
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, Print(text))
    }

    fn set_title(&mut self, title: &str) -> io::Result<()> {
        queue!(self.out, SetTitle(title))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Écran alternatif + curseur masqué le temps de la session.
///
/// Le terminal est TOUJOURS restauré au drop, même en cas d'erreur.
pub struct TerminalSession {
    _private: (),
}

impl TerminalSession {
    /// Enter the alternate screen and hide the cursor.
    ///
    /// # Errors
    /// Returns the I/O error if stdout rejects the commands.
    pub fn start() -> io::Result<Self> {
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(e) = execute!(io::stdout(), Show, LeaveAlternateScreen) {
            log::warn!("terminal: restauration impossible: {e}");
        }
    }
}

/// One call received by a [`RecordingTerminal`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermOp {
    /// `clear()`
    Clear,
    /// `move_to(x, y)`
    MoveTo(u16, u16),
    /// `write_text(text)`
    Write(String),
    /// `set_title(title)`
    Title(String),
    /// `flush()`
    Flush,
}

/// Terminal factice qui enregistre les appels. Taille pilotée à la main.
///
/// # Example
/// ```
/// use cs_render::terminal::{RecordingTerminal, TermOp, Terminal};
/// let mut term = RecordingTerminal::new(80, 24);
/// term.clear().unwrap();
/// assert_eq!(term.ops(), &[TermOp::Clear]);
/// assert_eq!(term.size().unwrap(), (80, 24));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RecordingTerminal {
    size: (u16, u16),
    ops: Vec<TermOp>,
}

impl RecordingTerminal {
    /// Fake terminal of `width × height` cells.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            size: (width, height),
            ops: Vec::new(),
        }
    }

    /// Simulate a resize.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.size = (width, height);
    }

    /// Every call so far, in order.
    #[must_use]
    pub fn ops(&self) -> &[TermOp] {
        &self.ops
    }

    /// Forget recorded calls.
    pub fn reset(&mut self) {
        self.ops.clear();
    }

    /// Number of `clear()` calls.
    #[must_use]
    pub fn clear_count(&self) -> usize {
        self.ops.iter().filter(|op| **op == TermOp::Clear).count()
    }

    /// Last text written, if any.
    #[must_use]
    pub fn last_text(&self) -> Option<&str> {
        self.ops.iter().rev().find_map(|op| match op {
            TermOp::Write(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Last title set, if any.
    #[must_use]
    pub fn last_title(&self) -> Option<&str> {
        self.ops.iter().rev().find_map(|op| match op {
            TermOp::Title(title) => Some(title.as_str()),
            _ => None,
        })
    }
}

impl Terminal for RecordingTerminal {
    fn size(&self) -> io::Result<(u16, u16)> {
        Ok(self.size)
    }

    fn clear(&mut self) -> io::Result<()> {
        self.ops.push(TermOp::Clear);
        Ok(())
    }

    fn move_to(&mut self, x: u16, y: u16) -> io::Result<()> {
        self.ops.push(TermOp::MoveTo(x, y));
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.ops.push(TermOp::Write(text.to_string()));
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> io::Result<()> {
        self.ops.push(TermOp::Title(title.to_string()));
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ops.push(TermOp::Flush);
        Ok(())
    }
}
