use std::io;

use cs_core::frame::TerminalGrid;

use crate::terminal::Terminal;

/// `true` si l'écran doit être effacé avant de dessiner : premier frame ou
/// grille différente de l'itération précédente.
///
/// # Example
/// ```
/// use cs_core::frame::TerminalGrid;
/// use cs_render::renderer::needs_clear;
/// let grid = TerminalGrid::new(80, 24);
/// assert!(needs_clear(None, grid));
/// assert!(!needs_clear(Some(grid), grid));
/// assert!(needs_clear(Some(grid), TerminalGrid::new(100, 24)));
/// ```
#[must_use]
pub fn needs_clear(previous: Option<TerminalGrid>, current: TerminalGrid) -> bool {
    previous != Some(current)
}

/// Seul écrivain du terminal.
///
/// Sans changement de grille, le curseur revient en (0, 0) et le frame
/// écrase le précédent sur place : pas d'effacement, pas de scintillement.
pub struct Renderer<T: Terminal> {
    term: T,
    show_status: bool,
}

impl<T: Terminal> Renderer<T> {
    /// Wrap a terminal. `show_status` pushes the status line to the title.
    #[must_use]
    pub fn new(term: T, show_status: bool) -> Self {
        Self { term, show_status }
    }

    /// Grille courante du terminal.
    ///
    /// # Errors
    /// Returns the I/O error if the size cannot be queried.
    pub fn grid(&self) -> io::Result<TerminalGrid> {
        self.term.size().map(TerminalGrid::from)
    }

    /// Draw one frame and flush it.
    ///
    /// Returns `true` if the screen was cleared first.
    ///
    /// # Errors
    /// Returns the first I/O error from the terminal.
    pub fn draw(
        &mut self,
        frame: &str,
        grid: TerminalGrid,
        previous: Option<TerminalGrid>,
    ) -> io::Result<bool> {
        let cleared = needs_clear(previous, grid);
        if cleared {
            log::debug!("renderer: grille {}x{}, effacement", grid.width, grid.height);
            self.term.clear()?;
        }
        self.term.move_to(0, 0)?;
        self.term.write_text(frame)?;
        self.term.flush()?;
        Ok(cleared)
    }

    /// Pousse la ligne de statut dans le titre, une fois le frame écrit.
    ///
    /// Sans effet si le statut est désactivé.
    ///
    /// # Errors
    /// Returns the first I/O error from the terminal.
    pub fn set_status(&mut self, status: &str) -> io::Result<()> {
        if !self.show_status {
            return Ok(());
        }
        self.term.set_title(status)?;
        self.term.flush()
    }

    /// Terminal sous-jacent.
    #[must_use]
    pub fn terminal(&self) -> &T {
        &self.term
    }

    /// Terminal sous-jacent, mutable.
    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.term
    }

    /// Recover the terminal.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.term
    }
}
