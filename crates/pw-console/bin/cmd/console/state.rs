use pw_console::Scope;
use ratatui::layout::{Position, Rect};

/// Represents which pane receives key input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    LogPane,
    ReplPane,
}

impl Focus {
    pub(crate) fn next(self) -> Self {
        match self {
            Focus::LogPane => Focus::ReplPane,
            Focus::ReplPane => Focus::LogPane,
        }
    }

    /// With two panes cycling backwards lands on the same pane as forwards.
    pub(crate) fn previous(self) -> Self {
        self.next()
    }

    pub(crate) fn scope(self) -> Scope {
        match self {
            Focus::LogPane => Scope::LogPane,
            Focus::ReplPane => Scope::ReplPane,
        }
    }
}

/// Screen areas from the last render, used to route mouse events
#[derive(Debug, Clone, Default)]
pub(crate) struct PaneAreas {
    pub(crate) logs: Rect,
    /// Rows holding log lines, excluding borders and toolbar.
    pub(crate) log_lines: Rect,
    /// For each screen row of `log_lines`, the offset of the log line drawn
    /// there within the rendered range. Wrapped lines span several rows.
    pub(crate) log_row_offsets: Vec<usize>,
    pub(crate) repl: Rect,
}

impl PaneAreas {
    pub(crate) fn pane_at(&self, column: u16, row: u16) -> Option<Focus> {
        let position = Position::new(column, row);
        if self.logs.contains(position) {
            Some(Focus::LogPane)
        } else if self.repl.contains(position) {
            Some(Focus::ReplPane)
        } else {
            None
        }
    }

    /// Offset of the log line under `(column, row)` within the rendered range.
    pub(crate) fn log_line_at(&self, column: u16, row: u16) -> Option<usize> {
        if !self.log_lines.contains(Position::new(column, row)) {
            return None;
        }
        self.log_row_offsets
            .get((row - self.log_lines.y) as usize)
            .copied()
    }
}
