use pw_console::{CommandTable, LogContainer, ReplPane};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::cmd::console::state::{Focus, PaneAreas};

use super::bars::render_top_bar;
use super::help::render_help_popup;
use super::logs::render_log_pane;
use super::repl::render_repl_pane;

/// Display options that change the layout
#[derive(Debug, Clone, Copy)]
pub(crate) struct ViewOptions {
    pub(crate) focus: Focus,
    pub(crate) vertical_split: bool,
    pub(crate) wrap_lines: bool,
    pub(crate) show_help: bool,
}

/// Renders the title bar, both panes and the help popup. Returns the pane
/// areas for mouse routing.
pub(crate) fn render_main_view(
    frame: &mut Frame,
    logs: &mut LogContainer,
    repl: &ReplPane,
    commands: &CommandTable,
    options: ViewOptions,
) -> PaneAreas {
    let area = frame.area();
    let [top_area, panes_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);

    render_top_bar(frame, top_area, options.focus, options.vertical_split);

    let direction = if options.vertical_split {
        Direction::Horizontal
    } else {
        Direction::Vertical
    };
    let chunks = Layout::default()
        .direction(direction)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(panes_area);
    let (logs_area, repl_area) = (chunks[0], chunks[1]);

    let rendered = render_log_pane(
        logs,
        logs_area,
        frame,
        options.focus == Focus::LogPane,
        options.wrap_lines,
    );
    render_repl_pane(repl, repl_area, frame, options.focus == Focus::ReplPane);

    if options.show_help {
        render_help_popup(commands, area, frame);
    }

    PaneAreas {
        logs: logs_area,
        log_lines: rendered.lines_area,
        log_row_offsets: rendered.row_offsets,
        repl: repl_area,
    }
}
