use crate::cmd::console::widgets::formatters::scroll_to_cursor;
use pw_console::repl::RUNNING_MARKER;
use pw_console::text::wrap_with_indent;
use pw_console::ReplPane;
use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Style, Stylize},
    symbols::border,
    text::Line,
    widgets::{Block, Paragraph},
    Frame,
};

const INPUT_PROMPT: &str = "> ";

/// Renders the REPL pane: the transcript tail, the input line and a toolbar
pub(crate) fn render_repl_pane(repl: &ReplPane, area: Rect, frame: &mut Frame, is_focused: bool) {
    let border_set = if is_focused {
        border::THICK
    } else {
        border::PLAIN
    };
    let block = Block::bordered()
        .title(" Lua Results ")
        .border_set(border_set)
        .border_style(if is_focused {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        });

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let [transcript_area, input_area, toolbar_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner_area);

    render_transcript(repl.transcript(), transcript_area, frame);
    render_input(repl, input_area, frame, is_focused);

    let mut toolbar = vec![
        " Run code ".into(),
        "<Enter> ".blue().bold(),
        " | Cancel ".into(),
        "<Ctrl-C> ".blue().bold(),
        " | History ".into(),
        "<↑↓> ".blue().bold(),
    ];
    if repl.is_busy() {
        toolbar.push(" | ".into());
        toolbar.push(RUNNING_MARKER.yellow());
    }
    frame.render_widget(Paragraph::new(Line::from(toolbar)), toolbar_area);
}

/// Shows the end of the transcript, so the newest entry is always visible.
fn render_transcript(transcript: &str, area: Rect, frame: &mut Frame) {
    let width = area.width as usize;
    let height = area.height as usize;

    let mut rows: Vec<Line> = Vec::new();
    let mut style = Style::default();
    for text_line in transcript.lines() {
        if text_line.starts_with("In [") {
            style = Style::default().fg(Color::Cyan);
        } else if text_line.starts_with("Out[") {
            style = Style::default().fg(Color::Green);
        } else if text_line == RUNNING_MARKER {
            style = Style::default().fg(Color::Yellow);
        } else if !text_line.starts_with(' ') {
            style = Style::default();
        }
        for row in wrap_with_indent(text_line, width, 0) {
            rows.push(Line::styled(row, style));
        }
    }

    let skip = rows.len().saturating_sub(height);
    let visible: Vec<Line> = rows.into_iter().skip(skip).collect();
    frame.render_widget(Paragraph::new(visible), area);
}

fn render_input(repl: &ReplPane, area: Rect, frame: &mut Frame, is_focused: bool) {
    let prompt_width = INPUT_PROMPT.len() as u16;
    let text_width = area.width.saturating_sub(prompt_width) as usize;
    let input = repl.input();
    let (visible, cursor_column) = scroll_to_cursor(input.text(), input.cursor(), text_width);

    let line = Line::from(vec![INPUT_PROMPT.cyan().bold(), visible.into()]);
    frame.render_widget(Paragraph::new(line), area);

    if is_focused && area.width > prompt_width {
        frame.set_cursor_position(Position::new(
            area.x + prompt_width + cursor_column as u16,
            area.y,
        ));
    }
}
