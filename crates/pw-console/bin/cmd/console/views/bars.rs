use ratatui::{
    layout::Rect,
    style::{Color, Style, Stylize},
    text::Line,
    widgets::Paragraph,
    Frame,
};

use crate::cmd::console::state::Focus;

/// Renders the one-line title bar with the global key hints
pub(crate) fn render_top_bar(frame: &mut Frame, area: Rect, focus: Focus, vertical_split: bool) {
    let focused = match focus {
        Focus::LogPane => "Logs",
        Focus::ReplPane => "Lua",
    };
    let split = if vertical_split {
        "vertical"
    } else {
        "horizontal"
    };

    let line = Line::from(vec![
        " PW Console ".bold(),
        " | Focus: ".into(),
        focused.cyan(),
        " | Help ".into(),
        "<F1> ".blue().bold(),
        " | Split ".into(),
        "<F2> ".blue().bold(),
        split.into(),
        " | Switch ".into(),
        "<Shift-Tab> ".blue().bold(),
        " | Quit ".into(),
        "<Ctrl-W> ".blue().bold(),
    ]);

    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(Color::Black)),
        area,
    );
}
