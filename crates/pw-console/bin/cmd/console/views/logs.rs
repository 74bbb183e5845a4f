use crate::cmd::console::widgets::formatters::{fit_wrapped, level_color, on_off};
use pw_console::text::{truncate_left, wrap_with_indent};
use pw_console::LogContainer;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

/// Where the log lines ended up on screen after a render pass
pub(crate) struct RenderedLogs {
    pub(crate) lines_area: Rect,
    pub(crate) row_offsets: Vec<usize>,
}

/// Renders the log pane: visible lines around the cursor plus its toolbar
pub(crate) fn render_log_pane(
    logs: &mut LogContainer,
    area: Rect,
    frame: &mut Frame,
    is_focused: bool,
    wrap_lines: bool,
) -> RenderedLogs {
    let border_set = if is_focused {
        border::THICK
    } else {
        border::PLAIN
    };
    let block = Block::bordered()
        .title(" Logs ")
        .border_set(border_set)
        .border_style(if is_focused {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        });

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let [lines_area, toolbar_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner_area);

    let height = lines_area.height as usize;
    let width = lines_area.width as usize;
    logs.set_window_height(height);

    let range_start = logs.visible_range().start;
    let cursor_offset = (!logs.follow())
        .then(|| logs.cursor().checked_sub(range_start))
        .flatten();

    let drawn: Vec<Vec<Line>> = logs
        .draw()
        .enumerate()
        .map(|(offset, line)| {
            let color = level_color(line.record().level);
            let rows = if wrap_lines {
                wrap_with_indent(line.formatted(), width, line.prefix_width())
            } else {
                vec![line.formatted().chars().take(width).collect()]
            };
            let highlight = cursor_offset == Some(offset);
            rows.into_iter()
                .enumerate()
                .map(|(i, row)| style_row(row, i == 0, line.prefix_width(), color, highlight))
                .collect()
        })
        .collect();

    let heights: Vec<usize> = drawn.iter().map(Vec::len).collect();
    let kept = fit_wrapped(&heights, height, cursor_offset);

    let mut row_offsets = Vec::with_capacity(height);
    let mut rows = Vec::with_capacity(height);
    for (offset, line_rows) in drawn.into_iter().enumerate() {
        if !kept.contains(&offset) {
            continue;
        }
        for row in line_rows {
            row_offsets.push(offset);
            rows.push(row);
        }
    }
    rows.truncate(height);
    row_offsets.truncate(height);

    frame.render_widget(Paragraph::new(rows), lines_area);
    render_log_toolbar(logs, toolbar_area, frame, wrap_lines);

    RenderedLogs {
        lines_area,
        row_offsets,
    }
}

fn style_row(
    row: String,
    first_row: bool,
    prefix_width: usize,
    color: Color,
    highlight: bool,
) -> Line<'static> {
    let line = if first_row {
        let split_at = row
            .char_indices()
            .nth(prefix_width)
            .map(|(i, _)| i)
            .unwrap_or(row.len());
        let message = row[split_at..].to_string();
        let mut prefix = row;
        prefix.truncate(split_at);
        Line::from(vec![Span::styled(prefix, Style::default().fg(color)), Span::raw(message)])
    } else {
        Line::from(row)
    };

    if highlight {
        line.style(
            Style::default()
                .add_modifier(Modifier::REVERSED)
                .bg(Color::DarkGray),
        )
    } else {
        line
    }
}

fn render_log_toolbar(logs: &LogContainer, area: Rect, frame: &mut Frame, wrap_lines: bool) {
    let mut spans: Vec<Span> = vec![
        format!(" {} lines ", logs.len()).bold(),
        format!("({}) ", logs.human_byte_size()).into(),
        " | Follow ".into(),
        "<f> ".blue().bold(),
        if logs.follow() {
            on_off(true).green()
        } else {
            on_off(false).yellow()
        },
        " | Wrap ".into(),
        "<w> ".blue().bold(),
        on_off(wrap_lines).into(),
        " | Clear ".into(),
        "<c> ".blue().bold(),
    ];

    let used: usize = spans.iter().map(|span| span.width()).sum();
    let remaining = (area.width as usize).saturating_sub(used + 3);
    let channels = logs.channel_counts_summary();
    if remaining > 3 && !channels.is_empty() {
        spans.push(" | ".into());
        spans.push(truncate_left(&channels, remaining).dark_gray());
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
