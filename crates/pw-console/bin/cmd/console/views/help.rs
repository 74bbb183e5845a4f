use pw_console::CommandTable;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::Line,
    widgets::{Block, Clear, Row, Table},
    Frame,
};

/// Renders a centered popup listing every key binding
pub(crate) fn render_help_popup(commands: &CommandTable, area: Rect, frame: &mut Frame) {
    let popup_width = (area.width as f32 * 0.8) as u16;
    let popup_height = (area.height as f32 * 0.8) as u16;
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(" Help ")
        .title_bottom(Line::from(" Close <q/Esc/F1> ").centered())
        .border_set(border::DOUBLE);

    let header = Row::new(vec!["Scope", "Keys", "Description"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = commands
        .describe()
        .into_iter()
        .map(|row| {
            Row::new(vec![
                row.scope.to_string(),
                row.keys_label(),
                row.command.description().to_string(),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Length(32),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, popup_area);
}
