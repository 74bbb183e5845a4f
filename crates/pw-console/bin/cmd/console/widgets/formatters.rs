use ratatui::style::Color;
use std::ops::Range;
use tracing::Level;

pub(crate) fn level_color(level: Level) -> Color {
    match level {
        Level::ERROR => Color::Red,
        Level::WARN => Color::Yellow,
        Level::INFO => Color::Green,
        Level::DEBUG => Color::Blue,
        Level::TRACE => Color::Magenta,
    }
}

pub(crate) fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// Picks which of the drawn lines fit into `height` rows once wrapped.
///
/// `heights` holds the row count of every drawn line. Lines are dropped from
/// the bottom while the `keep` line is above them, then from the top, so the
/// kept line always stays visible.
pub(crate) fn fit_wrapped(heights: &[usize], height: usize, keep: Option<usize>) -> Range<usize> {
    let mut range = 0..heights.len();
    let mut total: usize = heights.iter().sum();
    while total > height && range.len() > 1 {
        let drop_last = keep.is_some_and(|k| k < range.end - 1);
        if drop_last {
            range.end -= 1;
            total -= heights[range.end];
        } else {
            total -= heights[range.start];
            range.start += 1;
        }
    }
    range
}

/// Keeps the end of `text` that fits in `width` columns with the cursor
/// visible. Returns the visible slice and the cursor column inside it.
pub(crate) fn scroll_to_cursor(text: &str, cursor: usize, width: usize) -> (String, usize) {
    if width == 0 {
        return (String::new(), 0);
    }
    let skip = (cursor + 1).saturating_sub(width);
    let visible: String = text.chars().skip(skip).take(width).collect();
    (visible, cursor - skip)
}

/// One log line as printed by the test-mode fake device.
pub(crate) fn fake_device_line(count: u64) -> String {
    const BAR_SIZE: usize = 10;
    let position = (count % BAR_SIZE as u64) as usize;
    let bar = if position == 0 {
        format!("{}=", " ".repeat(BAR_SIZE - 1))
    } else {
        format!("{:>width$}{}", "=", " ".repeat(BAR_SIZE - position), width = position)
    };
    let mut line = format!("Log message [{}] # {}", bar, count);
    if count % 10 == 0 {
        line.push_str(&" Lorem ipsum dolor sit amet, consectetur adipiscing elit.".repeat(8));
    }
    line
}
