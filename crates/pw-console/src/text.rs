use regex::Regex;
use std::sync::LazyLock;

static RE_ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b(?:\[[0-?]*[ -/]*[@-~]|\][^\x07\x1b]*(?:\x07|\x1b\\)|[@-Z\\-_])")
        .expect("ANSI escape pattern is valid")
});

/// Removes terminal escape sequences (SGR colors, cursor movement, OSC titles).
pub fn strip_ansi(text: &str) -> String {
    RE_ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// Format a byte count into human-readable units (B, KB, MB, GB, TB, PB).
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_idx])
}

/// Number of screen rows a line of `text_width` characters occupies when
/// wrapped at `screen_width`, with every continuation row indented by
/// `prefix_width` columns. An empty line occupies no rows.
pub fn line_height(text_width: usize, screen_width: usize, prefix_width: usize) -> usize {
    if text_width == 0 {
        return 0;
    }
    if screen_width == 0 || text_width <= screen_width {
        return 1;
    }
    let continuation = continuation_width(screen_width, prefix_width);
    let remaining = text_width - screen_width;
    1 + remaining.div_ceil(continuation)
}

/// Wraps `text` into rows of at most `screen_width` characters. Continuation
/// rows are prefixed with `prefix_width` spaces so they line up under the
/// message column of a formatted log line.
pub fn wrap_with_indent(text: &str, screen_width: usize, prefix_width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if screen_width == 0 || chars.len() <= screen_width {
        return vec![text.to_string()];
    }

    let continuation = continuation_width(screen_width, prefix_width);
    let indent = " ".repeat(screen_width - continuation);

    let mut rows = vec![chars[..screen_width].iter().collect::<String>()];
    for chunk in chars[screen_width..].chunks(continuation) {
        let mut row = indent.clone();
        row.extend(chunk.iter());
        rows.push(row);
    }
    rows
}

fn continuation_width(screen_width: usize, prefix_width: usize) -> usize {
    if prefix_width < screen_width {
        screen_width - prefix_width
    } else {
        screen_width
    }
}

/// Keeps the tail of `s`, prefixing "..." when it has to cut.
pub fn truncate_left(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else {
        let keep = max_len.saturating_sub(3);
        let tail: String = s.chars().skip(len - keep).collect();
        format!("...{}", tail)
    }
}
