use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::collections::{BTreeMap, VecDeque};
use std::ops::Range;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};

use crate::redraw::RedrawSignal;
use crate::text::{format_bytes, strip_ansi};
use crate::LogRecord;

/// Number of log lines retained when no capacity is configured.
pub const DEFAULT_HISTORY_SIZE: usize = 1000;

/// Timestamp layout used for the line prefix, e.g. `20210418 12:32:23`.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d %H:%M:%S";

/// True when `format` holds only specifiers `chrono` can render.
pub fn is_valid_timestamp_format(format: &str) -> bool {
    StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

/// A single ingested log event together with its pre-rendered text.
#[derive(Debug, Clone)]
pub struct LogLine {
    record: LogRecord,
    formatted: String,
    prefix_width: usize,
}

impl LogLine {
    fn new(record: LogRecord, timestamp_format: &str) -> Self {
        let prefix = format!(
            "{} {:<5} ",
            record.timestamp.format(timestamp_format),
            record.level.to_string()
        );
        let prefix_width = prefix.chars().count();
        let formatted = format!("{}{}", prefix, strip_ansi(&record.message));
        Self {
            record,
            formatted,
            prefix_width,
        }
    }

    pub fn record(&self) -> &LogRecord {
        &self.record
    }

    pub fn time(&self) -> DateTime<Local> {
        self.record.timestamp
    }

    /// Plain text of the line, without any styling.
    pub fn formatted(&self) -> &str {
        &self.formatted
    }

    /// Width of the timestamp and level columns; wrapped rows are indented by this much.
    pub fn prefix_width(&self) -> usize {
        self.prefix_width
    }

    /// Rough in-memory footprint, used for the size shown in the toolbar.
    fn estimated_size(&self) -> usize {
        std::mem::size_of::<LogLine>()
            + self.formatted.len()
            + self.record.message.len()
            + self.record.channel.len()
    }
}

/// Cloneable capability handed to log producers.
///
/// Emitting never blocks: records are queued and picked up by the owning
/// [`LogContainer`] on its next [`LogContainer::drain_pending`] call. The
/// queue holds at most as many records as the container does; when it is
/// full the oldest queued record is dropped.
#[derive(Debug, Clone)]
pub struct LogHandler {
    sender: Sender<LogRecord>,
    overflow: Receiver<LogRecord>,
    redraw: RedrawSignal,
}

impl LogHandler {
    pub fn emit(&self, mut record: LogRecord) {
        loop {
            match self.sender.try_send(record) {
                Ok(()) => break,
                Err(TrySendError::Full(rejected)) => {
                    let _ = self.overflow.try_recv();
                    record = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
        self.redraw.request();
    }
}

/// Bounded buffer of log lines with a scroll cursor and follow mode.
#[derive(Debug)]
pub struct LogContainer {
    logs: VecDeque<LogLine>,
    capacity: usize,
    byte_size: usize,
    channel_counts: BTreeMap<String, usize>,
    cursor: usize,
    follow: bool,
    window_height: usize,
    view_start: usize,
    last_rendered: Range<usize>,
    timestamp_format: String,
    sender: Sender<LogRecord>,
    pending: Receiver<LogRecord>,
    redraw: RedrawSignal,
}

impl LogContainer {
    pub fn new(capacity: usize, redraw: RedrawSignal) -> Self {
        let capacity = capacity.max(1);
        let (sender, pending) = bounded(capacity);
        Self {
            logs: VecDeque::new(),
            capacity,
            byte_size: 0,
            channel_counts: BTreeMap::new(),
            cursor: 0,
            follow: true,
            window_height: 0,
            view_start: 0,
            last_rendered: 0..0,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            sender,
            pending,
            redraw,
        }
    }

    /// Sets the timestamp layout. An unrenderable format is ignored and the
    /// current one kept.
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        let format = format.into();
        if is_valid_timestamp_format(&format) {
            self.timestamp_format = format;
        } else {
            tracing::warn!("Ignoring invalid timestamp format {:?}", format);
        }
        self
    }

    /// Returns a handle producers use to feed records into this container.
    pub fn handler(&self) -> LogHandler {
        LogHandler {
            sender: self.sender.clone(),
            overflow: self.pending.clone(),
            redraw: self.redraw.clone(),
        }
    }

    /// Applies every record queued through a [`LogHandler`]. Returns how many were applied.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(record) = self.pending.try_recv() {
            self.append(record);
            applied += 1;
        }
        applied
    }

    pub fn append(&mut self, record: LogRecord) {
        *self
            .channel_counts
            .entry(record.channel.clone())
            .or_insert(0) += 1;

        let line = LogLine::new(record, &self.timestamp_format);
        self.byte_size += line.estimated_size();
        self.logs.push_back(line);

        if self.logs.len() > self.capacity {
            if let Some(evicted) = self.logs.pop_front() {
                self.byte_size = self.byte_size.saturating_sub(evicted.estimated_size());
            }
        }

        if self.follow {
            self.cursor = self.last_index();
        }

        self.redraw.request();
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn follow(&self) -> bool {
        self.follow
    }

    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    pub fn human_byte_size(&self) -> String {
        format_bytes(self.byte_size)
    }

    pub fn window_height(&self) -> usize {
        self.window_height
    }

    pub fn channel_counts(&self) -> &BTreeMap<String, usize> {
        &self.channel_counts
    }

    /// Channel counts as `name: count` pairs, e.g. `fake_device.1: 12, lua: 3`.
    pub fn channel_counts_summary(&self) -> String {
        self.channel_counts
            .iter()
            .map(|(name, count)| format!("{}: {}", name, count))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn lines(&self) -> impl Iterator<Item = &LogLine> {
        self.logs.iter()
    }

    /// Records the height of the log window from the current layout pass.
    pub fn set_window_height(&mut self, height: usize) {
        self.window_height = height;
    }

    pub fn scroll_up(&mut self) {
        self.scroll_up_by(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_down_by(1);
    }

    pub fn scroll_up_one_page(&mut self) {
        self.scroll_up_by(self.window_height.max(1));
    }

    pub fn scroll_down_one_page(&mut self) {
        self.scroll_down_by(self.window_height.max(1));
    }

    pub fn scroll_to_top(&mut self) {
        if self.is_empty() {
            return;
        }
        self.follow = false;
        self.cursor = 0;
        self.anchor_view();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.cursor = self.last_index();
        self.follow = true;
    }

    /// Moves the cursor to the line shown on `row` (0 = top of the log window)
    /// during the last render pass.
    pub fn scroll_to_position(&mut self, row: usize) {
        if self.is_empty() {
            return;
        }
        self.anchor_view();
        self.follow = false;
        self.cursor = (self.last_rendered.start + row).min(self.last_index());
        self.anchor_view();
    }

    pub fn toggle_follow(&mut self) {
        if self.follow {
            self.anchor_view();
            self.follow = false;
        } else {
            self.scroll_to_bottom();
        }
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
        self.channel_counts.clear();
        self.byte_size = 0;
        self.cursor = 0;
        self.view_start = 0;
        self.last_rendered = 0..0;
        self.redraw.request();
    }

    /// Index range of the lines that fit in the window around the cursor.
    pub fn visible_range(&self) -> Range<usize> {
        let len = self.logs.len();
        if len == 0 || self.window_height == 0 {
            return 0..0;
        }
        let height = self.window_height;
        let cursor = self.cursor.min(len - 1);

        let start = if self.follow {
            (cursor + 1).saturating_sub(height)
        } else {
            let start = self.view_start.min(cursor);
            if cursor >= start + height {
                cursor + 1 - height
            } else {
                start
            }
        };
        start..(start + height).min(len)
    }

    /// Lines to show in the current render pass. Remembers the range so
    /// mouse clicks can be mapped back to buffer indices.
    pub fn draw(&mut self) -> impl Iterator<Item = &LogLine> {
        let range = self.visible_range();
        self.last_rendered = range.clone();
        self.logs.range(range)
    }

    fn scroll_up_by(&mut self, lines: usize) {
        if self.is_empty() {
            return;
        }
        self.anchor_view();
        self.follow = false;
        self.cursor = self.cursor.min(self.last_index()).saturating_sub(lines);
        self.anchor_view();
    }

    fn scroll_down_by(&mut self, lines: usize) {
        if self.is_empty() {
            return;
        }
        let last = self.last_index();
        self.anchor_view();
        self.cursor = self.cursor.saturating_add(lines).min(last);
        if self.cursor == last {
            self.follow = true;
        } else {
            self.anchor_view();
        }
    }

    /// Pins the window start to what is currently on screen so that leaving
    /// follow mode does not make the view jump.
    fn anchor_view(&mut self) {
        if self.window_height > 0 {
            self.view_start = self.visible_range().start;
        }
    }

    fn last_index(&self) -> usize {
        self.logs.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    fn record(message: &str) -> LogRecord {
        LogRecord::new(Level::INFO, "test", message)
    }

    fn container(capacity: usize) -> LogContainer {
        LogContainer::new(capacity, RedrawSignal::new())
    }

    fn messages(container: &LogContainer) -> Vec<String> {
        container
            .lines()
            .map(|line| line.record().message.clone())
            .collect()
    }

    #[test]
    fn evicts_oldest_and_keeps_cursor_when_not_following() {
        let mut logs = container(3);
        for msg in ["A", "B", "C", "D"] {
            logs.append(record(msg));
        }
        assert_eq!(messages(&logs), vec!["B", "C", "D"]);
        assert_eq!(logs.cursor(), 2);

        logs.scroll_to_top();
        assert_eq!(logs.cursor(), 0);
        assert!(!logs.follow());

        logs.append(record("E"));
        assert_eq!(messages(&logs), vec!["C", "D", "E"]);
        assert_eq!(logs.cursor(), 0);
    }

    #[test]
    fn byte_size_tracks_evictions() {
        let mut logs = container(2);
        logs.append(record("first"));
        let one = logs.byte_size();
        assert!(one > 0);

        logs.append(record("second"));
        logs.append(record("third!"));
        assert_eq!(logs.len(), 2);
        assert!(logs.byte_size() < one * 3);

        logs.clear_logs();
        assert_eq!(logs.byte_size(), 0);
    }

    #[test]
    fn formatted_line_has_timestamp_level_and_plain_message() {
        let timestamp = Local::now();
        let mut logs = container(10);
        logs.append(
            LogRecord::new(Level::WARN, "dev", "\x1b[31mhot\x1b[0m").with_timestamp(timestamp),
        );
        let line = logs.lines().next().unwrap();
        let expected_prefix = format!("{} WARN  ", timestamp.format(DEFAULT_TIMESTAMP_FORMAT));
        assert_eq!(line.formatted(), format!("{}hot", expected_prefix));
        assert_eq!(line.prefix_width(), expected_prefix.len());
    }

    #[test]
    fn draw_is_empty_before_layout() {
        let mut logs = container(10);
        logs.append(record("a"));
        assert_eq!(logs.draw().count(), 0);
    }

    #[test]
    fn draw_ends_at_cursor_when_following() {
        let mut logs = container(100);
        for i in 0..20 {
            logs.append(record(&i.to_string()));
        }
        logs.set_window_height(5);
        let shown: Vec<_> = logs.draw().map(|l| l.record().message.clone()).collect();
        assert_eq!(shown, vec!["15", "16", "17", "18", "19"]);
        // Restartable: a second pass yields the same projection.
        assert_eq!(logs.draw().count(), 5);
    }

    #[test]
    fn leaving_follow_keeps_the_window_still() {
        let mut logs = container(100);
        for i in 0..20 {
            logs.append(record(&i.to_string()));
        }
        logs.set_window_height(5);
        assert_eq!(logs.visible_range(), 15..20);

        logs.scroll_up();
        assert_eq!(logs.cursor(), 18);
        assert_eq!(logs.visible_range(), 15..20);

        for _ in 0..4 {
            logs.scroll_up();
        }
        assert_eq!(logs.cursor(), 14);
        assert_eq!(logs.visible_range(), 14..19);
    }

    #[test]
    fn scroll_down_to_tail_resumes_following() {
        let mut logs = container(10);
        for i in 0..3 {
            logs.append(record(&i.to_string()));
        }
        logs.scroll_up();
        assert!(!logs.follow());
        logs.scroll_down();
        assert_eq!(logs.cursor(), 2);
        assert!(logs.follow());

        logs.append(record("3"));
        assert_eq!(logs.cursor(), 3);
    }

    #[test]
    fn page_scrolling_uses_window_height_and_clamps() {
        let mut logs = container(100);
        for i in 0..30 {
            logs.append(record(&i.to_string()));
        }
        logs.set_window_height(10);

        logs.scroll_up_one_page();
        assert_eq!(logs.cursor(), 19);
        logs.scroll_up_one_page();
        logs.scroll_up_one_page();
        assert_eq!(logs.cursor(), 0);
        logs.scroll_down_one_page();
        assert_eq!(logs.cursor(), 10);
        assert!(!logs.follow());
        logs.scroll_down_one_page();
        logs.scroll_down_one_page();
        assert_eq!(logs.cursor(), 29);
        assert!(logs.follow());
    }

    #[test]
    fn navigation_on_empty_buffer_is_a_no_op() {
        let mut logs = container(10);
        logs.scroll_up();
        logs.scroll_down();
        logs.scroll_up_one_page();
        logs.scroll_down_one_page();
        logs.scroll_to_top();
        logs.scroll_to_bottom();
        logs.scroll_to_position(4);
        logs.toggle_follow();
        logs.toggle_follow();
        assert_eq!(logs.cursor(), 0);
        assert_eq!(logs.draw().count(), 0);
    }

    #[test]
    fn click_maps_row_into_last_rendered_range() {
        let mut logs = container(100);
        for i in 0..20 {
            logs.append(record(&i.to_string()));
        }
        logs.set_window_height(5);
        let _ = logs.draw().count();

        logs.scroll_to_position(1);
        assert_eq!(logs.cursor(), 16);
        assert!(!logs.follow());

        logs.scroll_to_position(40);
        assert_eq!(logs.cursor(), 19);
    }

    #[test]
    fn toggle_follow_jumps_to_tail() {
        let mut logs = container(10);
        for i in 0..5 {
            logs.append(record(&i.to_string()));
        }
        logs.scroll_to_top();
        logs.toggle_follow();
        assert!(logs.follow());
        assert_eq!(logs.cursor(), 4);
        logs.toggle_follow();
        assert!(!logs.follow());
        logs.append(record("5"));
        assert_eq!(logs.cursor(), 4);
    }

    #[test]
    fn clear_resets_counts_and_view() {
        let mut logs = container(10);
        logs.append(LogRecord::new(Level::INFO, "a", "x"));
        logs.append(LogRecord::new(Level::INFO, "b", "y"));
        logs.append(LogRecord::new(Level::INFO, "a", "z"));
        assert_eq!(logs.channel_counts_summary(), "a: 2, b: 1");

        logs.set_window_height(5);
        logs.clear_logs();
        assert!(logs.channel_counts().is_empty());
        assert_eq!(logs.draw().count(), 0);
        assert_eq!(logs.cursor(), 0);
    }

    #[test]
    fn handler_records_arrive_on_drain() {
        let redraw = RedrawSignal::new();
        let mut logs = LogContainer::new(10, redraw.clone());
        let handler = logs.handler();

        let producers: Vec<_> = (0..4)
            .map(|n| {
                let handler = handler.clone();
                std::thread::spawn(move || {
                    for i in 0..5 {
                        handler.emit(LogRecord::new(Level::DEBUG, format!("p{}", n), i.to_string()));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        assert!(redraw.take());
        assert_eq!(logs.len(), 0);
        // The queue is bounded by the container capacity.
        assert_eq!(logs.drain_pending(), 10);
        assert_eq!(logs.len(), 10);
        assert_eq!(logs.channel_counts().values().sum::<usize>(), 10);
        assert_eq!(logs.cursor(), 9);
    }

    #[test]
    fn full_queue_drops_oldest_pending_record() {
        let mut logs = container(3);
        let handler = logs.handler();
        for i in 0..7 {
            handler.emit(record(&i.to_string()));
        }
        assert_eq!(logs.drain_pending(), 3);
        assert_eq!(messages(&logs), vec!["4", "5", "6"]);
    }

    #[test]
    fn invalid_timestamp_format_falls_back_to_default() {
        assert!(is_valid_timestamp_format(DEFAULT_TIMESTAMP_FORMAT));
        assert!(!is_valid_timestamp_format("%Q"));

        let timestamp = Local::now();
        let mut logs = container(10).with_timestamp_format("%Q");
        logs.append(record("still here").with_timestamp(timestamp));
        let line = logs.lines().next().unwrap();
        assert!(line
            .formatted()
            .starts_with(&timestamp.format(DEFAULT_TIMESTAMP_FORMAT).to_string()));
        assert!(line.formatted().ends_with("still here"));
    }
}
