#[cfg(test)]
pub mod tests {
    use pw_console::{LogContainer, LogPaneLayer, RedrawSignal};
    use tracing_subscriber::layer::SubscriberExt;

    fn messages(logs: &LogContainer) -> Vec<String> {
        logs.lines()
            .map(|line| line.record().message.clone())
            .collect()
    }

    #[test]
    fn test_tracing_events_land_in_bounded_buffer() {
        let redraw = RedrawSignal::new();
        let mut logs = LogContainer::new(5, redraw.clone());
        let subscriber = tracing_subscriber::registry().with(LogPaneLayer::new(logs.handler()));

        tracing::subscriber::with_default(subscriber, || {
            for i in 0..8 {
                tracing::info!(target: "fake_device.1", "Log message # {}", i);
            }
            tracing::warn!(target: "lua", attempt = 2, "retrying");
        });

        assert!(redraw.take());
        // Pending records are capped at the capacity, keeping the newest.
        assert_eq!(logs.drain_pending(), 5);
        assert_eq!(logs.len(), 5);
        assert_eq!(
            messages(&logs),
            [
                "Log message # 4",
                "Log message # 5",
                "Log message # 6",
                "Log message # 7",
                "retrying attempt=2",
            ]
        );
        assert_eq!(logs.channel_counts_summary(), "fake_device.1: 4, lua: 1");
        assert_eq!(logs.cursor(), 4);
        assert!(logs.follow());
    }

    #[test]
    fn test_scrolled_view_survives_new_lines() {
        let mut logs = LogContainer::new(1000, RedrawSignal::new());
        let handler = logs.handler();
        for i in 0..50 {
            handler.emit(pw_console::LogRecord::new(
                tracing::Level::INFO,
                "dev",
                format!("line {}", i),
            ));
        }
        logs.drain_pending();
        logs.set_window_height(10);
        logs.scroll_up_one_page();
        let before = logs.visible_range();

        for i in 50..60 {
            handler.emit(pw_console::LogRecord::new(
                tracing::Level::INFO,
                "dev",
                format!("line {}", i),
            ));
        }
        logs.drain_pending();

        assert_eq!(logs.cursor(), 39);
        assert_eq!(logs.visible_range(), before);
        let shown: Vec<String> = logs
            .draw()
            .map(|line| line.record().message.clone())
            .collect();
        assert_eq!(shown.first().map(String::as_str), Some("line 39"));
        assert_eq!(shown.len(), 10);
    }
}
