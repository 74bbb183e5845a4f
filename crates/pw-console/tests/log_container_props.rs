#[cfg(test)]
pub mod tests {
    use proptest::prelude::*;
    use pw_console::{LogContainer, LogRecord, RedrawSignal};
    use tracing::Level;

    #[derive(Debug, Clone)]
    enum Op {
        Append,
        ScrollUp,
        ScrollDown,
        PageUp,
        PageDown,
        Top,
        Bottom,
        Draw,
        Click(usize),
        ToggleFollow,
        Clear,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => Just(Op::Append),
            1 => Just(Op::ScrollUp),
            1 => Just(Op::ScrollDown),
            1 => Just(Op::PageUp),
            1 => Just(Op::PageDown),
            1 => Just(Op::Top),
            1 => Just(Op::Bottom),
            1 => Just(Op::Draw),
            1 => (0usize..20).prop_map(Op::Click),
            1 => Just(Op::ToggleFollow),
            1 => Just(Op::Clear),
        ]
    }

    fn check_invariants(
        logs: &LogContainer,
        capacity: usize,
        appended: &[u64],
    ) -> Result<(), TestCaseError> {
        let len = logs.len();
        prop_assert!(len <= capacity, "len {} over capacity {}", len, capacity);

        let keep = appended.len().min(capacity);
        let expected: Vec<String> = appended[appended.len() - keep..]
            .iter()
            .map(u64::to_string)
            .collect();
        let retained: Vec<String> = logs
            .lines()
            .map(|line| line.record().message.clone())
            .collect();
        prop_assert_eq!(retained, expected);

        if len == 0 {
            prop_assert_eq!(logs.cursor(), 0);
        } else {
            prop_assert!(logs.cursor() < len, "cursor {} past len {}", logs.cursor(), len);
        }
        if logs.follow() && len > 0 {
            prop_assert_eq!(logs.cursor(), len - 1);
        }

        let range = logs.visible_range();
        prop_assert!(range.end <= len);
        prop_assert!(range.len() <= logs.window_height());
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn buffer_invariants_hold_for_any_operation_sequence(
            capacity in 1usize..12,
            window_height in 0usize..8,
            ops in prop::collection::vec(op(), 0..80),
        ) {
            let mut logs = LogContainer::new(capacity, RedrawSignal::new());
            logs.set_window_height(window_height);
            let mut appended: Vec<u64> = Vec::new();
            let mut next = 0u64;

            for op in ops {
                match op {
                    Op::Append => {
                        logs.append(LogRecord::new(Level::INFO, "prop", next.to_string()));
                        appended.push(next);
                        next += 1;
                        if logs.follow() {
                            prop_assert_eq!(logs.cursor(), logs.len() - 1);
                        }
                    }
                    Op::ScrollUp => logs.scroll_up(),
                    Op::ScrollDown => logs.scroll_down(),
                    Op::PageUp => logs.scroll_up_one_page(),
                    Op::PageDown => logs.scroll_down_one_page(),
                    Op::Top => logs.scroll_to_top(),
                    Op::Bottom => logs.scroll_to_bottom(),
                    Op::Draw => {
                        let drawn = logs.draw().count();
                        prop_assert!(drawn <= window_height);
                    }
                    Op::Click(row) => logs.scroll_to_position(row),
                    Op::ToggleFollow => logs.toggle_follow(),
                    Op::Clear => {
                        logs.clear_logs();
                        appended.clear();
                    }
                }
                check_invariants(&logs, capacity, &appended)?;
            }
        }

        #[test]
        fn cursor_stays_visible_after_navigation(
            count in 1usize..40,
            window_height in 1usize..10,
            ups in 0usize..50,
        ) {
            let mut logs = LogContainer::new(100, RedrawSignal::new());
            for i in 0..count {
                logs.append(LogRecord::new(Level::INFO, "prop", i.to_string()));
            }
            logs.set_window_height(window_height);
            for _ in 0..ups {
                logs.scroll_up();
            }
            let range = logs.visible_range();
            prop_assert!(range.contains(&logs.cursor()), "{:?} misses {}", range, logs.cursor());
        }
    }
}
