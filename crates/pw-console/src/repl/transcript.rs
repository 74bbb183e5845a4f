use super::execution::UserCodeExecution;

pub const RUNNING_MARKER: &str = "Running...";

/// Renders the whole REPL history, numbering entries from 1.
///
/// This is recomputed from scratch on every change rather than patched, so
/// the text always reflects the current state of each entry.
pub fn render_transcript(entries: &[UserCodeExecution]) -> String {
    let blocks: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| render_entry(entry, Some(i + 1)))
        .collect();
    blocks.join("\n\n").trim().to_string()
}

/// Renders one entry. Without an index the prompts read `In []:` / `Out[]:`.
pub fn render_entry(entry: &UserCodeExecution, index: Option<usize>) -> String {
    let index = index.map(|i| i.to_string()).unwrap_or_default();
    let prompt_width = 7 + index.len();
    let mut lines = vec![format!(
        "In [{}]: {}",
        index,
        indent_continuation(&entry.input, prompt_width)
    )];

    if entry.is_running() {
        lines.push(RUNNING_MARKER.to_string());
    } else {
        for stream in [&entry.stdout, &entry.stderr] {
            let stream = stream.trim_end_matches('\n');
            if !stream.is_empty() {
                lines.push(stream.to_string());
            }
        }
        if let Some(output) = entry.output.as_deref().filter(|o| !o.is_empty()) {
            lines.push(format!(
                "Out[{}]: {}",
                index,
                indent_continuation(output, prompt_width)
            ));
        }
    }

    lines.join("\n")
}

fn indent_continuation(text: &str, width: usize) -> String {
    let padding = " ".repeat(width);
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("{}{}", padding, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repl::execution::Evaluation;

    fn finished(id: u64, input: &str, evaluation: Evaluation) -> UserCodeExecution {
        let mut entry = UserCodeExecution::new(id, input.to_string());
        entry.complete(evaluation);
        entry
    }

    #[test]
    fn renders_entries_in_order_with_fixed_sections() {
        let entries = vec![
            finished(
                1,
                "1+1",
                Evaluation {
                    result: Some("2".into()),
                    ..Default::default()
                },
            ),
            finished(
                2,
                "print('hi') io.stderr:write('warn\\n') return 3",
                Evaluation {
                    stdout: "hi\n".into(),
                    stderr: "warn\n".into(),
                    result: Some("3".into()),
                },
            ),
            UserCodeExecution::new(3, "slow()".into()),
        ];

        let expected = "\
In [1]: 1+1
Out[1]: 2

In [2]: print('hi') io.stderr:write('warn\\n') return 3
hi
warn
Out[2]: 3

In [3]: slow()
Running...";
        assert_eq!(render_transcript(&entries), expected);
    }

    #[test]
    fn multi_line_text_is_indented_under_the_prompt() {
        let entry = finished(
            1,
            "t = {\n1, 2}",
            Evaluation {
                result: Some("first\nsecond".into()),
                ..Default::default()
            },
        );
        assert_eq!(
            render_entry(&entry, Some(10)),
            "In [10]: t = {\n         1, 2}\nOut[10]: first\n         second"
        );
        assert!(render_entry(&entry, None).starts_with("In []: t = {\n       1, 2}"));
    }

    #[test]
    fn cancelled_entry_shows_marker_and_empty_history_is_blank() {
        let mut entry = UserCodeExecution::new(1, "while true do end".into());
        entry.cancel();
        assert_eq!(
            render_transcript(&[entry]),
            "In [1]: while true do end\nOut[1]: Canceled"
        );
        assert_eq!(render_transcript(&[]), "");
    }
}
