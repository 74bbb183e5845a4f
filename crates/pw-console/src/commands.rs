//! Key bindings and the commands they trigger.
//!
//! Keys are described independently of any terminal backend so bindings can
//! be listed, tested and printed without a terminal.

use prettytable::{Cell, Row, Table};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Tab,
    BackTab,
    Esc,
    F(u8),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(' ') => write!(f, "Space"),
            Key::Char(c) => write!(f, "{}", c),
            Key::F(n) => write!(f, "F{}", n),
            Key::BackTab => write!(f, "Shift-Tab"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A key plus modifiers. Shift is implied by the character for `Key::Char`
/// and by `Key::BackTab`, so it is only set for other keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyBinding {
    pub const fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
        }
    }

    pub const fn ctrl(key: Key) -> Self {
        Self {
            key,
            ctrl: true,
            shift: false,
        }
    }

    pub const fn shift(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: true,
        }
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl-")?;
        }
        if self.shift {
            write!(f, "Shift-")?;
        }
        match (self.ctrl, self.key) {
            (true, Key::Char(c)) => write!(f, "{}", c.to_ascii_uppercase()),
            (_, key) => write!(f, "{}", key),
        }
    }
}

/// Where a binding applies. The focused pane's scope is consulted before
/// `Global`; `Help` replaces the pane scope while the help window is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Global,
    Help,
    LogPane,
    ReplPane,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Global => "Global",
            Scope::Help => "Help",
            Scope::LogPane => "Log pane",
            Scope::ReplPane => "Lua REPL",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Quit,
    ToggleHelp,
    CloseHelp,
    ToggleSplit,
    ToggleWrap,
    FocusNext,
    FocusPrevious,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ScrollTop,
    ScrollBottom,
    ToggleFollow,
    ClearLogs,
    Submit,
    Interrupt,
    HistoryPrevious,
    HistoryNext,
}

impl Command {
    pub fn description(&self) -> &'static str {
        match self {
            Command::Quit => "Quit the console",
            Command::ToggleHelp => "Toggle the help window",
            Command::CloseHelp => "Close the help window",
            Command::ToggleSplit => "Switch between vertical and horizontal split",
            Command::ToggleWrap => "Toggle line wrapping",
            Command::FocusNext => "Focus the next pane",
            Command::FocusPrevious => "Focus the previous pane",
            Command::ScrollUp => "Move the selection up one line",
            Command::ScrollDown => "Move the selection down one line",
            Command::PageUp => "Move the selection up one page",
            Command::PageDown => "Move the selection down one page",
            Command::ScrollTop => "Jump to the first line",
            Command::ScrollBottom => "Jump to the last line and follow",
            Command::ToggleFollow => "Toggle following new lines",
            Command::ClearLogs => "Clear all log lines",
            Command::Submit => "Run the code in the input line",
            Command::Interrupt => "Clear the input or cancel the running code",
            Command::HistoryPrevious => "Previous input from history",
            Command::HistoryNext => "Next input from history",
        }
    }
}

/// One row of the help listing: every key bound to a command in a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDescription {
    pub scope: Scope,
    pub command: Command,
    pub keys: Vec<KeyBinding>,
}

impl BindingDescription {
    pub fn keys_label(&self) -> String {
        self.keys
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Maps `(Scope, KeyBinding)` to a [`Command`].
#[derive(Debug, Clone)]
pub struct CommandTable {
    bindings: Vec<(Scope, KeyBinding, Command)>,
}

impl CommandTable {
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Adds a binding, replacing any earlier one for the same scope and key.
    pub fn bind(&mut self, scope: Scope, binding: KeyBinding, command: Command) {
        self.bindings
            .retain(|(s, b, _)| !(*s == scope && *b == binding));
        self.bindings.push((scope, binding, command));
    }

    /// Looks in `scope` first, then in [`Scope::Global`].
    pub fn lookup(&self, scope: Scope, binding: KeyBinding) -> Option<Command> {
        self.find(scope, binding).or_else(|| {
            if scope == Scope::Global {
                None
            } else {
                self.find(Scope::Global, binding)
            }
        })
    }

    fn find(&self, scope: Scope, binding: KeyBinding) -> Option<Command> {
        self.bindings
            .iter()
            .find(|(s, b, _)| *s == scope && *b == binding)
            .map(|(_, _, command)| *command)
    }

    /// Bindings grouped per scope and command, in the order they were added.
    pub fn describe(&self) -> Vec<BindingDescription> {
        let mut rows: Vec<BindingDescription> = Vec::new();
        for (scope, binding, command) in &self.bindings {
            match rows
                .iter_mut()
                .find(|row| row.scope == *scope && row.command == *command)
            {
                Some(row) => row.keys.push(*binding),
                None => rows.push(BindingDescription {
                    scope: *scope,
                    command: *command,
                    keys: vec![*binding],
                }),
            }
        }
        rows.sort_by_key(|row| row.scope);
        rows
    }

    pub fn keybinds_table(&self) -> Table {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("Scope"),
            Cell::new("Keys"),
            Cell::new("Description"),
        ]));
        for row in self.describe() {
            table.add_row(Row::new(vec![
                Cell::new(&row.scope.to_string()),
                Cell::new(&row.keys_label()),
                Cell::new(row.command.description()),
            ]));
        }
        table
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        use Command::*;
        use Key::*;

        let mut table = Self::empty();
        let global = [
            (KeyBinding::plain(F(1)), ToggleHelp),
            (KeyBinding::plain(F(2)), ToggleSplit),
            (KeyBinding::ctrl(Char('w')), Quit),
            (KeyBinding::ctrl(Char('q')), Quit),
            (KeyBinding::ctrl(Char('e')), Quit),
            (KeyBinding::plain(BackTab), FocusNext),
            (KeyBinding::ctrl(Right), FocusNext),
            (KeyBinding::ctrl(Down), FocusNext),
            (KeyBinding::ctrl(Left), FocusPrevious),
            (KeyBinding::ctrl(Up), FocusPrevious),
        ];
        let help = [
            (KeyBinding::plain(Char('q')), CloseHelp),
            (KeyBinding::plain(Esc), CloseHelp),
        ];
        let log_pane = [
            (KeyBinding::plain(Up), ScrollUp),
            (KeyBinding::plain(Char('k')), ScrollUp),
            (KeyBinding::plain(Down), ScrollDown),
            (KeyBinding::plain(Char('j')), ScrollDown),
            (KeyBinding::plain(Key::PageUp), Command::PageUp),
            (KeyBinding::plain(Key::PageDown), Command::PageDown),
            (KeyBinding::plain(Home), ScrollTop),
            (KeyBinding::plain(Char('g')), ScrollTop),
            (KeyBinding::plain(End), ScrollBottom),
            (KeyBinding::plain(Char('G')), ScrollBottom),
            (KeyBinding::plain(Char('f')), ToggleFollow),
            (KeyBinding::plain(Char('c')), ClearLogs),
            (KeyBinding::plain(Char('w')), ToggleWrap),
        ];
        let repl_pane = [
            (KeyBinding::plain(Enter), Submit),
            (KeyBinding::ctrl(Char('c')), Interrupt),
            (KeyBinding::plain(Up), HistoryPrevious),
            (KeyBinding::plain(Down), HistoryNext),
        ];

        for (scope, bindings) in [
            (Scope::Global, &global[..]),
            (Scope::Help, &help[..]),
            (Scope::LogPane, &log_pane[..]),
            (Scope::ReplPane, &repl_pane[..]),
        ] {
            for (binding, command) in bindings {
                table.bind(scope, *binding, *command);
            }
        }
        table
    }
}
