use clap::Parser;
use colored::Colorize;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use eyre::{eyre, Result, WrapErr};
use pw_console::repl::InputHistory;
use pw_console::{
    Command, CommandTable, ConsoleConfig, Interrupt, Key, KeyBinding, LogContainer, LuaEvaluator,
    RedrawSignal, ReplPane, Scope,
};
use ratatui::{DefaultTerminal, Frame};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

use super::fake_device::spawn_fake_device;
use super::logging::init_tracing;
use super::lua_log::install_log_module;
use super::state::{Focus, PaneAreas};
use super::views::main_view::{render_main_view, ViewOptions};

const TICK: Duration = Duration::from_millis(50);

#[derive(Debug, Parser)]
#[command(
    name = "pw-console",
    version,
    about = "Live log viewer with an embedded Lua REPL"
)]
pub struct ConsoleArgs {
    /// Lowest level of log records to show
    #[arg(long, default_value = "debug")]
    pub loglevel: Level,

    /// Also write log records to this file
    #[arg(long)]
    pub logfile: Option<PathBuf>,

    /// Settings file, defaults to $PW_ROOT/.pw_console.toml
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Log fake device messages every 2 seconds
    #[arg(long)]
    pub test_mode: bool,

    /// Print the default key bindings and exit
    #[arg(long)]
    pub show_default_keybinds: bool,

    /// Evaluate CODE without the UI, print the results and exit. Repeatable
    #[arg(long = "exec", value_name = "CODE")]
    pub exec: Vec<String>,
}

pub(crate) struct App {
    logs: LogContainer,
    repl: ReplPane,
    commands: CommandTable,
    redraw: RedrawSignal,
    focus: Focus,
    show_help: bool,
    vertical_split: bool,
    wrap_lines: bool,
    areas: PaneAreas,
    exit: bool,
}

impl ConsoleArgs {
    pub fn run(&self) -> Result<()> {
        if self.show_default_keybinds {
            print_default_keybinds();
            return Ok(());
        }

        let config_path = self
            .config_file
            .clone()
            .unwrap_or_else(ConsoleConfig::default_path);
        let config = ConsoleConfig::load(&config_path)?;

        if !self.exec.is_empty() {
            return self.run_headless();
        }

        let redraw = RedrawSignal::new();
        let logs = LogContainer::new(config.log_history_size, redraw.clone())
            .with_timestamp_format(config.timestamp_format.as_str());
        init_tracing(self.loglevel, self.logfile.as_deref(), Some(logs.handler()))?;

        let mut repl = ReplPane::with_evaluator(new_lua_evaluator, redraw.clone())?;
        if let Some(path) = &config.history_file {
            repl.set_input_history(InputHistory::load(path));
        }

        if self.test_mode {
            spawn_fake_device()?;
        }

        let mut app = App {
            logs,
            repl,
            commands: CommandTable::default(),
            redraw,
            focus: Focus::ReplPane,
            show_help: false,
            vertical_split: config.vertical_split,
            wrap_lines: config.wrap_lines,
            areas: PaneAreas::default(),
            exit: false,
        };

        tracing::info!(target: "pw_console", "Console started");

        let mut terminal = ratatui::init();
        execute!(io::stdout(), EnableMouseCapture).wrap_err("Failed to enable mouse capture")?;
        let app_result = app.run(&mut terminal);
        let _ = execute!(io::stdout(), DisableMouseCapture);
        ratatui::restore();
        app_result.map_err(|e| eyre!("TUI error: {}", e))
    }

    /// Evaluates every `--exec` snippet in order and prints the transcript.
    fn run_headless(&self) -> Result<()> {
        init_tracing(self.loglevel, self.logfile.as_deref(), None)?;
        let mut repl = ReplPane::with_evaluator(new_lua_evaluator, RedrawSignal::new())?;

        for code in &self.exec {
            if !repl.submit(code) {
                continue;
            }
            while repl.is_busy() {
                repl.poll_blocking(TICK);
            }
        }

        println!("{}", repl.transcript());
        Ok(())
    }
}

fn new_lua_evaluator() -> Result<LuaEvaluator> {
    LuaEvaluator::with_setup(install_log_module)
        .map_err(|e| eyre!("Failed to create Lua state: {}", e))
}

fn print_default_keybinds() {
    println!("{}", "Default key bindings".bold());
    CommandTable::default().keybinds_table().printstd();
}

impl App {
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        self.redraw.request();

        while !self.exit {
            self.logs.drain_pending();
            self.repl.poll();

            if self.redraw.take() {
                terminal.draw(|frame| self.draw(frame))?;
            }

            self.handle_events()?;
        }
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let options = ViewOptions {
            focus: self.focus,
            vertical_split: self.vertical_split,
            wrap_lines: self.wrap_lines,
            show_help: self.show_help,
        };
        self.areas = render_main_view(
            frame,
            &mut self.logs,
            &self.repl,
            &self.commands,
            options,
        );
    }

    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    self.handle_key_event(key_event);
                }
                Event::Mouse(mouse_event) => self.handle_mouse_event(mouse_event),
                Event::Resize(_, _) => self.redraw.request(),
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        let Some(binding) = key_binding(&key_event) else {
            return;
        };
        let scope = if self.show_help {
            Scope::Help
        } else {
            self.focus.scope()
        };

        match self.commands.lookup(scope, binding) {
            Some(command) => self.execute(command),
            None if !self.show_help && self.focus == Focus::ReplPane => {
                self.edit_input(binding)
            }
            None => {}
        }
        self.redraw.request();
    }

    fn handle_mouse_event(&mut self, mouse_event: MouseEvent) {
        let MouseEvent {
            kind, column, row, ..
        } = mouse_event;
        let Some(pane) = self.areas.pane_at(column, row) else {
            return;
        };

        match kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.focus = pane;
                if let Some(offset) = self.areas.log_line_at(column, row) {
                    self.logs.scroll_to_position(offset);
                }
            }
            MouseEventKind::ScrollUp if pane == Focus::LogPane => self.logs.scroll_up(),
            MouseEventKind::ScrollDown if pane == Focus::LogPane => self.logs.scroll_down(),
            _ => return,
        }
        self.redraw.request();
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Quit => self.exit = true,
            Command::ToggleHelp => self.show_help = !self.show_help,
            Command::CloseHelp => self.show_help = false,
            Command::ToggleSplit => self.vertical_split = !self.vertical_split,
            Command::ToggleWrap => self.wrap_lines = !self.wrap_lines,
            Command::FocusNext => self.focus = self.focus.next(),
            Command::FocusPrevious => self.focus = self.focus.previous(),
            Command::ScrollUp => self.logs.scroll_up(),
            Command::ScrollDown => self.logs.scroll_down(),
            Command::PageUp => self.logs.scroll_up_one_page(),
            Command::PageDown => self.logs.scroll_down_one_page(),
            Command::ScrollTop => self.logs.scroll_to_top(),
            Command::ScrollBottom => self.logs.scroll_to_bottom(),
            Command::ToggleFollow => self.logs.toggle_follow(),
            Command::ClearLogs => self.logs.clear_logs(),
            Command::Submit => {
                self.repl.submit_input();
            }
            Command::Interrupt => {
                if let Interrupt::Cancelled(id) = self.repl.interrupt() {
                    tracing::debug!("cancelled submission {}", id);
                }
            }
            Command::HistoryPrevious => self.repl.input_mut().history_previous(),
            Command::HistoryNext => self.repl.input_mut().history_next(),
        }
    }

    fn edit_input(&mut self, binding: KeyBinding) {
        if binding.ctrl {
            return;
        }
        let input = self.repl.input_mut();
        match binding.key {
            Key::Char(c) => input.insert(c),
            Key::Backspace => input.backspace(),
            Key::Delete => input.delete(),
            Key::Left => input.move_left(),
            Key::Right => input.move_right(),
            Key::Home => input.move_home(),
            Key::End => input.move_end(),
            _ => {}
        }
    }
}

fn key_binding(event: &KeyEvent) -> Option<KeyBinding> {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Esc => Key::Esc,
        KeyCode::F(n) => Key::F(n),
        _ => return None,
    };
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    let shift = event.modifiers.contains(KeyModifiers::SHIFT)
        && !matches!(key, Key::Char(_) | Key::BackTab);
    Some(KeyBinding { key, ctrl, shift })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_is_folded_into_chars_and_backtab() {
        let upper_g = KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT);
        assert_eq!(
            key_binding(&upper_g),
            Some(KeyBinding::plain(Key::Char('G')))
        );

        let back_tab = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(key_binding(&back_tab), Some(KeyBinding::plain(Key::BackTab)));

        let ctrl_w = KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL);
        assert_eq!(
            CommandTable::default().lookup(Scope::ReplPane, key_binding(&ctrl_w).unwrap()),
            Some(Command::Quit)
        );

        let shift_up = KeyEvent::new(KeyCode::Up, KeyModifiers::SHIFT);
        assert_eq!(key_binding(&shift_up), Some(KeyBinding::shift(Key::Up)));
        assert_eq!(key_binding(&KeyEvent::from(KeyCode::Null)), None);
    }
}
