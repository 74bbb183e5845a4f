use std::sync::Arc;

use mlua::Lua;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Streams {
    stdout: String,
    stderr: String,
}

/// Destination for everything user code writes while one evaluation runs.
#[derive(Debug, Clone, Default)]
pub struct OutputCapture {
    streams: Arc<Mutex<Streams>>,
}

impl OutputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_stdout(&self, text: &str) {
        self.streams.lock().stdout.push_str(text);
    }

    pub fn write_stderr(&self, text: &str) {
        self.streams.lock().stderr.push_str(text);
    }

    /// Returns `(stdout, stderr)` and leaves both buffers empty.
    pub fn take(&self) -> (String, String) {
        let mut streams = self.streams.lock();
        (
            std::mem::take(&mut streams.stdout),
            std::mem::take(&mut streams.stderr),
        )
    }

    /// The capture installed on `lua` by the innermost live [`CaptureScope`].
    pub fn current(lua: &Lua) -> Option<OutputCapture> {
        lua.app_data_ref::<OutputCapture>().map(|capture| capture.clone())
    }
}

/// Routes the Lua output functions into `capture` for as long as the scope
/// lives. Dropping the scope restores whatever was installed before, on
/// every exit path including faults and unwinding.
pub struct CaptureScope<'lua> {
    lua: &'lua Lua,
    previous: Option<OutputCapture>,
}

impl<'lua> CaptureScope<'lua> {
    pub fn install(lua: &'lua Lua, capture: OutputCapture) -> Self {
        let previous = lua.set_app_data(capture);
        Self { lua, previous }
    }
}

impl Drop for CaptureScope<'_> {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(previous) => {
                self.lua.set_app_data(previous);
            }
            None => {
                self.lua.remove_app_data::<OutputCapture>();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_nest_and_restore() {
        let lua = Lua::new();
        assert!(OutputCapture::current(&lua).is_none());

        let outer = OutputCapture::new();
        {
            let _outer_scope = CaptureScope::install(&lua, outer.clone());
            let inner = OutputCapture::new();
            {
                let _inner_scope = CaptureScope::install(&lua, inner.clone());
                OutputCapture::current(&lua).unwrap().write_stdout("inner");
            }
            OutputCapture::current(&lua).unwrap().write_stderr("outer");
            assert_eq!(inner.take(), ("inner".to_string(), String::new()));
        }

        assert!(OutputCapture::current(&lua).is_none());
        assert_eq!(outer.take(), (String::new(), "outer".to_string()));
        assert_eq!(outer.take(), (String::new(), String::new()));
    }
}
