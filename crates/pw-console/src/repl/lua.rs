use mlua::{Function, Lua, MultiValue, Table, Value};

use super::capture::{CaptureScope, OutputCapture};
use super::execution::Evaluation;
use super::worker::Evaluator;

const CHUNK_NAME: &str = "=repl";
const MAX_TABLE_DEPTH: usize = 2;
const MAX_TABLE_ITEMS: usize = 32;

/// Evaluates REPL input in a persistent Lua 5.4 state.
///
/// Input is first compiled as an expression (`return <input>`), falling
/// back to a statement chunk, so both `1 + 1` and `x = 1` work. `print`,
/// `io.write` and `io.stderr:write` are redirected into the capture of the
/// evaluation in progress.
pub struct LuaEvaluator {
    lua: Lua,
}

impl LuaEvaluator {
    pub fn new() -> mlua::Result<Self> {
        Self::with_setup(|_| Ok(()))
    }

    /// Builds the Lua state and runs `setup` on it, e.g. to register globals
    /// the console exposes to user code.
    pub fn with_setup<F>(setup: F) -> mlua::Result<Self>
    where
        F: FnOnce(&Lua) -> mlua::Result<()>,
    {
        let lua = Lua::new();
        install_output_functions(&lua)?;
        setup(&lua)?;
        Ok(Self { lua })
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    fn run(&self, source: &str) -> mlua::Result<MultiValue> {
        let function = match self
            .lua
            .load(format!("return {}", source))
            .set_name(CHUNK_NAME)
            .into_function()
        {
            Ok(function) => function,
            Err(_) => self.lua.load(source).set_name(CHUNK_NAME).into_function()?,
        };
        function.call::<MultiValue>(())
    }
}

impl Evaluator for LuaEvaluator {
    fn evaluate(&mut self, source: &str) -> Evaluation {
        let capture = OutputCapture::new();
        let outcome = {
            let _scope = CaptureScope::install(&self.lua, capture.clone());
            self.run(source)
        };
        let (stdout, stderr) = capture.take();

        let result = match outcome {
            Ok(values) => format_values(&self.lua, &values),
            Err(err) => Some(err.to_string()),
        };
        Evaluation {
            stdout,
            stderr,
            result,
        }
    }
}

fn install_output_functions(lua: &Lua) -> mlua::Result<()> {
    let globals = lua.globals();

    let print = lua.create_function(|lua, args: MultiValue| {
        let parts = args
            .iter()
            .map(|value| tostring(lua, value))
            .collect::<mlua::Result<Vec<_>>>()?;
        write_stdout(lua, &format!("{}\n", parts.join("\t")));
        Ok(())
    })?;
    globals.set("print", print)?;

    let io: Table = globals.get("io")?;
    let write = lua.create_function(|lua, args: MultiValue| {
        for value in args.iter() {
            write_stdout(lua, &tostring(lua, value)?);
        }
        Ok(())
    })?;
    io.set("write", write)?;

    let stdout = output_handle(lua, write_stdout)?;
    let stderr = output_handle(lua, write_stderr)?;
    io.set("stdout", stdout.clone())?;
    io.set("stderr", stderr)?;

    // `io.output()` may be queried but never redirected to a real file.
    let output = lua.create_function(move |_, target: Option<Value>| match target {
        None => Ok(stdout.clone()),
        Some(_) => Err(mlua::Error::runtime(
            "io.output cannot be redirected in the console",
        )),
    })?;
    io.set("output", output)?;

    let os: Table = globals.get("os")?;
    let exit = lua.create_function(|_, _: MultiValue| -> mlua::Result<()> {
        Err(mlua::Error::runtime("os.exit is disabled in the console"))
    })?;
    os.set("exit", exit)?;

    Ok(())
}

/// A file-like table whose `write` method forwards to `sink` and returns the
/// handle, so calls chain like they do on real Lua files.
fn output_handle(lua: &Lua, sink: fn(&Lua, &str)) -> mlua::Result<Table> {
    let handle = lua.create_table()?;
    let write = lua.create_function(move |lua, (this, args): (Table, MultiValue)| {
        for value in args.iter() {
            sink(lua, &tostring(lua, value)?);
        }
        Ok(this)
    })?;
    handle.set("write", write)?;
    handle.set("flush", lua.create_function(|_, this: Table| Ok(this))?)?;
    Ok(handle)
}

fn write_stdout(lua: &Lua, text: &str) {
    match OutputCapture::current(lua) {
        Some(capture) => capture.write_stdout(text),
        None => tracing::debug!(target: "lua", "{}", text.trim_end()),
    }
}

fn write_stderr(lua: &Lua, text: &str) {
    match OutputCapture::current(lua) {
        Some(capture) => capture.write_stderr(text),
        None => tracing::warn!(target: "lua", "{}", text.trim_end()),
    }
}

fn tostring(lua: &Lua, value: &Value) -> mlua::Result<String> {
    let tostring: Function = lua.globals().get("tostring")?;
    tostring.call::<String>(value.clone())
}

/// Renders returned values; `None` when nothing but `nil` came back.
fn format_values(lua: &Lua, values: &MultiValue) -> Option<String> {
    if values.iter().all(|value| matches!(value, Value::Nil)) {
        return None;
    }
    let parts: Vec<String> = values
        .iter()
        .map(|value| format_value(lua, value, 0))
        .collect();
    Some(parts.join(", "))
}

fn format_value(lua: &Lua, value: &Value, depth: usize) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => format!("{:?}", s.to_string_lossy()),
        Value::Table(table) if depth < MAX_TABLE_DEPTH => format_table(lua, table, depth)
            .unwrap_or_else(|_| tostring(lua, value).unwrap_or_else(|_| "table".to_string())),
        other => tostring(lua, other).unwrap_or_else(|_| format!("{:?}", other)),
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}inf", sign)
    } else if n.abs() >= 1e16 {
        format!("{:e}", n)
    } else if n.fract() == 0.0 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

fn format_table(lua: &Lua, table: &Table, depth: usize) -> mlua::Result<String> {
    let len = table.raw_len();
    let mut entries = Vec::new();
    for pair in table.pairs::<Value, Value>() {
        entries.push(pair?);
    }

    let truncated = entries.len() > MAX_TABLE_ITEMS;
    let mut parts = if entries.len() == len {
        (1..=len.min(MAX_TABLE_ITEMS))
            .map(|i| {
                table
                    .raw_get::<Value>(i)
                    .map(|value| format_value(lua, &value, depth + 1))
            })
            .collect::<mlua::Result<Vec<_>>>()?
    } else {
        let mut parts: Vec<String> = entries
            .iter()
            .map(|(key, value)| {
                format!(
                    "{} = {}",
                    format_key(lua, key, depth),
                    format_value(lua, value, depth + 1)
                )
            })
            .collect();
        parts.sort();
        parts.truncate(MAX_TABLE_ITEMS);
        parts
    };

    if truncated {
        parts.push("...".to_string());
    }
    if parts.is_empty() {
        return Ok("{}".to_string());
    }
    Ok(format!("{{{}}}", parts.join(", ")))
}

fn format_key(lua: &Lua, key: &Value, depth: usize) -> String {
    if let Value::String(s) = key {
        let name = s.to_string_lossy();
        let is_identifier = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if is_identifier {
            return name;
        }
    }
    format!("[{}]", format_value(lua, key, depth + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(evaluator: &mut LuaEvaluator, source: &str) -> Evaluation {
        evaluator.evaluate(source)
    }

    #[test]
    fn expressions_return_formatted_values() {
        let mut lua = LuaEvaluator::new().unwrap();
        let cases = [
            ("1+1", Some("2")),
            ("1/2", Some("0.5")),
            ("2^2", Some("4.0")),
            ("'hi' .. ' there'", Some("\"hi there\"")),
            ("true, 3", Some("true, 3")),
            ("{1, 2, 3}", Some("{1, 2, 3}")),
            ("{b = 2, a = 1}", Some("{a = 1, b = 2}")),
            ("nil", None),
        ];
        for (source, expected) in cases {
            let evaluation = eval(&mut lua, source);
            assert_eq!(
                evaluation.result.as_deref(),
                expected,
                "Expected:\n{expected:?}\n\nGot:\n{evaluation:?}\n\nFor:\n{source}",
            );
            assert!(evaluation.stdout.is_empty());
            assert!(evaluation.stderr.is_empty());
        }
    }

    #[test]
    fn statements_persist_globals() {
        let mut lua = LuaEvaluator::new().unwrap();
        let assignment = eval(&mut lua, "x = 20");
        assert_eq!(assignment, Evaluation::default());
        assert_eq!(eval(&mut lua, "x * 2").result.as_deref(), Some("40"));
    }

    #[test]
    fn output_functions_are_captured_per_call() {
        let mut lua = LuaEvaluator::new().unwrap();
        let evaluation = eval(
            &mut lua,
            "print('a', 1) io.write('b', 2) io.stderr:write('oops\\n')",
        );
        assert_eq!(evaluation.stdout, "a\t1\nb2");
        assert_eq!(evaluation.stderr, "oops\n");
        assert_eq!(evaluation.result, None);

        let next = eval(&mut lua, "print('again')");
        assert_eq!(next.stdout, "again\n");
    }

    #[test]
    fn faults_become_result_text() {
        let mut lua = LuaEvaluator::new().unwrap();
        let evaluation = eval(&mut lua, "print('before') error('boom')");
        assert_eq!(evaluation.stdout, "before\n");
        let fault = evaluation.result.unwrap();
        assert!(fault.contains("boom"), "Got:\n{fault}");

        let syntax = eval(&mut lua, "for").result.unwrap();
        assert!(syntax.contains("syntax error"), "Got:\n{syntax}");

        // The state survives faults.
        assert_eq!(eval(&mut lua, "1+1").result.as_deref(), Some("2"));
    }

    #[test]
    fn exit_is_a_fault_not_a_process_exit() {
        let mut lua = LuaEvaluator::new().unwrap();
        let fault = eval(&mut lua, "os.exit(1)").result.unwrap();
        assert!(fault.contains("os.exit is disabled"), "Got:\n{fault}");
        assert_eq!(eval(&mut lua, "1+1").result.as_deref(), Some("2"));
    }

    #[test]
    fn stdout_handle_writes_into_capture() {
        let mut lua = LuaEvaluator::new().unwrap();
        let evaluation = eval(
            &mut lua,
            "io.stdout:write('x', 1):write('y') io.output():write('z') io.stdout:flush()",
        );
        assert_eq!(evaluation.stdout, "x1yz");
        assert_eq!(evaluation.result, None);

        let redirect = eval(&mut lua, "io.output('/tmp/out.txt')").result.unwrap();
        assert!(redirect.contains("cannot be redirected"), "Got:\n{redirect}");
    }

    #[test]
    fn setup_registers_globals() {
        let mut lua = LuaEvaluator::with_setup(|lua| lua.globals().set("answer", 42)).unwrap();
        assert_eq!(eval(&mut lua, "answer").result.as_deref(), Some("42"));
    }
}
