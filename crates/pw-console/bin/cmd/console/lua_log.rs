use mlua::{Lua, MultiValue};
use tracing::Level;

/// Registers the `log` table so user code can write to the log pane with
/// `log.info("...")` and friends. Records use the `lua` channel.
pub(crate) fn install_log_module(lua: &Lua) -> mlua::Result<()> {
    let log = lua.create_table()?;
    for (name, level) in [
        ("debug", Level::DEBUG),
        ("info", Level::INFO),
        ("warn", Level::WARN),
        ("error", Level::ERROR),
    ] {
        let function = lua.create_function(move |lua, args: MultiValue| {
            let tostring: mlua::Function = lua.globals().get("tostring")?;
            let parts = args
                .into_iter()
                .map(|value| tostring.call::<String>(value))
                .collect::<mlua::Result<Vec<_>>>()?;
            let message = parts.join(" ");
            match level {
                Level::DEBUG => tracing::debug!(target: "lua", "{}", message),
                Level::INFO => tracing::info!(target: "lua", "{}", message),
                Level::WARN => tracing::warn!(target: "lua", "{}", message),
                _ => tracing::error!(target: "lua", "{}", message),
            }
            Ok(())
        })?;
        log.set(name, function)?;
    }
    lua.globals().set("log", log)
}
