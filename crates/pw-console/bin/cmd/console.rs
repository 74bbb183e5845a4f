pub(crate) mod app;
pub(crate) mod fake_device;
pub(crate) mod logging;
pub(crate) mod lua_log;
pub(crate) mod state;
pub(crate) mod views;
pub(crate) mod widgets;

pub use app::ConsoleArgs;
