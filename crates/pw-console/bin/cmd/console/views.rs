pub(crate) mod bars;
pub(crate) mod help;
pub(crate) mod logs;
pub(crate) mod main_view;
pub(crate) mod repl;
