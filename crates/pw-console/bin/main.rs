use clap::Parser;
use cmd::console::ConsoleArgs;

mod cmd;

fn main() -> eyre::Result<()> {
    ConsoleArgs::parse().run()
}
