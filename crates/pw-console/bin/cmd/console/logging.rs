use eyre::{eyre, Result, WrapErr};
use pw_console::{LogHandler, LogPaneLayer};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber: records at `level` and above go to the
/// log pane (when `pane` is given) and to `logfile` (when given).
pub(crate) fn init_tracing(
    level: Level,
    logfile: Option<&Path>,
    pane: Option<LogHandler>,
) -> Result<()> {
    let file_layer = match logfile {
        Some(path) => {
            let file = File::create(path)
                .wrap_err_with(|| format!("Failed to create log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(pane.map(LogPaneLayer::new))
        .with(file_layer)
        .with(LevelFilter::from_level(level))
        .try_init()
        .map_err(|e| eyre!("Failed to install log subscriber: {}", e))
}
