use eyre::{Result, WrapErr};
use std::time::Duration;

use crate::cmd::console::widgets::formatters::fake_device_line;

const FAKE_DEVICE_CHANNEL: &str = "fake_device.1";
const INTERVAL: Duration = Duration::from_secs(2);

/// Starts a detached thread that logs an animated line every two seconds,
/// for trying the console without a device.
pub(crate) fn spawn_fake_device() -> Result<()> {
    std::thread::Builder::new()
        .name("fake-device".into())
        .spawn(|| {
            let mut count: u64 = 0;
            loop {
                std::thread::sleep(INTERVAL);
                tracing::info!(target: FAKE_DEVICE_CHANNEL, "{}", fake_device_line(count));
                count += 1;
            }
        })
        .wrap_err("Failed to spawn fake device thread")?;
    Ok(())
}
