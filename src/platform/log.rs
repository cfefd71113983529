use tracing::info;

use crate::publisher::{InfoCenter, NowPlayingRecord, PlatformError};

/// Headless backend that writes each published record to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogInfoCenter;

impl InfoCenter for LogInfoCenter {
    fn name(&self) -> &'static str {
        "log"
    }

    fn set_metadata(&self, record: &NowPlayingRecord<'_>) -> Result<(), PlatformError> {
        info!("Now playing updated ({} entries)", record.len());
        for (key, value) in record.iter() {
            info!("  {key}: {value}");
        }
        Ok(())
    }
}
