use std::sync::{Arc, Mutex};

use super::{InfoCenter, NowPlayingRecord, PlatformError};

#[derive(Debug, Default)]
struct Recorded {
    current: Option<NowPlayingRecord<'static>>,
    publishes: usize,
}

/// In-memory stand-in for the system info center.
///
/// Clones share the same slot, so a test can hand one clone to the
/// publisher and read back through another.
#[derive(Debug, Clone, Default)]
pub struct RecordingInfoCenter {
    state: Arc<Mutex<Recorded>>,
    unavailable: bool,
}

impl RecordingInfoCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A center whose every call fails as if the service were down.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<NowPlayingRecord<'static>> {
        self.state.lock().unwrap().current.clone()
    }

    pub fn publish_count(&self) -> usize {
        self.state.lock().unwrap().publishes
    }
}

impl InfoCenter for RecordingInfoCenter {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn set_metadata(&self, record: &NowPlayingRecord<'_>) -> Result<(), PlatformError> {
        if self.unavailable {
            return Err(PlatformError::Unavailable("recorder offline".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        state.current = Some(record.clone().into_owned());
        state.publishes += 1;
        Ok(())
    }
}
