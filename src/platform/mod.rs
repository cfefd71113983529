use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::{Backend, Config};
use crate::publisher::{InfoCenter, PlatformError};

mod log;
pub use log::LogInfoCenter;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;

/// Pick the info center named by the config.
pub fn info_center(config: &Config) -> Result<Box<dyn InfoCenter>> {
    let center: Box<dyn InfoCenter> = match config.publisher.backend {
        Backend::Log => Box::new(LogInfoCenter),
        Backend::System => {
            system_center(config).with_context(|| "System now playing backend unavailable")?
        }
        Backend::Auto => match system_center(config) {
            Ok(center) => center,
            Err(e) => {
                warn!("System now playing backend unavailable, logging instead: {e}");
                Box::new(LogInfoCenter)
            }
        },
    };

    info!("Using {} now playing backend", center.name());
    Ok(center)
}

#[cfg(target_os = "macos")]
fn system_center(_config: &Config) -> Result<Box<dyn InfoCenter>, PlatformError> {
    Ok(Box::new(macos::SystemInfoCenter::new()))
}

#[cfg(target_os = "linux")]
fn system_center(config: &Config) -> Result<Box<dyn InfoCenter>, PlatformError> {
    let center = linux::MprisInfoCenter::spawn(&config.publisher.identity, config.artwork_dir())?;
    Ok(Box::new(center))
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn system_center(_config: &Config) -> Result<Box<dyn InfoCenter>, PlatformError> {
    Err(PlatformError::Unavailable(
        "no now playing service on this platform".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PublisherConfig;

    #[test]
    fn test_log_backend_selected() {
        let config = Config {
            publisher: PublisherConfig {
                backend: Backend::Log,
                ..PublisherConfig::default()
            },
            ..Config::default()
        };

        let center = info_center(&config).unwrap();
        assert_eq!(center.name(), "log");
    }
}
