use anyhow::{Context, Result, bail};
use std::path::PathBuf;

use super::MetadataArgs;
use crate::config::Config;
use crate::daemon::Daemon;
use crate::ipc::{DaemonClient, DaemonResponse};
use crate::models::{Artwork, NowPlayingMetadata};
use crate::publisher::NowPlayingRecord;

pub struct App {
    pub config: Config,
    config_path: PathBuf,
}

impl App {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = config_path.unwrap_or_else(Config::config_path);
        let config = Config::load_from(&config_path)?;
        config.ensure_dirs()?;

        Ok(Self {
            config,
            config_path,
        })
    }

    fn client(&self) -> DaemonClient {
        DaemonClient::new(self.config.socket_path())
    }

    fn ensure_daemon(&self) -> Result<DaemonClient> {
        let client = self.client();
        if !client.is_daemon_running() {
            if self.config.daemon.auto_start {
                println!("Starting daemon...");
                Daemon::start_detached(&self.config, &self.config_path)?;
            } else {
                bail!("Daemon is not running. Start it with: nowplaying daemon start");
            }
        }
        Ok(client)
    }

    // Command implementations

    pub fn publish(&self, args: &MetadataArgs) -> Result<()> {
        let metadata = args.to_metadata()?;
        let client = self.ensure_daemon()?;

        match client.publish(metadata.clone())? {
            DaemonResponse::Ok => {
                println!("Now playing: {}", describe(&metadata));
            }
            DaemonResponse::Error(e) => bail!("{e}"),
            _ => {}
        }

        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let client = self.ensure_daemon()?;
        match client.clear()? {
            DaemonResponse::Error(e) => bail!("{e}"),
            _ => println!("Now playing cleared"),
        }
        Ok(())
    }

    pub fn inspect(&self, args: &MetadataArgs) -> Result<()> {
        let metadata = args.to_metadata()?;
        let record = NowPlayingRecord::from_metadata(&metadata);

        for (key, value) in record.iter() {
            println!("{key}: {value}");
        }

        Ok(())
    }

    pub fn status(&self) -> Result<()> {
        let client = self.client();

        if !client.is_daemon_running() {
            println!("Daemon is not running.");
            return Ok(());
        }

        let status = client.get_status()?;
        println!("Daemon running (pid {})", status.pid);
        println!("Backend: {}", status.backend);
        println!("Updates published: {}", status.publishes);

        Ok(())
    }

    pub fn daemon_start(&self) -> Result<()> {
        if Daemon::is_running(&self.config) {
            println!("Daemon is already running.");
            return Ok(());
        }

        Daemon::start_detached(&self.config, &self.config_path)?;
        println!("Daemon started.");

        Ok(())
    }

    pub fn daemon_stop(&self) -> Result<()> {
        if !Daemon::is_running(&self.config) {
            println!("Daemon is not running.");
            return Ok(());
        }

        Daemon::stop(&self.config)?;
        println!("Daemon stopped.");

        Ok(())
    }

    pub fn daemon_status(&self) -> Result<()> {
        if Daemon::is_running(&self.config) {
            println!("Daemon is running.");
        } else {
            println!("Daemon is not running.");
        }

        Ok(())
    }

    pub fn daemon_run(&self) -> Result<()> {
        let daemon = Daemon::new(self.config.clone())?;
        daemon.run()
    }
}

impl MetadataArgs {
    pub fn to_metadata(&self) -> Result<NowPlayingMetadata> {
        let playback_duration = match &self.duration {
            Some(duration) => parse_time(duration)?,
            None => 0.0,
        };

        let artwork = match &self.artwork {
            Some(path) => Some(
                Artwork::from_path(path)
                    .with_context(|| format!("Failed to load artwork: {}", path.display()))?,
            ),
            None => None,
        };

        Ok(NowPlayingMetadata {
            album_title: self.album.clone(),
            album_track_count: self.track_count,
            album_track_number: self.track,
            artist: self.artist.clone(),
            artwork,
            composer: self.composer.clone(),
            disc_count: self.disc_count,
            disc_number: self.disc,
            genre: self.genre.clone(),
            media_type: self.media_type.clone(),
            persistent_id: self.persistent_id.clone(),
            playback_duration,
            title: self.title.clone(),
        })
    }
}

fn parse_time(s: &str) -> Result<f64> {
    if s.contains(':') {
        let parts: Vec<&str> = s.split(':').collect();
        let (hours, mins, secs) = match parts.as_slice() {
            [m, s] => ("0", *m, *s),
            [h, m, s] => (*h, *m, *s),
            _ => bail!("Invalid time format. Use seconds, MM:SS or HH:MM:SS"),
        };
        let hours: u64 = hours.parse().context("Invalid hours")?;
        let mins: u64 = mins.parse().context("Invalid minutes")?;
        let secs: f64 = secs.parse().context("Invalid seconds")?;
        let whole = hours
            .checked_mul(3600)
            .zip(mins.checked_mul(60))
            .and_then(|(h, m)| h.checked_add(m))
            .context("Time out of range")?;
        return Ok(whole as f64 + secs);
    }

    s.parse()
        .context("Invalid time format. Use seconds, MM:SS or HH:MM:SS")
}

fn format_duration(seconds: f64) -> String {
    let total = seconds.round() as u64;
    let mins = total / 60;
    let secs = total % 60;
    format!("{mins}:{secs:02}")
}

fn describe(metadata: &NowPlayingMetadata) -> String {
    let mut line = metadata.display_name().to_string();
    if let Some(artist) = &metadata.artist {
        line.push_str(&format!(" - {artist}"));
    }
    if metadata.playback_duration > 0.0 {
        line.push_str(&format!(" ({})", format_duration(metadata.playback_duration)));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("180").unwrap(), 180.0);
        assert_eq!(parse_time("245.5").unwrap(), 245.5);
        assert_eq!(parse_time("3:05").unwrap(), 185.0);
        assert_eq!(parse_time("1:02:03").unwrap(), 3723.0);
        assert!(parse_time("1:2:3:4").is_err());
        assert!(parse_time("abc").is_err());
        assert!(parse_time("18446744073709551615:00:00").is_err());
        assert!(parse_time("0:18446744073709551615:00").is_err());
    }

    #[test]
    fn test_args_to_metadata() {
        let args = MetadataArgs {
            title: Some("Song A".to_string()),
            artist: Some("Artist X".to_string()),
            duration: Some("3:00".to_string()),
            track: 4,
            ..MetadataArgs::default()
        };

        let metadata = args.to_metadata().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Song A"));
        assert_eq!(metadata.playback_duration, 180.0);
        assert_eq!(metadata.album_track_number, 4);
        assert_eq!(metadata.disc_count, 0);
        assert!(metadata.album_title.is_none());
        assert_eq!(describe(&metadata), "Song A - Artist X (3:00)");
    }

    #[test]
    fn test_missing_artwork_file_is_an_error() {
        let args = MetadataArgs {
            artwork: Some(PathBuf::from("/nonexistent/cover.png")),
            ..MetadataArgs::default()
        };
        assert!(args.to_metadata().is_err());
    }
}
