use mpris_server::{Metadata, Player, Time, TrackId};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::thread;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use url::Url;

use crate::models::Artwork;
use crate::publisher::{InfoCenter, MetadataKey, MetadataValue, NowPlayingRecord, PlatformError};

const TRACK_ID_PREFIX: &str = "/org/nowplaying/track/";

/// MPRIS player registered on the session bus.
///
/// The player is not `Send`, so it lives on its own thread and receives
/// metadata over a channel.
pub struct MprisInfoCenter {
    tx: UnboundedSender<Metadata>,
    artwork_dir: PathBuf,
}

impl MprisInfoCenter {
    pub fn spawn(identity: &str, artwork_dir: PathBuf) -> Result<Self, PlatformError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = std_mpsc::channel();
        let identity = identity.to_string();

        thread::Builder::new()
            .name("mpris".to_string())
            .spawn(move || run_player_thread(identity, rx, ready_tx))
            .map_err(|e| PlatformError::Unavailable(format!("failed to spawn MPRIS thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { tx, artwork_dir }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PlatformError::Unavailable(
                "MPRIS thread exited during startup".to_string(),
            )),
        }
    }
}

impl InfoCenter for MprisInfoCenter {
    fn name(&self) -> &'static str {
        "mpris"
    }

    fn set_metadata(&self, record: &NowPlayingRecord<'_>) -> Result<(), PlatformError> {
        let metadata = to_mpris(record, &self.artwork_dir);
        self.tx
            .send(metadata)
            .map_err(|_| PlatformError::Unavailable("MPRIS player thread stopped".to_string()))
    }
}

fn run_player_thread(
    identity: String,
    mut rx: UnboundedReceiver<Metadata>,
    ready: std_mpsc::Sender<Result<(), PlatformError>>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            let _ = ready.send(Err(PlatformError::Unavailable(format!(
                "failed to start MPRIS runtime: {e}"
            ))));
            return;
        }
    };

    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, async move {
        let player = match Player::builder(identity.as_str())
            .identity(identity.as_str())
            .build()
            .await
        {
            Ok(player) => player,
            Err(e) => {
                let _ = ready.send(Err(PlatformError::Unavailable(format!(
                    "failed to register MPRIS player: {e}"
                ))));
                return;
            }
        };

        tokio::task::spawn_local(player.run());
        let _ = ready.send(Ok(()));
        info!("MPRIS player registered as org.mpris.MediaPlayer2.{identity}");

        while let Some(metadata) = rx.recv().await {
            if let Err(e) = player.set_metadata(metadata).await {
                warn!("Failed to update MPRIS metadata: {e}");
            }
        }

        debug!("MPRIS channel closed");
    });
}

fn to_mpris(record: &NowPlayingRecord<'_>, artwork_dir: &Path) -> Metadata {
    let mut metadata = Metadata::new();

    for (key, value) in record.iter() {
        match (key, value) {
            (MetadataKey::Title, MetadataValue::Text(title)) => {
                metadata.set_title(Some(&**title));
            }
            (MetadataKey::Artist, MetadataValue::Text(artist)) => {
                metadata.set_artist(Some([&**artist]));
            }
            (MetadataKey::AlbumTitle, MetadataValue::Text(album)) => {
                metadata.set_album(Some(&**album));
            }
            (MetadataKey::Composer, MetadataValue::Text(composer)) => {
                metadata.set_composer(Some([&**composer]));
            }
            (MetadataKey::Genre, MetadataValue::Text(genre)) => {
                metadata.set_genre(Some([&**genre]));
            }
            (MetadataKey::AlbumTrackNumber, MetadataValue::Number(n)) if *n > 0 => {
                metadata.set_track_number(i32::try_from(*n).ok());
            }
            (MetadataKey::DiscNumber, MetadataValue::Number(n)) if *n > 0 => {
                metadata.set_disc_number(i32::try_from(*n).ok());
            }
            (MetadataKey::PlaybackDuration, MetadataValue::Seconds(secs)) if *secs > 0.0 => {
                metadata.set_length(Some(Time::from_micros((secs * 1_000_000.0) as i64)));
            }
            (MetadataKey::PersistentId, MetadataValue::Text(id)) => {
                let path = track_id_path(id);
                match TrackId::try_from(path.as_str()) {
                    Ok(track_id) => metadata.set_trackid(Some(track_id)),
                    Err(e) => debug!("Skipping track id {id:?}: {e}"),
                }
            }
            (MetadataKey::Artwork, MetadataValue::Artwork(artwork)) => {
                match art_url(artwork, artwork_dir) {
                    Ok(url) => metadata.set_art_url(Some(url)),
                    Err(e) => warn!("Publishing without artwork: {e}"),
                }
            }
            // No MPRIS counterpart for counts and media type.
            _ => {}
        }
    }

    metadata
}

/// Object path for a persistent id. Path elements only allow `[A-Za-z0-9_]`.
fn track_id_path(id: &str) -> String {
    let mut path = String::from(TRACK_ID_PREFIX);
    if id.is_empty() {
        path.push('_');
    }
    path.extend(id.chars().map(|c| {
        if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '_'
        }
    }));
    path
}

fn art_url(artwork: &Artwork, artwork_dir: &Path) -> Result<String, PlatformError> {
    // Only an absolute path means the same file to the MPRIS client.
    let path = match artwork.path() {
        Some(path) if path.is_absolute() && path.exists() => path.to_path_buf(),
        _ => cache_artwork(artwork, artwork_dir)?,
    };
    file_url(&path)
}

/// Write artwork to a content-addressed file so it has a URL.
///
/// Names are the SHA-256 of the bytes, so they stay the same across daemon
/// restarts. Nothing prunes this directory.
fn cache_artwork(artwork: &Artwork, artwork_dir: &Path) -> Result<PathBuf, PlatformError> {
    let digest = Sha256::digest(artwork.bytes());
    let path = artwork_dir.join(format!(
        "{}.{}",
        hex::encode(&digest[..16]),
        artwork.format().extension()
    ));

    if !path.exists() {
        fs::create_dir_all(artwork_dir)
            .and_then(|()| fs::write(&path, artwork.bytes()))
            .map_err(|e| {
                PlatformError::Artwork(format!("failed to cache {}: {e}", path.display()))
            })?;
    }

    Ok(path)
}

fn file_url(path: &Path) -> Result<String, PlatformError> {
    Url::from_file_path(path)
        .map(String::from)
        .map_err(|()| PlatformError::Artwork(format!("no file URL for {}", path.display())))
}
