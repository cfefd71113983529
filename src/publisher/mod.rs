use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Artwork, NowPlayingMetadata};

#[cfg(test)]
mod recording;
#[cfg(test)]
pub use recording::RecordingInfoCenter;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("now playing service unavailable: {0}")]
    Unavailable(String),
    #[error("artwork could not be converted: {0}")]
    Artwork(String),
}

/// Keys of the platform metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataKey {
    AlbumTitle,
    AlbumTrackCount,
    AlbumTrackNumber,
    Artist,
    Artwork,
    Composer,
    DiscCount,
    DiscNumber,
    Genre,
    MediaType,
    PersistentId,
    PlaybackDuration,
    Title,
}

impl MetadataKey {
    #[allow(dead_code)]
    pub const ALL: [MetadataKey; 13] = [
        Self::AlbumTitle,
        Self::AlbumTrackCount,
        Self::AlbumTrackNumber,
        Self::Artist,
        Self::Artwork,
        Self::Composer,
        Self::DiscCount,
        Self::DiscNumber,
        Self::Genre,
        Self::MediaType,
        Self::PersistentId,
        Self::PlaybackDuration,
        Self::Title,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlbumTitle => "albumTitle",
            Self::AlbumTrackCount => "albumTrackCount",
            Self::AlbumTrackNumber => "albumTrackNumber",
            Self::Artist => "artist",
            Self::Artwork => "artwork",
            Self::Composer => "composer",
            Self::DiscCount => "discCount",
            Self::DiscNumber => "discNumber",
            Self::Genre => "genre",
            Self::MediaType => "mediaType",
            Self::PersistentId => "persistentID",
            Self::PlaybackDuration => "playbackDuration",
            Self::Title => "title",
        }
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue<'a> {
    Text(Cow<'a, str>),
    Number(u32),
    Seconds(f64),
    Artwork(Cow<'a, Artwork>),
}

impl MetadataValue<'_> {
    pub fn into_owned(self) -> MetadataValue<'static> {
        match self {
            Self::Text(text) => MetadataValue::Text(Cow::Owned(text.into_owned())),
            Self::Number(n) => MetadataValue::Number(n),
            Self::Seconds(s) => MetadataValue::Seconds(s),
            Self::Artwork(artwork) => MetadataValue::Artwork(Cow::Owned(artwork.into_owned())),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(&**text),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Seconds(s) => write!(f, "{s}"),
            Self::Artwork(artwork) => write!(
                f,
                "<{}, {} bytes>",
                artwork.format().mime_type(),
                artwork.bytes().len()
            ),
        }
    }
}

/// The complete set of entries handed to the platform in one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NowPlayingRecord<'a> {
    entries: BTreeMap<MetadataKey, MetadataValue<'a>>,
}

impl<'a> NowPlayingRecord<'a> {
    pub fn from_metadata(metadata: &'a NowPlayingMetadata) -> Self {
        let mut record = Self::default();

        let text = |value: &'a Option<String>| {
            value
                .as_deref()
                .map(|s| MetadataValue::Text(Cow::Borrowed(s)))
        };

        record.insert_opt(MetadataKey::AlbumTitle, text(&metadata.album_title));
        record.insert(
            MetadataKey::AlbumTrackCount,
            MetadataValue::Number(metadata.album_track_count),
        );
        record.insert(
            MetadataKey::AlbumTrackNumber,
            MetadataValue::Number(metadata.album_track_number),
        );
        record.insert_opt(MetadataKey::Artist, text(&metadata.artist));
        record.insert_opt(
            MetadataKey::Artwork,
            metadata
                .artwork
                .as_ref()
                .map(|artwork| MetadataValue::Artwork(Cow::Borrowed(artwork))),
        );
        record.insert_opt(MetadataKey::Composer, text(&metadata.composer));
        record.insert(
            MetadataKey::DiscCount,
            MetadataValue::Number(metadata.disc_count),
        );
        record.insert(
            MetadataKey::DiscNumber,
            MetadataValue::Number(metadata.disc_number),
        );
        record.insert_opt(MetadataKey::Genre, text(&metadata.genre));
        record.insert_opt(MetadataKey::MediaType, text(&metadata.media_type));
        record.insert_opt(MetadataKey::PersistentId, text(&metadata.persistent_id));

        // NaN and infinities mean nothing to the platform; report unknown.
        let duration = if metadata.playback_duration.is_finite() {
            metadata.playback_duration
        } else {
            0.0
        };
        record.insert(
            MetadataKey::PlaybackDuration,
            MetadataValue::Seconds(duration),
        );
        record.insert_opt(MetadataKey::Title, text(&metadata.title));

        record
    }

    fn insert(&mut self, key: MetadataKey, value: MetadataValue<'a>) {
        self.entries.insert(key, value);
    }

    fn insert_opt(&mut self, key: MetadataKey, value: Option<MetadataValue<'a>>) {
        if let Some(value) = value {
            self.entries.insert(key, value);
        }
    }

    pub fn get(&self, key: MetadataKey) -> Option<&MetadataValue<'a>> {
        self.entries.get(&key)
    }

    #[allow(dead_code)]
    pub fn text(&self, key: MetadataKey) -> Option<&str> {
        self.get(key).and_then(MetadataValue::as_text)
    }

    #[allow(dead_code)]
    pub fn number(&self, key: MetadataKey) -> Option<u32> {
        match self.get(key) {
            Some(MetadataValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    #[allow(dead_code)]
    pub fn seconds(&self, key: MetadataKey) -> Option<f64> {
        match self.get(key) {
            Some(MetadataValue::Seconds(s)) => Some(*s),
            _ => None,
        }
    }

    #[allow(dead_code)]
    pub fn artwork(&self) -> Option<&Artwork> {
        match self.get(MetadataKey::Artwork) {
            Some(MetadataValue::Artwork(artwork)) => Some(&**artwork),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetadataKey, &MetadataValue<'a>)> {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_owned(self) -> NowPlayingRecord<'static> {
        NowPlayingRecord {
            entries: self
                .entries
                .into_iter()
                .map(|(key, value)| (key, value.into_owned()))
                .collect(),
        }
    }
}

/// The process-wide "now playing" slot of the host platform.
///
/// Each call replaces the previously registered record. Implementations
/// must copy anything they keep past the call.
pub trait InfoCenter {
    fn name(&self) -> &'static str;

    fn set_metadata(&self, record: &NowPlayingRecord<'_>) -> Result<(), PlatformError>;
}

impl InfoCenter for Box<dyn InfoCenter> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn set_metadata(&self, record: &NowPlayingRecord<'_>) -> Result<(), PlatformError> {
        (**self).set_metadata(record)
    }
}

pub struct NowPlayingPublisher<C> {
    center: C,
}

impl<C: InfoCenter> NowPlayingPublisher<C> {
    pub fn new(center: C) -> Self {
        Self { center }
    }

    pub fn backend(&self) -> &'static str {
        self.center.name()
    }

    /// Replace the published now-playing state with `metadata`.
    ///
    /// Failures reaching the platform are logged and dropped.
    pub fn publish(&self, metadata: &NowPlayingMetadata) {
        let record = NowPlayingRecord::from_metadata(metadata);
        debug!(
            backend = self.center.name(),
            entries = record.len(),
            "Publishing now playing: {}",
            metadata.display_name()
        );

        if let Err(e) = self.center.set_metadata(&record) {
            warn!(backend = self.center.name(), "Failed to publish now playing: {e}");
        }
    }

    pub fn clear(&self) {
        self.publish(&NowPlayingMetadata::default());
    }
}
