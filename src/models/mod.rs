use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("artwork data is empty")]
    Empty,
    #[error("unsupported artwork format")]
    UnsupportedFormat,
    #[error("failed to read artwork from {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtworkFormat {
    Png,
    Jpeg,
    Gif,
    Tiff,
    Bmp,
    WebP,
}

impl ArtworkFormat {
    /// Identify an encoded image by its leading magic bytes.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

        if data.starts_with(PNG) {
            Some(Self::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
            Some(Self::Tiff)
        } else if data.starts_with(b"BM") {
            Some(Self::Bmp)
        } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(Self::WebP)
        } else {
            None
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
            Self::WebP => "image/webp",
        }
    }

    #[allow(dead_code)]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
            Self::WebP => "webp",
        }
    }
}

/// An encoded image supplied by the caller as cover art.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    data: Vec<u8>,
    format: ArtworkFormat,
    path: Option<PathBuf>,
}

impl Artwork {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, ArtworkError> {
        if data.is_empty() {
            return Err(ArtworkError::Empty);
        }
        let format = ArtworkFormat::sniff(&data).ok_or(ArtworkError::UnsupportedFormat)?;
        Ok(Self {
            data,
            format,
            path: None,
        })
    }

    /// Load artwork from a file. The stored path is canonical, so it still
    /// names the same file when read by a process with another cwd.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ArtworkError> {
        let io_error = |source| ArtworkError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        };
        let path = fs::canonicalize(path.as_ref()).map_err(io_error)?;
        let data = fs::read(&path).map_err(io_error)?;

        let mut artwork = Self::from_bytes(data)?;
        artwork.path = Some(path);
        Ok(artwork)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn format(&self) -> ArtworkFormat {
        self.format
    }

    /// The file this artwork was loaded from, if any.
    #[allow(dead_code)]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Metadata for the media item that is currently playing.
///
/// Integer fields use `0` for "unknown" and the duration uses `0.0` or any
/// negative value for "unknown". Every publish replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingMetadata {
    pub album_title: Option<String>,
    pub album_track_count: u32,
    pub album_track_number: u32,
    pub artist: Option<String>,
    pub artwork: Option<Artwork>,
    pub composer: Option<String>,
    pub disc_count: u32,
    pub disc_number: u32,
    pub genre: Option<String>,
    pub media_type: Option<String>,
    pub persistent_id: Option<String>,
    pub playback_duration: f64,
    pub title: Option<String>,
}

impl NowPlayingMetadata {
    #[allow(dead_code)]
    pub fn builder() -> NowPlayingMetadataBuilder {
        NowPlayingMetadataBuilder::default()
    }

    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled)")
    }
}

#[derive(Debug, Default)]
pub struct NowPlayingMetadataBuilder {
    inner: NowPlayingMetadata,
}

#[allow(dead_code)]
impl NowPlayingMetadataBuilder {
    pub fn album_title(mut self, album_title: impl Into<String>) -> Self {
        self.inner.album_title = Some(album_title.into());
        self
    }

    pub fn album_track_count(mut self, count: u32) -> Self {
        self.inner.album_track_count = count;
        self
    }

    pub fn album_track_number(mut self, number: u32) -> Self {
        self.inner.album_track_number = number;
        self
    }

    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.inner.artist = Some(artist.into());
        self
    }

    pub fn artwork(mut self, artwork: Artwork) -> Self {
        self.inner.artwork = Some(artwork);
        self
    }

    pub fn composer(mut self, composer: impl Into<String>) -> Self {
        self.inner.composer = Some(composer.into());
        self
    }

    pub fn disc_count(mut self, count: u32) -> Self {
        self.inner.disc_count = count;
        self
    }

    pub fn disc_number(mut self, number: u32) -> Self {
        self.inner.disc_number = number;
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.inner.genre = Some(genre.into());
        self
    }

    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.inner.media_type = Some(media_type.into());
        self
    }

    pub fn persistent_id(mut self, id: impl Into<String>) -> Self {
        self.inner.persistent_id = Some(id.into());
        self
    }

    pub fn playback_duration(mut self, seconds: f64) -> Self {
        self.inner.playback_duration = seconds;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.inner.title = Some(title.into());
        self
    }

    pub fn build(self) -> NowPlayingMetadata {
        self.inner
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TINY_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_sniff_formats() {
        assert_eq!(ArtworkFormat::sniff(TINY_PNG), Some(ArtworkFormat::Png));
        assert_eq!(
            ArtworkFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ArtworkFormat::Jpeg)
        );
        assert_eq!(
            ArtworkFormat::sniff(b"RIFF\0\0\0\0WEBPVP8 "),
            Some(ArtworkFormat::WebP)
        );
        assert_eq!(ArtworkFormat::sniff(b"RIFF\0\0\0\0WAVE"), None);
        assert_eq!(ArtworkFormat::sniff(b"hello"), None);
    }

    #[test]
    fn test_artwork_rejects_bad_data() {
        assert!(matches!(
            Artwork::from_bytes(Vec::new()),
            Err(ArtworkError::Empty)
        ));
        assert!(matches!(
            Artwork::from_bytes(b"not an image".to_vec()),
            Err(ArtworkError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_artwork_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.png");
        fs::write(&path, TINY_PNG).unwrap();

        let artwork = Artwork::from_path(&path).unwrap();
        assert_eq!(artwork.format(), ArtworkFormat::Png);
        assert_eq!(artwork.bytes(), TINY_PNG);
        assert_eq!(
            artwork.path(),
            Some(fs::canonicalize(&path).unwrap().as_path())
        );
        assert!(artwork.path().unwrap().is_absolute());

        let missing = Artwork::from_path(dir.path().join("missing.png"));
        assert!(matches!(missing, Err(ArtworkError::Io { .. })));
    }

    #[test]
    fn test_artwork_path_is_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("covers");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("cover.png"), TINY_PNG).unwrap();

        // `a/../b` resolves without touching the process cwd.
        let artwork = Artwork::from_path(nested.join("..").join("covers/cover.png")).unwrap();
        let stored = artwork.path().unwrap();
        assert!(stored.is_absolute());
        assert!(!stored.components().any(|c| c == std::path::Component::ParentDir));
        assert_eq!(stored, fs::canonicalize(nested.join("cover.png")).unwrap());
    }

    #[test]
    fn test_builder_defaults_to_unknown() {
        let metadata = NowPlayingMetadata::builder().title("Song A").build();
        assert_eq!(metadata.title.as_deref(), Some("Song A"));
        assert_eq!(metadata.album_track_count, 0);
        assert_eq!(metadata.playback_duration, 0.0);
        assert!(metadata.artwork.is_none());
        assert_eq!(NowPlayingMetadata::default().display_name(), "(untitled)");
    }
}
