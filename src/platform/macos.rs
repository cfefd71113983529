use block2::RcBlock;
use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2::{AnyThread, Message};
use objc2_app_kit::NSImage;
use objc2_foundation::{NSData, NSDictionary, NSNumber, NSSize, NSString};
use objc2_media_player::{
    MPMediaItemArtwork, MPMediaItemPropertyAlbumTitle, MPMediaItemPropertyAlbumTrackCount,
    MPMediaItemPropertyAlbumTrackNumber, MPMediaItemPropertyArtist, MPMediaItemPropertyArtwork,
    MPMediaItemPropertyComposer, MPMediaItemPropertyDiscCount, MPMediaItemPropertyDiscNumber,
    MPMediaItemPropertyGenre, MPMediaItemPropertyMediaType, MPMediaItemPropertyPersistentID,
    MPMediaItemPropertyPlaybackDuration, MPMediaItemPropertyTitle, MPNowPlayingInfoCenter,
};
use std::ptr::NonNull;
use tracing::warn;

use crate::models::Artwork;
use crate::publisher::{InfoCenter, MetadataKey, MetadataValue, NowPlayingRecord, PlatformError};

/// `MPNowPlayingInfoCenter.defaultCenter`.
#[derive(Debug, Default)]
pub struct SystemInfoCenter;

impl SystemInfoCenter {
    pub fn new() -> Self {
        Self
    }
}

impl InfoCenter for SystemInfoCenter {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn set_metadata(&self, record: &NowPlayingRecord<'_>) -> Result<(), PlatformError> {
        let info = now_playing_info(record);
        unsafe {
            let center = MPNowPlayingInfoCenter::defaultCenter();
            center.setNowPlayingInfo(Some(&info));
        }
        Ok(())
    }
}

fn now_playing_info(record: &NowPlayingRecord<'_>) -> Retained<NSDictionary<NSString, AnyObject>> {
    let mut keys: Vec<&NSString> = Vec::with_capacity(record.len());
    let mut values: Vec<Retained<AnyObject>> = Vec::with_capacity(record.len());

    for (key, value) in record.iter() {
        let object = match value {
            MetadataValue::Text(text) if key == MetadataKey::PersistentId => {
                // The framework expects an unsigned 64-bit id; keep opaque ids as strings.
                match text.parse::<u64>() {
                    Ok(id) => into_object(NSNumber::new_u64(id)),
                    Err(_) => into_object(NSString::from_str(text)),
                }
            }
            MetadataValue::Text(text) => into_object(NSString::from_str(text)),
            MetadataValue::Number(n) => into_object(NSNumber::new_u32(*n)),
            MetadataValue::Seconds(secs) => into_object(NSNumber::new_f64(*secs)),
            MetadataValue::Artwork(artwork) => match media_item_artwork(artwork) {
                Ok(item) => into_object(item),
                Err(e) => {
                    warn!("Publishing without artwork: {e}");
                    continue;
                }
            },
        };
        keys.push(property_key(key));
        values.push(object);
    }

    NSDictionary::from_retained_objects(&keys, &values)
}

fn into_object<T: Message>(object: Retained<T>) -> Retained<AnyObject> {
    // Every Objective-C object is an `AnyObject`.
    unsafe { Retained::cast_unchecked(object) }
}

fn media_item_artwork(artwork: &Artwork) -> Result<Retained<MPMediaItemArtwork>, PlatformError> {
    let data = NSData::with_bytes(artwork.bytes());
    let image = unsafe { NSImage::initWithData(NSImage::alloc(), &data) }.ok_or_else(|| {
        PlatformError::Artwork(format!(
            "{} data could not be decoded",
            artwork.format().mime_type()
        ))
    })?;
    let size: NSSize = unsafe { image.size() };

    // The handler owns the image, so the framework can ask for it after the
    // caller's artwork is gone.
    let handler = RcBlock::new(move |_requested: NSSize| -> NonNull<NSImage> {
        NonNull::from(&*image)
    });

    let item = unsafe {
        MPMediaItemArtwork::initWithBoundsSize_requestHandler(
            MPMediaItemArtwork::alloc(),
            size,
            &handler,
        )
    };
    Ok(item)
}

fn property_key(key: MetadataKey) -> &'static NSString {
    unsafe {
        match key {
            MetadataKey::AlbumTitle => MPMediaItemPropertyAlbumTitle,
            MetadataKey::AlbumTrackCount => MPMediaItemPropertyAlbumTrackCount,
            MetadataKey::AlbumTrackNumber => MPMediaItemPropertyAlbumTrackNumber,
            MetadataKey::Artist => MPMediaItemPropertyArtist,
            MetadataKey::Artwork => MPMediaItemPropertyArtwork,
            MetadataKey::Composer => MPMediaItemPropertyComposer,
            MetadataKey::DiscCount => MPMediaItemPropertyDiscCount,
            MetadataKey::DiscNumber => MPMediaItemPropertyDiscNumber,
            MetadataKey::Genre => MPMediaItemPropertyGenre,
            MetadataKey::MediaType => MPMediaItemPropertyMediaType,
            MetadataKey::PersistentId => MPMediaItemPropertyPersistentID,
            MetadataKey::PlaybackDuration => MPMediaItemPropertyPlaybackDuration,
            MetadataKey::Title => MPMediaItemPropertyTitle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NowPlayingMetadata;

    #[test]
    fn test_dictionary_has_one_entry_per_record_entry() {
        let metadata = NowPlayingMetadata::builder()
            .title("Song A")
            .artist("Artist X")
            .persistent_id("42")
            .playback_duration(180.0)
            .build();
        let record = NowPlayingRecord::from_metadata(&metadata);

        let info = now_playing_info(&record);
        assert_eq!(info.count(), record.len());
    }

    #[test]
    fn test_undecodable_artwork_is_rejected() {
        // Valid PNG signature, truncated body.
        let artwork = Artwork::from_bytes(b"\x89PNG\r\n\x1a\n".to_vec()).unwrap();
        assert!(matches!(
            media_item_artwork(&artwork),
            Err(PlatformError::Artwork(_))
        ));
    }

    #[test]
    fn test_undecodable_artwork_keeps_other_fields() {
        let metadata = NowPlayingMetadata::builder()
            .title("Song B")
            .artwork(Artwork::from_bytes(b"\x89PNG\r\n\x1a\n".to_vec()).unwrap())
            .build();
        let record = NowPlayingRecord::from_metadata(&metadata);

        let info = now_playing_info(&record);
        assert!(record.artwork().is_some());
        assert_eq!(info.count(), record.len() - 1);
    }
}
