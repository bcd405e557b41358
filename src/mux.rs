use bytes::{BufMut, Bytes, BytesMut};
use chrono::Utc;
use tracing::{debug, info};

use crate::codec::{Codec, MediaKind};
use crate::error::{Error, Result};
use crate::record::{
    Metadata, RecordPrefix, MAGIC, MAX_RECORD_SIZE, METADATA_LENGTH_LEN, RECORD_PREFIX_LEN,
};

/// Writes RTP packets into a current-format MJR container.
///
/// The container header and metadata are emitted in front of the first
/// packet, so the media must be known by then. Nothing is written on close.
#[derive(Debug)]
pub struct Muxer {
    /// Microseconds since the Unix epoch.
    created: i64,
    media: Option<(MediaKind, Codec)>,
    initialized: bool,
    packets: u64,
}

impl Muxer {
    /// `created` is the recording start, in microseconds since the Unix epoch.
    pub fn new(created: i64) -> Self {
        Self {
            created,
            media: None,
            initialized: false,
            packets: 0,
        }
    }

    /// A muxer whose recording starts now.
    pub fn now() -> Self {
        Self::new(Utc::now().timestamp_micros())
    }

    pub fn set_media(&mut self, kind: MediaKind, codec_name: &str) -> Result<()> {
        let codec = Codec::from_name(codec_name)
            .ok_or_else(|| Error::UnsupportedCodec(codec_name.to_string()))?;
        if codec.kind() != kind {
            return Err(Error::MediaMismatch { kind, codec });
        }
        if self.initialized && self.media != Some((kind, codec)) {
            return Err(Error::MediaLocked);
        }
        debug!(%kind, %codec, "media set");
        self.media = Some((kind, codec));
        Ok(())
    }

    /// Encode one packet, returning the bytes to append to the sink.
    pub fn write(&mut self, packet: &[u8]) -> Result<Bytes> {
        self.write_at(packet, Utc::now().timestamp_micros())
    }

    /// Like [`Muxer::write`], with an explicit metadata write time.
    pub fn write_at(&mut self, packet: &[u8], written: i64) -> Result<Bytes> {
        if packet.len() > MAX_RECORD_SIZE {
            return Err(Error::PacketTooLarge(packet.len()));
        }
        let mut buf = BytesMut::with_capacity(RECORD_PREFIX_LEN + packet.len());

        if !self.initialized {
            let (kind, codec) = self.media.ok_or(Error::MediaNotSet)?;
            let json = Metadata {
                kind,
                codec,
                created: self.created,
                written,
            }
            .to_json()?;
            if json.len() > MAX_RECORD_SIZE {
                return Err(Error::MetadataTooLarge(json.len()));
            }
            buf.reserve(MAGIC.len() + METADATA_LENGTH_LEN + json.len());
            buf.put_slice(MAGIC);
            buf.put_u16(json.len() as u16);
            buf.put_slice(json.as_bytes());
            info!(metadata = %json, "MJR header written");
            self.initialized = true;
        }

        RecordPrefix {
            reserved: 0,
            length: packet.len(),
        }
        .write(&mut buf);
        buf.put_slice(packet);
        self.packets += 1;
        Ok(buf.freeze())
    }

    pub fn media(&self) -> Option<(MediaKind, Codec)> {
        self.media
    }

    pub fn created(&self) -> i64 {
        self.created
    }

    pub fn packets(&self) -> u64 {
        self.packets
    }
}
