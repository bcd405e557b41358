//! On-disk layout of an MJR container.
//!
//! ```text
//! MAGIC(8) [LEN(2) METADATA_JSON(LEN)] { TAG(4) RESERVED(4) LEN(2) PACKET(LEN) }*
//! ```
//!
//! Legacy containers replace the bracketed metadata block with a 5 byte
//! `a`/`v` marker. Their packet records start with `MEETECHO` and a length,
//! which reads as a regular `MEET` tag followed by 4 reserved bytes.

use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;
use serde_json::Value;

use crate::codec::{Codec, MediaKind};
use crate::error::{Error, Result};

/// Upper bound for any length-prefixed field, metadata included.
pub const MAX_RECORD_SIZE: usize = 1500;

pub const HEADER_LEN: usize = 8;
pub const MAGIC: &[u8; HEADER_LEN] = b"MJR00002";
pub const LEGACY_MAGIC: &[u8; HEADER_LEN] = b"MEETECHO";

pub const METADATA_LENGTH_LEN: usize = 2;
pub const LEGACY_MARKER_LEN: usize = 5;

pub const RECORD_TAG: &[u8; 4] = b"MEET";
/// Tag, reserved word and length.
pub const RECORD_PREFIX_LEN: usize = 10;

/// Container variant, fixed for the whole stream once the header is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// `MJR00002`, with a JSON metadata record.
    Current,
    /// `MEETECHO`, with a bare audio/video marker.
    Legacy,
}

impl Format {
    pub fn detect(header: &[u8]) -> Result<Self> {
        let first = header.first().copied().unwrap_or_default();
        if first != b'M' {
            return Err(Error::NotMjr(first));
        }
        if header == MAGIC {
            Ok(Format::Current)
        } else if header == LEGACY_MAGIC {
            Ok(Format::Legacy)
        } else {
            Err(Error::UnsupportedVersion(
                String::from_utf8_lossy(header).into_owned(),
            ))
        }
    }

    pub fn magic(self) -> &'static [u8; HEADER_LEN] {
        match self {
            Format::Current => MAGIC,
            Format::Legacy => LEGACY_MAGIC,
        }
    }
}

/// The fixed part in front of every packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordPrefix {
    /// Currently always zero when written; never interpreted when read.
    pub reserved: u32,
    pub length: usize,
}

impl RecordPrefix {
    pub fn parse(mut buf: &[u8]) -> Result<Self> {
        if buf.len() < RECORD_PREFIX_LEN || &buf[..RECORD_TAG.len()] != RECORD_TAG {
            let end = buf.len().min(RECORD_TAG.len());
            return Err(Error::InvalidTag {
                found: String::from_utf8_lossy(&buf[..end]).into_owned(),
            });
        }
        buf.advance(RECORD_TAG.len());
        let reserved = buf.get_u32();
        let length = buf.get_u16() as usize;
        if length > MAX_RECORD_SIZE {
            return Err(Error::PacketTooLarge(length));
        }
        Ok(Self { reserved, length })
    }

    pub fn write(&self, buf: &mut BytesMut) {
        buf.put_slice(RECORD_TAG);
        buf.put_u32(self.reserved);
        buf.put_u16(self.length as u16);
    }
}

/// Description of the single stream a container carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub kind: MediaKind,
    pub codec: Codec,
    /// Recorder-supplied creation time.
    pub created: i64,
    /// Recorder-supplied time of the metadata write.
    pub written: i64,
}

#[derive(Serialize)]
struct MetadataJson<'a> {
    t: &'a str,
    c: &'a str,
    s: i64,
    u: i64,
}

impl Metadata {
    /// Parse the JSON metadata record of a current-format container.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let end = buf
            .iter()
            .rposition(|b| *b != 0)
            .map_or(0, |last| last + 1);
        let value: Value = serde_json::from_slice(&buf[..end])
            .map_err(|e| Error::InvalidMetadata(e.to_string()))?;

        let t = string_field(&value, "t")?;
        let c = string_field(&value, "c")?;
        let created = integer_field(&value, "s")?;
        let written = integer_field(&value, "u")?;

        let declared = match t.to_ascii_lowercase().as_str() {
            "a" => Some(MediaKind::Audio),
            "v" => Some(MediaKind::Video),
            "d" => return Err(Error::UnsupportedMedia(t.to_string())),
            _ => None,
        };
        let codec = Codec::from_name(c).ok_or_else(|| Error::UnsupportedCodec(c.to_string()))?;
        let kind = codec.kind();
        if declared != Some(kind) {
            tracing::warn!(declared = t, codec = %codec, "media kind follows the codec");
        }

        Ok(Self {
            kind,
            codec,
            created,
            written,
        })
    }

    /// Metadata implied by a legacy marker byte.
    pub fn legacy(marker: u8) -> Result<Self> {
        let (kind, codec) = match marker {
            b'a' => (MediaKind::Audio, Codec::Opus),
            b'v' => (MediaKind::Video, Codec::Vp8),
            other => {
                return Err(Error::UnsupportedMedia(
                    char::from(other).escape_default().to_string(),
                ))
            }
        };
        Ok(Self {
            kind,
            codec,
            created: 0,
            written: 0,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&MetadataJson {
            t: self.kind.marker(),
            c: self.codec.name(),
            s: self.created,
            u: self.written,
        })
        .map_err(|e| Error::Serialize(e.to_string()))
    }
}

fn string_field<'a>(value: &'a Value, key: &str) -> Result<&'a str> {
    match value.get(key).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(Error::InvalidMetadata(format!(
            "missing or empty string key {key:?}"
        ))),
    }
}

fn integer_field(value: &Value, key: &str) -> Result<i64> {
    match value.get(key).and_then(Value::as_i64) {
        Some(n) if n != 0 => Ok(n),
        _ => Err(Error::InvalidMetadata(format!(
            "missing or zero integer key {key:?}"
        ))),
    }
}
