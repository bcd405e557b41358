use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Track category carried by a container. One container holds exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Marker used by the `t` metadata key and the legacy header.
    pub fn marker(self) -> &'static str {
        match self {
            MediaKind::Audio => "a",
            MediaKind::Video => "v",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }

    pub fn is_video(self) -> bool {
        self == MediaKind::Video
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Codecs a recording may declare.
///
/// The discriminants are the identifiers recorders use internally: audio
/// codecs live in `1..=6`, video codecs in `11..=15`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Codec {
    Opus = 1,
    Pcmu = 2,
    Pcma = 3,
    G722 = 4,
    L16 = 5,
    L16_48 = 6,
    Vp8 = 11,
    Vp9 = 12,
    H264 = 13,
    H265 = 14,
    Av1 = 15,
}

impl Codec {
    pub const ALL: [Codec; 11] = [
        Codec::Opus,
        Codec::Pcmu,
        Codec::Pcma,
        Codec::G722,
        Codec::L16,
        Codec::L16_48,
        Codec::Vp8,
        Codec::Vp9,
        Codec::H264,
        Codec::H265,
        Codec::Av1,
    ];

    /// Case-insensitive lookup, accepting the dotted `h.264`/`h.265` spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        let codec = match name.as_str() {
            "vp8" => Codec::Vp8,
            "vp9" => Codec::Vp9,
            "h264" | "h.264" => Codec::H264,
            "h265" | "h.265" => Codec::H265,
            "av1" => Codec::Av1,
            "opus" => Codec::Opus,
            "pcmu" => Codec::Pcmu,
            "pcma" => Codec::Pcma,
            "g722" => Codec::G722,
            "l16" => Codec::L16,
            "l16-48" => Codec::L16_48,
            _ => return None,
        };
        Some(codec)
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|codec| codec.id() == id)
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Canonical name, as written into the `c` metadata key.
    pub fn name(self) -> &'static str {
        match self {
            Codec::Opus => "opus",
            Codec::Pcmu => "pcmu",
            Codec::Pcma => "pcma",
            Codec::G722 => "g722",
            Codec::L16 => "l16",
            Codec::L16_48 => "l16-48",
            Codec::Vp8 => "vp8",
            Codec::Vp9 => "vp9",
            Codec::H264 => "h264",
            Codec::H265 => "h265",
            Codec::Av1 => "av1",
        }
    }

    /// RTP encoding name, e.g. for SDP `a=rtpmap` lines.
    pub fn encoding_name(self) -> &'static str {
        match self {
            Codec::Opus => "OPUS",
            Codec::Pcmu => "PCMU",
            Codec::Pcma => "PCMA",
            Codec::G722 => "G722",
            Codec::L16 => "L16",
            Codec::L16_48 => "L16-48",
            Codec::Vp8 => "VP8",
            Codec::Vp9 => "VP9",
            Codec::H264 => "H264",
            Codec::H265 => "H265",
            Codec::Av1 => "AV1",
        }
    }

    /// RTP clock rate in Hz.
    pub fn clock_rate(self) -> u32 {
        match self {
            Codec::Opus => 48_000,
            Codec::Pcmu | Codec::Pcma | Codec::G722 => 8_000,
            Codec::L16 | Codec::L16_48 => 16_000,
            Codec::Vp8 | Codec::Vp9 | Codec::H264 | Codec::H265 | Codec::Av1 => 90_000,
        }
    }

    pub fn kind(self) -> MediaKind {
        match self {
            Codec::Vp8 | Codec::Vp9 | Codec::H264 | Codec::H265 | Codec::Av1 => MediaKind::Video,
            _ => MediaKind::Audio,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Codec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Codec::from_name(s).ok_or_else(|| Error::UnsupportedCodec(s.to_string()))
    }
}

/// Resolve a codec name to its identifier and whether it is a video codec.
///
/// Returns `None` for names outside the table.
pub fn resolve(name: &str) -> Option<(u8, bool)> {
    Codec::from_name(name).map(|codec| (codec.id(), codec.kind().is_video()))
}

/// Inverse of [`resolve`]: canonical name and clock rate for an identifier.
pub fn describe(id: u8) -> Option<(&'static str, u32)> {
    Codec::from_id(id).map(|codec| (codec.name(), codec.clock_rate()))
}
