/// Broad classification of [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad magic or unknown container version.
    Format,
    /// Record boundaries can no longer be trusted.
    Framing,
    /// The metadata record is malformed or describes unsupported media.
    Metadata,
    /// The engine was driven or set up incorrectly.
    Configuration,
}

/// Every failure is fatal for the session that produced it: the container
/// has no resynchronization marker to skip corruption with.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("not an MJR container: expected 'M', found {0:#04x}")]
    NotMjr(u8),

    #[error("unsupported MJR version {0:?}")]
    UnsupportedVersion(String),

    #[error("invalid record tag: expected \"MEET\", found {found:?}")]
    InvalidTag { found: String },

    #[error("packet length {0} exceeds 1500 bytes")]
    PacketTooLarge(usize),

    #[error("metadata length {0} exceeds 1500 bytes")]
    MetadataTooLarge(usize),

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("unsupported media format {0:?}")]
    UnsupportedMedia(String),

    #[error("unsupported codec {0:?}")]
    UnsupportedCodec(String),

    #[error("media kind and codec must be set before the first packet")]
    MediaNotSet,

    #[error("codec {codec} is not a {kind} codec")]
    MediaMismatch {
        kind: crate::MediaKind,
        codec: crate::Codec,
    },

    #[error("media cannot change after the container header was written")]
    MediaLocked,

    #[error("failed to serialize metadata: {0}")]
    Serialize(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotMjr(_) | Error::UnsupportedVersion(_) => ErrorKind::Format,
            Error::InvalidTag { .. } | Error::PacketTooLarge(_) => ErrorKind::Framing,
            Error::MetadataTooLarge(_)
            | Error::InvalidMetadata(_)
            | Error::UnsupportedMedia(_)
            | Error::UnsupportedCodec(_) => ErrorKind::Metadata,
            Error::MediaNotSet
            | Error::MediaMismatch { .. }
            | Error::MediaLocked
            | Error::Serialize(_) => ErrorKind::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
