use anyhow::{anyhow, Result};
use clap::ValueEnum;

/// Codecs accepted on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Codec {
    Vp8,
    Vp9,
    H264,
    H265,
    AV1,
    Opus,
    G722,
    PCMU,
    PCMA,
    L16,
    #[value(name = "l16-48")]
    L16_48,
}

impl From<Codec> for mjr::Codec {
    fn from(codec: Codec) -> Self {
        match codec {
            Codec::Vp8 => mjr::Codec::Vp8,
            Codec::Vp9 => mjr::Codec::Vp9,
            Codec::H264 => mjr::Codec::H264,
            Codec::H265 => mjr::Codec::H265,
            Codec::AV1 => mjr::Codec::Av1,
            Codec::Opus => mjr::Codec::Opus,
            Codec::G722 => mjr::Codec::G722,
            Codec::PCMU => mjr::Codec::Pcmu,
            Codec::PCMA => mjr::Codec::Pcma,
            Codec::L16 => mjr::Codec::L16,
            Codec::L16_48 => mjr::Codec::L16_48,
        }
    }
}

/// Accepts the names MJR metadata uses, plus `h.264`-style aliases.
pub fn codec_from_str(s: &str) -> Result<mjr::Codec> {
    mjr::Codec::from_name(s).ok_or_else(|| anyhow!("unknown codec: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_enum_names() {
        assert_eq!(Codec::from_str("av1", true).unwrap(), Codec::AV1);
        assert_eq!(Codec::from_str("pcma", true).unwrap(), Codec::PCMA);
        assert_eq!(Codec::from_str("l16-48", true).unwrap(), Codec::L16_48);
        assert!(Codec::from_str("speex", true).is_err());
    }

    #[test]
    fn test_every_variant_maps_to_its_name() {
        for codec in Codec::value_variants() {
            let name = codec.to_possible_value().unwrap().get_name().to_string();
            let mapped: mjr::Codec = (*codec).into();
            assert_eq!(mapped.name(), name);
        }
    }

    #[test]
    fn test_codec_from_str() {
        assert_eq!(codec_from_str("H.264").unwrap(), mjr::Codec::H264);
        assert_eq!(codec_from_str("opus").unwrap(), mjr::Codec::Opus);
        assert!(codec_from_str("mp3").is_err());
    }
}
