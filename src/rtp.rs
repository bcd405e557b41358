use bytes::Buf;

/// Size of the fixed RTP header, CSRC list excluded.
pub const RTP_HEADER_LEN: usize = 12;

const SSRC_OFFSET: usize = 8;

/// The fixed fields of an RTP header (RFC 3550 section 5.1).
///
/// Only what the demuxer needs for flow filtering and timing is read; the
/// rest of the packet stays opaque.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RtpHeader {
    pub version: u8,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
}

impl RtpHeader {
    /// Returns `None` when the packet is shorter than the fixed header.
    pub fn parse(packet: &[u8]) -> Option<Self> {
        if packet.len() < RTP_HEADER_LEN {
            return None;
        }
        let mut buf = packet;
        let b0 = buf.get_u8();
        let b1 = buf.get_u8();
        Some(Self {
            version: b0 >> 6,
            marker: b1 & 0x80 != 0,
            payload_type: b1 & 0x7f,
            sequence_number: buf.get_u16(),
            timestamp: buf.get_u32(),
            ssrc: buf.get_u32(),
        })
    }
}

/// Overwrite the SSRC of a packet in place.
pub fn rewrite_ssrc(packet: &mut [u8], ssrc: u32) {
    if let Some(field) = packet.get_mut(SSRC_OFFSET..RTP_HEADER_LEN) {
        field.copy_from_slice(&ssrc.to_be_bytes());
    }
}
