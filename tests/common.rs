#![allow(dead_code)]

use mjr::{DemuxEvent, Demuxer, Error, MediaDescription, Packet};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Minimal RTP packet: fixed header followed by `payload`.
pub fn rtp_packet(ssrc: u32, seq: u16, ts: u32, payload_type: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0x80, payload_type & 0x7f];
    buf.extend_from_slice(&seq.to_be_bytes());
    buf.extend_from_slice(&ts.to_be_bytes());
    buf.extend_from_slice(&ssrc.to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

pub fn record(packet: &[u8]) -> Vec<u8> {
    let mut buf = b"MEET\0\0\0\0".to_vec();
    buf.extend_from_slice(&(packet.len() as u16).to_be_bytes());
    buf.extend_from_slice(packet);
    buf
}

/// A current-format container with the given metadata and packets.
pub fn container(json: &[u8], packets: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = b"MJR00002".to_vec();
    buf.extend_from_slice(&(json.len() as u16).to_be_bytes());
    buf.extend_from_slice(json);
    for packet in packets {
        buf.extend(record(packet));
    }
    buf
}

pub fn demux_whole(input: &[u8]) -> Vec<DemuxEvent> {
    Demuxer::default().feed(input)
}

pub fn demux_chunks<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Vec<DemuxEvent> {
    let mut demuxer = Demuxer::default();
    let mut events = Vec::new();
    for chunk in chunks {
        demuxer.feed_into(chunk, &mut events);
    }
    events
}

/// Split `input` into random non-empty chunks of at most `max` bytes.
pub fn random_chunks(input: &[u8], seed: u64, max: usize) -> Vec<&[u8]> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut chunks = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        let n = rng.random_range(1..=max.min(rest.len()));
        let (chunk, tail) = rest.split_at(n);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

pub struct Demuxed {
    pub media: Vec<MediaDescription>,
    pub packets: Vec<Packet>,
    pub error: Option<Error>,
}

pub fn split_events(events: Vec<DemuxEvent>) -> Demuxed {
    let mut out = Demuxed {
        media: Vec::new(),
        packets: Vec::new(),
        error: None,
    };
    for event in events {
        match event {
            DemuxEvent::MediaDescribed(media) => out.media.push(media),
            DemuxEvent::Packet(packet) => out.packets.push(packet),
            DemuxEvent::Error(err) => {
                assert!(out.error.is_none(), "more than one error event");
                out.error = Some(err);
            }
        }
    }
    out
}
