//! Incremental MJR demuxer.
//!
//! The container arrives in arbitrarily sized chunks. Every field is read
//! through the same rule: the demuxer knows how many bytes it still needs
//! (`pending`), copies at most that many out of the current chunk into a
//! bounded buffer and only acts on the field once it is complete. A chunk
//! that ends mid-field leaves the partial field buffered until the next one.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::codec::{Codec, MediaKind};
use crate::error::{Error, Result};
use crate::record::{
    Format, Metadata, RecordPrefix, HEADER_LEN, LEGACY_MARKER_LEN, MAX_RECORD_SIZE,
    METADATA_LENGTH_LEN, RECORD_PREFIX_LEN,
};
use crate::rtp::{rewrite_ssrc, RtpHeader};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DemuxConfig {
    /// Rewrite the SSRC of every emitted packet.
    #[serde(default)]
    pub ssrc: Option<u32>,
    /// Pick a random output SSRC when `ssrc` is not set.
    #[serde(default)]
    pub randomize_ssrc: bool,
    /// Log every chunk and packet at debug level instead of trace.
    #[serde(default)]
    pub verbose: bool,
}

/// What the demuxer learned about the stream, announced once before the
/// first packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescription {
    pub kind: MediaKind,
    pub codec: Codec,
    pub codec_name: &'static str,
    pub encoding_name: &'static str,
    pub clock_rate: u32,
    /// Taken from the first accepted packet.
    pub payload_type: u8,
    /// Not available in legacy containers.
    pub created: Option<i64>,
    pub written: Option<i64>,
}

/// One RTP packet recovered from the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub data: Bytes,
    /// Time since the first accepted packet.
    pub timestamp: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemuxEvent {
    MediaDescribed(MediaDescription),
    Packet(Packet),
    /// Terminal: nothing else is produced after it.
    Error(Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemuxStats {
    /// Bytes consumed from the input.
    pub bytes: u64,
    pub packets: u64,
    /// Packets whose SSRC differs from the first accepted one.
    pub dropped_ssrc: u64,
    /// Records too short to hold an RTP header.
    pub dropped_short: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    WaitingHeader,
    ReadingHeader,
    WaitingMetaLength,
    ReadingMeta,
    /// Rest of a length-prefixed legacy `audio`/`video` marker.
    SkippingLegacyMeta,
    WaitingRecordPrefix,
    ReadingRecordPayload,
    Failed,
}

/// Relative timeline built from RTP timestamp deltas.
#[derive(Debug)]
struct Timeline {
    clock_rate: u32,
    last: u32,
    ticks: u64,
}

impl Timeline {
    fn new(clock_rate: u32, first: u32) -> Self {
        Self {
            clock_rate,
            last: first,
            ticks: 0,
        }
    }

    /// Deltas are taken modulo 2^32, so a wrapping source clock keeps moving
    /// forward.
    fn advance(&mut self, timestamp: u32) -> Duration {
        self.ticks += u64::from(timestamp.wrapping_sub(self.last));
        self.last = timestamp;
        ticks_to_duration(self.ticks, self.clock_rate)
    }
}

fn ticks_to_duration(ticks: u64, clock_rate: u32) -> Duration {
    let rate = u64::from(clock_rate);
    let secs = ticks / rate;
    let nanos = (ticks % rate) * 1_000_000_000 / rate;
    Duration::new(secs, nanos as u32)
}

pub struct Demuxer {
    config: DemuxConfig,
    out_ssrc: Option<u32>,

    state: State,
    format: Option<Format>,
    metadata: Option<Metadata>,
    pending: usize,
    buffer: BytesMut,

    ssrc: Option<u32>,
    media: Option<MediaDescription>,
    timeline: Option<Timeline>,

    stats: DemuxStats,
}

impl Default for Demuxer {
    fn default() -> Self {
        Self::new(DemuxConfig::default())
    }
}

impl Demuxer {
    pub fn new(config: DemuxConfig) -> Self {
        let out_ssrc = config
            .ssrc
            .or_else(|| config.randomize_ssrc.then(rand::random::<u32>));
        if let Some(ssrc) = out_ssrc {
            debug!(ssrc, "rewriting output SSRC");
        }
        Self {
            config,
            out_ssrc,
            state: State::WaitingHeader,
            format: None,
            metadata: None,
            pending: 0,
            buffer: BytesMut::with_capacity(MAX_RECORD_SIZE),
            ssrc: None,
            media: None,
            timeline: None,
            stats: DemuxStats::default(),
        }
    }

    /// Feed the next chunk of the container.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<DemuxEvent> {
        let mut events = Vec::new();
        self.feed_into(chunk, &mut events);
        events
    }

    /// Like [`Demuxer::feed`], appending to a caller-owned event list.
    pub fn feed_into(&mut self, mut chunk: &[u8], events: &mut Vec<DemuxEvent>) {
        if self.state == State::Failed {
            return;
        }
        if self.config.verbose {
            debug!(len = chunk.len(), state = ?self.state, "got chunk");
        } else {
            trace!(len = chunk.len(), state = ?self.state, "got chunk");
        }

        loop {
            let n = self.pending.min(chunk.len());
            self.buffer.extend_from_slice(&chunk[..n]);
            chunk = &chunk[n..];
            self.pending -= n;
            self.stats.bytes += n as u64;
            if self.pending > 0 {
                return;
            }

            if let Err(err) = self.advance(events) {
                warn!(state = ?self.state, "demux failed: {}", err);
                self.state = State::Failed;
                self.buffer = BytesMut::new();
                events.push(DemuxEvent::Error(err));
                return;
            }
        }
    }

    /// Act on the field that was just completed and request the next one.
    fn advance(&mut self, events: &mut Vec<DemuxEvent>) -> Result<()> {
        match self.state {
            State::WaitingHeader => self.request(State::ReadingHeader, HEADER_LEN),
            State::ReadingHeader => {
                let format = Format::detect(&self.buffer)?;
                info!(?format, "MJR header");
                self.format = Some(format);
                match format {
                    Format::Current => self.request(State::WaitingMetaLength, METADATA_LENGTH_LEN),
                    Format::Legacy => self.request(State::ReadingMeta, LEGACY_MARKER_LEN),
                }
            }
            State::WaitingMetaLength => {
                let length = u16::from_be_bytes([self.buffer[0], self.buffer[1]]) as usize;
                if length > MAX_RECORD_SIZE {
                    return Err(Error::MetadataTooLarge(length));
                }
                self.request(State::ReadingMeta, length);
            }
            State::ReadingMeta => {
                if self.format == Some(Format::Legacy) {
                    return self.read_legacy_marker();
                }
                let metadata = Metadata::parse(&self.buffer)?;
                info!(
                    kind = %metadata.kind,
                    codec = %metadata.codec,
                    created = metadata.created,
                    written = metadata.written,
                    "MJR metadata"
                );
                self.metadata = Some(metadata);
                self.request(State::WaitingRecordPrefix, RECORD_PREFIX_LEN);
            }
            State::SkippingLegacyMeta => self.request(State::WaitingRecordPrefix, RECORD_PREFIX_LEN),
            State::WaitingRecordPrefix => {
                let prefix = RecordPrefix::parse(&self.buffer)?;
                self.request(State::ReadingRecordPayload, prefix.length);
            }
            State::ReadingRecordPayload => {
                self.read_packet(events)?;
                self.request(State::WaitingRecordPrefix, RECORD_PREFIX_LEN);
            }
            State::Failed => {}
        }
        Ok(())
    }

    fn request(&mut self, state: State, length: usize) {
        self.state = state;
        self.pending = length;
        self.buffer.clear();
        self.buffer.reserve(length);
    }

    fn read_legacy_marker(&mut self) -> Result<()> {
        // Legacy recorders wrote a length (always 5) followed by "audio" or
        // "video"; a bare marker is accepted as well.
        let (marker, rest) = match &self.buffer[..] {
            [0x00, 0x05, marker @ (b'a' | b'v'), ..] => (*marker, METADATA_LENGTH_LEN),
            [marker, ..] => (*marker, 0),
            [] => return Err(Error::UnsupportedMedia(String::new())),
        };
        let metadata = Metadata::legacy(marker)?;
        info!(kind = %metadata.kind, codec = %metadata.codec, "legacy MJR, codec assumed");
        self.metadata = Some(metadata);
        if rest > 0 {
            self.request(State::SkippingLegacyMeta, rest);
        } else {
            self.request(State::WaitingRecordPrefix, RECORD_PREFIX_LEN);
        }
        Ok(())
    }

    fn read_packet(&mut self, events: &mut Vec<DemuxEvent>) -> Result<()> {
        let Some(header) = RtpHeader::parse(&self.buffer) else {
            self.stats.dropped_short += 1;
            debug!(len = self.buffer.len(), "dropping record shorter than an RTP header");
            return Ok(());
        };
        if self.config.verbose {
            debug!(seq = header.sequence_number, ts = header.timestamp, "RTP packet");
        } else {
            trace!(seq = header.sequence_number, ts = header.timestamp, "RTP packet");
        }

        let ssrc = *self.ssrc.get_or_insert(header.ssrc);
        if header.ssrc != ssrc {
            self.stats.dropped_ssrc += 1;
            debug!(expected = ssrc, found = header.ssrc, "dropping packet from another flow");
            return Ok(());
        }

        if self.timeline.is_none() {
            let media = self.describe(header.payload_type)?;
            info!(
                kind = %media.kind,
                encoding = media.encoding_name,
                clock_rate = media.clock_rate,
                payload_type = media.payload_type,
                ssrc,
                "media described"
            );
            self.timeline = Some(Timeline::new(media.clock_rate, header.timestamp));
            self.media = Some(media.clone());
            events.push(DemuxEvent::MediaDescribed(media));
        }
        let timestamp = self
            .timeline
            .as_mut()
            .map_or(Duration::ZERO, |timeline| timeline.advance(header.timestamp));
        if self.config.verbose {
            debug!(?timestamp, "computed timestamp");
        }

        let mut data = self.buffer.split();
        if let Some(out) = self.out_ssrc {
            rewrite_ssrc(&mut data, out);
        }
        self.stats.packets += 1;
        events.push(DemuxEvent::Packet(Packet {
            data: data.freeze(),
            timestamp,
        }));
        Ok(())
    }

    fn describe(&self, payload_type: u8) -> Result<MediaDescription> {
        let metadata = self.metadata.as_ref().ok_or(Error::MediaNotSet)?;
        let legacy = self.format == Some(Format::Legacy);
        Ok(MediaDescription {
            kind: metadata.kind,
            codec: metadata.codec,
            codec_name: metadata.codec.name(),
            encoding_name: metadata.codec.encoding_name(),
            clock_rate: metadata.codec.clock_rate(),
            payload_type,
            created: (!legacy).then_some(metadata.created),
            written: (!legacy).then_some(metadata.written),
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_failed(&self) -> bool {
        self.state == State::Failed
    }

    pub fn format(&self) -> Option<Format> {
        self.format
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Available once the first packet was accepted.
    pub fn media(&self) -> Option<&MediaDescription> {
        self.media.as_ref()
    }

    /// SSRC written into emitted packets, if any.
    pub fn output_ssrc(&self) -> Option<u32> {
        self.out_ssrc
    }

    pub fn stats(&self) -> DemuxStats {
        self.stats
    }
}
