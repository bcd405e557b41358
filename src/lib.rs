//! Demuxer and muxer for Janus MJR recordings.
//!
//! An MJR container holds a single RTP stream: an 8 byte header, one
//! metadata record, then one length-prefixed record per RTP packet.
//!
//! - [`Demuxer`] turns arbitrarily fragmented container bytes back into RTP
//!   packets with relative timestamps.
//! - [`Muxer`] writes RTP packets into a new container.
//!
//! Both are synchronous and single-stream; run one per container.

mod codec;
mod demux;
mod error;
mod mux;
pub mod record;
pub mod rtp;

pub use codec::{describe, resolve, Codec, MediaKind};
pub use demux::{
    DemuxConfig, DemuxEvent, DemuxStats, Demuxer, MediaDescription, Packet, State,
};
pub use error::{Error, ErrorKind, Result};
pub use mux::Muxer;
