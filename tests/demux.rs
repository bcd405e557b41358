use std::time::Duration;

use mjr::{Codec, DemuxEvent, Demuxer, Error, ErrorKind, MediaKind};

mod common;
use common::{
    container, demux_chunks, demux_whole, random_chunks, record, rtp_packet, split_events,
};

const OPUS_META: &[u8] = br#"{"t":"a","c":"opus","s":100,"u":200}"#;
const VP8_META: &[u8] = br#"{"t":"v","c":"vp8","s":100,"u":200}"#;

fn opus_packets(timestamps: &[u32]) -> Vec<Vec<u8>> {
    timestamps
        .iter()
        .enumerate()
        .map(|(i, ts)| rtp_packet(0x1234, i as u16, *ts, 111, &[0xfc, i as u8]))
        .collect()
}

#[test]
fn test_single_opus_packet() {
    let packet = rtp_packet(0x1234, 1, 1000, 111, &[]);
    assert_eq!(packet.len(), 12);
    let input = container(OPUS_META, &[packet.clone()]);

    let events = demux_whole(&input);
    assert_eq!(events.len(), 2, "{events:?}");
    let DemuxEvent::MediaDescribed(media) = &events[0] else {
        panic!("expected media description first, got {events:?}");
    };
    assert_eq!(media.kind, MediaKind::Audio);
    assert_eq!(media.codec, Codec::Opus);
    assert_eq!(media.codec_name, "opus");
    assert_eq!(media.encoding_name, "OPUS");
    assert_eq!(media.clock_rate, 48_000);
    assert_eq!(media.payload_type, 111);
    assert_eq!(media.created, Some(100));
    assert_eq!(media.written, Some(200));

    let DemuxEvent::Packet(out) = &events[1] else {
        panic!("expected packet, got {events:?}");
    };
    assert_eq!(out.timestamp, Duration::ZERO);
    assert_eq!(&out.data[..], &packet[..]);
}

#[test]
fn test_second_packet_one_second_later() {
    let input = container(OPUS_META, &opus_packets(&[1000, 1000 + 48_000]));
    let demuxed = split_events(demux_whole(&input));
    assert_eq!(demuxed.media.len(), 1);
    assert_eq!(demuxed.packets.len(), 2);
    assert_eq!(demuxed.packets[0].timestamp.as_micros(), 0);
    assert_eq!(demuxed.packets[1].timestamp.as_micros(), 1_000_000);
}

#[test]
fn test_fragmentation_invariance() {
    let input = container(
        VP8_META,
        &(0..5u32)
            .map(|i| rtp_packet(0xabcd, i as u16, i * 3000, 96, &vec![i as u8; 20 + i as usize]))
            .collect::<Vec<_>>(),
    );
    let expected = demux_whole(&input);
    assert_eq!(expected.len(), 6);

    for split in 0..=input.len() {
        let (a, b) = input.split_at(split);
        assert_eq!(demux_chunks([a, b]), expected, "split at {split}");
    }

    assert_eq!(demux_chunks(input.chunks(1)), expected);

    for seed in 0..32 {
        let chunks = random_chunks(&input, seed, 17);
        assert_eq!(demux_chunks(chunks), expected, "seed {seed}");
    }
}

#[test]
fn test_fragmented_errors_match() {
    let mut input = container(VP8_META, &[rtp_packet(1, 0, 0, 96, &[1, 2, 3])]);
    input.extend_from_slice(b"MEAT\0\0\0\0\x00\x01x");
    let expected = demux_whole(&input);
    assert!(matches!(expected.last(), Some(DemuxEvent::Error(_))));
    assert_eq!(demux_chunks(input.chunks(1)), expected);
    for seed in 0..8 {
        assert_eq!(demux_chunks(random_chunks(&input, seed, 5)), expected);
    }
}

#[test]
fn test_timestamps_are_monotonic() {
    let timestamps = [5000, 5960, 5960, 6920, 9000, 48_000 * 3];
    let input = container(OPUS_META, &opus_packets(&timestamps));
    let demuxed = split_events(demux_whole(&input));
    assert_eq!(demuxed.packets.len(), timestamps.len());
    assert_eq!(demuxed.packets[0].timestamp, Duration::ZERO);
    for pair in demuxed.packets.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
    assert_eq!(demuxed.packets[1].timestamp, Duration::from_millis(20));
    assert_eq!(demuxed.packets[2].timestamp, Duration::from_millis(20));
}

#[test]
fn test_timestamp_wraparound() {
    let start = u32::MAX - 959;
    let timestamps = [start, start.wrapping_add(960), start.wrapping_add(1920)];
    assert_eq!(timestamps[1], 0);
    let input = container(OPUS_META, &opus_packets(&timestamps));
    let demuxed = split_events(demux_whole(&input));
    let times: Vec<_> = demuxed.packets.iter().map(|p| p.timestamp).collect();
    assert_eq!(
        times,
        vec![
            Duration::ZERO,
            Duration::from_millis(20),
            Duration::from_millis(40)
        ]
    );
}

#[test]
fn test_record_length_bound() {
    let mut input = container(OPUS_META, &[]);
    input.extend_from_slice(b"MEET\0\0\0\0");
    input.extend_from_slice(&1501u16.to_be_bytes());
    input.extend(vec![0u8; 1501]);

    let demuxed = split_events(demux_whole(&input));
    assert!(demuxed.packets.is_empty());
    assert!(demuxed.media.is_empty());
    let err = demuxed.error.expect("length 1501 must be rejected");
    assert_eq!(err, Error::PacketTooLarge(1501));
    assert_eq!(err.kind(), ErrorKind::Framing);
}

#[test]
fn test_record_of_max_length_is_accepted() {
    let packet = rtp_packet(3, 0, 0, 96, &vec![7u8; 1500 - 12]);
    let input = container(VP8_META, &[packet]);
    let demuxed = split_events(demux_whole(&input));
    assert_eq!(demuxed.packets.len(), 1);
    assert_eq!(demuxed.packets[0].data.len(), 1500);
    assert!(demuxed.error.is_none());
}

#[test]
fn test_metadata_length_bound() {
    let mut input = b"MJR00002".to_vec();
    input.extend_from_slice(&1501u16.to_be_bytes());
    input.extend(vec![b' '; 1501]);
    let demuxed = split_events(demux_whole(&input));
    assert!(demuxed.packets.is_empty());
    let err = demuxed.error.expect("length 1501 must be rejected");
    assert_eq!(err.kind(), ErrorKind::Metadata);
}

#[test]
fn test_flow_filtering() {
    let packets = vec![
        rtp_packet(0xaaaa, 0, 1000, 111, b"a0"),
        rtp_packet(0xbbbb, 0, 777_777, 111, b"b0"),
        rtp_packet(0xaaaa, 1, 1960, 111, b"a1"),
        rtp_packet(0xbbbb, 1, 5, 111, b"b1"),
        rtp_packet(0xaaaa, 2, 2920, 111, b"a2"),
    ];
    let input = container(OPUS_META, &packets);

    let mut demuxer = Demuxer::default();
    let demuxed = split_events(demuxer.feed(&input));
    assert_eq!(demuxed.media.len(), 1);
    assert!(demuxed.error.is_none());

    let payloads: Vec<_> = demuxed.packets.iter().map(|p| &p.data[12..]).collect();
    assert_eq!(payloads, vec![&b"a0"[..], &b"a1"[..], &b"a2"[..]]);
    let times: Vec<_> = demuxed.packets.iter().map(|p| p.timestamp).collect();
    assert_eq!(
        times,
        vec![
            Duration::ZERO,
            Duration::from_millis(20),
            Duration::from_millis(40)
        ]
    );

    let stats = demuxer.stats();
    assert_eq!(stats.packets, 3);
    assert_eq!(stats.dropped_ssrc, 2);
    assert_eq!(stats.bytes, input.len() as u64);
}

#[test]
fn test_invalid_tag_stops_the_session() {
    let mut input = container(OPUS_META, &opus_packets(&[0, 960]));
    input.extend_from_slice(b"MEEP\0\0\0\0\x00\x0c");
    input.extend(rtp_packet(0x1234, 9, 1920, 111, &[]));

    let mut demuxer = Demuxer::default();
    let demuxed = split_events(demuxer.feed(&input));
    assert_eq!(demuxed.packets.len(), 2);
    assert_eq!(
        demuxed.error,
        Some(Error::InvalidTag {
            found: "MEEP".to_string()
        })
    );
    assert!(demuxer.is_failed());
    assert!(demuxer.feed(&record(&rtp_packet(0x1234, 10, 2880, 111, &[]))).is_empty());
}

#[test]
fn test_header_errors() {
    let cases: Vec<(&[u8], Error)> = vec![
        (&b"RIFF\0\0\0\0"[..], Error::NotMjr(b'R')),
        (
            &b"MJR00001"[..],
            Error::UnsupportedVersion("MJR00001".to_string()),
        ),
        (
            &b"MEETECH0"[..],
            Error::UnsupportedVersion("MEETECH0".to_string()),
        ),
    ];
    for (input, expected) in cases {
        let events = demux_whole(input);
        assert_eq!(events, vec![DemuxEvent::Error(expected.clone())]);
        assert_eq!(expected.kind(), ErrorKind::Format);
    }
}

#[test]
fn test_metadata_errors() {
    let cases: Vec<(&[u8], Error)> = vec![
        (
            &br#"{"t":"d","c":"opus","s":1,"u":2}"#[..],
            Error::UnsupportedMedia("d".to_string()),
        ),
        (
            &br#"{"t":"a","c":"speex","s":1,"u":2}"#[..],
            Error::UnsupportedCodec("speex".to_string()),
        ),
    ];
    for (json, expected) in cases {
        let events = demux_whole(&container(json, &opus_packets(&[0])));
        assert_eq!(events, vec![DemuxEvent::Error(expected)]);
    }

    for json in [
        &br#"{"t":"a","c":"opus","s":1}"#[..],
        &br#"{"t":"a","c":"","s":1,"u":2}"#[..],
        &br#"["t","a"]"#[..],
        &b"{"[..],
    ] {
        let demuxed = split_events(demux_whole(&container(json, &opus_packets(&[0]))));
        assert!(demuxed.packets.is_empty());
        assert!(
            matches!(demuxed.error, Some(Error::InvalidMetadata(_))),
            "{:?}",
            demuxed.error
        );
    }
}

#[test]
fn test_no_media_description_without_packets() {
    let input = container(VP8_META, &[]);
    let mut demuxer = Demuxer::default();
    assert!(demuxer.feed(&input).is_empty());
    assert!(demuxer.media().is_none());
    assert_eq!(demuxer.metadata().map(|m| m.codec), Some(Codec::Vp8));
}

#[test]
fn test_legacy_container() {
    let mut input = b"MEETECHO\x00\x05video".to_vec();
    for i in 0..3u32 {
        let packet = rtp_packet(42, i as u16, 90_000 * i, 100, &[i as u8]);
        input.extend_from_slice(b"MEETECHO");
        input.extend_from_slice(&(packet.len() as u16).to_be_bytes());
        input.extend(packet);
    }

    let demuxed = split_events(demux_chunks(input.chunks(3)));
    assert!(demuxed.error.is_none());
    assert_eq!(demuxed.media.len(), 1);
    assert_eq!(demuxed.media[0].codec, Codec::Vp8);
    assert_eq!(demuxed.media[0].clock_rate, 90_000);
    assert_eq!(demuxed.media[0].payload_type, 100);
    let times: Vec<_> = demuxed.packets.iter().map(|p| p.timestamp.as_secs()).collect();
    assert_eq!(times, vec![0, 1, 2]);
}
