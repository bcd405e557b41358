use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use mjr::{DemuxEvent, Demuxer, State};
use tokio::{fs::File, io::AsyncReadExt, net::UdpSocket, time::Instant};
use tracing::{debug, info, trace, warn};

mod config;

use config::Config;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Verbose mode [default: "warn", -v "info", -vv "debug", -vvv "trace"]
    #[arg(short = 'v', action = ArgAction::Count, default_value_t = 0)]
    verbose: u8,
    /// MJR recording to read
    input: PathBuf,
    /// TOML config file, command line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,
    /// Send the extracted RTP packets to this UDP address, e.g.: 127.0.0.1:5004
    #[arg(short, long)]
    target: Option<SocketAddr>,
    /// Rewrite the SSRC of every packet
    #[arg(long)]
    ssrc: Option<u32>,
    /// Rewrite the SSRC of every packet with a random value
    #[arg(long)]
    randomize_ssrc: bool,
    /// Send packets at their recorded pace
    #[arg(long)]
    realtime: bool,
    /// Bytes read from the file at a time
    #[arg(long)]
    chunk_size: Option<usize>,
}

impl Args {
    fn merge(&self, mut cfg: Config) -> Config {
        if self.target.is_some() {
            cfg.output.target = self.target;
        }
        if self.ssrc.is_some() {
            cfg.demux.ssrc = self.ssrc;
        }
        cfg.demux.randomize_ssrc |= self.randomize_ssrc;
        cfg.output.realtime |= self.realtime;
        if let Some(chunk_size) = self.chunk_size {
            cfg.output.chunk_size = chunk_size;
        }
        cfg
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = args.merge(Config::load(args.config.as_deref())?);
    cfg.validate()?;

    let level = match args.verbose {
        0 => cfg.log.level.clone(),
        n => utils::verbosity_level(n).to_string(),
    };
    utils::set_log(utils::log_filter("mjrfrom", level));

    let mut file = File::open(&args.input)
        .await
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let socket = match cfg.output.target {
        Some(target) => {
            let bind = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
            let socket = UdpSocket::bind(bind).await?;
            socket.connect(target).await?;
            println!("=== RTP sender started : {} ===", target);
            Some(socket)
        }
        None => None,
    };

    let mut demuxer = Demuxer::new(cfg.demux.clone());
    tokio::select! {
        result = forward(&mut file, &mut demuxer, socket.as_ref(), &cfg) => result?,
        signal = utils::wait_for_stop_signal() => {
            info!("Received signal: {}", signal?);
        }
    }

    let stats = demuxer.stats();
    match demuxer.media() {
        Some(media) => println!(
            "=== {} {} clock_rate={} payload_type={} ===",
            media.kind, media.encoding_name, media.clock_rate, media.payload_type
        ),
        None => println!("=== no media ==="),
    }
    println!(
        "=== packets={} dropped_ssrc={} dropped_short={} bytes={} ===",
        stats.packets, stats.dropped_ssrc, stats.dropped_short, stats.bytes
    );
    Ok(())
}

async fn forward(
    file: &mut File,
    demuxer: &mut Demuxer,
    socket: Option<&UdpSocket>,
    cfg: &Config,
) -> Result<()> {
    let mut buf = vec![0u8; cfg.output.chunk_size];
    let mut events = Vec::new();
    let mut start: Option<Instant> = None;

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        demuxer.feed_into(&buf[..n], &mut events);

        for event in events.drain(..) {
            match event {
                DemuxEvent::MediaDescribed(media) => {
                    info!(
                        "{} {} clock_rate={} payload_type={} created={:?}",
                        media.kind,
                        media.encoding_name,
                        media.clock_rate,
                        media.payload_type,
                        media.created
                    );
                }
                DemuxEvent::Packet(packet) => {
                    trace!(len = packet.data.len(), timestamp = ?packet.timestamp, "packet");
                    let Some(socket) = socket else {
                        continue;
                    };
                    if cfg.output.realtime {
                        let start = *start.get_or_insert_with(Instant::now);
                        tokio::time::sleep_until(start + packet.timestamp).await;
                    }
                    if let Err(err) = socket.send(&packet.data).await {
                        debug!("RTP send error: {}", err);
                    }
                }
                DemuxEvent::Error(err) => {
                    return Err(err).context("failed to demux recording");
                }
            }
        }
    }

    if demuxer.state() != State::WaitingRecordPrefix {
        warn!(state = ?demuxer.state(), "recording ends in the middle of a field");
    }
    Ok(())
}
