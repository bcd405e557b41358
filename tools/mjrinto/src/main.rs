use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use cli::Codec;
use mjr::{ErrorKind, Muxer};
use tokio::{fs::File, io::AsyncWriteExt, net::UdpSocket};
use tracing::{debug, info, trace, warn};
use webrtc::{rtp, util::Unmarshal};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Verbose mode [default: "warn", -v "info", -vv "debug", -vvv "trace"]
    #[arg(short = 'v', action = ArgAction::Count, default_value_t = 0)]
    verbose: u8,
    #[arg(long, default_value_t = String::from("0.0.0.0"))]
    host: String,
    #[arg(short, long, default_value_t = 0)]
    port: u16,
    #[arg(short, long, value_enum)]
    codec: Codec,
    /// MJR recording to create, an existing file is truncated
    #[arg(short, long)]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    utils::set_log(format!(
        "{},webrtc=error",
        utils::log_filter("mjrinto", utils::verbosity_level(args.verbose))
    ));

    let codec: mjr::Codec = args.codec.into();
    let mut muxer = Muxer::now();
    muxer.set_media(codec.kind(), codec.name())?;

    let listener = UdpSocket::bind(format!("{}:{}", args.host, args.port)).await?;
    println!("=== RTP listener started : {} ===", listener.local_addr()?);
    let mut file = File::create(&args.output)
        .await
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    tokio::select! {
        result = rtp_listener(&listener, &mut muxer, &mut file) => result?,
        signal = utils::wait_for_stop_signal() => {
            info!("Received signal: {}", signal?);
        }
    }
    file.flush().await?;

    println!(
        "=== {} {} packets written to {} ===",
        muxer.packets(),
        codec,
        args.output.display()
    );
    Ok(())
}

async fn rtp_listener(socket: &UdpSocket, muxer: &mut Muxer, file: &mut File) -> Result<()> {
    let mut inbound_rtp_packet = vec![0u8; 1600];
    loop {
        let (n, addr) = socket.recv_from(&mut inbound_rtp_packet).await?;
        let data = &inbound_rtp_packet[..n];

        let mut buf = data;
        let packet = match rtp::packet::Packet::unmarshal(&mut buf) {
            Ok(packet) => packet,
            Err(err) => {
                debug!("dropping datagram from {}: {}", addr, err);
                continue;
            }
        };
        trace!(
            seq = packet.header.sequence_number,
            ts = packet.header.timestamp,
            ssrc = packet.header.ssrc,
            pt = packet.header.payload_type,
            "RTP packet"
        );

        match muxer.write(data) {
            Ok(record) => {
                file.write_all(&record).await?;
                if muxer.packets() == 1 {
                    info!("recording started, first packet from {}", addr);
                }
            }
            Err(err) if err.kind() == ErrorKind::Framing => warn!("{}", err),
            Err(err) => return Err(err.into()),
        }
    }
}
