use std::{path::PathBuf, time::Duration};

use clap::Parser;
use common::protocol::{LandmarkMsg, ProtoMsg};
use env_logger::TimestampPrecision;
use futures::sink::SinkExt;
use landmark_sender::{recording::Recording, Error};
use tokio::{net::TcpStream, time::MissedTickBehavior};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

#[derive(Parser, Debug)]
#[clap(author, version)]
struct Args {
    /// Address of the sign server data socket
    #[clap(long, default_value = "127.0.0.1:3001")]
    address: String,

    /// Channel name that this sender publishes to
    #[clap(long, default_value = "default")]
    channel: String,

    /// JSON lines file with one detector result per frame
    #[clap(long)]
    recording: PathBuf,

    /// Frames per second to replay at
    #[clap(long, default_value_t = 30)]
    fps: u32,

    /// Replay the recording in a loop, resetting the session between passes
    #[clap(long)]
    repeat: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    env_logger::builder()
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    log::info!("Launching landmark sender for channel {}", &args.channel);

    let recording = Recording::from_file(&args.recording)?;
    if recording.is_empty() {
        return Err(format!("{} holds no frames", args.recording.display()).into());
    }

    let stream = TcpStream::connect(&args.address).await?;
    log::info!("Client connected to {}", &args.address);

    // Wrap stream in transport handler with length-delimited codec
    let mut transport = Framed::new(stream, LengthDelimitedCodec::new());

    // Send init message
    let init_msg = ProtoMsg::ConnectReq(args.channel.clone()).serialize()?;
    transport.send(bytes::Bytes::from(init_msg)).await?;

    // Pace frames like a camera would deliver them
    let mut frame_interval = tokio::time::interval(Duration::from_secs(1) / args.fps.max(1));
    frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut pass = 0;
    loop {
        for frame in recording.frames() {
            frame_interval.tick().await;

            let data = ProtoMsg::LandmarkMsg(LandmarkMsg::new(args.channel.clone(), frame.clone()));
            transport.send(bytes::Bytes::from(data.serialize()?)).await?;
        }

        pass += 1;
        log::info!("Finished pass {} over {} frames", pass, recording.len());

        if !args.repeat {
            break;
        }
        transport
            .send(bytes::Bytes::from(ProtoMsg::Reset.serialize()?))
            .await?;
    }

    Ok(())
}
