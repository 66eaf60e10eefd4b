//! Data socket module to receive landmark streams via network.
//!
//! Every connection announces its channel with a `ConnectReq` and then sends
//! one `LandmarkMsg` per camera frame. The connection owns a translation
//! session for its whole lifetime and publishes each new label on the
//! channel's broadcast.
use std::{net::SocketAddr, sync::Arc};

use anyhow::{bail, Result};
use common::protocol::ProtoMsg;
use futures::StreamExt;
use tokio::{
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::{
    meter::{FrameOutcome, Meter},
    nn::InferModel,
    pubsub::{LabelSender, NamedPubSub},
    session::{SessionFactory, TranslationSession},
};

/// Bind the data socket and accept connections in a separate task.
///
/// Returns the bound address, which differs from `addr` when binding to port 0.
pub async fn spawn_data_socket<M: InferModel + 'static>(
    factory: Arc<SessionFactory<M>>,
    pubsub: Arc<NamedPubSub>,
    meter: Arc<Meter>,
    addr: &str,
) -> Result<(SocketAddr, JoinHandle<Result<()>>)> {
    let socket: SocketAddr = addr.parse()?;
    let listener = TcpListener::bind(socket).await?;
    let local_addr = listener.local_addr()?;
    log::info!("Listening for landmark streams on {}", &local_addr);

    let handle: JoinHandle<Result<()>> = tokio::spawn(async move {
        loop {
            let (socket, _peer_addr) = listener.accept().await?;
            let factory = Arc::clone(&factory);
            let pubsub = Arc::clone(&pubsub);
            let meter = Arc::clone(&meter);
            tokio::spawn(async move {
                if let Err(e) = handle_incoming(factory, pubsub, meter, socket).await {
                    log::warn!("Connection closed with error: {e:#}");
                }
            });
        }
    });

    Ok((local_addr, handle))
}

async fn handle_incoming<M: InferModel>(
    factory: Arc<SessionFactory<M>>,
    pubsub: Arc<NamedPubSub>,
    meter: Arc<Meter>,
    stream: TcpStream,
) -> Result<()> {
    let addr = stream.peer_addr()?;
    log::info!("{}: New TCP connection", &addr);

    let mut transport = Framed::new(stream, LengthDelimitedCodec::new());

    let channel_name = {
        if let Some(Ok(data)) = transport.next().await {
            if let Ok(ProtoMsg::ConnectReq(channel)) = ProtoMsg::deserialize(&data) {
                channel
            } else {
                bail!("no channel name");
            }
        } else {
            bail!("no channel name");
        }
    };

    log::info!("{}: Translating channel {}", &addr, &channel_name);
    let mut session = factory.create(&channel_name)?;
    let sender = pubsub.publish(&channel_name).await;

    translate(&mut transport, &mut session, &sender, &meter).await;

    drop(sender);
    pubsub.release_publisher(&channel_name).await;
    log::info!("{}: TCP stream ended", &addr);
    Ok(())
}

async fn translate<M: InferModel>(
    transport: &mut Framed<TcpStream, LengthDelimitedCodec>,
    session: &mut TranslationSession<M>,
    sender: &LabelSender,
    meter: &Meter,
) {
    // Labels borrow the session, keep an owned copy of its name
    let name = session.name().to_owned();

    while let Some(res) = transport.next().await {
        let data = match res {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Error in TCP codec: {e}");
                break;
            }
        };

        match ProtoMsg::deserialize(&data) {
            Ok(ProtoMsg::LandmarkMsg(msg)) => {
                let res = session.process_landmarks(msg.landmarks.as_deref());
                meter.record(
                    &name,
                    FrameOutcome::classify(msg.landmarks.is_some(), &res),
                );
                match res {
                    Ok(Some(label)) => {
                        if sender.send(label.to_owned()).is_err() {
                            log::debug!("No listener for channel {}", &name);
                        }
                    }
                    Ok(None) => (),
                    Err(e) => log::warn!("{}: Rejected frame: {e}", &name),
                }
            }
            Ok(ProtoMsg::Reset) => session.reset(),
            Ok(ProtoMsg::ConnectReq(channel)) => {
                log::warn!("{}: Ignoring second connect request for {}", &name, channel)
            }
            Err(e) => log::warn!("{}: Undecodable message: {e}", &name),
        }
    }
}
