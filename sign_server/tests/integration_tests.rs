use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use common::protocol::{Landmark, LandmarkMsg, ProtoMsg};
use futures::SinkExt;
use sign_server::{
    aggregator::{FeatureAggregator, FlattenedBatch},
    config::PipelineConfig,
    data_socket::spawn_data_socket,
    endpoints::router,
    labels::{LabelTable, UNKNOWN_LABEL},
    meter::Meter,
    nn::InferModel,
    pubsub::NamedPubSub,
    session::SessionFactory,
    stabilizer::PredictionStabilizer,
};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

/// Scores the class whose index is stored in the wrist `x` of the newest frame.
struct WristCodedModel;

impl InferModel for WristCodedModel {
    fn run(&self, batch: &FlattenedBatch) -> Result<Vec<f32>> {
        let newest = batch
            .frame(batch.window_size() - 1)
            .expect("batch is full");
        let mut scores = vec![0.01; 29];
        scores[newest[0] as usize] = 0.9;
        Ok(scores)
    }
}

fn hand(class: usize) -> Vec<Landmark> {
    let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0); 21];
    landmarks[0].x = class as f32;
    landmarks
}

#[test]
fn test_aggregator_steady_state() -> Result<()> {
    let mut aggregator = FeatureAggregator::new(30, 63);

    for _ in 0..29 {
        assert!(aggregator.push(vec![0.0; 63])?.is_none());
    }

    let first = aggregator.push(vec![0.0; 63])?.expect("30th push fills the window");
    assert_eq!(first.len(), 30 * 63);
    assert!(first.as_slice().iter().all(|&v| v == 0.0));

    let second = aggregator.push(vec![0.5; 63])?.expect("window stays full");
    assert_eq!(second.len(), 30 * 63);
    assert_eq!(second.frame(0), first.frame(1));
    assert_eq!(second.frame(29), Some(&[0.5; 63][..]));

    Ok(())
}

#[test]
fn test_stabilizer_running_labels() {
    let labels = Arc::new(LabelTable::default());
    let mut stabilizer = PredictionStabilizer::new(5, Arc::clone(&labels));
    assert_eq!(stabilizer.current(), UNKNOWN_LABEL);

    for index in [5, 5, 5, 6, 6] {
        let label = stabilizer.push(Some(index)).to_owned();
        assert_eq!(Some(label.as_str()), labels.get(5));
    }
}

#[test]
fn test_session_translates_landmarks() -> Result<()> {
    let factory = SessionFactory::new(
        PipelineConfig::default(),
        Arc::new(LabelTable::default()),
        Arc::new(WristCodedModel),
    )?;
    let mut session = factory.create("test")?;

    for _ in 0..29 {
        assert_eq!(session.process_landmarks(Some(hand(2).as_slice()))?, None);
    }
    assert_eq!(
        session.process_landmarks(Some(hand(2).as_slice()))?,
        Some("C")
    );

    // A flicker of another class is voted away
    assert_eq!(
        session.process_landmarks(Some(hand(26).as_slice()))?,
        Some("C")
    );
    assert_eq!(
        session.process_landmarks(Some(hand(2).as_slice()))?,
        Some("C")
    );

    Ok(())
}

#[tokio::test]
async fn test_labels_over_data_socket() -> Result<()> {
    let factory = Arc::new(SessionFactory::new(
        PipelineConfig {
            window_size: 3,
            ..Default::default()
        },
        Arc::new(LabelTable::default()),
        Arc::new(WristCodedModel),
    )?);
    let pubsub = Arc::new(NamedPubSub::new());
    let mut labels_rx = pubsub.subscribe("simon").await;

    let meter = Arc::new(Meter::new());

    let (addr, _handle) = spawn_data_socket(
        factory,
        Arc::clone(&pubsub),
        Arc::clone(&meter),
        "127.0.0.1:0",
    )
    .await?;

    let stream = TcpStream::connect(addr).await?;
    let mut transport = Framed::new(stream, LengthDelimitedCodec::new());

    let messages = [
        ProtoMsg::ConnectReq("simon".to_owned()),
        ProtoMsg::LandmarkMsg(LandmarkMsg::new("simon".to_owned(), Some(hand(19)))),
        ProtoMsg::LandmarkMsg(LandmarkMsg::new("simon".to_owned(), None)),
        ProtoMsg::LandmarkMsg(LandmarkMsg::new("simon".to_owned(), Some(hand(19)))),
        ProtoMsg::LandmarkMsg(LandmarkMsg::new("simon".to_owned(), Some(vec![]))),
        ProtoMsg::LandmarkMsg(LandmarkMsg::new("simon".to_owned(), Some(hand(19)))),
    ];
    for msg in messages.iter() {
        transport.send(bytes::Bytes::from(msg.serialize()?)).await?;
    }

    let label = tokio::time::timeout(Duration::from_secs(5), labels_rx.recv()).await??;
    assert_eq!(label, "T");

    // Reset empties the window, the next label needs three more hands
    transport
        .send(bytes::Bytes::from(ProtoMsg::Reset.serialize()?))
        .await?;
    for _ in 0..3 {
        let msg = ProtoMsg::LandmarkMsg(LandmarkMsg::new("simon".to_owned(), Some(hand(0))));
        transport.send(bytes::Bytes::from(msg.serialize()?)).await?;
    }

    let label = tokio::time::timeout(Duration::from_secs(5), labels_rx.recv()).await??;
    assert_eq!(label, "A");

    let drained = meter.drain();
    assert_eq!(drained.len(), 1);
    let (channel, counts) = &drained[0];
    assert_eq!(channel, "simon");
    assert_eq!(counts.no_hand, 1);
    assert_eq!(counts.rejected, 1);
    assert_eq!(counts.labelled, 2);

    // Closing the connection releases the channel once nobody listens
    drop(labels_rx);
    drop(transport);
    tokio::time::timeout(Duration::from_secs(5), async {
        while pubsub.len().await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;

    Ok(())
}

/// Serve the HTTP routes on an ephemeral port.
fn serve_http(pubsub: Arc<NamedPubSub>) -> SocketAddr {
    let server = axum::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
        .serve(router(pubsub).into_make_service());
    let addr = server.local_addr();
    tokio::spawn(server);
    addr
}

/// Read from a label stream until `expected` arrived.
async fn read_until(response: &mut reqwest::Response, expected: &str) -> Result<String> {
    let mut body = String::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !body.contains(expected) {
            match response.chunk().await? {
                Some(chunk) => body.push_str(std::str::from_utf8(&chunk)?),
                None => anyhow::bail!("label stream ended"),
            }
        }
        Ok::<_, anyhow::Error>(())
    })
    .await??;
    Ok(body)
}

#[tokio::test]
async fn test_healthcheck() -> Result<()> {
    let addr = serve_http(Arc::new(NamedPubSub::new()));

    let body = reqwest::get(format!("http://{addr}/healthcheck"))
        .await?
        .text()
        .await?;
    assert_eq!(body, "healthy");

    Ok(())
}

#[tokio::test]
async fn test_label_stream_over_http() -> Result<()> {
    let pubsub = Arc::new(NamedPubSub::new());
    let addr = serve_http(Arc::clone(&pubsub));

    let mut response = reqwest::get(format!("http://{addr}/labels?name=simon")).await?;
    assert_eq!(
        response.headers()[reqwest::header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );

    // The handler subscribed before the headers were sent
    let tx = pubsub.publish("simon").await;
    tx.send("X".to_owned())?;
    tx.send("Y".to_owned())?;

    let body = read_until(&mut response, "Y\n").await?;
    assert!(body.starts_with("X\nY\n"));

    Ok(())
}

#[tokio::test]
async fn test_label_stream_defaults_to_default_channel() -> Result<()> {
    let pubsub = Arc::new(NamedPubSub::new());
    let addr = serve_http(Arc::clone(&pubsub));

    let mut response = reqwest::get(format!("http://{addr}/labels")).await?;

    let tx = pubsub.publish("default").await;
    tx.send("Hello".to_owned())?;

    let body = read_until(&mut response, "Hello\n").await?;
    assert_eq!(body, "Hello\n");

    Ok(())
}

#[tokio::test]
async fn test_lagging_label_stream_keeps_going() -> Result<()> {
    let pubsub = Arc::new(NamedPubSub::new());
    let addr = serve_http(Arc::clone(&pubsub));

    let mut response = reqwest::get(format!("http://{addr}/labels?name=burst")).await?;

    // More labels than the channel holds, the stream skips what it missed
    let tx = pubsub.publish("burst").await;
    for i in 0..50 {
        tx.send(format!("{i}"))?;
    }
    tx.send("end".to_owned())?;

    let body = read_until(&mut response, "end\n").await?;
    assert!(body.ends_with("49\nend\n"));

    Ok(())
}
