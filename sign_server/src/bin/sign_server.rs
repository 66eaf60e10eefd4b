//! Sign server binary.
//!
use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use env_logger::TimestampPrecision;
use sign_server::{
    config::{PipelineConfig, DEFAULT_BUFFER_SIZE, DEFAULT_WINDOW_SIZE},
    data_socket::spawn_data_socket,
    endpoints::router,
    features::{Normalization, FEATURE_SIZE},
    labels::LabelTable,
    meter::{spawn_meter_logger, Meter},
    nn::OnnxSignModel,
    pubsub::NamedPubSub,
    session::SessionFactory,
};

#[derive(Parser, Debug)]
#[clap(author, version)]
struct Args {
    /// Address of the HTTP server streaming labels
    #[clap(long, default_value = "127.0.0.1:3000")]
    server_address: String,

    /// Address of the socket receiving landmark streams
    #[clap(long, default_value = "127.0.0.1:3001")]
    socket_address: String,

    /// Path of the ONNX hand sign model
    #[clap(long, default_value = "handsigns.onnx")]
    model: PathBuf,

    /// File with one label per line, in model output order
    #[clap(long)]
    labels: Option<PathBuf>,

    /// Frames per model input
    #[clap(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    window_size: usize,

    /// Predictions per majority vote
    #[clap(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Landmark normalization before aggregation
    #[clap(long, value_enum, default_value_t = Normalization::None)]
    normalization: Normalization,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logger
    env_logger::builder()
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    let config = PipelineConfig {
        window_size: args.window_size,
        feature_size: FEATURE_SIZE,
        buffer_size: args.buffer_size,
        normalization: args.normalization,
    };
    config.validate_for_landmarks()?;

    let labels = match &args.labels {
        Some(path) => LabelTable::from_file(path)?,
        None => LabelTable::default(),
    };

    // Load the model once, all sessions share it
    let model = OnnxSignModel::new(&args.model, config.window_size, config.feature_size)?;
    let factory = Arc::new(SessionFactory::new(
        config,
        Arc::new(labels),
        Arc::new(model),
    )?);

    // Pub/Sub-Engine between translation sessions and label streams
    let pubsub = Arc::new(NamedPubSub::new());

    let meter = Arc::new(Meter::new());

    // Create socket to receive landmark streams via network
    spawn_data_socket(
        factory,
        Arc::clone(&pubsub),
        Arc::clone(&meter),
        &args.socket_address,
    )
    .await?;

    spawn_meter_logger(meter);

    // Build HTTP server with endpoints
    let app = router(pubsub);

    // Serve HTTP server
    let addr: SocketAddr = args.server_address.parse()?;
    log::info!("Serving labels on http://{}/labels", &addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
