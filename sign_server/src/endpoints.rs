//! Endpoints of HTTP server.
//!
use std::{convert::Infallible, sync::Arc};

use axum::{
    body::StreamBody, extract::Query, http::header, response::IntoResponse, routing::get,
    Extension, Router,
};
use futures::StreamExt;
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;

use crate::pubsub::NamedPubSub;

/// HTTP routes of the display side.
pub fn router(pubsub: Arc<NamedPubSub>) -> Router {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/labels", get(label_stream))
        .layer(Extension(pubsub))
}

/// Search parameters available to streams.
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    #[serde(default)]
    name: Option<String>,
}

/// Health check endpoint.
pub async fn healthcheck() -> &'static str {
    "healthy"
}

/// Stream of labels of one channel, one label per line.
pub async fn label_stream(
    Extension(pubsub): Extension<Arc<NamedPubSub>>,
    Query(params): Query<StreamParams>,
) -> impl IntoResponse {
    let name = params.name.unwrap_or_else(|| "default".into());
    log::info!("Label stream for {} requested", &name);

    let rx = pubsub.subscribe(&name).await;

    // Lagging subscribers skip the labels they missed
    let stream = BroadcastStream::from(rx).filter_map(|res| async move {
        res.ok()
            .map(|label| Ok::<_, Infallible>(format!("{label}\n")))
    });

    let body = StreamBody::new(stream);
    let headers = [(header::CONTENT_TYPE, "text/plain; charset=utf-8")];

    (headers, body)
}
