//! Song and cover-art streaming handlers.
//!
//! Separated from the REST handlers because they own byte sources: each
//! handler runs the service pipeline, then hands the plan to the
//! [`Streamer`](crate::stream::Streamer) which takes over the open source.

use std::net::SocketAddr;

use axum::{
    extract::{connect_info::ConnectInfo, Path, State},
    http::{header, Extensions, HeaderMap, Uri},
    response::Response,
};

use crate::api::AppState;
use crate::error::{StreamError, StreamResult};
use crate::stream::guard::client_label;

/// `GET /song/{id}`: whole song, or a byte range of it.
pub(super) async fn stream_song(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    extensions: Extensions,
) -> StreamResult<Response> {
    let client = client_addr(&extensions);
    let range = range_header(&headers)?;

    if let Some(range) = range {
        log::debug!(
            "[Stream] Range request: client={}, song={}, range='{}'",
            client_label(client),
            id,
            range
        );
    } else {
        log::info!(
            "[Stream] New connection: client={}, song={}",
            client_label(client),
            id
        );
    }

    let plan = state.media.song_plan(Some(&id), range).await?;
    state.streamer.respond(plan, client).await
}

/// `GET /art/{id}`: cover art, always whole.
pub(super) async fn stream_art(
    Path(id): Path<String>,
    State(state): State<AppState>,
    extensions: Extensions,
) -> StreamResult<Response> {
    let client = client_addr(&extensions);
    log::debug!("[Stream] Art requested: client={}, song={}", client_label(client), id);

    let plan = state.media.art_plan(Some(&id)).await?;
    state.streamer.respond(plan, client).await
}

/// `/song` and `/art` without an id segment.
pub(super) async fn missing_id(uri: Uri) -> StreamError {
    log::debug!("[Stream] Request without id: {}", uri.path());
    let what = if uri.path().starts_with("/art") { "art" } else { "song" };
    StreamError::BadRequest(format!("missing {} id", what))
}

/// Reads the `Range` header; a value that is not visible ASCII is malformed.
fn range_header(headers: &HeaderMap) -> StreamResult<Option<&str>> {
    headers
        .get(header::RANGE)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| StreamError::BadRequest("malformed Range header".into()))
        })
        .transpose()
}

/// Peer address, present when served with connect info.
fn client_addr(extensions: &Extensions) -> Option<SocketAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}
