//! Retrieval handler: direct artifact download or progressive SSE stream.

use super::DownloadQuery;
use crate::api::AppState;
use crate::types::{ArtifactDownload, DirectOutcome, EventPayload, ProgressEvent};
use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use std::convert::Infallible;
use tokio_stream::StreamExt;

/// GET /download - Fetch media directly or stream progress
#[utoipa::path(
    get,
    path = "/api/v1/download",
    tag = "retrieval",
    params(
        ("url" = String, Query, description = "Source page URL"),
        ("quality" = Option<String>, Query, description = "Height cap such as 720, or \"best\" (default: 720)"),
        ("audioOnly" = Option<String>, Query, description = "\"true\" to fetch the audio track only"),
        ("progress" = Option<String>, Query, description = "\"true\" to stream progress events")
    ),
    responses(
        (status = 200, description = "Artifact bytes (video/mp4 or audio/mpeg); upstream URLs as JSON when the artifact could not be produced; with progress=true a text/event-stream of EventPayload frames", body = crate::types::UrlListResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 500, description = "Download and URL resolution both failed", body = crate::error::ApiError),
        (status = 503, description = "Shutting down or extraction tool unavailable", body = crate::error::ApiError)
    )
)]
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let request = match query.to_request() {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    if query.is_progressive() {
        tracing::info!(
            url = %request.url(),
            quality = %request.quality(),
            audio_only = request.audio_only(),
            "progressive fetch requested"
        );

        return match state.orchestrator.fetch_progressive(request) {
            Ok(stream) => {
                let sse_stream =
                    stream.filter_map(|event| to_sse_event(&event).map(Ok::<_, Infallible>));
                Sse::new(sse_stream)
                    .keep_alive(KeepAlive::default())
                    .into_response()
            }
            Err(e) => e.into_response(),
        };
    }

    tracing::info!(
        url = %request.url(),
        quality = %request.quality(),
        audio_only = request.audio_only(),
        "direct fetch requested"
    );

    match state.orchestrator.fetch_direct(&request).await {
        Ok(DirectOutcome::Artifact(artifact)) => artifact_response(artifact),
        Ok(DirectOutcome::Urls(urls)) => (StatusCode::OK, Json(urls)).into_response(),
        Err(e) => e.into_response(),
    }
}

fn artifact_response(artifact: ArtifactDownload) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    let length = artifact.bytes.len().to_string();

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, length),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        artifact.bytes,
    )
        .into_response()
}

fn to_sse_event(event: &ProgressEvent) -> Option<SseEvent> {
    let payload = EventPayload::from(event);
    match serde_json::to_string(&payload) {
        Ok(json_data) => Some(SseEvent::default().event(payload.kind.as_str()).data(json_data)),
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize progress event");
            None
        }
    }
}
