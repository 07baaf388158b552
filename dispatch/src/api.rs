use crate::Dispatcher;
use crate::record::{Identity, RawEvent};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

#[derive(Deserialize, Debug)]
struct EnqueueRequest {
    #[serde(flatten)]
    identity: Identity,
    #[serde(flatten)]
    event: RawEvent,
}

#[derive(Serialize)]
struct EnqueueResponse {
    #[serde(rename = "messageId")]
    message_id: String,
}

impl IntoResponse for EnqueueResponse {
    fn into_response(self) -> Response {
        (StatusCode::ACCEPTED, Json(self)).into_response()
    }
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error_message: String,
}

pub fn router(dispatcher: Dispatcher) -> Router {
    Router::new()
        .route("/v1/records", post(enqueue))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(dispatcher)
}

pub async fn serve(dispatcher: Dispatcher, host: &str, port: u16) -> std::io::Result<()> {
    let app = router(dispatcher);
    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    axum::serve(listener, app).await
}

async fn enqueue(
    State(dispatcher): State<Dispatcher>,
    Json(request): Json<EnqueueRequest>,
) -> Result<EnqueueResponse, Response> {
    match dispatcher.enqueue_event(request.event, request.identity) {
        Ok(message_id) => Ok(EnqueueResponse { message_id }),
        Err(e) => {
            tracing::error!(error = %e, "Enqueue rejected");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiErrorResponse {
                    error_message: e.to_string(),
                }),
            )
                .into_response())
        }
    }
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn ready(State(dispatcher): State<Dispatcher>) -> StatusCode {
    if dispatcher.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
