//! Request handlers.
//!
//! Pipeline for chat completions: parse, reject streaming, match the model,
//! require an attached runtime, pass the admission gate, decode content,
//! bridge the inference, format the response. Validation faults never reach
//! the bridge; anything uncaught is converted to an `api_error` body at the
//! outermost boundary instead of crashing the listener.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use tracing::{error, info, warn};
use uuid::Uuid;

use lmbridge_core::ports::RunRequest;
use lmbridge_core::services::complete;
use lmbridge_core::status::{LogLevel, ServerLog};
use lmbridge_media::decode_messages;

use crate::api::{ChatCompletionRequest, ChatCompletionResponse, HealthResponse, ModelsResponse};
use crate::error::ApiError;
use crate::state::{ServerContext, SharedState};

/// `GET /health` - liveness and counters.
pub async fn health(State(context): State<SharedState>) -> Json<HealthResponse> {
    context
        .log
        .append(ServerLog::new(LogLevel::Info, "GET /health"));
    Json(HealthResponse {
        status: "ok".to_string(),
        server_running: true,
        model_loaded: context.runtime.is_attached(),
        requests_processed: context.admission.requests_processed(),
        uptime_seconds: context.uptime_seconds(),
    })
}

/// `GET /v1/models` - single-element listing for the configured model.
pub async fn list_models(State(context): State<SharedState>) -> Json<ModelsResponse> {
    context
        .log
        .append(ServerLog::new(LogLevel::Info, "GET /v1/models"));
    Json(ModelsResponse::single(&context.model_name, context.created))
}

/// Fallback for unmatched paths and methods.
pub async fn endpoint_not_found(State(context): State<SharedState>, uri: Uri) -> Response {
    let error = ApiError::NotFound(uri.path().to_string());
    warn!(path = %uri.path(), "unmatched route");
    context
        .log
        .append(ServerLog::new(LogLevel::Warning, error.to_string()));
    error.into_response()
}

/// `POST /v1/chat/completions` - the full pipeline.
///
/// The pipeline runs on its own task and the handler awaits the join
/// handle. Two properties fall out of this boundary: a client that closes
/// its connection does not abort the in-flight inference (the task detaches
/// and runs to completion, keeping the admission gate closed until the
/// runtime terminates), and a panic anywhere in the pipeline surfaces as a
/// 500 `api_error` body instead of crashing the listener.
pub async fn chat_completions(State(context): State<SharedState>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();
    context.log.append(
        ServerLog::new(LogLevel::Info, "POST /v1/chat/completions")
            .with_detail(request_id.to_string()),
    );

    let task_context = context.clone();
    let outcome =
        tokio::spawn(async move { handle_completion(&task_context, &body).await }).await;

    match outcome {
        Ok(Ok(response)) => {
            info!(request_id = %request_id, id = %response.id, "completion finished");
            context.log.append(
                ServerLog::new(LogLevel::Success, format!("completion {} finished", response.id))
                    .with_detail(request_id.to_string()),
            );
            Json(response).into_response()
        }
        Ok(Err(error)) => {
            let level = if error.is_server_fault() {
                LogLevel::Error
            } else {
                LogLevel::Warning
            };
            warn!(request_id = %request_id, error = %error, "completion failed");
            context.log.append(
                ServerLog::new(level, format!("completion failed: {error}"))
                    .with_detail(request_id.to_string()),
            );
            error.into_response()
        }
        Err(join_error) => {
            error!(request_id = %request_id, "completion task failed: {join_error}");
            context.log.append(
                ServerLog::new(LogLevel::Error, "completion handler panicked")
                    .with_detail(request_id.to_string()),
            );
            ApiError::Internal("internal server error".to_string()).into_response()
        }
    }
}

async fn handle_completion(
    context: &ServerContext,
    body: &Bytes,
) -> Result<ChatCompletionResponse, ApiError> {
    let request: ChatCompletionRequest = serde_json::from_slice(body)
        .map_err(|err| ApiError::InvalidRequest(format!("invalid request body: {err}")))?;

    if request.stream {
        return Err(ApiError::InvalidRequest(
            "streaming responses are not supported; set \"stream\" to false".to_string(),
        ));
    }
    if request.model != context.model_name {
        return Err(ApiError::UnknownModel(request.model));
    }
    let Some(runtime) = context.runtime.current() else {
        return Err(ApiError::ModelNotInitialized);
    };
    // Gate before any decoding work; the permit's Drop frees the gate on
    // every exit path below, including errors and panics.
    let Some(_permit) = context.admission.try_acquire() else {
        return Err(ApiError::Busy);
    };

    let content = decode_messages(&request.messages, &context.limits, context.log.as_ref())?;

    let run = RunRequest {
        prompt: content.text.clone(),
        images: content.images,
        audio: content.audio,
        params: request.sampling(),
    };
    let completion = complete(runtime.as_ref(), run).await?;

    Ok(ChatCompletionResponse::completed(
        &context.model_name,
        &content.text,
        completion,
    ))
}
