//! 网关 HTTP 处理器

use axum::{
    Extension, Json,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use futures::{StreamExt, stream};

use super::error::ApiError;
use super::middleware::RequestContext;
use super::router::AppState;
use super::stream::AuditedStream;
use super::types::{GenerateRequest, GenerateResponse, StatusResponse};
use crate::audit::{AuditCycle, AuditGuard, AuditStatus, char_count};

pub const GENERATE_ENDPOINT: &str = "/generate";
pub const GENERATE_STREAM_ENDPOINT: &str = "/generate/stream";

/// GET /health
pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        message: "The local llm api server is up and running",
    })
}

/// GET /ready
pub async fn ready() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ready",
        message: "The local llm api server is ready to take requests",
    })
}

/// POST /generate
/// 非流式生成，返回完整文本
pub async fn generate(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(payload) = payload?;
    let request = payload.accept(&state.default_model)?;

    let cycle = AuditCycle::new(
        ctx.request_id,
        GENERATE_ENDPOINT,
        &request.model,
        &request.prompt,
        false,
        ctx.started,
    );
    let mut guard = AuditGuard::new(cycle, state.audit.clone());

    match state
        .service
        .generate_once(&request.model, &request.prompt)
        .await
    {
        Ok(text) => {
            guard.add_delivered(char_count(&text));
            guard.finish(AuditStatus::Ok);
            Ok(Json(GenerateResponse {
                prompt: request.prompt,
                model: request.model,
                response: text,
            }))
        }
        Err(e) => {
            guard.finish(AuditStatus::Error);
            Err(e.into())
        }
    }
}

/// POST /generate/stream
/// 流式生成，逐个转发文本片段
///
/// 第一个片段到达前的失败仍以状态码返回；开始传输后的失败只能通过中断响应流体现
pub async fn generate_stream(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let request = payload.accept(&state.default_model)?;

    let cycle = AuditCycle::new(
        ctx.request_id,
        GENERATE_STREAM_ENDPOINT,
        &request.model,
        &request.prompt,
        true,
        ctx.started,
    );
    let guard = AuditGuard::new(cycle, state.audit.clone());

    let mut fragments = match state
        .service
        .generate_stream(&request.model, &request.prompt)
        .await
    {
        Ok(fragments) => fragments,
        Err(e) => {
            guard.finish(AuditStatus::Error);
            return Err(e.into());
        }
    };

    let first = match fragments.next().await {
        Some(Ok(text)) => Some(text),
        Some(Err(e)) => {
            guard.finish(AuditStatus::Error);
            return Err(e.into());
        }
        None => None,
    };

    let fragments = stream::iter(first.map(Ok)).chain(fragments).boxed();
    let body = AuditedStream::new(fragments, guard, tracing::Span::current());

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body),
    )
        .into_response())
}
