//! 网关错误映射
//!
//! - `bad_request` (400)：校验信息原样返回
//! - `upstream_error` (502)：细节只写服务端日志
//! - `internal_server_error` (500)：handler panic，细节只写服务端日志

use std::any::Any;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::ollama::UpstreamError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

fn upstream_error_response() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(serde_json::json!({
            "error": "upstream_error",
            "detail": "Dependency failed"
        })),
    )
        .into_response()
}

fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "internal_server_error",
            "detail": "An unexpected error occurred"
        })),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => {
                tracing::warn!("请求校验失败: {}", message);
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                        "error": "bad_request",
                        "message": message
                    })),
                )
                    .into_response()
            }
            Self::Upstream(e) => {
                tracing::error!("上游调用失败: {}", e);
                upstream_error_response()
            }
        }
    }
}

/// handler panic 时的响应（CatchPanicLayer）
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "未知 panic".to_string()
    };
    tracing::error!("handler panic: {}", detail);
    internal_error_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_exposes_message() {
        let response = ApiError::BadRequest("prompt must not be empty".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["message"], "prompt must not be empty");
    }

    #[tokio::test]
    async fn test_upstream_error_hides_detail() {
        let err = UpstreamError::Connect("tcp connect error: 10.0.0.7:11434".to_string());
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "upstream_error");
        assert_eq!(body["detail"], "Dependency failed");
        assert!(!body.to_string().contains("10.0.0.7"));
    }

    #[tokio::test]
    async fn test_panic_response() {
        let response = panic_response(Box::new("secret path /var/lib/x"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "internal_server_error");
        assert_eq!(body["detail"], "An unexpected error occurred");
        assert!(!body.to_string().contains("/var/lib/x"));
    }
}
