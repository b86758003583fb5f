//! 网关路由

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::catch_panic::CatchPanicLayer;

use super::error::panic_response;
use super::handlers::{generate, generate_stream, health, ready};
use super::middleware::request_context_middleware;
use crate::audit::AuditSink;
use crate::service::GenerationService;

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 生成服务
    pub service: GenerationService,
    /// 审计 sink（进程内唯一）
    pub audit: Arc<AuditSink>,
    /// 请求未指定 model 时的默认模型
    pub default_model: String,
}

impl AppState {
    pub fn new(service: GenerationService, audit: Arc<AuditSink>) -> Self {
        Self {
            service,
            audit,
            default_model: "phi3:mini".to_string(),
        }
    }

    /// 设置默认模型
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }
}

/// 创建网关路由
///
/// # 端点
/// - `GET /health` - 存活检查
/// - `GET /ready` - 就绪检查
/// - `POST /generate` - 非流式生成
/// - `POST /generate/stream` - 流式生成（text/event-stream）
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/generate", post(generate))
        .route("/generate/stream", post(generate_stream))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(request_context_middleware))
        .with_state(state)
}
