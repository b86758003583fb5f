//! 网关中间件：请求 ID、访问日志、处理耗时

use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const RESPONSE_TIME_HEADER: &str = "x-response-time-ms";

/// 请求上下文，由中间件注入 extensions
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    /// 请求被接受的时刻，审计耗时从这里开始计算
    pub started: Instant,
}

/// 请求上下文中间件
///
/// 沿用调用方传入的 `X-Request-ID`，没有时生成 UUID v4；
/// 响应头回写 `X-Request-ID` 与 `X-Response-Time-ms`（到响应头发出为止的耗时）
pub async fn request_context_middleware(mut request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    request.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
        started,
    });

    let span = tracing::info_span!("request", request_id = %request_id);
    async move {
        tracing::info!("REQ {} {}", method, path);

        let mut response = next.run(request).await;
        let duration_ms = started.elapsed().as_millis();

        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert(REQUEST_ID_HEADER, value);
        }
        headers.insert(RESPONSE_TIME_HEADER, HeaderValue::from(duration_ms as u64));

        tracing::info!(
            "RES {} {} {} {}ms",
            method,
            path,
            response.status().as_u16(),
            duration_ms
        );
        response
    }
    .instrument(span)
    .await
}
