//! HTTP 网关
//!
//! 校验请求、调用生成服务、返回完整 JSON 或转发流式片段，
//! 并在每个请求周期结束后把摘要交给审计 sink

pub mod error;
mod handlers;
pub mod middleware;
mod router;
mod stream;
pub mod types;

pub use router::{AppState, create_router};
