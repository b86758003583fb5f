//! 上游推理守护进程客户端
//!
//! 协议：`POST {base_url}/api/generate`，流式模式下返回逐行 JSON（NDJSON）

pub mod client;
pub mod error;
pub mod ndjson;
pub mod types;

pub use client::{FragmentStream, OllamaClient};
pub use error::UpstreamError;
