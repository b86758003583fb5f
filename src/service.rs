//! 生成服务
//!
//! 网关层只依赖 [`Upstream`] trait，不直接依赖 HTTP 客户端，便于用桩替换

use std::sync::Arc;

use async_trait::async_trait;

use crate::ollama::{FragmentStream, OllamaClient, UpstreamError};

/// 文本生成上游
#[async_trait]
pub trait Upstream: Send + Sync {
    /// 非流式生成
    async fn generate_once(&self, model: &str, prompt: &str) -> Result<String, UpstreamError>;

    /// 流式生成
    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<FragmentStream, UpstreamError>;
}

#[async_trait]
impl Upstream for OllamaClient {
    async fn generate_once(&self, model: &str, prompt: &str) -> Result<String, UpstreamError> {
        OllamaClient::generate_once(self, model, prompt).await
    }

    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<FragmentStream, UpstreamError> {
        OllamaClient::generate_stream(self, model, prompt).await
    }
}

/// 生成服务，纯转发
#[derive(Clone)]
pub struct GenerationService {
    upstream: Arc<dyn Upstream>,
}

impl GenerationService {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    pub async fn generate_once(&self, model: &str, prompt: &str) -> Result<String, UpstreamError> {
        self.upstream.generate_once(model, prompt).await
    }

    pub async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<FragmentStream, UpstreamError> {
        self.upstream.generate_stream(model, prompt).await
    }
}
