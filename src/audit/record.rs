//! 审计记录数据模型

use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 请求周期结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Ok,
    Error,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// 审计记录
///
/// 每个请求周期结束后生成一次，之后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// ISO-8601，毫秒精度，UTC
    pub timestamp: String,
    pub request_id: String,
    pub endpoint: String,
    pub model: String,
    /// 字符数
    pub prompt_length: u64,
    /// 已交付给调用方的字符数
    pub response_length: u64,
    pub status: AuditStatus,
    pub duration_ms: u64,
    pub stream: bool,
}

/// 字符数（非字节数）
pub fn char_count(s: &str) -> u64 {
    s.chars().count() as u64
}

/// 进行中的请求周期，结束时转为 [`AuditRecord`]
#[derive(Debug, Clone)]
pub struct AuditCycle {
    pub request_id: String,
    pub endpoint: String,
    pub model: String,
    pub prompt_length: u64,
    pub stream: bool,
    pub started: Instant,
}

impl AuditCycle {
    pub fn new(
        request_id: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        prompt: &str,
        stream: bool,
        started: Instant,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            prompt_length: char_count(prompt),
            stream,
            started,
        }
    }

    /// 周期结束，生成最终记录
    pub fn finish(self, response_length: u64, status: AuditStatus) -> AuditRecord {
        AuditRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            request_id: self.request_id,
            endpoint: self.endpoint,
            model: self.model,
            prompt_length: self.prompt_length,
            response_length,
            status,
            duration_ms: self.started.elapsed().as_millis() as u64,
            stream: self.stream,
        }
    }
}
