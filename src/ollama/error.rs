//! 上游调用错误

use thiserror::Error;

/// 调用推理守护进程失败
///
/// 原始错误只在本模块内包装，网关层只暴露分类，不回显细节
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// 无法建立连接
    #[error("无法连接上游: {0}")]
    Connect(String),

    /// 请求超时（连接 + 读取）
    #[error("上游请求超时: {0}")]
    Timeout(String),

    /// 上游返回非成功状态码
    #[error("上游返回非成功状态: {0}")]
    Status(reqwest::StatusCode),

    /// 响应体无法解析
    #[error("上游响应解析失败: {0}")]
    Decode(String),

    /// 传输中断
    #[error("上游连接中断: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status(status)
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
