//! HTTP Client 构建模块
//!
//! Input: 连接超时
//! Output: reqwest::Client
//! Pos: 上游推理守护进程的共享 HTTP 客户端

use reqwest::Client;
use std::time::Duration;

/// 构建上游 HTTP Client
///
/// 总超时按请求设置（流式与非流式不同），这里只限制建立连接的时间。
/// 上游是本机守护进程，不经过系统代理。
///
/// # Arguments
/// * `connect_timeout_secs` - 建立连接超时（秒）
pub fn build_client(connect_timeout_secs: u64) -> anyhow::Result<Client> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .no_proxy()
        .build()?;

    tracing::debug!("上游 HTTP Client 已创建，连接超时 {}s", connect_timeout_secs);
    Ok(client)
}
