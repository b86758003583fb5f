//! 请求周期审计守卫
//!
//! 保证每个已接受的请求周期恰好产生一条审计记录：
//! 正常结束时由调用方显式 `finish`，未结束就被丢弃（客户端断开、handler 被取消）
//! 时在 Drop 中以 `error` 状态补记，长度为已交付的字符数。
//! 写入都在后台完成，不占用响应路径。

use std::sync::Arc;

use super::AuditSink;
use super::record::{AuditCycle, AuditStatus};

pub struct AuditGuard {
    cycle: Option<AuditCycle>,
    sink: Arc<AuditSink>,
    delivered: u64,
}

impl AuditGuard {
    pub fn new(cycle: AuditCycle, sink: Arc<AuditSink>) -> Self {
        Self {
            cycle: Some(cycle),
            sink,
            delivered: 0,
        }
    }

    /// 累加已交付给调用方的字符数
    pub fn add_delivered(&mut self, chars: u64) {
        self.delivered += chars;
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn is_finished(&self) -> bool {
        self.cycle.is_none()
    }

    /// 结束周期并交给后台写入
    pub fn finish(mut self, status: AuditStatus) {
        self.finish_detached(status);
    }

    /// 同 `finish`，但不消耗守卫（用于 `poll` 等只能拿到 `&mut` 的上下文）
    pub fn finish_detached(&mut self, status: AuditStatus) {
        if let Some(cycle) = self.cycle.take() {
            self.sink.submit_detached(cycle.finish(self.delivered, status));
        }
    }
}

impl Drop for AuditGuard {
    fn drop(&mut self) {
        if let Some(cycle) = self.cycle.take() {
            tracing::warn!(
                request_id = %cycle.request_id,
                delivered = self.delivered,
                "请求周期未正常结束（客户端可能已断开），按 error 记录"
            );
            self.sink
                .submit_detached(cycle.finish(self.delivered, AuditStatus::Error));
        }
    }
}
