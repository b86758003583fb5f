//! 带审计的出站字节流
//!
//! 包装上游片段流：片段按原顺序逐个转为 HTTP body 分块，同时累计已交付字符数。
//! 流结束时记 `ok`；上游中途失败时产出错误，使 body 异常终止
//! （分块传输没有结束块，客户端可以区分截断与正常结束），记 `error`；
//! 客户端断开导致流被丢弃时，由 [`AuditGuard`] 的 Drop 记 `error`，
//! 同时上游连接随内部流一起释放。

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::Span;

use crate::audit::{AuditGuard, AuditStatus, char_count};
use crate::ollama::{FragmentStream, UpstreamError};

pub struct AuditedStream {
    inner: FragmentStream,
    guard: AuditGuard,
    span: Span,
}

impl AuditedStream {
    pub fn new(inner: FragmentStream, guard: AuditGuard, span: Span) -> Self {
        Self { inner, guard, span }
    }
}

impl Stream for AuditedStream {
    type Item = Result<Bytes, UpstreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.guard.is_finished() {
            return Poll::Ready(None);
        }

        let span = this.span.clone();
        let _entered = span.enter();

        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(text))) => {
                this.guard.add_delivered(char_count(&text));
                Poll::Ready(Some(Ok(Bytes::from(text))))
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::error!(
                    delivered = this.guard.delivered(),
                    "流式响应中途上游失败，终止响应流: {}",
                    e
                );
                this.guard.finish_detached(AuditStatus::Error);
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                tracing::debug!(delivered = this.guard.delivered(), "流式响应完成");
                this.guard.finish_detached(AuditStatus::Ok);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
