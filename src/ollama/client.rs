//! 推理守护进程 HTTP 客户端

use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::Client;

use super::error::UpstreamError;
use super::ndjson::{LineDecoder, parse_line};
use super::types::{GenerateBody, GenerateChunk};
use crate::http_client::build_client;
use crate::model::config::Config;

/// 按上游顺序产出的文本片段流
///
/// 遇到 `done = true` 或连接正常关闭时结束；传输失败时产出一个 `Err` 后结束
pub type FragmentStream = BoxStream<'static, Result<String, UpstreamError>>;

/// 推理守护进程客户端
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    once_timeout: Duration,
    stream_timeout: Duration,
}

impl OllamaClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        once_timeout: Duration,
        stream_timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            once_timeout,
            stream_timeout,
        }
    }

    /// 根据配置创建客户端
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = build_client(config.connect_timeout_secs)?;
        Ok(Self::new(
            client,
            config.upstream_base_url.clone(),
            Duration::from_secs(config.once_timeout_secs),
            Duration::from_secs(config.stream_timeout_secs),
        ))
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    /// 非流式生成，返回去掉尾部空白的完整文本
    pub async fn generate_once(&self, model: &str, prompt: &str) -> Result<String, UpstreamError> {
        let body = GenerateBody {
            model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(self.generate_url())
            .timeout(self.once_timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let chunk: GenerateChunk = response.json().await?;
        Ok(chunk.response.unwrap_or_default().trim_end().to_string())
    }

    /// 流式生成
    ///
    /// 连接失败或非成功状态在这里直接返回 `Err`，成功时返回惰性片段流
    pub async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<FragmentStream, UpstreamError> {
        let body = GenerateBody {
            model,
            prompt,
            stream: true,
        };

        let response = self
            .client
            .post(self.generate_url())
            .timeout(self.stream_timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        tracing::debug!(model = %model, "上游流式连接已建立");
        Ok(fragment_stream(response.bytes_stream()))
    }
}

/// 片段流解码状态
struct FragmentState {
    body: BoxStream<'static, Result<Bytes, UpstreamError>>,
    decoder: LineDecoder,
    pending: VecDeque<String>,
    received: bool,
    finished: bool,
}

impl FragmentState {
    /// 处理一行；`done` 之后的行全部丢弃
    fn absorb(&mut self, line: &str) {
        if self.finished {
            return;
        }
        let Some(chunk) = parse_line(line) else {
            return;
        };
        if let Some(text) = chunk.text() {
            self.pending.push_back(text.to_string());
        }
        if chunk.is_done() {
            self.finished = true;
        }
    }
}

/// 将上游字节流解码为文本片段流
pub fn fragment_stream<S, E>(body: S) -> FragmentStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<UpstreamError> + 'static,
{
    let state = FragmentState {
        body: body.map(|r| r.map_err(Into::into)).boxed(),
        decoder: LineDecoder::new(),
        pending: VecDeque::new(),
        received: false,
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(text) = st.pending.pop_front() {
                return Some((Ok(text), st));
            }
            if st.finished {
                return None;
            }

            match st.body.next().await {
                Some(Ok(bytes)) => {
                    if !bytes.is_empty() {
                        st.received = true;
                    }
                    for line in st.decoder.push(&bytes) {
                        st.absorb(&line);
                    }
                }
                Some(Err(e)) => {
                    if st.received {
                        tracing::warn!("上游流在传输中断开: {}", e);
                    } else {
                        tracing::warn!("上游在返回任何数据前断开: {}", e);
                    }
                    st.finished = true;
                    return Some((Err(e), st));
                }
                None => {
                    if let Some(line) = st.decoder.finish() {
                        st.absorb(&line);
                    }
                    st.finished = true;
                }
            }
        }
    })
    .boxed()
}
