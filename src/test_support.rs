//! 测试用的上游桩服务

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use futures::stream::{self, StreamExt};

enum Mode {
    /// 非流式返回固定文本
    Once(String),
    /// 按行返回 NDJSON；非流式请求时返回拼接后的完整文本
    Streaming(Vec<String>),
    /// 返回若干行后保持连接不再发送数据
    Stalling(Vec<String>),
    /// 返回指定状态码
    Failing(u16),
}

/// 上游桩
pub struct StubUpstream {
    mode: Mode,
    delay: Option<Duration>,
}

impl StubUpstream {
    pub fn once(text: &str) -> Self {
        Self {
            mode: Mode::Once(text.to_string()),
            delay: None,
        }
    }

    pub fn streaming(lines: &[&str]) -> Self {
        Self {
            mode: Mode::Streaming(lines.iter().map(|l| l.to_string()).collect()),
            delay: None,
        }
    }

    pub fn stalling(lines: &[&str]) -> Self {
        Self {
            mode: Mode::Stalling(lines.iter().map(|l| l.to_string()).collect()),
            delay: None,
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            mode: Mode::Failing(status),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

fn ndjson_body(lines: &[String]) -> impl futures::Stream<Item = Result<String, Infallible>> + Send + 'static {
    let lines: Vec<Result<String, Infallible>> =
        lines.iter().map(|l| Ok(format!("{}\n", l))).collect();
    stream::iter(lines)
}

/// 与真实上游一致：拼接 `done` 之前（含）所有行的 response
fn concat_lines(lines: &[String]) -> String {
    let mut out = String::new();
    for line in lines {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
            continue;
        };
        if let Some(text) = value.get("response").and_then(|v| v.as_str()) {
            out.push_str(text);
        }
        if value.get("done").and_then(|v| v.as_bool()).unwrap_or(false) {
            break;
        }
    }
    out
}

async fn handle_generate(
    State(stub): State<Arc<StubUpstream>>,
    Json(req): Json<serde_json::Value>,
) -> Response {
    if let Some(delay) = stub.delay {
        tokio::time::sleep(delay).await;
    }
    let stream = req.get("stream").and_then(|v| v.as_bool()).unwrap_or(false);

    match &stub.mode {
        Mode::Failing(code) => (
            StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            "upstream exploded",
        )
            .into_response(),
        Mode::Once(text) => Json(serde_json::json!({
            "model": req.get("model"),
            "response": text,
            "done": true,
        }))
        .into_response(),
        Mode::Streaming(lines) if stream => Body::from_stream(ndjson_body(lines)).into_response(),
        Mode::Streaming(lines) => Json(serde_json::json!({
            "model": req.get("model"),
            "response": concat_lines(lines),
            "done": true,
        }))
        .into_response(),
        Mode::Stalling(lines) => {
            let body = ndjson_body(lines).chain(stream::pending::<Result<String, Infallible>>());
            Body::from_stream(body).into_response()
        }
    }
}

/// 在随机端口启动上游桩，返回 base_url
pub async fn spawn_stub(stub: StubUpstream) -> String {
    let app = Router::new()
        .route("/api/generate", post(handle_generate))
        .with_state(Arc::new(stub));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// 读取 JSONL 审计日志
pub fn jsonl_records(path: &std::path::Path) -> Vec<crate::audit::AuditRecord> {
    let content = std::fs::read_to_string(path).unwrap_or_default();
    content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

/// 读取 CSV 文件的原始行
pub fn csv_lines(path: &std::path::Path) -> Vec<String> {
    let content = std::fs::read_to_string(path).unwrap_or_default();
    content.lines().map(|l| l.to_string()).collect()
}

/// 读取 SQLite 审计表，返回 (id, 记录)
pub fn sqlite_rows(path: &std::path::Path) -> Vec<(i64, crate::audit::AuditRecord)> {
    use crate::audit::{AuditRecord, AuditStatus};

    let conn = rusqlite::Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT id, timestamp, request_id, endpoint, model, prompt_length, response_length, status, duration_ms, stream
             FROM audit ORDER BY id",
        )
        .unwrap();
    stmt.query_map([], |row| {
        let status: String = row.get(7)?;
        Ok((
            row.get(0)?,
            AuditRecord {
                timestamp: row.get(1)?,
                request_id: row.get(2)?,
                endpoint: row.get(3)?,
                model: row.get(4)?,
                prompt_length: row.get::<_, i64>(5)? as u64,
                response_length: row.get::<_, i64>(6)? as u64,
                status: if status == "ok" {
                    AuditStatus::Ok
                } else {
                    AuditStatus::Error
                },
                duration_ms: row.get::<_, i64>(8)? as u64,
                stream: row.get::<_, i32>(9)? != 0,
            },
        ))
    })
    .unwrap()
    .collect::<Result<Vec<_>, _>>()
    .unwrap()
}

/// 审计写入在阻塞线程池中完成，轮询 SQLite（最后写入的目标）直到出现指定行数
pub async fn wait_for_rows(
    config: &crate::model::config::AuditConfig,
    expected: usize,
) -> Vec<crate::audit::AuditRecord> {
    let db = config.sqlite_path.as_deref().unwrap();
    for _ in 0..100 {
        if sqlite_rows(db).len() >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    sqlite_rows(db).into_iter().map(|(_, r)| r).collect()
}
