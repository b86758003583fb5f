//! SQLite 审计表

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use super::record::AuditRecord;
use super::{AuditDestination, ensure_parent_dir};

/// 嵌入式关系存储，连接在 sink 生命周期内复用
pub struct SqliteDestination {
    conn: Connection,
}

impl SqliteDestination {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        ensure_parent_dir(path)?;

        let conn = Connection::open(path)?;
        // 多个进程共用同一个库时等待锁，而不是立即失败
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                request_id TEXT NOT NULL,
                endpoint TEXT NOT NULL,
                model TEXT NOT NULL,
                prompt_length INTEGER NOT NULL DEFAULT 0,
                response_length INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                duration_ms INTEGER NOT NULL DEFAULT 0,
                stream INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit(timestamp);
            CREATE INDEX IF NOT EXISTS idx_audit_request_id ON audit(request_id);",
        )?;
        Ok(Self { conn })
    }
}

impl AuditDestination for SqliteDestination {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn append(&mut self, record: &AuditRecord) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO audit (timestamp, request_id, endpoint, model, prompt_length, response_length, status, duration_ms, stream)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                record.timestamp,
                record.request_id,
                record.endpoint,
                record.model,
                record.prompt_length as i64,
                record.response_length as i64,
                record.status.as_str(),
                record.duration_ms as i64,
                record.stream as i32,
            ],
        )?;
        Ok(())
    }
}
