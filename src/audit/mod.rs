//! 请求审计
//!
//! 每个请求周期结束后写一条记录到三个互相独立的存储：
//! - JSONL 追加日志
//! - CSV 表格文件（固定表头）
//! - SQLite `audit` 表
//!
//! 单个存储失败只记录日志，不影响其他存储，也不会传递到 HTTP 响应

pub mod csv_file;
pub mod guard;
pub mod jsonl;
pub mod record;
pub mod sqlite;

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::model::config::AuditConfig;

pub use csv_file::CsvDestination;
pub use guard::AuditGuard;
pub use jsonl::JsonlDestination;
pub use record::{AuditCycle, AuditRecord, AuditStatus, char_count};
pub use sqlite::SqliteDestination;

/// 审计存储目标
pub trait AuditDestination: Send {
    /// 用于日志的名称
    fn name(&self) -> &'static str;

    /// 追加一条记录
    fn append(&mut self, record: &AuditRecord) -> anyhow::Result<()>;
}

/// 单次写入结果
#[derive(Debug, Default)]
pub struct AuditReport {
    pub written: usize,
    pub failed: Vec<&'static str>,
}

impl AuditReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 创建父目录（如不存在）
pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

/// 审计 sink
///
/// 一把锁覆盖所有存储目标：一次 `record` 写完全部目标后才开始下一次
pub struct AuditSink {
    destinations: Mutex<Vec<Box<dyn AuditDestination>>>,
}

impl AuditSink {
    /// 根据配置打开所有启用的存储目标
    ///
    /// 可重复调用：目录按需创建，表头与表结构只在缺失时创建。
    /// 打开失败的目标会被跳过，其余目标照常工作。
    pub fn open(config: &AuditConfig) -> Self {
        let mut destinations: Vec<Box<dyn AuditDestination>> = Vec::new();

        if let Some(path) = &config.jsonl_path {
            match JsonlDestination::open(path) {
                Ok(d) => destinations.push(Box::new(d)),
                Err(e) => tracing::error!("打开 JSONL 审计日志失败 ({}): {}", path.display(), e),
            }
        }
        if let Some(path) = &config.csv_path {
            match CsvDestination::open(path) {
                Ok(d) => destinations.push(Box::new(d)),
                Err(e) => tracing::error!("打开 CSV 审计文件失败 ({}): {}", path.display(), e),
            }
        }
        if let Some(path) = &config.sqlite_path {
            match SqliteDestination::open(path) {
                Ok(d) => destinations.push(Box::new(d)),
                Err(e) => tracing::error!("打开 SQLite 审计库失败 ({}): {}", path.display(), e),
            }
        }

        Self::with_destinations(destinations)
    }

    pub fn with_destinations(destinations: Vec<Box<dyn AuditDestination>>) -> Self {
        Self {
            destinations: Mutex::new(destinations),
        }
    }

    /// 已启用的存储目标名称
    pub fn destination_names(&self) -> Vec<&'static str> {
        self.destinations.lock().iter().map(|d| d.name()).collect()
    }

    /// 同步写入所有存储目标，从不返回错误
    pub fn record(&self, record: &AuditRecord) -> AuditReport {
        let mut report = AuditReport::default();
        let mut destinations = self.destinations.lock();

        for destination in destinations.iter_mut() {
            match destination.append(record) {
                Ok(()) => report.written += 1,
                Err(e) => {
                    tracing::error!(
                        request_id = %record.request_id,
                        "写入审计记录失败 [{}]: {}",
                        destination.name(),
                        e
                    );
                    report.failed.push(destination.name());
                }
            }
        }

        if report.is_complete() {
            tracing::debug!(
                request_id = %record.request_id,
                status = record.status.as_str(),
                response_length = record.response_length,
                duration_ms = record.duration_ms,
                "审计记录已写入 {} 个存储",
                report.written
            );
        } else {
            tracing::warn!(
                request_id = %record.request_id,
                "审计记录部分写入: 成功 {}, 失败 {:?}",
                report.written,
                report.failed
            );
        }
        report
    }

    /// 后台写入，不等待结果（可在 Drop 中调用）
    ///
    /// 在 tokio 运行时内交给阻塞线程池，调用方立即返回；没有运行时时同步写入
    pub fn submit_detached(self: &Arc<Self>, record: AuditRecord) {
        let sink = Arc::clone(self);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || {
                    sink.record(&record);
                });
            }
            Err(_) => {
                sink.record(&record);
            }
        }
    }
}
