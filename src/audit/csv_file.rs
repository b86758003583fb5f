//! CSV 表格文件

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use super::record::AuditRecord;
use super::{AuditDestination, ensure_parent_dir};

/// 固定表头
pub const CSV_HEADER: [&str; 9] = [
    "timestamp",
    "request_id",
    "endpoint",
    "model",
    "prompt_length",
    "response_length",
    "status",
    "duration_ms",
    "stream",
];

pub struct CsvDestination {
    path: PathBuf,
}

impl CsvDestination {
    /// 打开 CSV 文件，仅在文件不存在（或为空）时写入表头
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        ensure_parent_dir(path)?;

        let needs_header = match std::fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        if needs_header {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl AuditDestination for CsvDestination {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn append(&mut self, record: &AuditRecord) -> anyhow::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        writer.write_record([
            record.timestamp.clone(),
            record.request_id.clone(),
            record.endpoint.clone(),
            record.model.clone(),
            record.prompt_length.to_string(),
            record.response_length.to_string(),
            record.status.as_str().to_string(),
            record.duration_ms.to_string(),
            (record.stream as u8).to_string(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}
