//! JSONL 追加日志

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::record::AuditRecord;
use super::{AuditDestination, ensure_parent_dir};

/// 每条记录一行 JSON，只追加
pub struct JsonlDestination {
    path: PathBuf,
}

impl JsonlDestination {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        ensure_parent_dir(path)?;
        OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl AuditDestination for JsonlDestination {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn append(&mut self, record: &AuditRecord) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        // 整行一次写入
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}
