use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 审计存储配置
///
/// 每个路径都可以设为 `null` 以禁用对应的存储目标
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    /// JSONL 追加日志路径
    #[serde(default = "default_jsonl_path")]
    pub jsonl_path: Option<PathBuf>,
    /// CSV 表格文件路径
    #[serde(default = "default_csv_path")]
    pub csv_path: Option<PathBuf>,
    /// SQLite 数据库路径
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: Option<PathBuf>,
}

fn default_jsonl_path() -> Option<PathBuf> {
    Some(PathBuf::from("logs/audit.jsonl"))
}

fn default_csv_path() -> Option<PathBuf> {
    Some(PathBuf::from("logs/audit.csv"))
}

fn default_sqlite_path() -> Option<PathBuf> {
    Some(PathBuf::from("logs/audit.db"))
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            jsonl_path: default_jsonl_path(),
            csv_path: default_csv_path(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

impl AuditConfig {
    /// 将所有存储目标放到同一目录下
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            jsonl_path: Some(dir.join("audit.jsonl")),
            csv_path: Some(dir.join("audit.csv")),
            sqlite_path: Some(dir.join("audit.db")),
        }
    }
}

/// 网关应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// 推理守护进程地址
    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,

    /// 请求体未指定 model 时使用的模型
    #[serde(default = "default_model")]
    pub default_model: String,

    /// 非流式请求总超时（秒）
    #[serde(default = "default_once_timeout_secs")]
    pub once_timeout_secs: u64,

    /// 流式请求总超时（秒），覆盖连接与读取
    #[serde(default = "default_stream_timeout_secs")]
    pub stream_timeout_secs: u64,

    /// 建立连接超时（秒）
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// 日志级别（RUST_LOG 优先）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub audit: AuditConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_upstream_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "phi3:mini".to_string()
}

fn default_once_timeout_secs() -> u64 {
    60
}

fn default_stream_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            upstream_base_url: default_upstream_base_url(),
            default_model: default_model(),
            once_timeout_secs: default_once_timeout_secs(),
            stream_timeout_secs: default_stream_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            log_level: default_log_level(),
            audit: AuditConfig::default(),
        }
    }
}

impl Config {
    /// 获取默认配置文件路径
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// 从文件加载配置，文件不存在时返回默认配置
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 监听地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
