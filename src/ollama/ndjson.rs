//! NDJSON 增量解码
//!
//! 网络分块与行边界无关：一行可能跨多个分块，一个分块也可能包含多行，
//! 多字节 UTF-8 字符同样可能被截断在两个分块之间。因此按字节缓冲，
//! 只有凑齐完整一行后才做 UTF-8 解码。

use bytes::{Buf, BytesMut};

use super::types::GenerateChunk;

/// 单行上限，超出的行整行丢弃
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// 行解码器
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: BytesMut,
    /// `buffer` 中已确认不含换行符的前缀长度
    scanned: usize,
    /// 当前行已超长，丢弃到下一个换行符为止
    discarding: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个分块，返回其中所有完整的行（不含换行符）
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
            let line = self.buffer.split_to(self.scanned + offset);
            self.buffer.advance(1);
            self.scanned = 0;
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            lines.push(Self::decode(&line));
        }
        self.scanned = self.buffer.len();

        if self.buffer.len() > MAX_LINE_BYTES {
            if !self.discarding {
                tracing::warn!("上游单行超过 {} 字节，丢弃该行", MAX_LINE_BYTES);
            }
            self.buffer.clear();
            self.scanned = 0;
            self.discarding = true;
        }
        lines
    }

    /// 连接关闭时取出末尾没有换行符的残留行
    pub fn finish(&mut self) -> Option<String> {
        self.scanned = 0;
        if std::mem::take(&mut self.discarding) || self.buffer.is_empty() {
            self.buffer.clear();
            return None;
        }
        let rest = self.buffer.split();
        Some(Self::decode(&rest))
    }

    fn decode(line: &[u8]) -> String {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        String::from_utf8_lossy(line).into_owned()
    }
}

/// 解析一行协议数据
///
/// 空行与无法解析的行返回 `None`，调用方直接跳过
pub fn parse_line(line: &str) -> Option<GenerateChunk> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<GenerateChunk>(line) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            tracing::debug!("跳过无法解析的上游行: {}", e);
            None
        }
    }
}
