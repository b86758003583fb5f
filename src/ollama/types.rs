//! 上游协议类型

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `/api/generate` 请求体
#[derive(Debug, Serialize)]
pub struct GenerateBody<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

/// `/api/generate` 响应对象
///
/// 非流式模式下是完整响应，流式模式下每行一个。
/// 上游还会带 `model`、`eval_count` 等字段，这里忽略。
/// 字段类型不符时不拒绝整行：非字符串的 `response` 视为无文本，`done` 按真值判断。
#[derive(Debug, Default, Deserialize)]
pub struct GenerateChunk {
    #[serde(default, deserialize_with = "lenient_text")]
    pub response: Option<String>,
    #[serde(default, deserialize_with = "truthy")]
    pub done: Option<bool>,
}

impl GenerateChunk {
    /// 非空的文本增量
    pub fn text(&self) -> Option<&str> {
        self.response.as_deref().filter(|s| !s.is_empty())
    }

    pub fn is_done(&self) -> bool {
        self.done.unwrap_or(false)
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn truthy<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let flag = match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    };
    Ok(Some(flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(json: &str) -> GenerateChunk {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_done_uses_truthiness() {
        assert!(chunk(r#"{"response":"x","done":1}"#).is_done());
        assert!(chunk(r#"{"done":"yes"}"#).is_done());
        assert!(!chunk(r#"{"done":0}"#).is_done());
        assert!(!chunk(r#"{"done":null}"#).is_done());
        assert!(!chunk(r#"{"done":""}"#).is_done());
    }

    #[test]
    fn test_mistyped_fields_keep_the_rest_of_the_line() {
        let c = chunk(r#"{"response":"x","done":1}"#);
        assert_eq!(c.text(), Some("x"));

        let c = chunk(r#"{"response":42,"done":true}"#);
        assert!(c.text().is_none());
        assert!(c.is_done());
    }
}
