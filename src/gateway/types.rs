//! 网关请求/响应类型

use serde::{Deserialize, Serialize};

use super::error::ApiError;

/// POST /generate 与 /generate/stream 请求体
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    /// 缺省时使用配置中的默认模型
    #[serde(default)]
    pub model: Option<String>,
}

/// 通过校验的生成请求，之后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedRequest {
    pub prompt: String,
    pub model: String,
}

impl GenerateRequest {
    /// 校验并补全默认模型
    pub fn accept(self, default_model: &str) -> Result<AcceptedRequest, ApiError> {
        if self.prompt.trim().is_empty() {
            return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
        }
        let model = match self.model {
            Some(model) if model.trim().is_empty() => {
                return Err(ApiError::BadRequest("model must not be empty".to_string()));
            }
            Some(model) => model,
            None => default_model.to_string(),
        };
        Ok(AcceptedRequest {
            prompt: self.prompt,
            model,
        })
    }
}

/// POST /generate 响应体
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub prompt: String,
    pub model: String,
    pub response: String,
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_defaults_when_absent_or_null() {
        for json in [r#"{"prompt":"hi"}"#, r#"{"prompt":"hi","model":null}"#] {
            let req: GenerateRequest = serde_json::from_str(json).unwrap();
            let accepted = req.accept("phi3:mini").unwrap();
            assert_eq!(accepted.model, "phi3:mini");
            assert_eq!(accepted.prompt, "hi");
        }
    }

    #[test]
    fn test_explicit_model_kept() {
        let req: GenerateRequest =
            serde_json::from_str(r#"{"prompt":"hi","model":"llama3:8b","extra":1}"#).unwrap();
        assert_eq!(req.accept("phi3:mini").unwrap().model, "llama3:8b");
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let req: GenerateRequest = serde_json::from_str(r#"{"prompt":"  "}"#).unwrap();
        assert!(matches!(req.accept("phi3:mini"), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_empty_model_rejected() {
        let req: GenerateRequest = serde_json::from_str(r#"{"prompt":"hi","model":""}"#).unwrap();
        assert!(matches!(req.accept("phi3:mini"), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_schema_violations_fail_to_parse() {
        assert!(serde_json::from_str::<GenerateRequest>(r#"{"model":"x"}"#).is_err());
        assert!(serde_json::from_str::<GenerateRequest>(r#"{"prompt":42}"#).is_err());
        assert!(serde_json::from_str::<GenerateRequest>(r#"{"prompt":"hi","model":7}"#).is_err());
    }
}
