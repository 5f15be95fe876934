use serde::{Deserialize, Serialize};

pub mod parameters;
pub mod printability;

pub use parameters::{ParameterDefinition, ParameterError, ParameterOverride};
pub use printability::{CenterOfGravity, OverhangAngle, PrintabilityReport, WallThickness};

// ============================================================================
// Generation service API
// ============================================================================

/// Запрос на генерацию процедурной модели из эскиза и описания
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// PNG эскиза в base64 (без префикса data:)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    /// Текстовое описание от пользователя
    #[serde(default)]
    pub prompt: String,
    /// Предыдущий код модели для итеративной доработки
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_code: Option<String>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            image_base64: None,
            prompt: prompt.into(),
            previous_code: None,
        }
    }
}

/// Ответ сервиса генерации: исходный код модели
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Имя поля сохранено для совместимости с существующими клиентами
    #[serde(rename = "openSCADCode", alias = "generatedSource")]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

/// Отчёт клиента об ошибке (вычисление модели, сеть и т.д.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogRequest {
    pub source: String,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub timestamp: String,
}

/// Результат записи отчёта об ошибке
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ErrorLogResponse {
    Logged { file: String },
    Failed { error: String },
}

/// Запрос проверки печатаемости
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub code: String,
}

/// Тело ошибки API (формат `{ "detail": ... }`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_camel_case() {
        let json = r#"{"imageBase64":"aGk=","prompt":"a mug","previousCode":"fn main() {}"}"#;
        let req: GenerateRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.image_base64.as_deref(), Some("aGk="));
        assert_eq!(req.prompt, "a mug");
        assert_eq!(req.previous_code.as_deref(), Some("fn main() {}"));
    }

    #[test]
    fn test_generate_request_optional_fields_omitted() {
        let req = GenerateRequest::new("box");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({ "prompt": "box" }));
    }

    #[test]
    fn test_generate_response_wire_name() {
        let resp = GenerateResponse {
            code: "fn main() { cube(1) }".to_string(),
            raw_response: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["openSCADCode"], "fn main() { cube(1) }");
        assert!(json.get("rawResponse").is_none());
    }

    #[test]
    fn test_generate_response_accepts_alias() {
        let resp: GenerateResponse =
            serde_json::from_str(r#"{"generatedSource":"x"}"#).unwrap();
        assert_eq!(resp.code, "x");
    }

    #[test]
    fn test_error_log_response_tagged() {
        let ok = ErrorLogResponse::Logged {
            file: "logs/a.log".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({ "status": "logged", "file": "logs/a.log" })
        );
    }
}
