use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;

use base64::Engine as _;
use serde_json::{json, Value};
use shared::GenerateRequest;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub const SYSTEM_PROMPT: &str = r#"
You are an expert procedural CAD programmer. You turn a hand-drawn sketch and a short
description into a 3D model script for a desktop physical prototyping tool.

The script language is Rhai. Rules:
- Output ONLY the script. No markdown fencing, no explanation.
- Define `fn main(params)` returning one solid or an array of solids.
- Optionally define `fn parameter_definitions()` returning an array of maps
  `#{ name: "...", initial: <number>, caption: "..." }`. Their values arrive in `params`.
- Units are millimeters. +Z is up; models should rest on the XY plane.
- Only the functions below exist. There is no file, network, or module access.

Primitives:
- cube(size) / cube([x, y, z])            corner at the origin
- cuboid([x, y, z]) / cuboid([x, y, z], [cx, cy, cz])   centered
- sphere(r) / sphere(r, segments)
- cylinder(r, h) / cylinder(r, h, segments)   centered, along Z
- cone(r_bottom, r_top, h)
- torus(major_radius, minor_radius)

2D profiles (for extrusion):
- rectangle([w, h]), circle(r), circle(r, segments), polygon([[x, y], ...])

Transforms (angles in degrees):
- translate([x, y, z], solid), rotate([rx, ry, rz], solid), scale([x, y, z], solid), mirror("x", solid)

Booleans:
- union(a, b) / union([a, b, ...]), subtract(a, b) / subtract([base, cut, ...]), intersect(a, b)

Extrusions:
- extrude_linear(profile, height) / extrude_linear(profile, height, twist_degrees, top_scale)
- extrude_rotate(profile, angle_degrees, segments)

Measurements:
- volume(solid), bounding_box(solid) -> [[min], [max]], dimensions(solid) -> [dx, dy, dz]

Example:

fn parameter_definitions() {
    [
        #{ name: "size", initial: 50.0, caption: "Size" }
    ]
}

fn main(params) {
    let size = params.size;
    let base = cuboid([size, size, 5.0], [0.0, 0.0, 2.5]);
    let tower = translate([0.0, 0.0, 15.0], cylinder(5.0, 20.0));
    union(base, tower)
}
"#;

/// Errors raised while producing model source.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("GEMINI_API_KEY not configured")]
    MissingApiKey,
    #[error("Invalid base64 image data: {0}")]
    InvalidImage(String),
    #[error("Gemini API error: {0}")]
    Upstream(String),
    #[error("Gemini API error: response contained no text")]
    EmptyResponse,
}

pub type GenerationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<GeneratedCode, GenerationError>> + Send + 'a>>;

/// Cleaned source plus the raw model text.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCode {
    pub code: String,
    pub raw: String,
}

impl GeneratedCode {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            code: strip_code_fences(&raw),
            raw,
        }
    }
}

/// Seam between the HTTP layer and the language model.
pub trait CodeGenerator: Send + Sync {
    fn generate<'a>(&'a self, request: &'a GenerateRequest) -> GenerationFuture<'a>;
}

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: model.into(),
        }
    }

    async fn call(&self, request: &GenerateRequest) -> Result<GeneratedCode, GenerationError> {
        let api_key = self.api_key.as_ref().ok_or(GenerationError::MissingApiKey)?;
        let body = request_body(request)?;

        tracing::info!(
            model = %self.model,
            prompt_len = request.prompt.len(),
            has_image = request.image_base64.is_some(),
            iterating = request.previous_code.is_some(),
            "Sending generation request"
        );

        let url = format!("{}/{}:generateContent", GEMINI_ENDPOINT, self.model);
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Upstream(e.to_string()))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Upstream(e.to_string()))?;

        if !status.is_success() {
            let message = payload["error"]["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(GenerationError::Upstream(message));
        }

        let text = response_text(&payload).ok_or(GenerationError::EmptyResponse)?;
        tracing::info!(raw_len = text.len(), "Received generation response");
        Ok(GeneratedCode::from_raw(text))
    }
}

impl CodeGenerator for GeminiClient {
    fn generate<'a>(&'a self, request: &'a GenerateRequest) -> GenerationFuture<'a> {
        Box::pin(self.call(request))
    }
}

/// Decode a sketch image, with or without a `data:` URL prefix.
pub fn decode_image(image: &str) -> Result<Vec<u8>, GenerationError> {
    base64::engine::general_purpose::STANDARD
        .decode(strip_data_url(image))
        .map_err(|e| GenerationError::InvalidImage(e.to_string()))
}

/// Assemble the `generateContent` body: system prompt, description,
/// previous source (when iterating) and the sketch image.
pub fn request_body(request: &GenerateRequest) -> Result<Value, GenerationError> {
    let mut parts = vec![
        json!({ "text": SYSTEM_PROMPT }),
        json!({ "text": format!("\n\nUser description: {}", request.prompt) }),
    ];

    if let Some(previous) = request.previous_code.as_deref().filter(|c| !c.trim().is_empty()) {
        parts.push(json!({
            "text": format!(
                "\n\nModify the following existing script according to the description and sketch. \
                 Keep the parameter names stable where possible.\n\n{}",
                previous
            )
        }));
    }

    if let Some(image) = request.image_base64.as_deref() {
        let data = strip_data_url(image);
        let bytes = decode_image(image)?;
        tracing::debug!(image_bytes = bytes.len(), "Attached sketch image");
        parts.push(json!({
            "inline_data": { "mime_type": "image/png", "data": data }
        }));
    }

    Ok(json!({
        "contents": [ { "role": "user", "parts": parts } ]
    }))
}

/// Accept both bare base64 and `data:image/png;base64,...`.
fn strip_data_url(image: &str) -> &str {
    match image.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => image,
    }
}

fn response_text(payload: &Value) -> Option<String> {
    let parts = payload["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Remove markdown code fences the model may wrap the script in.
pub fn strip_code_fences(text: &str) -> String {
    static OPENING: OnceLock<regex::Regex> = OnceLock::new();
    let opening = OPENING.get_or_init(|| {
        regex::Regex::new(r"```[A-Za-z]*\n?").expect("valid regex")
    });
    opening.replace_all(text, "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences_with_language() {
        let raw = "```rhai\nfn main() { cube(10) }\n```\n";
        assert_eq!(strip_code_fences(raw), "fn main() { cube(10) }");
    }

    #[test]
    fn test_strip_fences_plain() {
        assert_eq!(strip_code_fences("```\nfn main() {}```"), "fn main() {}");
        assert_eq!(strip_code_fences("  fn main() {}  "), "fn main() {}");
    }

    #[test]
    fn test_request_body_parts() {
        let mut request = GenerateRequest::new("a cup");
        request.image_base64 = Some("aGVsbG8=".to_string());
        request.previous_code = Some("fn main() { cube(1) }".to_string());

        let body = request_body(&request).unwrap();
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 4);
        assert!(parts[1]["text"].as_str().unwrap().contains("a cup"));
        assert!(parts[2]["text"].as_str().unwrap().contains("cube(1)"));
        assert_eq!(parts[3]["inline_data"]["data"], "aGVsbG8=");
    }

    #[test]
    fn test_request_body_without_image() {
        let body = request_body(&GenerateRequest::new("a cup")).unwrap();
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_data_url_prefix_accepted() {
        let mut request = GenerateRequest::new("x");
        request.image_base64 = Some("data:image/png;base64,aGVsbG8=".to_string());
        let body = request_body(&request).unwrap();
        assert_eq!(body["contents"][0]["parts"][2]["inline_data"]["data"], "aGVsbG8=");
    }

    #[test]
    fn test_invalid_image_rejected() {
        let mut request = GenerateRequest::new("x");
        request.image_base64 = Some("not base64 !!".to_string());
        assert!(matches!(request_body(&request), Err(GenerationError::InvalidImage(_))));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [ { "text": "fn main() " }, { "text": "{ cube(2) }" } ] } }]
        });
        assert_eq!(response_text(&payload).unwrap(), "fn main() { cube(2) }");
        assert!(response_text(&json!({ "candidates": [] })).is_none());
    }

    #[tokio::test]
    async fn test_missing_key_fails_fast() {
        let client = GeminiClient::new(None, "gemini-2.5-flash");
        let result = client.generate(&GenerateRequest::new("x")).await;
        assert!(matches!(result, Err(GenerationError::MissingApiKey)));
    }
}
