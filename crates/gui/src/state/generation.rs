//! Client for the generation service.
//!
//! Requests run on a background tokio runtime; results come back over an
//! mpsc channel that the UI polls once per frame.

use std::sync::mpsc;

use shared::{ApiErrorBody, ErrorLogRequest, ErrorLogResponse, GenerateRequest, GenerateResponse};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationServiceError {
    #[error("generation service unreachable: {0}")]
    Unreachable(String),
    #[error("generation service rejected the request ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("rate limit exceeded, try again in a minute")]
    RateLimited,
    #[error("invalid response from generation service: {0}")]
    InvalidResponse(String),
    #[error("a generation request is already in progress")]
    Busy,
}

type GenerationResult = Result<GenerateResponse, GenerationServiceError>;

/// Role of a history entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single request/response line shown in the prompt panel
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub is_error: bool,
}

pub struct GenerationClient {
    base_url: String,
    http: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    pending: Option<mpsc::Receiver<GenerationResult>>,
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub last_failed_request: Option<GenerateRequest>,
}

impl GenerationClient {
    pub fn new(base_url: impl Into<String>) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("generation-client")
            .enable_all()
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            runtime,
            pending: None,
            messages: Vec::new(),
            input: String::new(),
            last_failed_request: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, url: &str) {
        self.base_url = url.trim_end_matches('/').to_string();
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a generation request. Only one may be in flight.
    pub fn request(&mut self, request: GenerateRequest) -> Result<(), GenerationServiceError> {
        if self.pending.is_some() {
            return Err(GenerationServiceError::Busy);
        }
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            text: request.prompt.clone(),
            is_error: false,
        });

        let (tx, rx) = mpsc::channel();
        let http = self.http.clone();
        let url = format!("{}/api/generate", self.base_url);
        let request_id = uuid::Uuid::new_v4();
        tracing::info!(
            %url,
            %request_id,
            prompt_len = request.prompt.len(),
            has_image = request.image_base64.is_some(),
            "Requesting model generation"
        );
        self.last_failed_request = Some(request.clone());
        self.runtime.spawn(async move {
            let result = post_generate(&http, &url, &request, request_id).await;
            if let Err(e) = &result {
                tracing::debug!(%request_id, "Generation request ended with: {e}");
            }
            // Receiver gone means the UI moved on
            let _ = tx.send(result);
        });
        self.pending = Some(rx);
        Ok(())
    }

    /// Resend the last request that failed.
    pub fn retry(&mut self) -> Result<(), GenerationServiceError> {
        match self.last_failed_request.take() {
            Some(request) => self.request(request),
            None => Ok(()),
        }
    }

    /// Non-blocking check for a finished request.
    pub fn poll(&mut self) -> Option<GenerationResult> {
        let rx = self.pending.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => Err(GenerationServiceError::Unreachable(
                "request task ended without a response".to_string(),
            )),
        };
        self.pending = None;

        match &result {
            Ok(response) => {
                self.last_failed_request = None;
                self.messages.push(ChatMessage {
                    role: ChatRole::Assistant,
                    text: format!("Generated model ({} lines)", response.code.lines().count()),
                    is_error: false,
                });
            }
            Err(e) => {
                tracing::warn!("Generation failed: {e}");
                self.messages.push(ChatMessage {
                    role: ChatRole::Assistant,
                    text: e.to_string(),
                    is_error: true,
                });
            }
        }
        Some(result)
    }

    /// Fire-and-forget error report to the service log sink.
    pub fn report_error(&self, source: &str, error: &str, code: Option<&str>) {
        let report = ErrorLogRequest {
            source: source.to_string(),
            error: error.to_string(),
            code: code.map(str::to_string),
            timestamp: chrono::Local::now().to_rfc3339(),
        };
        let http = self.http.clone();
        let url = format!("{}/api/log/error", self.base_url);
        self.runtime.spawn(async move {
            match http.post(&url).json(&report).send().await {
                Ok(resp) => match resp.json::<ErrorLogResponse>().await {
                    Ok(ErrorLogResponse::Logged { file }) => tracing::debug!(%file, "Error report logged"),
                    Ok(ErrorLogResponse::Failed { error }) => tracing::warn!("Error report rejected: {error}"),
                    Err(e) => tracing::debug!("Unreadable error-log response: {e}"),
                },
                Err(e) => tracing::debug!("Error report not delivered: {e}"),
            }
        });
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.input.clear();
        self.last_failed_request = None;
    }
}

async fn post_generate(
    http: &reqwest::Client,
    url: &str,
    request: &GenerateRequest,
    request_id: uuid::Uuid,
) -> GenerationResult {
    let response = http
        .post(url)
        .header("x-request-id", request_id.to_string())
        .json(request)
        .send()
        .await
        .map_err(|e| GenerationServiceError::Unreachable(e.to_string()))?;

    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GenerationServiceError::RateLimited);
    }
    if !status.is_success() {
        let detail = response
            .json::<ApiErrorBody>()
            .await
            .map(|b| b.detail)
            .unwrap_or_else(|_| status.to_string());
        return Err(GenerationServiceError::Rejected {
            status: status.as_u16(),
            detail,
        });
    }
    let body: GenerateResponse = response
        .json()
        .await
        .map_err(|e| GenerationServiceError::InvalidResponse(e.to_string()))?;
    if body.code.trim().is_empty() {
        return Err(GenerationServiceError::InvalidResponse("empty model source".to_string()));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_idle_client_polls_nothing() {
        let mut client = GenerationClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert!(!client.is_loading());
        assert!(client.poll().is_none());
    }

    #[test]
    fn test_second_request_is_busy() {
        // Port 9 (discard) is closed on test machines; the request fails quickly
        let mut client = GenerationClient::new("http://127.0.0.1:9").unwrap();
        client.request(GenerateRequest::new("a box")).unwrap();
        assert_eq!(
            client.request(GenerateRequest::new("again")),
            Err(GenerationServiceError::Busy)
        );
    }

    #[test]
    fn test_unreachable_service_reported() {
        let mut client = GenerationClient::new("http://127.0.0.1:9").unwrap();
        client.request(GenerateRequest::new("a box")).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let result = loop {
            if let Some(result) = client.poll() {
                break result;
            }
            assert!(Instant::now() < deadline, "request never finished");
            std::thread::sleep(Duration::from_millis(10));
        };
        assert!(matches!(result, Err(GenerationServiceError::Unreachable(_))));
        assert!(!client.is_loading());
        assert!(client.last_failed_request.is_some());
        assert!(client.messages.last().is_some_and(|m| m.is_error));
    }
}
