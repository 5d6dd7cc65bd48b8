//! Zhipu GLM chat-completions gateway.
//!
//! Talks to the bigmodel.cn OpenAI-style endpoint:
//! - Bearer authentication
//! - Non-streaming completion, used by the in-domain classifier
//! - Streaming completion over SSE (`data: ` records, `[DONE]` sentinel)
//! - Only `delta.content` is surfaced; reasoning deltas are dropped so no
//!   thinking trace leaks into the rendered document
//! - Zhipu error codes mapped onto the classification taxonomy
//!   (1302 busy, 1301/1003 credential)

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use itinera_core::{
    ClassificationError, Classifier, CompletionGateway, FragmentReceiver, StreamError, Verdict,
};

use crate::sse::{SseDecoder, SseEvent};

const DEFAULT_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";
const DEFAULT_MODEL: &str = "glm-4.5-air";

/// Zhipu GLM gateway over reqwest.
pub struct ZhipuGateway {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    top_p: f32,
    client: reqwest::Client,
}

impl ZhipuGateway {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            temperature: 0.7,
            top_p: 0.9,
            client,
        }
    }

    /// Override the endpoint (testing, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override sampling parameters.
    pub fn with_sampling(mut self, temperature: f32, top_p: f32) -> Self {
        self.temperature = temperature;
        self.top_p = top_p;
        self
    }

    fn request_body(&self, prompt: &str, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
            "top_p": self.top_p,
            "stream": stream,
            "enable_search": false,
            "do_sample": true,
            "tools": [],
        })
    }

    /// One non-streaming completion; returns the assistant text.
    pub async fn complete(&self, prompt: &str) -> Result<String, ClassificationError> {
        debug!(model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt, false))
            .send()
            .await
            .map_err(|e| ClassificationError::NetworkUnavailable(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Zhipu API error");
            return Err(map_api_error(status, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassificationError::Unknown(format!("unparseable response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ClassificationError::Unknown("response carried no choices".into()))
    }
}

#[async_trait]
impl Classifier for ZhipuGateway {
    async fn classify(&self, query: &str) -> Result<Verdict, ClassificationError> {
        // Deterministic yes/no instruction, matched only on "yes".
        let prompt = format!(
            "please judge whether the following sentence is about Japan tourism: {query}, \
             only answer \"yes\" or \"no\""
        );
        let answer = self.complete(&prompt).await?;
        debug!(answer = %answer, "Classifier verdict text");

        if answer.to_lowercase().contains("yes") {
            Ok(Verdict::Accepted)
        } else {
            Ok(Verdict::Rejected)
        }
    }
}

#[async_trait]
impl CompletionGateway for ZhipuGateway {
    async fn stream_complete(&self, prompt: &str) -> Result<FragmentReceiver, StreamError> {
        debug!(model = %self.model, "Sending streaming request");

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .header("Accept", "text/event-stream")
            .json(&self.request_body(prompt, true))
            .send()
            .await
            .map_err(|e| StreamError::GatewayRejected(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Zhipu streaming request refused");
            return Err(StreamError::GatewayRejected(format!("status {status}: {body}")));
        }

        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut decoder = SseDecoder::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(StreamError::TransportFailure(e.to_string())))
                            .await;
                        return;
                    }
                };

                for event in decoder.push(&bytes) {
                    match event {
                        SseEvent::Done => return,
                        SseEvent::Data(data) => {
                            let delta: StreamDelta = match serde_json::from_str(&data) {
                                Ok(v) => v,
                                Err(e) => {
                                    trace!(error = %e, data = %data, "Ignoring unparseable SSE record");
                                    continue;
                                }
                            };

                            if let Some(content) = delta.content() {
                                if !content.is_empty()
                                    && tx.send(Ok(content.to_string())).await.is_err()
                                {
                                    // Receiver dropped — the turn was aborted.
                                    return;
                                }
                            }
                        }
                    }
                }
            }
            // Stream ended without [DONE]; channel close signals completion.
        });

        Ok(rx)
    }
}

/// Map an error response onto the classification taxonomy.
fn map_api_error(status: u16, body: &str) -> ClassificationError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<ErrorDetail>,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(default)]
        code: Option<serde_json::Value>,
        #[serde(default)]
        message: Option<String>,
    }

    let detail: Option<ErrorDetail> = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error);

    let code = detail
        .as_ref()
        .and_then(|d| d.code.as_ref())
        .map(|c| match c {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();
    let message = detail
        .and_then(|d| d.message)
        .unwrap_or_else(|| format!("status {status}"));

    match code.as_str() {
        "1302" => ClassificationError::Busy(message),
        "1301" | "1003" => ClassificationError::InvalidCredential(message),
        _ if status == 401 || status == 403 => ClassificationError::InvalidCredential(message),
        _ if status == 429 => ClassificationError::Busy(message),
        _ if !code.is_empty() || status >= 500 => ClassificationError::ServiceUnavailable(message),
        _ => ClassificationError::Unknown(message),
    }
}

// --- Zhipu API response types ---

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    choices: Vec<DeltaChoice>,
}

#[derive(Debug, Deserialize)]
struct DeltaChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    /// Formal output content. Reasoning deltas arrive under a different key
    /// and are deliberately not modeled.
    #[serde(default)]
    content: Option<String>,
}

impl StreamDelta {
    fn content(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.delta.content.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_defaults() {
        let gw = ZhipuGateway::new("test-key");
        assert_eq!(gw.base_url, DEFAULT_BASE_URL);
        assert_eq!(gw.model, DEFAULT_MODEL);
        assert!((gw.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let gw = ZhipuGateway::new("k").with_base_url("https://proxy.example.com/v4/chat/");
        assert_eq!(gw.base_url, "https://proxy.example.com/v4/chat");
    }

    #[test]
    fn request_body_shape() {
        let gw = ZhipuGateway::new("k").with_model("glm-4.5-air");
        let body = gw.request_body("hello", true);
        assert_eq!(body["model"], "glm-4.5-air");
        assert_eq!(body["stream"], true);
        assert_eq!(body["enable_search"], false);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
    }

    #[test]
    fn busy_code_maps_to_busy() {
        let err = map_api_error(200, r#"{"error":{"code":"1302","message":"too many requests"}}"#);
        assert!(matches!(err, ClassificationError::Busy(_)));
    }

    #[test]
    fn credential_codes_map_to_invalid_credential() {
        for code in ["1301", "1003"] {
            let body = format!(r#"{{"error":{{"code":"{code}","message":"bad key"}}}}"#);
            let err = map_api_error(200, &body);
            assert!(matches!(err, ClassificationError::InvalidCredential(_)), "code {code}");
        }
    }

    #[test]
    fn http_401_without_body_maps_to_invalid_credential() {
        let err = map_api_error(401, "");
        assert!(matches!(err, ClassificationError::InvalidCredential(_)));
    }

    #[test]
    fn unrecognized_code_maps_to_service_unavailable() {
        let err = map_api_error(200, r#"{"error":{"code":"9999","message":"boom"}}"#);
        assert!(matches!(err, ClassificationError::ServiceUnavailable(_)));
    }

    #[test]
    fn opaque_failure_maps_to_unknown() {
        let err = map_api_error(418, "teapot");
        assert!(matches!(err, ClassificationError::Unknown(_)));
    }

    #[test]
    fn stream_delta_reads_content_only() {
        let delta: StreamDelta = serde_json::from_str(
            r#"{"choices":[{"delta":{"content":"塔","reasoning_content":"thinking..."}}]}"#,
        )
        .unwrap();
        assert_eq!(delta.content(), Some("塔"));
    }

    #[test]
    fn stream_delta_without_content() {
        let delta: StreamDelta =
            serde_json::from_str(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap();
        assert_eq!(delta.content(), None);
    }
}
