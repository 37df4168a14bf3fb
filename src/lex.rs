//! Client for the conversational runtime (Lex V2 `RecognizeText`)

use crate::config::LexConfig;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Opaque key/value state round-tripped with the runtime on every turn
pub type SessionAttributes = HashMap<String, String>;

/// Runtime error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Client could not be constructed from the configuration
    Config,
    /// Connection failures
    Network,
    /// Non-success HTTP status
    Status,
    /// Response body did not have the expected shape
    Decode,
}

impl LexError {
    pub fn new(kind: LexErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(LexErrorKind::Config, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LexErrorKind::Network, message)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::new(LexErrorKind::Status, format!("runtime returned {status}: {body}"))
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(LexErrorKind::Decode, message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_attributes: Option<SessionAttributes>,
}

impl SessionState {
    pub fn with_attributes(attributes: SessionAttributes) -> Self {
        Self {
            session_attributes: Some(attributes),
        }
    }
}

/// One conversational turn
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizeTextRequest {
    pub bot_id: String,
    pub bot_alias_id: String,
    pub locale_id: String,
    pub session_id: String,
    pub text: String,
    pub session_state: SessionState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl LexMessage {
    #[cfg(test)]
    pub fn plain_text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            content_type: Some("PlainText".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeTextResponse {
    #[serde(default)]
    pub messages: Vec<LexMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<SessionState>,
}

impl RecognizeTextResponse {
    /// Split a response into the reply text (first message only) and the
    /// attributes for the next turn. Missing attributes become an empty map.
    pub fn into_turn(self) -> Result<(String, SessionAttributes), LexError> {
        let reply = self
            .messages
            .into_iter()
            .next()
            .and_then(|message| message.content)
            .ok_or_else(|| LexError::decode("response carried no message content"))?;

        let attributes = self
            .session_state
            .and_then(|state| state.session_attributes)
            .unwrap_or_default();

        Ok((reply, attributes))
    }
}

/// Wire body; the identifiers travel in the URL path
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeTextBody<'a> {
    text: &'a str,
    session_state: &'a SessionState,
}

/// Anything that can run one conversational turn
#[async_trait]
pub trait ConversationClient: Send + Sync {
    async fn recognize_text(
        &self,
        request: &RecognizeTextRequest,
    ) -> Result<RecognizeTextResponse, LexError>;
}

/// HTTP client for a Lex V2 compatible runtime endpoint.
///
/// Requests are sent unsigned, so `endpoint` must point at something that
/// accepts them (a signing gateway in front of the regional runtime, or a
/// local stand-in). The public AWS host is never derived implicitly.
#[derive(Clone)]
pub struct LexRuntimeClient {
    client: reqwest::Client,
    endpoint: Url,
    region: String,
}

impl LexRuntimeClient {
    pub fn new(config: &LexConfig) -> Result<Self, LexError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .ok_or_else(|| {
                LexError::config("No runtime endpoint configured; set lex.endpoint or LEX_ENDPOINT")
            })?;

        let endpoint = Url::parse(endpoint)
            .map_err(|e| LexError::config(format!("Invalid runtime endpoint {endpoint}: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(LexError::config(format!("Runtime endpoint {endpoint} cannot carry a path")));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LexError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            region: config.region.trim().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Identifiers are percent-encoded as individual path segments
    fn turn_url(&self, request: &RecognizeTextRequest) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "bot",
                request.bot_id.as_str(),
                "botAlias",
                request.bot_alias_id.as_str(),
                "botLocale",
                request.locale_id.as_str(),
                "session",
                request.session_id.as_str(),
                "text",
            ]);
        }
        url
    }
}

#[async_trait]
impl ConversationClient for LexRuntimeClient {
    async fn recognize_text(
        &self,
        request: &RecognizeTextRequest,
    ) -> Result<RecognizeTextResponse, LexError> {
        let url = self.turn_url(request);
        tracing::debug!(%url, region = %self.region, session_id = %request.session_id, "sending utterance");

        let body = RecognizeTextBody {
            text: &request.text,
            session_state: &request.session_state,
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LexError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LexError::status(status.as_u16(), &error_text));
        }

        response
            .json::<RecognizeTextResponse>()
            .await
            .map_err(|e| LexError::decode(e.to_string()))
    }
}
