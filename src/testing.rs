//! Mock implementations for testing
//!
//! These mocks let the chat widget and the user-info provider run without real I/O.

use crate::api::{ApiError, RosterEntry, StorageConfig, UserApi, UserProfile};
use crate::lex::{ConversationClient, LexError, RecognizeTextRequest, RecognizeTextResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Bind an axum router to an ephemeral local port and return its base URL
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// ============================================================================
// Mock conversational runtime
// ============================================================================

type QueuedTurn = (Duration, Result<RecognizeTextResponse, LexError>);

/// Conversational client that replays queued responses, optionally after a delay
#[derive(Default)]
pub struct MockConversationClient {
    responses: Mutex<VecDeque<QueuedTurn>>,
    requests: Mutex<Vec<RecognizeTextRequest>>,
}

impl MockConversationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_response(&self, response: RecognizeTextResponse) {
        self.queue_delayed(Duration::ZERO, Ok(response));
    }

    pub fn queue_error(&self, error: LexError) {
        self.queue_delayed(Duration::ZERO, Err(error));
    }

    pub fn queue_delayed(&self, delay: Duration, result: Result<RecognizeTextResponse, LexError>) {
        self.responses.lock().unwrap().push_back((delay, result));
    }

    pub fn recorded_requests(&self) -> Vec<RecognizeTextRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationClient for MockConversationClient {
    async fn recognize_text(
        &self,
        request: &RecognizeTextRequest,
    ) -> Result<RecognizeTextResponse, LexError> {
        self.requests.lock().unwrap().push(request.clone());
        let queued = self.responses.lock().unwrap().pop_front();
        match queued {
            Some((delay, result)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Err(LexError::network("no mock response queued")),
        }
    }
}

// ============================================================================
// Mock backend API
// ============================================================================

/// Backend API returning fixed results and counting calls
#[derive(Default)]
pub struct MockUserApi {
    pub config: Mutex<Option<StorageConfig>>,
    pub profile: Mutex<Option<UserProfile>>,
    pub roster: Mutex<Option<Vec<RosterEntry>>>,
    calls: AtomicUsize,
}

impl MockUserApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, username: &str, avatar: Option<&str>) -> Self {
        *self.profile.lock().unwrap() = Some(UserProfile {
            username: username.to_string(),
            avatar_url: avatar.map(str::to_string),
        });
        self
    }

    pub fn with_roster(self, entries: &[(&str, Option<&str>)]) -> Self {
        *self.roster.lock().unwrap() = Some(
            entries
                .iter()
                .map(|(username, avatar)| RosterEntry {
                    username: username.to_string(),
                    avatar: avatar.map(str::to_string),
                })
                .collect(),
        );
        self
    }

    pub fn with_config(self, config: StorageConfig) -> Self {
        *self.config.lock().unwrap() = Some(config);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn unavailable(endpoint: &str) -> ApiError {
        ApiError::Status {
            endpoint: endpoint.to_string(),
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[async_trait]
impl UserApi for MockUserApi {
    async fn fetch_config(&self) -> Result<StorageConfig, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.config.lock().unwrap().clone().ok_or_else(|| Self::unavailable("/api/config"))
    }

    async fn fetch_user_info(&self) -> Result<UserProfile, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.profile.lock().unwrap().clone().ok_or_else(|| Self::unavailable("/api/me/info"))
    }

    async fn fetch_all_users(&self) -> Result<Vec<RosterEntry>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.roster.lock().unwrap().clone().ok_or_else(|| Self::unavailable("/api/me/all-users"))
    }
}
