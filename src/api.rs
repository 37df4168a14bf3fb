//! Storefront backend REST client

use crate::credentials::LocalStorage;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_PATH: &str = "/api/config";
pub const PROFILE_PATH: &str = "/api/me/info";
pub const ROSTER_PATH: &str = "/api/me/all-users";
pub const DEFAULT_AVATAR_PATH: &str = "/api/me/avatar/user_default.png";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {endpoint} failed: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}")]
    Status { endpoint: String, status: StatusCode },

    #[error("could not decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Backend storage configuration. Field names follow the backend's config service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(rename = "USE_S3_STORAGE", default)]
    pub use_external_storage: bool,
    #[serde(rename = "S3_BUCKET", default)]
    pub bucket_name: String,
    #[serde(rename = "S3_REGION", default)]
    pub region: String,
}

/// The caller, as identified by the bearer credential
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(rename = "avatar", default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Default avatar resource served by the backend
pub fn default_avatar_url(base_url: &str) -> String {
    format!("{base_url}{DEFAULT_AVATAR_PATH}")
}

/// Backend calls the user-info provider depends on
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn fetch_config(&self) -> Result<StorageConfig, ApiError>;

    async fn fetch_user_info(&self) -> Result<UserProfile, ApiError>;

    async fn fetch_all_users(&self) -> Result<Vec<RosterEntry>, ApiError>;
}

/// reqwest-backed implementation of [`UserApi`]
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    credentials: LocalStorage,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, credentials: LocalStorage) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().build().map_err(ApiError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            credentials,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, authorized: bool) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);

        if authorized {
            match self.credentials.bearer_token() {
                Some(token) => request = request.bearer_auth(token),
                None => tracing::debug!(
                    store = %self.credentials.path().display(),
                    "no bearer token stored, sending {path} unauthenticated"
                ),
            }
        }

        let response = request.send().await.map_err(|source| ApiError::Network {
            endpoint: path.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: path.to_string(),
                status,
            });
        }

        response.json::<T>().await.map_err(|source| ApiError::Decode {
            endpoint: path.to_string(),
            source,
        })
    }
}

#[async_trait]
impl UserApi for BackendClient {
    async fn fetch_config(&self) -> Result<StorageConfig, ApiError> {
        self.get_json(CONFIG_PATH, false).await
    }

    async fn fetch_user_info(&self) -> Result<UserProfile, ApiError> {
        self.get_json(PROFILE_PATH, true).await
    }

    async fn fetch_all_users(&self) -> Result<Vec<RosterEntry>, ApiError> {
        self.get_json(ROSTER_PATH, true).await
    }
}
