//! User-info provider: storage config, current profile and the user roster
//!
//! Everything here is a point-in-time snapshot. Nothing re-fetches on its own;
//! callers invoke [`UserInfoProvider::load_profile`] or
//! [`UserInfoProvider::load_roster`] again when they want fresher data.

use crate::api::{default_avatar_url, ApiError, RosterEntry, StorageConfig, UserApi, UserProfile};
use std::sync::Arc;

pub struct UserInfoProvider {
    api: Arc<dyn UserApi>,
    base_url: String,
    storage_config: StorageConfig,
    username: String,
    avatar_url: Option<String>,
    roster: Vec<RosterEntry>,
    mounted: bool,
}

impl UserInfoProvider {
    pub fn new(api: Arc<dyn UserApi>, base_url: impl Into<String>) -> Self {
        Self {
            api,
            base_url: base_url.into(),
            storage_config: StorageConfig::default(),
            username: String::new(),
            avatar_url: None,
            roster: Vec::new(),
            mounted: false,
        }
    }

    /// Run the three initial fetches. They are independent and may resolve in
    /// any order; each result only touches its own slice of state.
    pub async fn mount(&mut self) {
        if self.mounted {
            tracing::debug!("user info already mounted");
            return;
        }
        self.mounted = true;

        let api = Arc::clone(&self.api);
        let (config, profile, roster) = tokio::join!(
            api.fetch_config(),
            api.fetch_user_info(),
            api.fetch_all_users(),
        );

        self.apply_storage_config(config);
        self.apply_profile(profile);
        self.apply_roster(roster);

        tracing::info!(
            username = %self.username,
            users = self.roster.len(),
            external_storage = self.storage_config.use_external_storage,
            "user info mounted"
        );
    }

    pub async fn load_storage_config(&mut self) {
        let result = self.api.fetch_config().await;
        self.apply_storage_config(result);
    }

    pub async fn load_profile(&mut self) {
        let result = self.api.fetch_user_info().await;
        self.apply_profile(result);
    }

    pub async fn load_roster(&mut self) {
        let result = self.api.fetch_all_users().await;
        self.apply_roster(result);
    }

    fn apply_storage_config(&mut self, result: Result<StorageConfig, ApiError>) {
        match result {
            Ok(config) => self.storage_config = config,
            Err(e) => tracing::error!(error = %e, "Failed to fetch config"),
        }
    }

    fn apply_profile(&mut self, result: Result<UserProfile, ApiError>) {
        match result {
            Ok(profile) => {
                self.username = profile.username;
                self.avatar_url = profile.avatar_url;
            }
            Err(e) => tracing::error!(error = %e, "Failed to fetch user info"),
        }
    }

    fn apply_roster(&mut self, result: Result<Vec<RosterEntry>, ApiError>) {
        match result {
            Ok(roster) => self.roster = roster,
            Err(e) => tracing::error!(error = %e, "Failed to fetch users"),
        }
    }

    /// Avatar URL for `username`. Never fails and never performs I/O: unknown
    /// users and users without an avatar get the backend's default image.
    pub fn resolve_avatar(&self, username: &str) -> String {
        self.roster
            .iter()
            .find(|user| user.username == username)
            .and_then(|user| user.avatar.as_deref())
            .filter(|avatar| !avatar.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_avatar_url(&self.base_url))
    }

    /// Local-only patch after the caller has stored a new avatar elsewhere.
    ///
    /// Updates the current avatar and the roster entry of the current user.
    /// The roster diverges from the server until the next `load_roster`.
    pub fn set_local_avatar(&mut self, new_avatar: impl Into<String>) {
        let new_avatar = new_avatar.into();

        for user in self.roster.iter_mut().filter(|user| user.username == self.username) {
            user.avatar = Some(new_avatar.clone());
        }
        tracing::debug!(username = %self.username, "avatar patched locally");

        self.avatar_url = Some(new_avatar);
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    pub fn storage_config(&self) -> &StorageConfig {
        &self.storage_config
    }
}
