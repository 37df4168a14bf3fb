use crate::api::BackendClient;
use crate::config::Config;
use crate::credentials::LocalStorage;
use crate::user_info::UserInfoProvider;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Build a provider against the configured backend. Nothing is fetched yet.
fn provider(config: &Config) -> Result<UserInfoProvider> {
    let base_url = config.backend_base_url()?;
    let credentials = LocalStorage::open(&config.credentials_path());
    let client = BackendClient::new(base_url.clone(), credentials)
        .context("Failed to create backend client")?;

    Ok(UserInfoProvider::new(Arc::new(client), base_url))
}

pub async fn whoami(config: &Config) -> Result<()> {
    let mut provider = provider(config)?;
    provider.load_profile().await;
    provider.load_storage_config().await;

    print!("{}", render_profile(&provider));
    Ok(())
}

pub async fn users(config: &Config) -> Result<()> {
    let mut provider = provider(config)?;
    provider.load_roster().await;

    print!("{}", render_roster(&provider));
    Ok(())
}

pub async fn avatar(config: &Config, username: &str, set: Option<String>) -> Result<()> {
    let mut provider = provider(config)?;
    provider.mount().await;

    if let Some(new_avatar) = set {
        if provider.username().is_empty() {
            println!("❌ Not signed in; there is no current user to patch.");
            return Ok(());
        }
        provider.set_local_avatar(new_avatar);
        println!("✏️  Patched avatar for {} locally (not sent to the server).", provider.username());
    }

    println!("{}", provider.resolve_avatar(username));
    Ok(())
}

fn render_profile(provider: &UserInfoProvider) -> String {
    let mut out = String::new();
    let username = if provider.username().is_empty() {
        "(not signed in)"
    } else {
        provider.username()
    };

    out.push_str(&format!("👤 User: {username}\n"));
    out.push_str(&format!(
        "   🖼  Avatar: {}\n",
        provider.avatar_url().unwrap_or("(none)")
    ));

    let storage = provider.storage_config();
    out.push_str("\n🗄  Storage:\n");
    if storage.use_external_storage {
        out.push_str(&format!("   External bucket {} ({})\n", storage.bucket_name, storage.region));
    } else {
        out.push_str("   Local storage\n");
    }

    out
}

fn render_roster(provider: &UserInfoProvider) -> String {
    let mut out = format!("📋 Users ({}):\n", provider.roster().len());
    for user in provider.roster() {
        out.push_str(&format!(
            "  • {} → {}\n",
            user.username,
            provider.resolve_avatar(&user.username)
        ));
    }
    out
}
