//! Authentication commands

use crate::config::{SettingsManager, Workspace};
use anyhow::{Context, Result};
use colored::Colorize;
use gambit_core::{can_access_admin, SessionState};

pub async fn login_interactive() -> Result<()> {
    println!("{}", "🔹 Login to Gambit backoffice".blue().bold());
    println!();

    let email: String = dialoguer::Input::new()
        .with_prompt("Email")
        .interact_text()?;

    let password: String = dialoguer::Password::new()
        .with_prompt("Password")
        .interact()?;

    println!();
    println!("{}", "🔐 Authenticating...".dimmed());

    do_login(&email, &password).await
}

pub async fn login_non_interactive(email: &str, password: &str) -> Result<()> {
    println!("{}", "🔹 Login to Gambit backoffice".blue().bold());
    println!();
    println!("   Email: {}", email.dimmed());
    println!("   Password: {}", "********".dimmed());
    println!();
    println!("{}", "🔐 Authenticating...".dimmed());

    do_login(email, password).await
}

async fn do_login(email: &str, password: &str) -> Result<()> {
    let ws = Workspace::load()?;
    let client = ws.client()?;

    let (tokens, user) = client.login(email, password).await.context("Login failed")?;

    let mut settings = ws.settings;
    settings.access_token = Some(tokens.access_token);
    settings.refresh_token = Some(tokens.refresh_token);
    settings.user_id = Some(user.id.clone());
    settings.email = user.email.clone().or_else(|| Some(email.to_string()));
    SettingsManager::save(&settings)?;

    println!();
    println!("{}", "✅ Login successful!".green().bold());
    println!();
    println!("   Welcome, {}!", settings.email.as_deref().unwrap_or(&user.id).cyan());

    Ok(())
}

pub async fn logout() -> Result<()> {
    let ws = Workspace::load()?;

    let Some(token) = ws.settings.access_token.clone() else {
        println!("{}", "⚠️  Not logged in".yellow());
        return Ok(());
    };

    // Revoking is best effort, the local session is cleared regardless
    if let Ok(client) = ws.client() {
        let _ = client.logout(&token).await;
    }

    let mut settings = ws.settings;
    settings.clear_session();
    SettingsManager::save(&settings)?;

    println!("{}", "✅ Logged out successfully".green());
    Ok(())
}

pub async fn whoami() -> Result<()> {
    let ws = Workspace::load()?;

    if !ws.settings.is_logged_in() {
        println!("{}", "⚠️  Not logged in".yellow());
        return Ok(());
    }

    let client = ws.client()?;
    let session = ws
        .check_session(&client)
        .await
        .context("Could not verify the stored session")?;

    match &session {
        SessionState::SignedIn(user) => {
            println!("{}", "👤 User Info".blue().bold());
            println!();
            println!("   ID:    {}", user.id.dimmed());
            if let Some(ref email) = user.email {
                println!("   Email: {}", email.cyan());
            }
            println!("   Role:  {}", user.role);
            if can_access_admin(&session) {
                println!("   {}", "✓ Admin area access".green());
            } else {
                println!("   {}", "✗ No admin area access".red());
            }
        }
        _ => {
            println!(
                "{}",
                "⚠️  Stored session could not be verified. Run: gambit auth login".yellow()
            );
        }
    }

    Ok(())
}
