//! Config command - Manage CLI configuration

use crate::config::{SettingsManager, Workspace};
use anyhow::{Context, Result};
use colored::Colorize;
use gambit_core::{ConfigManager, Settings};

/// Set the backend URL and key
pub async fn set_backend(url: &str, anon_key: Option<String>) -> Result<()> {
    let mut settings = SettingsManager::load().context("Failed to load settings")?;

    let url = url.trim().trim_end_matches('/');
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!(
            "Invalid URL: {}. URL must start with http:// or https://",
            url
        );
    }

    if settings.backend_url != url {
        // A session from another backend is meaningless here
        settings.clear_session();
    }
    settings.backend_url = url.to_string();
    if anon_key.is_some() {
        settings.anon_key = anon_key;
    }

    SettingsManager::save(&settings).context("Failed to save settings")?;

    println!("{} Backend URL set to: {}", "✓".green(), url.cyan());
    if settings.anon_key.is_none() {
        println!(
            "{}",
            "  Note: no anonymous key stored, pass --anon-key".yellow()
        );
    }

    Ok(())
}

/// Show current configuration
pub async fn show() -> Result<()> {
    let ws = Workspace::load()?;

    println!("{}", "📋 Current Configuration".blue().bold());
    println!();
    println!("   Backend:        {}", ws.backend_url().cyan());
    println!(
        "   Anonymous key:  {}",
        if ws.anon_key().is_some() {
            "configured".green()
        } else {
            "missing".red()
        }
    );
    println!(
        "   Default bucket: {}",
        ws.config
            .gallery
            .default_bucket
            .as_deref()
            .unwrap_or("-")
    );
    println!("   List limit:     {}", ws.config.gallery.list_limit);
    println!(
        "   Upload limit:   {} bytes ({})",
        ws.config.upload.max_bytes,
        ws.config.upload.allowed_types.join(", ")
    );
    println!(
        "   Logged in as:   {}",
        ws.settings.email.as_deref().unwrap_or("-")
    );
    println!();
    println!(
        "   Settings file:  {}",
        SettingsManager::settings_path()?.display().to_string().dimmed()
    );
    if let Some(ref path) = ws.config_path {
        println!("   Project config: {}", path.display().to_string().dimmed());
    }

    Ok(())
}

/// Validate the project configuration of the working directory
pub async fn validate() -> Result<()> {
    let ws = Workspace::load()?;

    let Some(ref path) = ws.config_path else {
        println!(
            "{}",
            "⚠️  No gambit.config.yaml found, defaults are in use".yellow()
        );
        return Ok(());
    };

    let report = ConfigManager::new().validate(&ws.config)?;

    for error in &report.errors {
        println!("   {} {}: {}", "✗".red(), error.field, error.message);
    }
    for warning in &report.warnings {
        println!("   {} {}: {}", "!".yellow(), warning.field, warning.message);
        if let Some(ref suggestion) = warning.suggestion {
            println!("      {}", suggestion.dimmed());
        }
    }

    report
        .into_result()
        .with_context(|| format!("{} is invalid", path.display()))?;

    println!("{} {} is valid", "✓".green(), path.display());
    Ok(())
}

/// Reset to default configuration
pub async fn reset() -> Result<()> {
    SettingsManager::save(&Settings::default()).context("Failed to reset settings")?;
    println!("{} Configuration reset to defaults", "✓".green());
    Ok(())
}
