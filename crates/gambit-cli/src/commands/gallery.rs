//! Gallery commands

use crate::config::Workspace;
use anyhow::{Context, Result};
use bytes::Bytes;
use colored::Colorize;
use gambit_core::{require_admin, GalleryIndexer, ObjectStore, Uploader};
use std::path::Path;
use std::sync::Arc;

pub async fn list(bucket: Option<String>, folder: Option<String>, json: bool) -> Result<()> {
    let ws = Workspace::load()?;
    ws.checked_config()?;
    let bucket = ws.bucket(bucket)?;

    // An expired token would be rejected even for public buckets
    let client = if ws.settings.is_logged_in() {
        let session = ws.session(&ws.client()?).await;
        ws.client_for(&session)?
    } else {
        ws.anonymous_client()?
    };
    let store: Arc<dyn ObjectStore> = Arc::new(client);

    let indexer = GalleryIndexer::new(store).with_limit(ws.config.gallery.list_limit);
    let files = indexer
        .list(&bucket, folder.as_deref())
        .await
        .with_context(|| format!("Failed to list bucket '{}'", bucket))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    if files.is_empty() {
        println!("{}", "No files found".yellow());
        return Ok(());
    }

    println!(
        "{} {} file(s) in {}",
        "🖼".blue(),
        files.len(),
        bucket.cyan().bold()
    );
    println!();
    for file in &files {
        println!(
            "   {}  {}",
            file.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            file.path
        );
        println!("      {}", file.url.dimmed());
    }

    Ok(())
}

pub async fn upload(file: &Path, bucket: Option<String>, folder: Option<String>) -> Result<()> {
    let ws = Workspace::load()?;
    ws.checked_config()?;
    let bucket = ws.bucket(bucket)?;
    let client = ws.client()?;

    let session = ws.session(&client).await;
    let user = require_admin(&session)?;
    tracing::debug!("Upload authorized for {}", user.id);

    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .context("Upload path has no file name")?
        .to_string();
    let content_type = mime_guess::from_path(file)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    // Type is checked before the file is read
    let size = tokio::fs::metadata(file)
        .await
        .with_context(|| format!("Failed to read {:?}", file))?
        .len();
    ws.config.upload.validate(&content_type, size)?;

    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {:?}", file))?;

    let uploader = Uploader::new(Arc::new(client), ws.config.upload.clone());
    let stored = uploader
        .upload(
            &bucket,
            folder.as_deref(),
            &file_name,
            Bytes::from(data),
            &content_type,
        )
        .await?;

    println!("{} Uploaded {}", "✓".green(), stored.path.cyan());
    println!("  URL: {}", stored.url.dimmed());

    Ok(())
}

pub async fn remove(bucket: Option<String>, paths: Vec<String>, yes: bool) -> Result<()> {
    let ws = Workspace::load()?;
    ws.checked_config()?;
    let bucket = ws.bucket(bucket)?;
    let client = ws.client()?;

    let session = ws.session(&client).await;
    require_admin(&session)?;

    if !yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete {} file(s) from '{}'?",
                paths.len(),
                bucket
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Cancelled".yellow());
            return Ok(());
        }
    }

    let uploader = Uploader::new(Arc::new(client), ws.config.upload.clone());
    uploader.remove(&bucket, &paths).await?;

    println!("{} Removed {} file(s)", "✓".green(), paths.len());
    Ok(())
}
