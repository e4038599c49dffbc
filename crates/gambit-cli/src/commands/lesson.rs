//! Lesson commands

use anyhow::{Context, Result};
use colored::Colorize;
use gambit_core::reading_time::{block_minutes, word_count};
use gambit_core::{estimate_lesson, Lesson};
use std::path::Path;

/// Load a lesson from a JSON or YAML file
pub fn load_lesson(path: &Path) -> Result<Lesson> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read lesson from {:?}", path))?;

    let lesson = if path.extension().map(|e| e == "json").unwrap_or(false) {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse lesson JSON {:?}", path))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse lesson YAML {:?}", path))?
    };

    Ok(lesson)
}

pub async fn reading_time(path: &Path, breakdown: bool) -> Result<()> {
    let lesson = load_lesson(path)?;
    let minutes = estimate_lesson(&lesson);

    println!(
        "{} {} {}",
        "⏱".blue(),
        lesson.title.bold(),
        format!("~{} min", minutes).cyan()
    );

    if breakdown {
        println!();
        if let Some(ref intro) = lesson.intro {
            println!("   {:<10} {:>5} words", "intro".dimmed(), word_count(intro));
        }
        for (i, block) in lesson.content.iter().enumerate() {
            let title = block.title.as_deref().unwrap_or("");
            println!(
                "   {:<10} {:>5} words  {:>5.2} min  {}",
                format!("{}. {}", i + 1, block.kind),
                word_count(&block.content) + word_count(title),
                block_minutes(block),
                title.dimmed()
            );
        }
        if let Some(ref summary) = lesson.summary {
            println!("   {:<10} {:>5} words", "summary".dimmed(), word_count(summary));
        }
    }

    Ok(())
}
