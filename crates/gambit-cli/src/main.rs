//! Gambit CLI
//!
//! Backoffice tooling for the board-game learning platform: lesson reading
//! times, gallery listings and uploads against the hosted backend.

mod api;
mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "gambit")]
#[command(author, version, about = "Gambit - backoffice tools for the board-game learning platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Lesson utilities
    Lesson {
        #[command(subcommand)]
        action: LessonAction,
    },

    /// Browse and manage storage galleries
    Gallery {
        #[command(subcommand)]
        action: GalleryAction,
    },

    /// Authentication management
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum LessonAction {
    /// Estimate how long a lesson takes to read
    #[command(name = "reading-time")]
    ReadingTime {
        /// Lesson file (JSON or YAML)
        file: PathBuf,

        /// Show per-block figures
        #[arg(short, long)]
        breakdown: bool,
    },
}

#[derive(Subcommand)]
enum GalleryAction {
    /// List files, newest first (whole bucket unless a folder is given)
    List {
        /// Bucket name (defaults to gallery.default_bucket)
        bucket: Option<String>,

        /// Only list this folder
        #[arg(short, long)]
        folder: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Upload a file (admin or moderator only)
    Upload {
        /// File to upload
        file: PathBuf,

        /// Bucket name (defaults to gallery.default_bucket)
        bucket: Option<String>,

        /// Destination folder
        #[arg(short, long)]
        folder: Option<String>,
    },
    /// Delete files (admin or moderator only)
    Remove {
        /// Bucket name
        #[arg(short, long)]
        bucket: Option<String>,

        /// Object paths to delete
        #[arg(required = true)]
        paths: Vec<String>,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Login to the backoffice
    Login {
        /// Email address (optional - will prompt if not provided)
        #[arg(short, long)]
        email: Option<String>,
        /// Password (optional - will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Logout
    Logout,
    /// Show current user and role
    Whoami,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set the backend URL
    SetBackend {
        /// Backend URL (e.g., https://academy.example.com)
        url: String,

        /// Public anonymous key of the project
        #[arg(long, env = "GAMBIT_ANON_KEY")]
        anon_key: Option<String>,
    },
    /// Show current configuration
    Show,
    /// Validate gambit.config.yaml in the working directory
    Validate,
    /// Reset to default configuration
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose {
            "gambit_cli=debug,gambit_core=debug"
        } else {
            "gambit_cli=info,gambit_core=warn"
        })
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    debug!("Starting Gambit CLI");

    let result = match cli.command {
        Commands::Lesson { action } => match action {
            LessonAction::ReadingTime { file, breakdown } => {
                commands::lesson::reading_time(&file, breakdown).await
            }
        },
        Commands::Gallery { action } => match action {
            GalleryAction::List {
                bucket,
                folder,
                json,
            } => commands::gallery::list(bucket, folder, json).await,
            GalleryAction::Upload {
                file,
                bucket,
                folder,
            } => commands::gallery::upload(&file, bucket, folder).await,
            GalleryAction::Remove { bucket, paths, yes } => {
                commands::gallery::remove(bucket, paths, yes).await
            }
        },
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => match (email, password) {
                (Some(e), Some(p)) => commands::auth::login_non_interactive(&e, &p).await,
                _ => commands::auth::login_interactive().await,
            },
            AuthAction::Logout => commands::auth::logout().await,
            AuthAction::Whoami => commands::auth::whoami().await,
        },
        Commands::Config { action } => match action {
            ConfigAction::SetBackend { url, anon_key } => {
                commands::config::set_backend(&url, anon_key).await
            }
            ConfigAction::Show => commands::config::show().await,
            ConfigAction::Validate => commands::config::validate().await,
            ConfigAction::Reset => commands::config::reset().await,
        },
    };

    if let Err(ref e) = result {
        error!("Command failed: {:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    result
}
