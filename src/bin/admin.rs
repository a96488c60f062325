//! CLI administration tool for newsletter-links.
//!
//! Provides commands for issuing and revoking sessions, inspecting links,
//! viewing statistics, and performing database checks without HTTP access.
//!
//! # Usage
//!
//! ```bash
//! # Issue a session for a user (prints the raw token once)
//! cargo run --bin admin -- session create --user-id user-42 --tier pro
//!
//! # List all sessions
//! cargo run --bin admin -- session list
//!
//! # Revoke a session
//! cargo run --bin admin -- session revoke 3
//!
//! # Show a link with its event counts
//! cargo run --bin admin -- link show spring-26
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_*` (required): PostgreSQL connection
//! - `SESSION_SIGNING_SECRET` (required for `session create`): must match the server's
//! - `PUBLIC_BASE_URL` (optional): origin used when printing short URLs

use newsletter_links::application::services::{LinkService, SessionService};
use newsletter_links::config::{Config, mask_connection_string};
use newsletter_links::domain::entities::SubscriptionTier;
use newsletter_links::infrastructure::persistence::{
    PgAnalyticsSink, PgLinkRepository, PgSessionRepository,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing newsletter-links.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage user sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Inspect links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Session management subcommands.
#[derive(Subcommand)]
enum SessionAction {
    /// Issue a new session token
    Create {
        /// User the session belongs to
        #[arg(short, long)]
        user_id: String,

        /// Subscription tier: free, starter, pro, business, premium
        #[arg(short, long, value_parser = parse_tier)]
        tier: SubscriptionTier,

        /// Days until the session expires (never expires if omitted)
        #[arg(long)]
        ttl_days: Option<i64>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all sessions
    List,

    /// Revoke a session by id
    Revoke { id: i64 },
}

/// Link inspection subcommands.
#[derive(Subcommand)]
enum LinkAction {
    /// Show a link with its click counter and event counts
    Show { code: String },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

fn parse_tier(value: &str) -> Result<SubscriptionTier, String> {
    SubscriptionTier::parse(value).ok_or_else(|| {
        format!(
            "unknown tier '{}', expected one of: free, starter, pro, business, premium",
            value
        )
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = Config::load_database_url()?;
    let pool = PgPool::connect(&database_url)
        .await
        .with_context(|| format!("Failed to connect to {}", mask_connection_string(&database_url)))?;

    match cli.command {
        Commands::Session { action } => handle_session_action(action, &pool).await?,
        Commands::Link { action } => handle_link_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches session management commands.
async fn handle_session_action(action: SessionAction, pool: &PgPool) -> Result<()> {
    let repo = Arc::new(PgSessionRepository::new(Arc::new(pool.clone())));

    match action {
        SessionAction::Create {
            user_id,
            tier,
            ttl_days,
            yes,
        } => {
            let secret = std::env::var("SESSION_SIGNING_SECRET")
                .context("SESSION_SIGNING_SECRET must be set")?;
            let service = SessionService::new(repo, secret);
            create_session(&service, user_id, tier, ttl_days, yes).await?;
        }
        SessionAction::List => {
            let service = SessionService::new(repo, String::new());
            list_sessions(&service).await?;
        }
        SessionAction::Revoke { id } => {
            let service = SessionService::new(repo, String::new());
            revoke_session(&service, id).await?;
        }
    }

    Ok(())
}

/// Issues a session after confirmation and prints its raw token once.
///
/// Only the HMAC of the token is stored; it cannot be shown again.
async fn create_session(
    service: &SessionService<PgSessionRepository>,
    user_id: String,
    tier: SubscriptionTier,
    ttl_days: Option<i64>,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "Create Session".bright_blue().bold());
    println!();
    println!("  User: {}", user_id.cyan());
    println!("  Tier: {}", tier.as_str().cyan());
    println!(
        "  TTL:  {}",
        ttl_days
            .map(|d| format!("{} days", d))
            .unwrap_or_else(|| "never expires".to_string())
            .bright_black()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this session?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    let (token, session) = service
        .issue(&user_id, Some(tier), ttl_days)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create session: {}", e))?;

    println!();
    println!(
        "{} (id {})",
        "Session created".green().bold(),
        session.id.to_string().bright_black()
    );
    println!("  Token: {}", token.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "IMPORTANT: Save this token now! You won't be able to see it again."
            .red()
            .bold()
    );
    println!();
    println!("{}", "Use it as:".bright_white());
    println!(
        "  {}: Bearer {}",
        "Authorization".bright_cyan(),
        token.bright_yellow()
    );
    println!("  {}: session_token={}", "Cookie".bright_cyan(), token.bright_yellow());
    println!();

    Ok(())
}

/// Lists all sessions with status indicators.
async fn list_sessions(service: &SessionService<PgSessionRepository>) -> Result<()> {
    println!("{}", "Sessions".bright_blue().bold());
    println!();

    let sessions = service
        .list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list sessions: {}", e))?;

    if sessions.is_empty() {
        println!("{}", "  No sessions found".yellow());
        println!();
        println!(
            "  Create one with: {} admin session create --user-id <id> --tier <tier>",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<5} {:<24} {:<10} {:<18} {:<10}",
        "ID".bright_white().bold(),
        "User".bright_white().bold(),
        "Tier".bright_white().bold(),
        "Created".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "-".repeat(75).bright_black());

    let now = chrono::Utc::now();
    for session in &sessions {
        let status = if session.revoked_at.is_some() {
            "REVOKED".red()
        } else if session.is_active_at(now) {
            "ACTIVE".green()
        } else {
            "EXPIRED".yellow()
        };

        println!(
            "  {:<5} {:<24} {:<10} {:<18} {}",
            session.id.to_string().bright_black(),
            session.user_id.cyan(),
            session
                .subscription_tier
                .map(|t| t.as_str())
                .unwrap_or("-"),
            session
                .created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            status
        );
    }

    println!();
    println!(
        "  Total: {}",
        sessions.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Revokes a session with confirmation prompt (default: No).
async fn revoke_session(service: &SessionService<PgSessionRepository>, id: i64) -> Result<()> {
    println!("{}", "Revoke Session".bright_blue().bold());
    println!();
    println!("  ID: {}", id.to_string().cyan());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Revoke this session?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "Cancelled".red());
        return Ok(());
    }

    service
        .revoke(id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke session: {}", e))?;

    println!();
    println!("{}", "Session revoked successfully!".green().bold());
    println!();

    Ok(())
}

/// Dispatches link inspection commands.
async fn handle_link_action(action: LinkAction, pool: &PgPool) -> Result<()> {
    let pool = Arc::new(pool.clone());
    let public_base_url = std::env::var("PUBLIC_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());
    let service = LinkService::new(
        Arc::new(PgLinkRepository::new(pool.clone())),
        Arc::new(PgAnalyticsSink::new(pool)),
        public_base_url,
    );

    match action {
        LinkAction::Show { code } => {
            let (link, events) = service
                .get_link_details(&code)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;

            println!("{}", "Link".bright_blue().bold());
            println!();
            println!("  Code:      {}", link.short_code.cyan());
            println!("  URL:       {}", service.short_url(&link.short_code));
            println!("  Id:        {}", link.id.bright_black());
            println!("  Template:  {}", link.template_id.cyan());
            println!(
                "  Created:   {}",
                link.created_at.format("%Y-%m-%d %H:%M")
            );
            println!(
                "  Expires:   {}",
                link.expires_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string())
            );
            println!(
                "  UTM:       source={} medium={} campaign={}",
                link.utm.source,
                link.utm.medium,
                link.utm.campaign.as_deref().unwrap_or("-")
            );
            println!();
            println!(
                "  Clicks:    {}",
                link.clicks.to_string().bright_green().bold()
            );
            println!(
                "  Events:    {} clicks, {} views, {} edits",
                events.clicks, events.views, events.edits
            );
            println!();
        }
    }

    Ok(())
}

/// Displays link, click, event and session totals.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "Statistics".bright_blue().bold());
    println!();

    let links_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM newsletter_links")
        .fetch_one(pool)
        .await?;

    let clicks_count: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(clicks), 0)::BIGINT FROM newsletter_links")
            .fetch_one(pool)
            .await?;

    let events_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM link_events")
        .fetch_one(pool)
        .await?;

    let sessions_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_sessions
         WHERE revoked_at IS NULL AND (expires_at IS NULL OR expires_at > NOW())",
    )
    .fetch_one(pool)
    .await?;

    println!(
        "  Links:           {}",
        links_count.to_string().bright_green().bold()
    );
    println!(
        "  Clicks:          {}",
        clicks_count.to_string().bright_green().bold()
    );
    println!(
        "  Events:          {}",
        events_count.to_string().bright_green().bold()
    );
    println!(
        "  Active sessions: {}",
        sessions_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}
