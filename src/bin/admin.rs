//! CLI administration tool for shortlinks.
//!
//! Manages links, prints statistics and metrics, and checks the database
//! without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create a link that stops after 100 visits and expires in a day
//! cargo run --bin admin -- link create --url https://example.com --max-clicks 100 --expires-in-hours 24
//!
//! # Inspect, ban or delete a link
//! cargo run --bin admin -- link show 42
//! cargo run --bin admin -- link ban 42
//! cargo run --bin admin -- link delete 42 -y
//!
//! # Click statistics over the last 30 days
//! cargo run --bin admin -- stats 42 --range 30d
//!
//! # Metrics exposition text
//! cargo run --bin admin -- metrics
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server; see [`shortlinks::config`].

use shortlinks::application::services::{LinkStatsReport, StatsRange};
use shortlinks::config::{self, Config};
use shortlinks::domain::entities::{BucketCount, Link, NewLink};
use shortlinks::server;
use shortlinks::state::{AppState, Settings};

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use tokio::sync::mpsc;

/// CLI tool for managing shortlinks.
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
    /// Manage links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Show click statistics of a link
    Stats {
        /// Link ID
        id: i64,

        /// Window: 1d, 7d or 30d
        #[arg(short, long, default_value = "7d")]
        range: String,
    },

    /// Print metrics in exposition format
    Metrics,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Link management subcommands.
#[derive(Subcommand)]
enum LinkAction {
    /// Create a signed link
    Create {
        /// Destination URL
        #[arg(short, long)]
        url: String,

        /// Maximum number of counted visits
        #[arg(short, long)]
        max_clicks: Option<i64>,

        /// Hours until the link expires
        #[arg(short, long)]
        expires_in_hours: Option<i64>,
    },

    /// Show a link
    Show {
        /// Link ID
        id: i64,
    },

    /// Ban a link
    Ban {
        /// Link ID
        id: i64,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Soft-delete a link
    Delete {
        /// Link ID
        id: i64,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env().context("Invalid configuration")?;
    let pool = server::connect_database(&config).await?;

    match cli.command {
        Commands::Link { action } => handle_link_action(action, &config, pool).await?,
        Commands::Stats { id, range } => handle_stats(id, &range, &config, pool).await?,
        Commands::Metrics => handle_metrics(&config, pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Builds the same services the server uses.
///
/// Click events are never produced here, so the queue receiver is dropped.
async fn app_state(config: &Config, pool: PgPool) -> AppState {
    let backends = server::build_backends(config, pool).await;
    let (click_tx, _) = mpsc::channel(1);
    AppState::new(&backends, &Settings::from_config(config), click_tx)
}

/// Dispatches link management commands.
async fn handle_link_action(action: LinkAction, config: &Config, pool: PgPool) -> Result<()> {
    let state = app_state(config, pool).await;

    match action {
        LinkAction::Create {
            url,
            max_clicks,
            expires_in_hours,
        } => create_link(&state, url, max_clicks, expires_in_hours).await,
        LinkAction::Show { id } => {
            let link = state.link_service.show(id).await.map_err(anyhow_err)?;
            print_link(&state, &link);
            Ok(())
        }
        LinkAction::Ban { id, yes } => moderate(&state, id, yes, Moderation::Ban).await,
        LinkAction::Delete { id, yes } => moderate(&state, id, yes, Moderation::Delete).await,
    }
}

async fn create_link(
    state: &AppState,
    url: String,
    max_clicks: Option<i64>,
    expires_in_hours: Option<i64>,
) -> Result<()> {
    println!("{}", "Create link".bright_blue().bold());
    println!();

    let new_link = NewLink {
        url,
        expires_at: expires_in_hours.map(|h| Utc::now() + Duration::hours(h)),
        max_clicks,
        domain_scope: None,
    };

    let link = state
        .link_service
        .create(new_link)
        .await
        .map_err(anyhow_err)?;

    println!("{}", "✓ Link created".green().bold());
    println!();
    print_link(state, &link);

    Ok(())
}

#[derive(Clone, Copy)]
enum Moderation {
    Ban,
    Delete,
}

/// Bans or deletes a link after showing it and asking for confirmation.
async fn moderate(state: &AppState, id: i64, skip_confirm: bool, action: Moderation) -> Result<()> {
    let verb = match action {
        Moderation::Ban => "Ban",
        Moderation::Delete => "Delete",
    };

    let link = state.link_service.show(id).await.map_err(anyhow_err)?;
    print_link(state, &link);

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt(format!("{verb} this link?"))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "✗ Cancelled".red());
            return Ok(());
        }
    }

    match action {
        Moderation::Ban => state.link_service.ban(id).await,
        Moderation::Delete => state.link_service.delete(id).await,
    }
    .map_err(anyhow_err)?;

    println!("{}", format!("✓ {verb} done").green().bold());
    Ok(())
}

fn print_link(state: &AppState, link: &Link) {
    let status = if link.is_deleted() {
        "DELETED".red()
    } else if link.is_banned {
        "BANNED".red()
    } else if link.is_expired_at(Utc::now()) {
        "EXPIRED".yellow()
    } else {
        "ACTIVE".green()
    };

    let limit = link
        .max_clicks
        .map_or_else(|| "unlimited".to_string(), |m| m.to_string());
    let expires = link
        .expires_at
        .map_or_else(|| "never".to_string(), |e| e.format("%Y-%m-%d %H:%M").to_string());

    println!("  ID:        {}", link.id.to_string().bright_black());
    println!("  Short URL: {}", state.short_url(&link.slug).bright_yellow());
    println!("  Target:    {}", link.url.cyan());
    println!("  Clicks:    {} / {}", link.clicks_count, limit);
    println!("  Expires:   {}", expires);
    println!("  Status:    {}", status);
    println!();
}

/// Prints the series total and breakdowns of one link.
async fn handle_stats(id: i64, range: &str, config: &Config, pool: PgPool) -> Result<()> {
    let state = app_state(config, pool).await;
    let range = StatsRange::parse(Some(range));

    let report = state
        .stats_service
        .link_stats(id, range)
        .await
        .map_err(anyhow_err)?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &LinkStatsReport) {
    println!(
        "{}",
        format!("Statistics for link {} ({})", report.link_id, report.range.as_str())
            .bright_blue()
            .bold()
    );
    println!(
        "  {} → {}",
        report.from.format("%Y-%m-%d %H:%M").to_string().bright_black(),
        report.to.format("%Y-%m-%d %H:%M").to_string().bright_black()
    );
    println!();

    let total: i64 = report.series.iter().map(|h| h.count).sum();
    println!("  Total clicks: {}", total.to_string().bright_green().bold());
    println!(
        "  Buckets below {} are hidden",
        report.k.to_string().bright_white()
    );
    println!();

    print_buckets("Referrers", &report.by_referrer);
    print_buckets("Countries", &report.by_country);
    print_buckets("Devices", &report.by_device);
}

fn print_buckets(title: &str, buckets: &[BucketCount]) {
    println!("  {}", title.bright_white().bold());
    if buckets.is_empty() {
        println!("    {}", "(none)".bright_black());
    }
    for b in buckets {
        println!("    {:<40} {}", b.bucket.cyan(), b.count);
    }
    println!();
}

async fn handle_metrics(config: &Config, pool: PgPool) -> Result<()> {
    if !config.is_cache_enabled() {
        eprintln!(
            "{}",
            "Redis is not configured: metrics live in the server process and cannot be read here."
                .yellow()
        );
        return Ok(());
    }

    let state = app_state(config, pool).await;
    let text = state
        .metrics
        .render()
        .await
        .context("Failed to read metrics")?;

    print!("{text}");
    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
                .fetch_one(pool)
                .await?;

            let rollup_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clicks_agg")
                .fetch_one(pool)
                .await?;

            println!("{}", "✓ Database connection OK".green().bold());
            println!();
            println!("  PostgreSQL:  {}", version.bright_white());
            println!("  Links:       {}", links.to_string().bright_green().bold());
            println!(
                "  Rollup rows: {}",
                rollup_rows.to_string().bright_green().bold()
            );
            println!();
        }
    }

    Ok(())
}

fn anyhow_err(e: shortlinks::AppError) -> anyhow::Error {
    let info = e.to_error_info();
    if info.details.is_null() || info.details == serde_json::json!({}) {
        anyhow::anyhow!("{}", info.message)
    } else {
        anyhow::anyhow!("{}: {}", info.message, info.details)
    }
}
