// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (RUST_LOG overrides the default "info")
// 2. Parse command-line arguments using clap
// 3. Dispatch to the crawl or rebuild handler
// 4. Exit with proper code (0 = done, 2 = fatal error)
//
// A crawl that dies part way is not lost: the checkpoint, seen-set and
// results CSV are all written as it goes, and the next `crawl` resumes.
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;
mod config;
mod crawl;
mod directory;
mod error;
mod query;
mod record;
mod store;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::{CrawlConfig, RunMode, StatePaths};
use crawl::{CrawlSession, RunSummary};
use directory::{HtmlRecordExtractor, HttpPageFetcher};
use store::{FingerprintStore, ResultSink};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl {
            reversed,
            state_dir,
            base_url,
            term_length,
            max_depth,
            page_timeout_secs,
            request_delay_ms,
            json,
        } => {
            let config = cli::crawl_config(
                reversed,
                state_dir,
                base_url,
                term_length,
                max_depth,
                page_timeout_secs,
                request_delay_ms,
            );
            handle_crawl(&config, json).await
        }
        Commands::Rebuild {
            reversed,
            state_dir,
        } => handle_rebuild(&StatePaths::for_mode(
            &state_dir,
            RunMode::from_reversed_flag(reversed),
        )),
    }
}

// Handles the 'crawl' subcommand
async fn handle_crawl(config: &CrawlConfig, json: bool) -> Result<i32> {
    let paths = config.paths();
    tracing::info!(
        mode = ?config.mode,
        results = %paths.results.display(),
        "starting crawl"
    );

    // Without a backend there is nothing to do; committed state stays as is
    let fetcher = HttpPageFetcher::connect(config)
        .await
        .context("could not start the directory backend")?;

    let mut session = CrawlSession::new(config, fetcher, HtmlRecordExtractor::new())
        .context("could not load crawl state")?;

    let summary = session.run().await.context("crawl aborted")?;

    print_summary(&summary, json)?;
    Ok(0)
}

// Handles the 'rebuild' subcommand
fn handle_rebuild(paths: &StatePaths) -> Result<i32> {
    println!("🔧 Rebuilding {} from {}", paths.seen.display(), paths.results.display());

    let sink = ResultSink::new(&paths.results);
    let seen = FingerprintStore::new(&paths.seen)
        .rebuild_from(&sink)
        .context("could not rebuild the seen-set")?;

    println!("✅ Seen-set now holds {} unique entries", seen.len());
    Ok(0)
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!();
    println!("📊 Summary ({}):", summary.mode);
    if let Some(from) = &summary.resumed_from {
        println!("   ⏩ Resumed from: {}", from);
    }
    println!("   🔤 Top-level terms: {}", summary.top_level_terms);
    println!("   🔍 Searches run: {}", summary.queries);
    println!("   📋 Entries seen: {}", summary.raw_entries);
    println!("   ✅ New entries saved: {}", summary.unique_entries);
    println!("   🌟 Total known entries: {}", summary.seen_total);
    if summary.depth_limited > 0 {
        println!(
            "   ⚠️  Searches still saturated at the depth limit: {}",
            summary.depth_limited
        );
    }
    Ok(())
}
