// src/main.rs

//! chronicle: historical timeline scraper and query CLI.
//!
//! Sweeps Wikipedia for historical events and periods, normalizes them
//! through an LLM extractor, and persists them to SQLite for querying.

use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{LevelFilter, warn};

use chronicle::cache::CacheStore;
use chronicle::config;
use chronicle::error::Result;
use chronicle::models::{Config, Event, UnitKey};
use chronicle::pipeline::{
    Orchestrator, RunOptions, SamplingPhase, default_civilization_terms,
};
use chronicle::services::{Extractor, OpenAiExtractor, PageFetcher, WikipediaClient};
use chronicle::store::SqliteStore;
use chronicle::utils::create_async_client;

#[derive(Parser, Debug)]
#[command(
    name = "chronicle",
    version,
    about = "Historical timeline scraper and query tool"
)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: String,

    /// Region to operate on (e.g. "European", "Chinese")
    #[arg(short, long, global = true, default_value = "European")]
    region: String,

    /// Root directory for the database and cache, overriding the config paths
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sweep the full year axis with phased sampling
    Sweep {
        /// Re-scrape and re-extract even when cached
        #[arg(long)]
        force: bool,
        /// Override the configured importance threshold
        #[arg(long)]
        min_importance: Option<i64>,
    },
    /// Sweep the Chinese dynasty pages
    Dynasties {
        #[arg(long)]
        force: bool,
    },
    /// Sweep civilization search terms
    Civilizations {
        #[arg(long)]
        force: bool,
        /// Terms to sweep instead of the built-in lists
        #[arg(long)]
        term: Vec<String>,
    },
    /// Extract and store named historical periods
    Periods {
        /// Period names, e.g. "Renaissance" "French Revolution"
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Query events within a year range
    Timeline {
        start_year: i32,
        end_year: i32,
        #[arg(long)]
        min_importance: Option<i64>,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Keyword search over stored events
    Search {
        keyword: String,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Contemporaneous events across regions around a year
    Compare {
        year: i32,
        /// Regions to compare
        #[arg(long, default_values_t = ["European".to_string(), "Chinese".to_string()])]
        regions: Vec<String>,
        #[arg(long, default_value_t = 6)]
        threshold: i64,
    },
    /// Database statistics
    Stats,
    /// Show cache contents per region and tier
    CacheInfo,
    /// Clear cache entries
    CacheClear {
        /// Clear every region, not just the selected one
        #[arg(long)]
        all: bool,
        /// Clear a single work-unit key within the region
        #[arg(long)]
        key: Option<String>,
    },
    /// Validate the configuration file
    Validate,
}

/// Wikipedia language edition backing a region.
fn language_for_region(region: &str) -> &'static str {
    match region {
        "Chinese" => "zh",
        _ => "en",
    }
}

/// Points both storage paths under `dir`, keeping the configured file names.
fn reroot_storage(cfg: &mut Config, dir: &str) {
    let root = Path::new(dir);
    let db_name = Path::new(&cfg.storage.database_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cfg.storage.database_path.clone());
    let cache_name = Path::new(&cfg.storage.cache_dir)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cfg.storage.cache_dir.clone());
    cfg.storage.database_path = root.join(db_name).to_string_lossy().into_owned();
    cfg.storage.cache_dir = root.join(cache_name).to_string_lossy().into_owned();
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_secs()
        .init();
}

async fn build_orchestrator(
    cfg: &Config,
    region: &str,
    force_refresh: bool,
    min_importance: Option<i64>,
) -> Result<Orchestrator> {
    let client = create_async_client(&cfg.scrape)?;
    let fetcher: Arc<dyn PageFetcher> = Arc::new(WikipediaClient::new(
        client.clone(),
        language_for_region(region),
    ));

    let llm = cfg.llm.resolve();
    let extractor: Option<Arc<dyn Extractor>> = match OpenAiExtractor::new(client, &llm) {
        Ok(extractor) => Some(Arc::new(extractor)),
        Err(error) => {
            warn!("LLM extractor unavailable ({error}); running in degraded mode");
            None
        }
    };

    let cache = CacheStore::new(&cfg.storage.cache_dir);
    let store = SqliteStore::open(&cfg.storage.database_path).await?;

    let mut options = RunOptions::from_config(&cfg.scrape, force_refresh);
    if let Some(min) = min_importance {
        options.min_importance = min;
    }

    Ok(Orchestrator::new(
        region, fetcher, extractor, cache, store, options,
    ))
}

fn print_events(events: &[Event]) {
    if events.is_empty() {
        println!("No events found.");
        return;
    }
    for event in events {
        let record = &event.record;
        let span = match record.end_year {
            Some(end) => format!("{} to {}", record.start_year, end),
            None => record.start_year.to_string(),
        };
        println!(
            "[{span}] {} (importance {}, {})",
            record.event_name, record.importance_level, record.region
        );
        if let Some(description) = &record.description {
            println!("    {description}");
        }
    }
    println!("{} event(s)", events.len());
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut cfg = config::load(Path::new(&cli.config))?;
    if let Some(dir) = &cli.data_dir {
        reroot_storage(&mut cfg, dir);
    }
    let region = cli.region.as_str();

    match cli.command {
        Command::Sweep {
            force,
            min_importance,
        } => {
            let orch = build_orchestrator(&cfg, region, force, min_importance).await?;
            let report = orch
                .sweep_full_timeline(&SamplingPhase::default_phases())
                .await;
            println!("{report}");
        }
        Command::Dynasties { force } => {
            let orch = build_orchestrator(&cfg, region, force, None).await?;
            let report = orch.sweep_dynasties().await;
            println!("{report}");
        }
        Command::Civilizations { force, term } => {
            let orch = build_orchestrator(&cfg, region, force, None).await?;
            let terms = if term.is_empty() {
                default_civilization_terms()
            } else {
                term
            };
            let report = orch.sweep_terms(&terms).await;
            println!("{report}");
        }
        Command::Periods { names } => {
            let orch = build_orchestrator(&cfg, region, false, None).await?;
            let report = orch.sweep_key_periods(&names).await;
            println!("{report}");
        }
        Command::Timeline {
            start_year,
            end_year,
            min_importance,
            limit,
        } => {
            let orch = build_orchestrator(&cfg, region, false, None).await?;
            let events = orch
                .timeline(start_year, end_year, min_importance, limit)
                .await?;
            print_events(&events);
        }
        Command::Search { keyword, limit } => {
            let orch = build_orchestrator(&cfg, region, false, None).await?;
            let events = orch.search(&keyword, limit).await?;
            print_events(&events);
        }
        Command::Compare {
            year,
            regions,
            threshold,
        } => {
            let orch = build_orchestrator(&cfg, region, false, None).await?;
            let grouped = orch.cross_regional_view(year, &regions, threshold).await?;
            if grouped.is_empty() {
                println!("No events found around {year}.");
            }
            for (region, events) in grouped {
                println!("== {region} ==");
                print_events(&events);
            }
        }
        Command::Stats => {
            let store = SqliteStore::open(&cfg.storage.database_path).await?;
            let stats = store.statistics().await?;
            println!("Events:  {}", stats.total_events);
            println!("Periods: {}", stats.total_periods);
            if let Some((min, max)) = stats.year_bounds {
                println!("Year range: {min} to {max}");
            }
            println!("By region:");
            for (region, count) in &stats.events_by_region {
                println!("  {region}: {count}");
            }
            println!("By category:");
            for (category, count) in &stats.events_by_category {
                println!("  {category}: {count}");
            }
            println!("By importance:");
            for (level, count) in &stats.importance_histogram {
                println!("  {level}: {count}");
            }
        }
        Command::CacheInfo => {
            let cache = CacheStore::new(&cfg.storage.cache_dir);
            let info = cache.info().await?;
            println!(
                "{} file(s) across {} region(s): {} raw, {} processed",
                info.total_files(),
                info.regions,
                info.raw_files,
                info.processed_files
            );
        }
        Command::CacheClear { all, key } => {
            let cache = CacheStore::new(&cfg.storage.cache_dir);
            let key = key.map(UnitKey::Entity);
            if all {
                cache.purge(None, None).await?;
                println!("Cleared all cache entries.");
            } else {
                cache.purge(Some(region), key.as_ref()).await?;
                println!("Cleared cache entries for {region}.");
            }
        }
        Command::Validate => {
            cfg.validate()?;
            println!("Configuration OK");
            println!("  user_agent:       {}", cfg.scrape.user_agent);
            println!("  timeout_secs:     {}", cfg.scrape.timeout_secs);
            println!("  min_importance:   {}", cfg.scrape.min_importance);
            println!("  database_path:    {}", cfg.storage.database_path);
            println!("  cache_dir:        {}", cfg.storage.cache_dir);
            println!("  llm.model:        {}", cfg.llm.model);
        }
    }

    Ok(())
}
