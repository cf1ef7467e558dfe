//! Fit engine - garment fit verdicts and attention tour
//!
//! Loads the shopper's profile and a garment from the catalog, prints the
//! per-zone verdict set as JSON, then runs one presentation session and
//! prints every focus change as a JSON line. Hover input can be scripted
//! with `--hover zone@ms` and `--hover-leave ms` (offsets from session start).

use anyhow::Context;
use clap::Parser;
use fit_engine::domain::{UserId, UserProfile, Zone};
use fit_engine::infra::{Config, Metrics};
use fit_engine::io::{GarmentCatalog, JsonProfileStore, ProfileProvider, TomlCatalog};
use fit_engine::services::{analyze, spawn_session_with_log, FocusPhase};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Fit engine - size verdicts and zone highlighting for a garment
#[derive(Parser, Debug)]
#[command(name = "fit-engine", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// User whose saved profile is compared against the garment
    #[arg(short, long)]
    user: Option<String>,

    /// Garment to analyze
    #[arg(short, long, default_value = "knit-sweater-m")]
    sku: String,

    /// Scripted hover: `<zone>@<ms>`, e.g. `chest@2000` (repeatable)
    #[arg(long, value_parser = parse_hover)]
    hover: Vec<(Zone, u64)>,

    /// Scripted hover leave at `<ms>` (repeatable)
    #[arg(long)]
    hover_leave: Vec<u64>,

    /// Print the verdict set and exit without running the tour
    #[arg(long)]
    report_only: bool,
}

fn parse_hover(s: &str) -> Result<(Zone, u64), String> {
    let (zone, at) = s.split_once('@').ok_or_else(|| format!("expected <zone>@<ms>, got '{s}'"))?;
    let zone: Zone = zone.parse().map_err(|e| format!("{e}"))?;
    let at: u64 = at.parse().map_err(|e| format!("invalid offset '{at}': {e}"))?;
    Ok((zone, at))
}

#[derive(Debug, Clone, Copy)]
enum ScriptAction {
    Enter(Zone),
    Leave,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!(version = %env!("CARGO_PKG_VERSION"), git_hash = %env!("GIT_HASH"), "fit_engine_starting");

    let config_path = args.config.clone().unwrap_or_else(|| Config::resolve_config_path(&[]));
    let config = Config::load_from_path(&config_path);
    let timings = config.timings();

    info!(
        config_file = %config.config_file(),
        catalog_file = ?config.catalog_file(),
        profiles_dir = %config.profiles_dir(),
        initial_delay_ms = %timings.initial_delay.as_millis(),
        tour_zoom_ms = %timings.tour_zoom.as_millis(),
        tour_hold_ms = %timings.tour_hold.as_millis(),
        manual_zoom_ms = %timings.manual_zoom.as_millis(),
        "config_loaded"
    );

    let metrics = Arc::new(Metrics::new());

    let catalog = match config.catalog_file() {
        Some(file) => TomlCatalog::from_file(file)
            .with_context(|| format!("Failed to load garment catalog {file}"))?,
        None => TomlCatalog::builtin(),
    };
    let garment = catalog.get_garment(&args.sku).await?;

    let profile = match &args.user {
        Some(user) => load_profile(&config, &metrics, &UserId::from(user.as_str())).await,
        None => None,
    };

    let report = analyze(profile.as_ref(), &garment);
    println!("{}", report.to_json());

    if args.report_only {
        return Ok(());
    }

    // Periodic metrics summary
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs().max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            metrics_clone.report().log();
        }
    });

    let mut script: Vec<(u64, ScriptAction)> =
        args.hover.iter().map(|&(zone, at)| (at, ScriptAction::Enter(zone))).collect();
    script.extend(args.hover_leave.iter().map(|&at| (at, ScriptAction::Leave)));
    script.sort_by_key(|(at, _)| *at);
    let mut script = script.into_iter().peekable();

    let (handle, mut focus_log) =
        spawn_session_with_log(report, timings, metrics.clone(), config.focus_log_capacity());
    let started_at = Instant::now();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last_phase = FocusPhase::Idle;
    loop {
        let next_at = script.peek().map(|(at, _)| started_at + Duration::from_millis(*at));

        // Settled and manual focus are both stable without further input
        if next_at.is_none() && matches!(last_phase, FocusPhase::Settled | FocusPhase::Manual) {
            break;
        }

        tokio::select! {
            _ = &mut ctrl_c => {
                info!("shutdown_signal_received");
                break;
            }
            event = focus_log.recv() => {
                let Some(event) = event else { break };
                last_phase = event.focus.phase;
                println!("{}", serde_json::to_string(&event)?);
            }
            _ = tokio::time::sleep_until(next_at.unwrap_or(started_at)), if next_at.is_some() => {
                match script.next() {
                    Some((_, ScriptAction::Enter(zone))) => handle.on_zone_hover_enter(zone).await,
                    Some((_, ScriptAction::Leave)) => handle.on_zone_hover_leave().await,
                    None => {}
                }
            }
        }
    }

    let last = handle.close().await;
    info!(zone = ?last.and_then(|f| f.zone), "session_finished");
    metrics.report().log();

    info!("fit-engine shutdown complete");
    Ok(())
}

/// Profile lookup failures degrade to "no profile" (every zone missing data)
async fn load_profile(config: &Config, metrics: &Metrics, user_id: &UserId) -> Option<UserProfile> {
    let store = JsonProfileStore::new(config.profiles_dir());
    match store.get_profile(user_id).await {
        Ok(profile) => {
            if profile.is_none() {
                info!(user_id = %user_id, "profile_absent");
            }
            profile
        }
        Err(e) => {
            metrics.record_profile_lookup_failure();
            warn!(user_id = %user_id, error = %e, "profile_lookup_failed");
            None
        }
    }
}
