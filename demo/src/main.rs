//! Warden care-home reference runtime: demo CLI
//!
//! Runs one or all of the care-home scenarios against the real Warden
//! components (permission registry, consent store, decision engine,
//! emergency monitor, hash-chained audit trail) with mock roster data.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- consent-access
//!   cargo run -p demo -- break-glass
//!   cargo run -p demo -- expiry
//!   cargo run -p demo -- --config warden.toml check-config

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use warden_contracts::error::WardenResult;
use warden_ref_care::{
    scenarios::{break_glass, consent_access, expiry},
    Runtime, RuntimeConfig,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Warden: access authorization for care records.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Warden care-home reference runtime demo",
    long_about = "Runs Warden care-home scenarios showing consent-based access,\n\
                  break-glass grants with compliance alerts, grant expiry,\n\
                  and audit chain integrity."
)]
struct Cli {
    /// Runtime config TOML, checked by `check-config`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all scenarios in sequence.
    RunAll,
    /// Scenario 1: consent-based access across the whole rule chain.
    ConsentAccess,
    /// Scenario 2: break-glass grants, alerts, and revoke.
    BreakGlass,
    /// Scenario 3: grant expiry, sweeping, and audit queries.
    Expiry,
    /// Load the runtime config, build the runtime, and report what it wired.
    CheckConfig,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::ConsentAccess => consent_access::run_scenario(),
        Command::BreakGlass => break_glass::run_scenario(),
        Command::Expiry => expiry::run_scenario(),
        Command::CheckConfig => check_config(cli.config),
    };

    match result {
        Ok(()) => {
            println!("Done.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_all() -> WardenResult<()> {
    consent_access::run_scenario()?;
    break_glass::run_scenario()?;
    expiry::run_scenario()?;
    Ok(())
}

fn check_config(path: Option<PathBuf>) -> WardenResult<()> {
    let config = match &path {
        Some(p) => RuntimeConfig::from_file(p)?,
        None => RuntimeConfig::default(),
    };
    info!(config = ?path, "building runtime");

    let rt = Runtime::care_home_live(config)?;
    let cfg = rt.config();
    println!(
        "  config file:         {}",
        path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "(defaults)".into())
    );
    println!(
        "  permission matrix:   {}",
        cfg.permissions_file.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "built-in".into())
    );
    println!(
        "  audit journal:       {} ({} entries replayed)",
        cfg.audit_journal.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "in-memory".into()),
        rt.audit.len()
    );
    println!("  audit chain:         {}", if rt.audit.verify_integrity() { "VERIFIED" } else { "FAILED" });
    println!("  emergency settings:  {:?}", cfg.emergency);
    println!();
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Warden: access authorization for care records");
    println!("Care-home Reference Demo");
    println!("=============================================");
    println!();
    println!("Decision chain per access request (first match wins):");
    println!("  [1] Self-access     actor is the subject and holds access-own-data");
    println!("  [2] Emergency       emergency purpose with justification, responder role");
    println!("  [3] Consent         active, unexpired consent covering every data type");
    println!("  [4] Role            assigned-patients permission plus a confirmed assignment");
    println!("  [5] Default deny");
    println!("Every decision is appended to a SHA-256 hash-chained audit trail.");
    println!();
}
