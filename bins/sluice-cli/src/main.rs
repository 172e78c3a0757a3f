//! sluice-cli — Operator tooling for the Sluice disbursement engine.
//!
//! `compute` dry-runs the release calculator against a hypothetical
//! balance; `simulate` drives a full engine over the in-memory ledger
//! for many periods, with optional random transfer failures, and emits
//! the resulting event log as JSON lines.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use sluice_core::constants::{EngineParams, MAX_MULTIPLIER, MULTIPLIER_BASE};
use sluice_core::error::{ReleaseError, SluiceError};
use sluice_core::ledger::{ManualClock, MemoryLedger};
use sluice_core::types::{AccountId, TriggerKind};
use sluice_engine::{DripEngine, calculator};

/// Sluice operator command-line interface.
#[derive(Parser)]
#[command(name = "sluice-cli")]
#[command(version, about = "Capped, breaker-guarded drip disbursement.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dry-run the release calculator for a given balance.
    Compute(ComputeArgs),
    /// Simulate an engine over many periods with an in-memory ledger.
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct ComputeArgs {
    /// Current source balance, in base units.
    #[arg(long)]
    balance: u64,

    /// Release multiplier in percent of baseline (1..=500).
    #[arg(long, default_value_t = MULTIPLIER_BASE)]
    multiplier: u64,

    /// Baseline release per period, in base units.
    #[arg(long)]
    baseline: Option<u64>,
}

#[derive(Args)]
struct SimulateArgs {
    /// Number of periods to simulate.
    #[arg(long, default_value_t = 52)]
    periods: u64,

    /// Starting source balance, in base units.
    #[arg(long)]
    balance: u64,

    /// Release multiplier in percent of baseline (1..=500).
    #[arg(long, default_value_t = MULTIPLIER_BASE)]
    multiplier: u64,

    /// Baseline release per period, in base units.
    #[arg(long)]
    baseline: Option<u64>,

    /// Probability that any given transfer fails (0.0..=1.0).
    #[arg(long, default_value_t = 0.0)]
    failure_rate: f64,

    /// RNG seed for reproducible failure injection.
    #[arg(long)]
    seed: Option<u64>,

    /// Reset the circuit breaker automatically when it trips,
    /// modelling an operator who always intervenes.
    #[arg(long)]
    auto_reset: bool,

    /// Emit the full event log as JSON lines instead of a summary.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compute(args) => compute(args),
        Commands::Simulate(args) => simulate(args),
    }
}

fn params_with_baseline(baseline: Option<u64>) -> EngineParams {
    let mut params = EngineParams::default();
    if let Some(baseline) = baseline {
        params.baseline_release = baseline;
    }
    params
}

fn compute(args: ComputeArgs) -> Result<()> {
    if args.multiplier == 0 || args.multiplier > MAX_MULTIPLIER {
        bail!("multiplier must be in 1..={MAX_MULTIPLIER}, got {}", args.multiplier);
    }
    let params = params_with_baseline(args.baseline);
    let amount = calculator::compute_amount(&params, args.multiplier, args.balance);
    let emergency = args.balance <= params.emergency_threshold();

    println!("balance:             {}", args.balance);
    println!("baseline:            {}", params.baseline_release);
    println!("multiplier:          {}%", args.multiplier);
    println!("retained floor:      {}", params.min_retained());
    println!("absolute cap:        {}", params.absolute_cap());
    println!("emergency threshold: {}", params.emergency_threshold());
    if amount == 0 {
        println!("release:             0");
        println!("note: balance at or below the retained floor; no release possible");
    } else if emergency {
        println!(
            "release:             {} (emergency: 5% of balance)",
            calculator::emergency_amount(args.balance)
        );
    } else {
        println!("release:             {amount}");
    }
    Ok(())
}

fn simulate(args: SimulateArgs) -> Result<()> {
    if !(0.0..=1.0).contains(&args.failure_rate) {
        bail!("failure-rate must be in 0.0..=1.0, got {}", args.failure_rate);
    }
    let params = params_with_baseline(args.baseline);

    let authority = AccountId::from_bytes([1u8; 32]);
    let source = AccountId::from_bytes([2u8; 32]);
    let destination = AccountId::from_bytes([3u8; 32]);
    let engine_id = AccountId::from_bytes([9u8; 32]);

    let ledger = MemoryLedger::new();
    ledger.set_balance(source, args.balance);
    ledger.approve(source, engine_id, u64::MAX);
    let clock = ManualClock::new(0);

    let mut engine = DripEngine::new(
        ledger.clone(),
        clock.clone(),
        params,
        engine_id,
        source,
        destination,
        authority,
    )
    .context("engine construction")?;
    engine
        .set_multiplier(authority, args.multiplier)
        .context("invalid multiplier")?;

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    info!(seed, periods = args.periods, "starting simulation");

    let mut successes = 0u64;
    let mut failures = 0u64;
    let mut rejections = 0u64;
    for _ in 0..args.periods {
        clock.advance(params.period_secs);
        if args.failure_rate > 0.0 && rng.gen_bool(args.failure_rate) {
            ledger.fail_next_transfers_with(1, "injected failure");
        }
        match engine.execute(authority, TriggerKind::Automated) {
            Ok(_) => successes += 1,
            Err(SluiceError::Release(ReleaseError::Transfer(_))) => {
                failures += 1;
                // A failed attempt rolls the timer back, so retry once
                // within the same period the way a scheduler would.
                match engine.execute(authority, TriggerKind::Automated) {
                    Ok(_) => successes += 1,
                    Err(_) => failures += 1,
                }
            }
            Err(SluiceError::Release(ReleaseError::CircuitBreakerTripped { .. }))
                if args.auto_reset =>
            {
                engine.reset_breaker(authority)?;
                rejections += 1;
            }
            Err(_) => rejections += 1,
        }
    }

    if args.json {
        use std::io::Write;
        let mut out = std::io::stdout().lock();
        for event in engine.events() {
            serde_json::to_writer(&mut out, event)?;
            writeln!(out)?;
        }
        return Ok(());
    }

    println!("seed:               {seed}");
    println!("periods simulated:  {}", args.periods);
    println!("releases executed:  {}", engine.state().releases_executed);
    println!("total released:     {}", engine.state().total_released);
    println!("failed attempts:    {}", engine.state().failed_release_attempts);
    println!("successes/failures/rejections: {successes}/{failures}/{rejections}");
    println!("final source balance: {}", ledger.balance(&source));
    println!("final destination balance: {}", ledger.balance(&destination));
    println!("halted at end:      {}", engine.is_halted());
    Ok(())
}
