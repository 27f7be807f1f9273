use anyhow::anyhow;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use index_engine::IndexSeries;
use rust_decimal::Decimal;
use snapshot::MarketSnapshot;
use std::path::PathBuf;
use std::time::Duration;

mod loader;

/// The main entry point for the Meridian index application.
fn main() {
    // Initialize structured logging, filterable via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    match cli.command {
        Commands::Compute(args) => {
            if let Err(e) = handle_compute(args) {
                eprintln!("Error during compute: {e:#}");
                std::process::exit(1);
            }
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A capitalization-weighted market index and token metrics engine.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and token metrics from CSV feeds and print a summary.
    Compute(ComputeArgs),
}

#[derive(Parser)]
struct ComputeArgs {
    /// Path to the observation CSV (id,timestamp,price,market_cap,volume_24h).
    #[arg(long)]
    prices: PathBuf,

    /// Path to the token metadata CSV (id,name,symbol,tags).
    #[arg(long)]
    metadata: PathBuf,

    /// The level the index is seeded at before its first period.
    #[arg(long, default_value = "100")]
    base_value: Decimal,

    /// Print the index for a single tag instead of the overall index.
    #[arg(long)]
    tag: Option<String>,

    /// Number of trailing index points to print.
    #[arg(long, default_value_t = 10)]
    tail: usize,

    /// Number of token metric rows to print.
    #[arg(long, default_value_t = 20)]
    top: usize,

    /// Emit the full snapshot as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Compute Command Logic
// ==============================================================================

/// Handles the orchestration of one full calculation pass.
fn handle_compute(args: ComputeArgs) -> anyhow::Result<()> {
    let observations = loader::load_observations(&args.prices)?;
    let metadata = loader::load_metadata(&args.metadata)?;
    tracing::info!(
        observations = observations.len(),
        tokens = metadata.len(),
        "loaded input feeds"
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Computing market snapshot...");

    let snapshot = MarketSnapshot::compute(&observations, &metadata, args.base_value)?;
    spinner.finish_and_clear();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let (scope, series) = match &args.tag {
        Some(tag) => (
            tag.as_str(),
            snapshot
                .tag_index(tag)
                .ok_or_else(|| anyhow!("No index data available for tag: {tag}"))?,
        ),
        None => ("overall", snapshot.overall()),
    };

    print_index_tail(scope, series, args.tail);
    print_token_metrics(&snapshot, args.top);
    print_market_summary(&snapshot);
    Ok(())
}

fn print_index_tail(scope: &str, series: &IndexSeries, tail: usize) {
    println!(
        "\nIndex '{}' — {} points (showing last {})",
        scope,
        series.len(),
        tail.min(series.len())
    );

    let mut table = Table::new();
    table.set_header(vec![
        "Timestamp",
        "Index Return",
        "Index Value",
        "Total Market Cap",
    ]);
    let start = series.len().saturating_sub(tail);
    for point in &series.points()[start..] {
        table.add_row(vec![
            point.timestamp.to_rfc3339(),
            point.index_return.round_dp(6).to_string(),
            point.index_value.round_dp(4).to_string(),
            point.total_market_cap.round_dp(0).to_string(),
        ]);
    }
    println!("{table}");
}

fn print_token_metrics(snapshot: &MarketSnapshot, top: usize) {
    let mut records: Vec<_> = snapshot.token_metrics().values().collect();
    // Highest upward sensitivity first, token id as the tie-breaker.
    records.sort_by(|a, b| b.usens.cmp(&a.usens).then(a.token_id.cmp(&b.token_id)));

    println!(
        "\nToken metrics — {} tokens with sufficient history (showing top {})",
        records.len(),
        top.min(records.len())
    );

    let mut table = Table::new();
    table.set_header(vec![
        "Token", "USens", "DSens", "Beta", "24h %", "7d %", "Overbought",
    ]);
    for record in records.into_iter().take(top) {
        table.add_row(vec![
            record.token_id.clone(),
            record.usens.to_string(),
            record.dsens.to_string(),
            record.beta.to_string(),
            record.change24h.to_string(),
            record.change7d.to_string(),
            record.overbought_coef.to_string(),
        ]);
    }
    println!("{table}");
}

fn print_market_summary(snapshot: &MarketSnapshot) {
    println!(
        "\nMarket 24h change: {}%",
        snapshot.market_change_24h_pct().round_dp(2)
    );
    if let Some(best) = snapshot.best_performing_tag() {
        println!(
            "Best performing tag: {} ({}% 24h, {}% 7d)",
            best.tag,
            best.change_24h_pct.round_dp(2),
            best.change_7d_pct.round_dp(2)
        );
    }
    println!(
        "Tag indices built: {} (computed at {})",
        snapshot.tags().count(),
        snapshot.computed_at().to_rfc3339()
    );
}
