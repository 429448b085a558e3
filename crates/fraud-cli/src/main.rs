use std::path::PathBuf;

use chrono::Duration;
use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, Context, Result};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use fraud_analysis::{analyze_sample, analyze_transactions, AnalysisConfig, AnalysisReport};
use fraud_data::ledger::parse_ledger_file;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fraudgraph")]
#[command(about = "Fraud-ring analysis over money-transfer ledgers")]
#[command(version)]
struct Cli {
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a ledger CSV and report suspicious accounts and rings.
    Analyze(AnalyzeArgs),
    /// Analyze the built-in sample ledger.
    Sample(SampleArgs),
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Path to the ledger CSV (header row with source/target/amount/timestamp).
    #[arg(long)]
    ledger: PathBuf,

    /// Output format: table (default) or json.
    #[arg(long, default_value = "table")]
    output: String,

    #[command(flatten)]
    tuning: TuningArgs,

    /// Abort the analysis if it exceeds this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

/// Arguments for the `sample` subcommand.
#[derive(Args, Debug)]
struct SampleArgs {
    /// Output format: table (default) or json.
    #[arg(long, default_value = "table")]
    output: String,

    #[command(flatten)]
    tuning: TuningArgs,
}

/// Engine tunables shared by both invocation modes.
#[derive(Args, Debug, Clone)]
struct TuningArgs {
    /// Maximum cycle hop count searched for fraud rings.
    #[arg(long, default_value_t = 6)]
    max_cycle_length: usize,

    /// Pass-through window for temporal velocity, in hours.
    #[arg(long, default_value_t = 72)]
    window_hours: i64,

    /// Cap on reported rings before the result is marked partial.
    #[arg(long, default_value_t = 256)]
    max_rings: usize,
}

impl TuningArgs {
    fn to_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            max_cycle_length: self.max_cycle_length,
            velocity_window: Duration::hours(self.window_hours),
            max_rings: self.max_rings,
            ..AnalysisConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    match cli.command {
        Commands::Analyze(args) => handle_analyze(args).await,
        Commands::Sample(args) => handle_sample(args).await,
    }
}

fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::WARN
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .wrap_err("failed to initialize tracing filter")?;

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    let pb = spinner("analyzing ledger")?;

    let config = args.tuning.to_config();
    let ledger_path = args.ledger.clone();
    let report = run_analysis(
        move || {
            let parsed = parse_ledger_file(&ledger_path)?;
            let mut report = analyze_transactions(&parsed.transactions, &config)?;
            report.skipped_rows = parsed.skipped_rows;
            Ok(report)
        },
        args.timeout_secs,
    )
    .await?;

    pb.finish_and_clear();
    print_report(&report, &args.output)?;

    info!(
        ledger = %args.ledger.display(),
        suspicious_accounts = report.suspicious_accounts.len(),
        fraud_rings = report.fraud_rings.len(),
        skipped_rows = report.skipped_rows,
        partial = report.partial,
        "analyze command completed"
    );

    Ok(())
}

async fn handle_sample(args: SampleArgs) -> Result<()> {
    let config = args.tuning.to_config();
    let report = run_analysis(move || analyze_sample(&config), None).await?;

    print_report(&report, &args.output)?;

    info!(
        suspicious_accounts = report.suspicious_accounts.len(),
        fraud_rings = report.fraud_rings.len(),
        "sample command completed"
    );

    Ok(())
}

/// Run the blocking analysis off the async runtime, optionally bounded
/// by a wall-clock timeout.
async fn run_analysis<F>(task: F, timeout_secs: Option<u64>) -> Result<AnalysisReport>
where
    F: FnOnce() -> Result<AnalysisReport> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(task);

    let joined = match timeout_secs {
        Some(secs) => tokio::time::timeout(std::time::Duration::from_secs(secs), handle)
            .await
            .map_err(|_| eyre!("analysis timed out after {} seconds", secs))?,
        None => handle.await,
    };

    joined.wrap_err("analysis task failed")?
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .wrap_err("failed to create progress style")?,
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

fn print_report(report: &AnalysisReport, output: &str) -> Result<()> {
    match output.to_lowercase().as_str() {
        "table" => print_report_tables(report),
        "json" => {
            let json =
                serde_json::to_string_pretty(report).wrap_err("failed to serialize report")?;
            println!("{json}");
            Ok(())
        }
        _ => Err(eyre!("unknown output format '{}'; use 'table' or 'json'", output)),
    }
}

fn print_report_tables(report: &AnalysisReport) -> Result<()> {
    let mut accounts = Table::new();
    accounts.load_preset(UTF8_BORDERS_ONLY);
    accounts.set_header(vec!["Account", "Score", "Patterns", "Ring"]);

    for account in &report.suspicious_accounts {
        let patterns: Vec<String> = account
            .detected_patterns
            .iter()
            .map(|pattern| pattern.to_string())
            .collect();
        accounts.add_row(vec![
            account.account_id.clone(),
            account.suspicion_score.to_string(),
            patterns.join("; "),
            account.ring_id.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }

    println!("\n{accounts}\n");

    if !report.fraud_rings.is_empty() {
        let mut rings = Table::new();
        rings.load_preset(UTF8_BORDERS_ONLY);
        rings.set_header(vec!["Ring", "Path", "Hops", "Total Flow", "Risk"]);

        for ring in &report.fraud_rings {
            rings.add_row(vec![
                ring.ring_id.clone(),
                ring.path.join(" → "),
                ring.cycle_length.to_string(),
                ring.total_flow.to_string(),
                format!("{:.1}", ring.risk_score),
            ]);
        }

        println!("{rings}\n");
    }

    let mut summary = Table::new();
    summary.load_preset(UTF8_BORDERS_ONLY);
    summary.set_header(vec!["Metric", "Value"]);
    summary.add_row(vec![
        "Suspicious accounts",
        &format!("{}", report.suspicious_accounts.len()),
    ]);
    summary.add_row(vec!["Fraud rings", &format!("{}", report.fraud_rings.len())]);
    summary.add_row(vec!["Graph edges", &format!("{}", report.edges.len())]);
    summary.add_row(vec!["Rows skipped", &format!("{}", report.skipped_rows)]);
    summary.add_row(vec![
        "Partial result",
        if report.partial { "yes" } else { "no" },
    ]);

    println!("{summary}\n");

    Ok(())
}
