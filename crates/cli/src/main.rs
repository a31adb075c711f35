use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod output;

use updown_backtest::{load_snapshot_csv, BacktestEngine, BacktestReport, FeeCurve};
use updown_core::{BacktestConfig, DEFAULT_PRICE_BOUNDS};

#[derive(Parser)]
#[command(name = "updown")]
#[command(about = "Backtester for binary up/down prediction markets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Arguments shared by every backtest subcommand.
#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Snapshot CSV file
    #[arg(short, long)]
    data: PathBuf,

    /// Boolean column holding the up-side entry signal
    #[arg(long)]
    up_col: Option<String>,

    /// Boolean column holding the down-side entry signal
    #[arg(long)]
    down_col: Option<String>,

    /// Lowest fillable entry price (inclusive)
    #[arg(long, default_value_t = DEFAULT_PRICE_BOUNDS.0)]
    pmin: f64,

    /// Highest fillable entry price (inclusive)
    #[arg(long, default_value_t = DEFAULT_PRICE_BOUNDS.1)]
    pmax: f64,

    /// Multiplicative price worsening in basis points
    #[arg(long, default_value_t = 0.0)]
    slippage_bps: f64,

    /// Disable the per-share fee curve
    #[arg(long)]
    no_fee: bool,

    /// Fee curve scale
    #[arg(long, default_value_t = 0.25)]
    fee_rate: f64,

    /// Fee curve exponent applied to p(1-p)
    #[arg(long, default_value_t = 2.0)]
    fee_exponent: f64,

    /// Snapshot columns copied through to the ledger (comma-separated)
    #[arg(long, value_delimiter = ',')]
    passthrough: Vec<String>,

    /// Write the trade ledger CSV to this path
    #[arg(long)]
    ledger_out: Option<PathBuf>,

    /// Write the window summary CSV to this path
    #[arg(long)]
    summary_out: Option<PathBuf>,

    /// Stdout format: text, json (default: text)
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest staking a fraction of a compounding balance per window
    Percent {
        #[command(flatten)]
        common: RunArgs,

        /// Starting account balance
        #[arg(long, default_value_t = 1000.0)]
        initial_balance: f64,

        /// Fraction of the balance staked per window (e.g. 0.05)
        #[arg(long)]
        bet_pct: f64,
    },
    /// Backtest staking a constant dollar amount per trade
    Fixed {
        #[command(flatten)]
        common: RunArgs,

        /// Stake per trade in dollars
        #[arg(long, default_value_t = 100.0)]
        bet_size: f64,
    },
}

/// Output format for the stdout report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format: '{}'. Valid formats: text, json", s)),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let (common, config) = match cli.command {
        Commands::Percent {
            common,
            initial_balance,
            bet_pct,
        } => {
            let config = BacktestConfig::percent(initial_balance, bet_pct);
            (common, config)
        }
        Commands::Fixed { common, bet_size } => {
            let config = BacktestConfig::fixed(bet_size);
            (common, config)
        }
    };
    run_backtest(&common, config)
}

fn run_backtest(args: &RunArgs, config: BacktestConfig) -> Result<()> {
    let format = OutputFormat::parse(&args.format)?;
    let config = config
        .with_price_bounds(args.pmin, args.pmax)
        .with_slippage_bps(args.slippage_bps)
        .with_fee_enabled(!args.no_fee);

    let loaded = load_snapshot_csv(
        &args.data,
        &args.passthrough,
        args.up_col.as_deref(),
        args.down_col.as_deref(),
    )?;

    let engine = BacktestEngine::new(config)
        .with_fee_curve(FeeCurve::new(args.fee_rate, args.fee_exponent));
    let report = engine.run(
        &loaded.snapshots,
        loaded.up_signal.as_ref(),
        loaded.down_signal.as_ref(),
    )?;

    match format {
        OutputFormat::Text => print!("{}", format_text_report(&report)),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "ledger": report.ledger,
                "summary": report.summary,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    if let Some(path) = &args.ledger_out {
        output::write_ledger_csv(path, &report.ledger)?;
    }
    if let Some(path) = &args.summary_out {
        output::write_summary_csv(path, &report.summary)?;
    }

    Ok(())
}

/// Formats the run as a short text report.
fn format_text_report(report: &BacktestReport) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str("==================================================\n");
    out.push_str("                 BACKTEST RESULTS                 \n");
    out.push_str("==================================================\n");

    if report.summary.is_empty() {
        out.push_str("No trades executed.\n");
        out.push_str("==================================================\n");
        return out;
    }

    let first = &report.summary[0];
    let last = &report.summary[report.summary.len() - 1];
    out.push_str(&format!(
        "Period:         {} to {}\n",
        first.end_time.format("%Y-%m-%d %H:%M"),
        last.end_time.format("%Y-%m-%d %H:%M")
    ));
    out.push_str(&format!("Trades:         {}\n", report.ledger.len()));
    out.push_str(&format!("Windows:        {}\n", report.summary.len()));
    out.push('\n');

    out.push_str(&format!("Net P&L:        ${:.2}\n", last.cum_pnl));
    out.push_str(&format!("Win Rate:       {:.1}%\n", last.win_rate * 100.0));
    let max_drawdown = report
        .summary
        .iter()
        .map(|row| row.drawdown)
        .fold(0.0, f64::max);
    out.push_str(&format!("Max Drawdown:   ${max_drawdown:.2}\n"));

    if let Some(balance) = report.ledger.last().and_then(|p| p.balance) {
        out.push_str(&format!("Final Balance:  ${balance:.2}\n"));
    }
    out.push_str("==================================================\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use updown_core::Resolution;
    use updown_backtest::WindowSummary;

    // ============================================
    // OutputFormat Tests
    // ============================================

    #[test]
    fn output_format_parse_text() {
        assert_eq!(OutputFormat::parse("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("TEXT").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("txt").unwrap(), OutputFormat::Text);
    }

    #[test]
    fn output_format_parse_json() {
        assert_eq!(OutputFormat::parse("json").unwrap(), OutputFormat::Json);
    }

    #[test]
    fn output_format_parse_invalid() {
        assert!(OutputFormat::parse("xml").is_err());
        assert!(OutputFormat::parse("").is_err());
    }

    // ============================================
    // Report Formatting Tests
    // ============================================

    #[test]
    fn empty_report_prints_no_trades() {
        let report = BacktestReport {
            ledger: vec![],
            summary: vec![],
        };
        let text = format_text_report(&report);
        assert!(text.contains("No trades executed"));
    }

    #[test]
    fn report_contains_key_figures() {
        let report = BacktestReport {
            ledger: vec![],
            summary: vec![WindowSummary {
                end_time: Utc.with_ymd_and_hms(2026, 3, 1, 12, 15, 0).unwrap(),
                resolved: Resolution::Up,
                total_trades: 1,
                up_trades: 1,
                dn_trades: 0,
                up_avg_entry: Some(0.40),
                dn_avg_entry: None,
                up_pnl: 150.0,
                dn_pnl: 0.0,
                total_pnl: 150.0,
                cum_pnl: 150.0,
                drawdown: 0.0,
                win: true,
                win_rate: 1.0,
            }],
        };
        let text = format_text_report(&report);
        assert!(text.contains("BACKTEST RESULTS"));
        assert!(text.contains("Net P&L:        $150.00"));
        assert!(text.contains("Win Rate:       100.0%"));
        assert!(text.contains("Max Drawdown:   $0.00"));
        assert!(!text.contains("Final Balance"), "fixed runs have no balance");
    }
}
