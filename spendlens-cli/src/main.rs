use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use spendlens_core::CategorizedSummary;
use spendlens_finance::{report_filename, ReportWriter, StatementPipeline, XlsxReportWriter};
use spendlens_ingest::{PdfTextSource, PlainTextSource, TextSource};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod config;
mod health;
mod logging;
mod server;
mod state;

use config::Config;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SPENDLENS_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "spendlens", version = VERSION, about = "Categorize bank statement spending")]
struct Cli {
    /// Config file (default: ~/.spendlens/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Categorize a statement and print the per-category summary
    Categorize {
        /// Statement PDF
        path: PathBuf,

        /// Treat the input as already-extracted statement text
        #[arg(long)]
        text: bool,

        /// Print the summary as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Categorize a statement and write the spreadsheet report
    Export {
        /// Statement PDF
        path: PathBuf,

        /// Output file (default: ./expense_report_<timestamp>.xlsx)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Treat the input as already-extracted statement text
        #[arg(long)]
        text: bool,
    },

    /// Run the upload/export web server
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Report which capabilities are available
    Health,

    /// Manage ~/.spendlens/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config (no-op if it exists)
    Init,

    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Categorize { path, text, json } => {
            let cfg = config::load_config(config_path)?;
            let summary = categorize(&cfg, &path, text).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }

        Command::Export { path, out, text } => {
            let cfg = config::load_config(config_path)?;
            let summary = categorize(&cfg, &path, text).await?;
            let writer = XlsxReportWriter;
            let out = out.unwrap_or_else(|| {
                PathBuf::from(report_filename(&chrono::Local::now(), writer.file_extension()))
            });
            let bytes = writer.render(&summary).context("render report")?;
            std::fs::write(&out, bytes).with_context(|| format!("write {}", out.display()))?;
            println!(
                "Wrote {} ({} transactions, AED {:.2})",
                out.display(),
                summary.total_transactions,
                summary.total_expenses
            );
        }

        Command::Serve { host, port } => {
            let cfg = config::load_config(config_path)?;
            let host = host.unwrap_or_else(|| cfg.server.host.clone());
            let port = port.unwrap_or(cfg.server.port);
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .with_context(|| format!("invalid listen address {}:{}", host, port))?;
            server::serve(server::AppState::new(cfg), addr).await?;
        }

        Command::Health => {
            let cfg = config::load_config(config_path)?;
            let report = health::HealthReport::check(&cfg);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(config_path)?,
            ConfigCommand::Show => config::show_config(&config::load_config(config_path)?)?,
        },
    }

    Ok(())
}

async fn categorize(cfg: &Config, path: &Path, text: bool) -> Result<CategorizedSummary> {
    if !path.exists() {
        bail!("Statement not found: {}", path.display());
    }
    let source: Arc<dyn TextSource> = if text {
        Arc::new(PlainTextSource)
    } else {
        Arc::new(PdfTextSource)
    };
    let pipeline =
        StatementPipeline::from_env(source, &cfg.llm_config(), &cfg.pipeline_settings())?;
    let summary = pipeline
        .process_file(path)
        .await
        .with_context(|| format!("processing {}", path.display()))?;
    Ok(summary)
}

fn print_summary(summary: &CategorizedSummary) {
    if summary.is_empty() {
        println!("No transactions found.");
        return;
    }

    for (category, group) in &summary.categories {
        println!(
            "{:<20} AED {:>10.2}  ({} transactions)",
            category.as_str(),
            group.total,
            group.transactions.len()
        );
        for t in &group.transactions {
            println!("    {:<10} {:<48} {:>10.2}", t.date, t.description, t.amount);
        }
    }

    println!(
        "\n{:<20} AED {:>10.2}  ({} transactions)",
        "TOTAL", summary.total_expenses, summary.total_transactions
    );
}
