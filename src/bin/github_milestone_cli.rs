use anyhow::Result;
use clap::Parser;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use github_milestone::app::{self, RunReport};
use github_milestone::config::{Args, GITHUB_ACCESS_TOKEN, LogLevel, OutputFormat};
use github_milestone::formatter::run_report_markdown;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider early to prevent "no process-level CryptoProvider available" panics
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let args = Args::parse();

    init_logging(args.log_level)?;

    info!("[-- GITHUB MILESTONE GENERATOR --------------------------------------------");
    display_parsed_args(&args);

    let access_token = env::var(GITHUB_ACCESS_TOKEN).ok();
    let report = match app::run(&args, access_token, app::connect_github).await {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            fatal_exit(1);
        }
    };

    print_report(&report, args.format)?;

    if !report.is_success() {
        error!("One or more requested operations failed.");
        fatal_exit(report.exit_code());
    }

    Ok(())
}

fn init_logging(log_level: LogLevel) -> Result<()> {
    let directive = format!("github_milestone={}", log_level.level_filter());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn display_parsed_args(args: &Args) {
    info!(
        "Parsed Command-line Arguments: GitHub API Domain: {}. GitHub Repository: {}. New Milestone Name: {}. New Milestone Due Date: {}. Close Milestones: {}. Logging Level: {:?}.",
        args.hostname,
        args.repository,
        args.milestone_name.as_deref().unwrap_or("none"),
        args.milestone_due_date.as_deref().unwrap_or("none"),
        args.close_milestones,
        args.log_level,
    );
}

fn print_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json_output = serde_json::to_string_pretty(report)?;
            println!("{}", json_output);
        }
        OutputFormat::Markdown => {
            println!("{}", run_report_markdown(report).0);
        }
    }
    Ok(())
}

fn fatal_exit(status: i32) -> ! {
    error!("Fatal error encountered. Exit status: {}", status);
    std::process::exit(status)
}
