//! # plm-bridge CLI
//!
//! Argument parsing and orchestration only. Client, automation and
//! transcription logic live in [`plm_bridge_core`].
//!
//! - `transcribe`: write a markdown transcription template for a video URL,
//!   optionally recording it in the sources ledger. No server needed.
//! - `build`: run an assembly plan (YAML) against the server and print the
//!   resulting report.
//! - `report`: print the assembly report for one item.
//! - `info`: print what the server says about itself.
//!
//! Server commands read `TEAMCENTER_URL`, `TEAMCENTER_USER` and
//! `TEAMCENTER_PASS` (see [`plm_bridge_core::config`]).
use crate::load_config::load_plan;
use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use plm_bridge_core::assembly::{assembly_report, build_assembly, AssemblyPlan, BuildReport};
use plm_bridge_core::config::ConnectionConfig;
use plm_bridge_core::error::BestEffort;
use plm_bridge_core::transcribe::{
    for_display, generate_template, update_sources, DEFAULT_OUTPUT_DIR, DEFAULT_SOURCES_FILE,
};
use plm_bridge_core::{PlmApi, TeamcenterClient};
use std::path::PathBuf;

/// CLI for plm-bridge: PLM automation and training-video transcription templates.
#[derive(Parser)]
#[clap(
    name = "plm-bridge",
    version,
    about = "Automate a Teamcenter-style PLM server and prepare training-video transcripts"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a transcription template for a training video
    Transcribe {
        /// Video URL
        #[clap(long)]
        url: String,
        /// Directory the template is written to
        #[clap(long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
        /// Mark the video as transcribed in the sources ledger
        #[clap(long)]
        update_sources: bool,
        /// Path to the sources ledger
        #[clap(long, default_value = DEFAULT_SOURCES_FILE)]
        sources: PathBuf,
    },
    /// Create an assembly, its components, BOM lines and change workflow from a YAML plan
    Build {
        /// Path to the YAML assembly plan
        #[clap(long)]
        plan: PathBuf,
    },
    /// Print item, BOM and where-used summary for an item
    Report {
        #[clap(long)]
        item: String,
        /// BOM depth; -1 for all levels
        #[clap(long, default_value_t = -1, allow_hyphen_values = true)]
        levels: i32,
    },
    /// Print server information
    Info,
}

async fn connect() -> Result<TeamcenterClient> {
    let config = ConnectionConfig::from_env();
    TeamcenterClient::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.base_url))
}

async fn disconnect(mut client: TeamcenterClient) {
    if let BestEffort::Ignored(e) = client.logout().await {
        tracing::warn!(error = %e, "Logout was not acknowledged by the server");
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_build_summary(report: &BuildReport) {
    println!("Assembly {} built", report.assembly.item_id);
    println!("  BOM lines added: {}", report.lines_added());
    let failed = report.failed_components();
    if !failed.is_empty() {
        println!("  Failed components: {}", failed.join(", "));
    }
    match &report.workflow {
        Some(Ok(wf)) => println!(
            "  Change workflow: {}",
            wf.workflow_id.as_deref().unwrap_or("<no id>")
        ),
        Some(Err(e)) => println!("  Change workflow not started: {e}"),
        None => {}
    }
}

async fn build_and_report(client: &TeamcenterClient, plan: &AssemblyPlan) -> Result<()> {
    let built = build_assembly(client, plan).await?;
    print_build_summary(&built);
    let report = assembly_report(client, &built.assembly.item_id, -1).await?;
    print_json(&report)
}

/// Async CLI entrypoint shared by `main` and the integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Transcribe {
            url,
            output,
            update_sources: record,
            sources,
        } => {
            tracing::info!(command = "transcribe", url = %url, "Generating transcription template");
            let now = Local::now();
            let generated = generate_template(&url, &output, now)?;
            println!("Transcript template saved to {}", generated.path.display());
            println!(
                "Platform: {} | timestamps: {} | commands: {} | features: {}",
                generated.metadata.platform,
                for_display(&generated.sections.timestamps).len(),
                for_display(&generated.sections.commands).len(),
                for_display(&generated.sections.features).len(),
            );
            if record {
                let ledger = update_sources(&sources, &url, &generated.path, now)?;
                println!("Updated sources ledger {}", ledger.display());
            }
            Ok(())
        }
        Commands::Build { plan } => {
            let plan = load_plan(plan)?;
            tracing::info!(command = "build", item_id = %plan.assembly.item_id, "Starting assembly build");
            let client = connect().await?;
            let result = build_and_report(&client, &plan).await;
            disconnect(client).await;
            match &result {
                Ok(()) => tracing::info!(command = "build", "Assembly build complete"),
                Err(e) => tracing::error!(command = "build", error = %e, "Assembly build failed"),
            }
            result
        }
        Commands::Report { item, levels } => {
            tracing::info!(command = "report", item_id = %item, levels, "Generating assembly report");
            let client = connect().await?;
            let result = match assembly_report(&client, &item, levels).await {
                Ok(report) => print_json(&report),
                Err(e) => Err(anyhow::Error::new(e).context(format!("Report for {item} failed"))),
            };
            disconnect(client).await;
            result
        }
        Commands::Info => {
            tracing::info!(command = "info", "Fetching server info");
            let client = connect().await?;
            let result = match client.get_server_info().await {
                Ok(info) => print_json(&info),
                Err(e) => Err(anyhow::Error::new(e).context("Server info request failed")),
            };
            disconnect(client).await;
            result
        }
    }
}
