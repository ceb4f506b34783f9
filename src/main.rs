//! Command-line interface for paging-check
//!
//! # Usage Examples
//!
//! ## Reads
//! ```bash
//! # Resolve the first dataset's first read group and check reads on reference "1"
//! paging-check reads --endpoint http://localhost:8000 --reference-name 1
//!
//! # Explicit ids, stricter duplicate handling, JSON report
//! paging-check reads --reference-id ref-1 --read-group-id rg1,rg2 \
//!   --strict-duplicates --output-format json
//! ```
//!
//! ## Variant Annotations
//! ```bash
//! paging-check variant-annotations --reference-name 1 --start 10177 --end 11008
//! ```
//!
//! ## Other Endpoints
//! ```bash
//! paging-check search --path variants/search --items-field variants --id-field id \
//!   --filter '{"variantSetId": "vs1", "referenceName": "1", "start": 0, "end": 100000}'
//! ```
//!
//! ## Plans
//! ```bash
//! paging-check plan checks.yaml --output-format markdown -o report.md
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use paging_check::config::{JsonTarget, ReadsTarget, TargetConfig, VariantAnnotationsTarget};
use paging_check::{render, run_plan, run_target, write_output, OutputOpts, PlanConfig, ServerOpts};
use paging_verify::{CheckArgs, ConsistencyReport};
use tracing::info;

#[derive(Parser)]
#[command(name = "paging-check")]
#[command(about = "Check that a GA4GH search API pages its results consistently")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check reads/search
    Reads {
        #[command(flatten)]
        target: ReadsTarget,

        #[command(flatten)]
        server: ServerOpts,

        #[command(flatten)]
        check: CheckArgs,

        #[command(flatten)]
        output: OutputOpts,
    },

    /// Check variantannotations/search
    VariantAnnotations {
        #[command(flatten)]
        target: VariantAnnotationsTarget,

        #[command(flatten)]
        server: ServerOpts,

        #[command(flatten)]
        check: CheckArgs,

        #[command(flatten)]
        output: OutputOpts,
    },

    /// Check any search endpoint following the GA4GH paging convention
    Search {
        #[command(flatten)]
        target: JsonTarget,

        #[command(flatten)]
        server: ServerOpts,

        #[command(flatten)]
        check: CheckArgs,

        #[command(flatten)]
        output: OutputOpts,
    },

    /// Check every target listed in a YAML plan file
    Plan {
        /// Path to the plan file
        plan: PathBuf,

        /// Bearer token, overriding the one in the plan file
        #[arg(long, env = "PAGING_CHECK_BEARER_TOKEN", hide_env_values = true)]
        bearer_token: Option<String>,

        #[command(flatten)]
        output: OutputOpts,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (reports, output) = match cli.command {
        Commands::Reads {
            target,
            server,
            check,
            output,
        } => {
            let report = check_one(TargetConfig::Reads(target), &server, &check).await?;
            (vec![report], output)
        }
        Commands::VariantAnnotations {
            target,
            server,
            check,
            output,
        } => {
            let report =
                check_one(TargetConfig::VariantAnnotations(target), &server, &check).await?;
            (vec![report], output)
        }
        Commands::Search {
            target,
            server,
            check,
            output,
        } => {
            let report = check_one(TargetConfig::Json(target), &server, &check).await?;
            (vec![report], output)
        }
        Commands::Plan {
            plan,
            bearer_token,
            output,
        } => {
            let plan = PlanConfig::from_file(&plan)?;
            let reports = run_plan(&plan, bearer_token.as_deref()).await?;
            (reports, output)
        }
    };

    let rendered = render(&reports, output.output_format)?;
    write_output(&rendered, output.output.as_deref())?;
    if let Some(path) = &output.output {
        info!("Report written to {:?}", path);
    }

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        anyhow::bail!(
            "Pagination check failed: {failed} of {} targets had failing scenarios",
            reports.len()
        );
    }
    Ok(())
}

async fn check_one(
    target: TargetConfig,
    server: &ServerOpts,
    check: &CheckArgs,
) -> anyhow::Result<ConsistencyReport> {
    let config = check.to_config()?;
    let client = server.client()?;
    run_target(&client, &target, &config).await
}
