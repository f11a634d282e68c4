use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tcinit_db::MongoAdmin;
use tcinit_kernel::settings::Settings;
use tcinit_kernel::ProvisioningPlan;
use tcresults_init::{VerifyOptions, VerifyReport};

#[derive(Debug, Parser)]
#[command(name = "tcinit", version, about = "Initialize and inspect the tcresults database")]
struct Cli {
    /// Administrative connection string; overrides `database.uri` from settings.
    #[arg(long, global = true, env = "MONGODB_URI")]
    uri: Option<String>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Command-line values win over every settings layer.
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(uri) = &self.uri {
            settings.database.uri = uri.clone();
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the initialization routine once.
    Run,
    /// Check that the principal and collection exist as expected.
    Verify {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
        /// Fail if the collection holds any documents.
        #[arg(long)]
        expect_empty: bool,
    },
    /// Print what the routine creates, with the secret masked.
    Plan {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load tcinit settings")?;
    cli.apply_overrides(&mut settings);
    tcinit_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Plan { json } => {
            print_plan(json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run => {
            let runtime = runtime()?;
            runtime.block_on(run(&settings))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { json, expect_empty } => {
            let runtime = runtime()?;
            let report = runtime.block_on(verify(&settings, VerifyOptions { expect_empty }))?;
            print_report(&report, json)?;
            Ok(if report.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .with_context(|| "failed to start async runtime")
}

async fn connect(settings: &Settings) -> anyhow::Result<MongoAdmin> {
    MongoAdmin::connect(&settings.database)
        .await
        .with_context(|| "failed to connect to MongoDB")
}

async fn run(settings: &Settings) -> anyhow::Result<()> {
    tracing::info!(env = ?settings.environment, "running initialization");

    let admin = connect(settings).await?;
    let mut stdout = std::io::stdout();
    tcresults_init::initialize(&admin, &mut stdout)
        .await
        .with_context(|| "database initialization aborted")?;
    Ok(())
}

async fn verify(settings: &Settings, options: VerifyOptions) -> anyhow::Result<VerifyReport> {
    let admin = connect(settings).await?;
    tcresults_init::verify(&admin, &ProvisioningPlan::tcresults(), options)
        .await
        .with_context(|| "verification could not complete")
}

fn print_plan(json: bool) -> anyhow::Result<()> {
    let plan = ProvisioningPlan::tcresults().redacted();
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("{}", plan);
    }
    Ok(())
}

fn print_report(report: &VerifyReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}
