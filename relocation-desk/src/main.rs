mod cases;
mod config;
mod host;
mod replay;
mod steps;
mod terminal;
mod wizards;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cases::{CaseDirectory, CaseStatus, PropertyListing, RelocationCase, Role};
use crate::config::{DeskConfig, LogFormat};
use crate::host::Desk;
use crate::replay::{Script, replay};
use crate::wizards::WizardKind;

#[derive(Parser, Debug)]
#[command(
    name = "relocation-desk",
    about = "Relocation and property intake wizards over the insurer's case desk",
    version
)]
struct Cli {
    /// Simulated submission delay, overrides SUBMIT_DELAY_MS
    #[arg(long, global = true)]
    submit_delay_ms: Option<u64>,
    /// Make every submission fail, overrides SUBMIT_FAILURE
    #[arg(long, global = true)]
    fail_submission: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill in a relocation request interactively
    Relocation,
    /// Offer a property for relocation interactively
    Property,
    /// Replay a JSON or YAML answers script and print the report
    Replay { wizard: WizardKind, file: PathBuf },
    /// Browse the case directory
    Cases {
        #[command(subcommand)]
        command: CasesCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CasesCommand {
    /// List cases, newest first
    List {
        #[arg(long)]
        status: Option<CaseStatus>,
    },
    /// Show one case by id or reference
    Show { id: String },
    /// Case statistics per status
    Stats,
    /// Listings matching a case
    Matches { id: String },
    /// Every published listing
    Listings,
    /// Message threads of a role
    Conversations { role: Role },
}

/// Initialize tracing on stderr, keeping stdout for the dialogue
fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "relocation_desk=info,wizard_flow=info".into());

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = DeskConfig::from_env()
        .context("invalid environment configuration")?
        .with_overrides(cli.submit_delay_ms, cli.fail_submission);
    init_tracing(config.log_format);

    info!(
        submit_delay_ms = %config.submit_delay.as_millis(),
        fail_submission = %config.fail_submission,
        "Starting relocation desk"
    );
    let desk = Desk::new(config, Arc::new(CaseDirectory::seeded()));

    match cli.command {
        Command::Relocation => interactive(&desk, WizardKind::Relocation).await,
        Command::Property => interactive(&desk, WizardKind::Property).await,
        Command::Replay { wizard, file } => {
            let script = Script::load(&file)?;
            let runner = desk.runner(wizard)?;
            let report = replay(&runner, script).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Cases { command } => browse(desk.directory(), command),
    }
}

async fn interactive(desk: &Desk, kind: WizardKind) -> Result<()> {
    let runner = desk.runner(kind)?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    let session_id = terminal::run_session(&runner, stdin, &mut stdout).await?;
    let session = runner.load(&session_id).await?;
    if session.state.is_submitted && kind == WizardKind::Relocation {
        if let Some(case) = desk.directory().relocation_cases(None).first() {
            println!("Référence du dossier : {}", case.reference);
        }
    }
    Ok(())
}

fn browse(directory: &CaseDirectory, command: CasesCommand) -> Result<()> {
    match command {
        CasesCommand::List { status } => {
            for case in directory.relocation_cases(status) {
                print_case_line(&case);
            }
        }
        CasesCommand::Show { id } => {
            let case = directory
                .get_case_by_id(&id)
                .with_context(|| format!("no case {id}"))?;
            println!("{}", serde_json::to_string_pretty(&case)?);
        }
        CasesCommand::Stats => {
            println!("{}", serde_json::to_string_pretty(&directory.statistics())?);
        }
        CasesCommand::Matches { id } => {
            let case = directory
                .get_case_by_id(&id)
                .with_context(|| format!("no case {id}"))?;
            let options = directory.get_matching_relocation_options(&case);
            if options.is_empty() {
                println!("Aucun logement disponible pour {}", case.reference);
            }
            options.iter().for_each(print_listing_line);
        }
        CasesCommand::Listings => directory.listings().iter().for_each(print_listing_line),
        CasesCommand::Conversations { role } => {
            for conversation in directory.get_conversations(role) {
                println!("{} [{}] {}", conversation.id, conversation.case_id, conversation.subject);
                if let Some(message) = conversation.last_message() {
                    println!("    {:?} : {}", message.from, message.body);
                }
            }
        }
    }
    Ok(())
}

fn print_case_line(case: &RelocationCase) {
    println!(
        "{:<10} {} {:<10} {:<8} {:<24} {} pers. arrivée {}",
        case.id,
        case.reference,
        case.status.to_string(),
        case.relocation_type,
        case.insured.name,
        case.household.size(),
        case.arrival_date
    );
}

fn print_listing_line(listing: &PropertyListing) {
    println!(
        "{:<12} {:<36} {:>2} ch. {:>2} pers. {:>7.2} €/nuit  {} {}",
        listing.id,
        listing.title,
        listing.bedrooms,
        listing.max_occupants,
        listing.nightly_rate,
        listing.address.postal_code,
        listing.address.city
    );
}
