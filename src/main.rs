use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use medcare::schedule::types::{DoseSlot, LoggedStatus};
use medcare::{cli, config, server};

#[derive(Parser)]
#[command(name = "medcare", version, about = "Medication reminders and adherence tracking")]
struct Cli {
    /// Act as this user instead of the configured default
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// Serve streamable HTTP instead of stdio
        #[arg(long)]
        http: bool,
    },
    /// Show today's doses
    Today,
    /// Show the last seven days of adherence
    Week,
    /// Mark a due dose as taken or missed
    Mark {
        /// morning, afternoon or night
        slot: DoseSlot,
        /// taken or missed
        status: LoggedStatus,
    },
    /// Apply a notification action (taken_all / missed_all)
    Action {
        action_id: String,
        prescription_id: String,
        /// Slot label from the alarm, e.g. "Night"
        slot_label: String,
    },
    /// List saved prescriptions
    Records {
        /// Filter by hospital name
        #[arg(long)]
        hospital: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one prescription
    Show { id: String },
    /// Add a prescription by hand
    Add {
        #[arg(long)]
        hospital: String,
        /// name|dose|frequency[|duration[|instructions]], repeatable
        #[arg(long = "med", required = true)]
        meds: Vec<String>,
    },
    /// Read a prescription photo through the extraction service
    Scan {
        image: PathBuf,
        /// Save the extracted prescription
        #[arg(long)]
        save: bool,
    },
    /// Show which slots a frequency code maps to
    Classify { code: String },
    /// Show or update the user profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Check database health
    Doctor,
    /// Export prescriptions and adherence as JSON
    Export,
    /// Delete all data
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::MedcareConfig::load()?;
    if let Some(user) = cli.user {
        config.storage.default_user = user;
    }

    // Log to stderr so stdout stays clean for MCP JSON-RPC and command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let user = config.storage.default_user.clone();

    match cli.command {
        Command::Serve { http } => {
            if http || config.server.transport == "http" {
                server::serve_http(config).await?;
            } else {
                server::serve_stdio(config).await?;
            }
        }
        Command::Today => {
            let app = cli::open_engine(&config)?;
            cli::schedule::today(&app, &user).await?;
        }
        Command::Week => {
            let app = cli::open_engine(&config)?;
            cli::schedule::week(&app, &user).await?;
        }
        Command::Mark { slot, status } => {
            let app = cli::open_engine(&config)?;
            cli::schedule::mark(&app, &user, slot, status).await?;
        }
        Command::Action {
            action_id,
            prescription_id,
            slot_label,
        } => {
            let app = cli::open_engine(&config)?;
            cli::schedule::action(&app, &action_id, &prescription_id, &slot_label).await?;
        }
        Command::Records { hospital, limit } => {
            let app = cli::open_engine(&config)?;
            cli::records::list(&app, &user, hospital.as_deref(), limit).await?;
        }
        Command::Show { id } => {
            let app = cli::open_engine(&config)?;
            cli::records::show(&app, &user, &id).await?;
        }
        Command::Add { hospital, meds } => {
            let app = cli::open_engine(&config)?;
            cli::records::add(&app, &user, &hospital, &meds).await?;
        }
        Command::Scan { image, save } => {
            let app = cli::open_engine(&config)?;
            cli::records::scan(&app, &user, &image, save).await?;
        }
        Command::Classify { code } => cli::schedule::classify(&code),
        Command::Profile { name, phone } => {
            let app = cli::open_engine(&config)?;
            cli::profile::profile(&app, &user, name, phone).await?;
        }
        Command::Doctor => cli::doctor::doctor(&config)?,
        Command::Export => cli::export::export(&config)?,
        Command::Reset => cli::reset::reset(&config)?,
    }

    Ok(())
}
