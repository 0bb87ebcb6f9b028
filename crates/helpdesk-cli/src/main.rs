//! Helpdesk CLI
//!
//! Operator command-line interface over the ticket engine.
//!
//! # Usage
//!
//! ```bash
//! helpdesk tickets list --as 1
//! helpdesk tickets create --title "VPN down" --description "No tunnel" --category technical --priority high --as 3
//! helpdesk tickets status T-1A2B3C4D in-progress --as 2
//! helpdesk escalation watch --interval-secs 60
//! helpdesk reports compliance --format json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "helpdesk")]
#[command(version)]
#[command(about = "Helpdesk ticket engine command line interface", long_about = None)]
struct Cli {
    /// JSON ticket store
    #[arg(long, env = "HELPDESK_STORE")]
    store: Option<PathBuf>,

    /// Organization configuration (TOML)
    #[arg(long, env = "HELPDESK_ORG_CONFIG")]
    org_config: Option<PathBuf>,

    /// Team and user directory (TOML)
    #[arg(long, env = "HELPDESK_DIRECTORY")]
    directory: Option<PathBuf>,

    /// Output format
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short, env = "HELPDESK_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage tickets
    Tickets {
        #[command(subcommand)]
        action: TicketCommands,
    },
    /// Run the escalation check
    Escalation {
        #[command(subcommand)]
        action: EscalationCommands,
    },
    /// SLA reports
    Reports {
        #[command(subcommand)]
        action: ReportCommands,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum TicketCommands {
    /// List tickets visible to a user
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "as", env = "HELPDESK_USER")]
        as_user: Option<String>,
    },
    /// Show ticket details
    Show {
        id: String,
        #[arg(long = "as", env = "HELPDESK_USER")]
        as_user: Option<String>,
    },
    /// Create a new ticket
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        subcategory: Option<String>,
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Initial assignee
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long = "as", env = "HELPDESK_USER")]
        as_user: Option<String>,
    },
    /// Change ticket status
    Status {
        id: String,
        status: String,
        #[arg(long = "as", env = "HELPDESK_USER")]
        as_user: Option<String>,
    },
    /// Assign a ticket
    Assign {
        id: String,
        assignee: String,
        #[arg(long = "as", env = "HELPDESK_USER")]
        as_user: Option<String>,
    },
    /// Add a tag
    Tag { id: String, tag: String },
    /// Remove a tag
    Untag { id: String, tag: String },
    /// Link two tickets
    Link {
        id: String,
        target: String,
        #[arg(long, default_value = "related")]
        relationship: String,
    },
    /// Remove a link between two tickets
    Unlink { id: String, target: String },
    /// Escalate a ticket to the next level
    Escalate {
        id: String,
        #[arg(long)]
        reason: String,
        #[arg(long = "as", env = "HELPDESK_USER")]
        as_user: Option<String>,
    },
}

#[derive(Subcommand)]
enum EscalationCommands {
    /// Run one escalation pass
    Check,
    /// Run escalation passes until interrupted
    Watch {
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// SLA compliance rate of finished tickets
    Compliance,
    /// SLA status of every active ticket
    Sla,
    /// Near-breach alerts for a supervisor
    Alerts {
        #[arg(long = "as", env = "HELPDESK_USER")]
        as_user: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a default profile config
    Init,
    /// Print the effective profile config
    Show,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Config { action } => commands::config::handle(action, cli.profile.as_deref()),
        command => run(command, cli.store, cli.org_config, cli.directory, cli.format, cli.profile).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(
    command: Commands,
    store: Option<PathBuf>,
    org_config: Option<PathBuf>,
    directory: Option<PathBuf>,
    format: Option<output::OutputFormat>,
    profile: Option<String>,
) -> anyhow::Result<()> {
    let config = config::Config::load(profile.as_deref())?;
    let settings = config.resolve(store, org_config, directory, format)?;
    let ctx = commands::Context::open(&settings)?;

    match command {
        Commands::Tickets { action } => commands::tickets::handle(action, &ctx).await,
        Commands::Escalation { action } => commands::escalation::handle(action, &ctx).await,
        Commands::Reports { action } => commands::reports::handle(action, &ctx).await,
        Commands::Config { .. } => Ok(()),
    }
}
