use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use incident_api::client::{ClientResult, IncidentClient, ListOptions};
use incident_api::models::{IncidentId, IncidentSource, IncidentStatus};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "incident-cli")]
#[command(about = "Incident API command-line client", long_about = None, version)]
struct Cli {
    #[arg(
        short,
        long,
        env = "INCIDENT_API_ENDPOINT",
        default_value = "http://localhost:8000"
    )]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report a new incident
    Create {
        #[arg(short, long)]
        description: String,

        /// operator, monitoring or partner
        #[arg(short, long)]
        source: IncidentSource,
    },

    /// List incidents
    List {
        /// new, in_progress, resolved or closed
        #[arg(short = 'S', long)]
        status: Option<IncidentStatus>,

        #[arg(short, long)]
        skip: Option<i64>,

        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Get incident details
    Get {
        #[arg(value_name = "INCIDENT_ID")]
        id: IncidentId,
    },

    /// Change the status of an incident
    SetStatus {
        #[arg(value_name = "INCIDENT_ID")]
        id: IncidentId,

        #[arg(value_name = "STATUS")]
        status: IncidentStatus,
    },

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = IncidentClient::new(&cli.endpoint);

    match cli.command {
        Commands::Create {
            description,
            source,
        } => {
            let incident = client
                .create(&description, source)
                .await
                .context("failed to create incident")?;
            print_json(&incident)?;
        }

        Commands::List {
            status,
            skip,
            limit,
        } => {
            let list = client
                .list(&ListOptions {
                    status,
                    skip,
                    limit,
                })
                .await
                .context("failed to list incidents")?;

            println!("Total: {}", list.total);
            print_json(&list.incidents)?;
        }

        Commands::Get { id } => {
            let incident = found(id, client.get(id).await)
                .with_context(|| format!("failed to get incident {}", id))?;
            print_json(&incident)?;
        }

        Commands::SetStatus { id, status } => {
            let incident = found(id, client.update_status(id, status).await)
                .with_context(|| format!("failed to update incident {}", id))?;
            print_json(&incident)?;
        }

        Commands::Health => {
            let health = client.health().await.context("health check failed")?;
            print_json(&health)?;
        }
    }

    Ok(())
}

/// Turn a 404 into a short message instead of the raw API error
fn found<T>(id: IncidentId, result: ClientResult<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_not_found() => bail!("incident {} does not exist", id),
        Err(e) => Err(e.into()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
