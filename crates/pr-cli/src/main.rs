//! Policy Reporter CLI
//!
//! Queries the kyverno/policy-reporter REST API about (Cluster)PolicyReports
//! through a temporary port-forward to the in-cluster service.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use policy_reporter_cli::commands;
use policy_reporter_cli::connect::Connection;
use policy_reporter_cli::filters::{NamespaceFlags, QueryFlags};
use policy_reporter_cli::output::{print_error, OutputFormat};
use policy_reporter_cli::prompt::TerminalSelector;
use pr_core::config;
use pr_core::Scope;

#[derive(Parser)]
#[command(name = "pr")]
#[command(author, version, about = "CLI for Policy Reporter REST API")]
#[command(
    long_about = "Query information from the kyverno/policy-reporter REST API about (Cluster)PolicyReports"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Policy Reporter service (e.g. svc/policy-reporter)
    #[arg(long, global = true)]
    service: Option<String>,

    /// Namespace of the Policy Reporter service
    #[arg(long, global = true)]
    service_namespace: Option<String>,

    /// Port of the Policy Reporter REST API
    #[arg(long, global = true)]
    service_port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured Policy Reporter targets
    #[command(alias = "tar")]
    Targets {
        /// Output format: table, json or yaml
        #[arg(short, long, default_value = "table")]
        output: OutputFormat,
    },

    /// Query PolicyReport results
    #[command(alias = "res")]
    Results {
        #[command(subcommand)]
        action: ResultsAction,
    },

    /// Query ClusterPolicyReport results
    #[command(alias = "cres")]
    ClusterResults {
        #[command(subcommand)]
        action: ClusterResultsAction,
    },

    /// Print the client version
    Version,
}

#[derive(Subcommand)]
enum ResultsAction {
    /// List PolicyReport results
    List {
        #[command(flatten)]
        namespace: NamespaceFlags,
        #[command(flatten)]
        query: QueryFlags,
        /// Only show results of resources matching this label selector
        #[arg(short = 'l', long)]
        selector: Option<String>,
    },
    /// Search PolicyReport results interactively
    Search {
        #[command(flatten)]
        namespace: NamespaceFlags,
        #[command(flatten)]
        query: QueryFlags,
    },
}

#[derive(Subcommand)]
enum ClusterResultsAction {
    /// List ClusterPolicyReport results
    List {
        #[command(flatten)]
        query: QueryFlags,
        /// Only show results of resources matching this label selector
        #[arg(short = 'l', long)]
        selector: Option<String>,
    },
    /// Search ClusterPolicyReport results interactively
    Search {
        #[command(flatten)]
        query: QueryFlags,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Version = cli.command {
        commands::version_command();
        return Ok(());
    }

    let mut config =
        config::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(service) = cli.service.as_deref() {
        config.set_service(service);
    }
    if let Some(namespace) = cli.service_namespace {
        config.namespace = namespace;
    }
    if let Some(port) = cli.service_port {
        config.port = port;
    }
    tracing::debug!("Using Policy Reporter at {}", config.service_url());

    let cancel = CancellationToken::new();
    let connection = Connection::open(&config, &cancel).await?;

    let result = dispatch(&connection, cli.command).await;

    connection.close().await;
    result
}

async fn dispatch(connection: &Connection, command: Commands) -> Result<()> {
    let client = connection.client();
    let cluster = connection.cluster();

    match command {
        Commands::Version => commands::version_command(),

        Commands::Targets { output } => {
            commands::targets_command(client, output).await?;
        }

        Commands::Results { action } => match action {
            ResultsAction::List {
                namespace,
                query,
                selector,
            } => {
                let mut filter = query.filter();
                filter.namespaces = namespace.namespaces(Some(cluster.default_namespace()));

                let label_filter = cluster.label_filter();
                let labels = selector.as_deref().map(|s| (&label_filter, s));

                commands::list_command(
                    client,
                    Scope::Namespaced,
                    &filter,
                    query.group_by,
                    query.output,
                    labels,
                )
                .await?;
            }
            ResultsAction::Search { namespace, query } => {
                let mut filter = query.filter();
                filter.namespaces = namespace.namespaces(None);
                let dimensions =
                    commands::search_options(Scope::Namespaced, &query, namespace.is_fixed());

                commands::search_command(
                    client,
                    Scope::Namespaced,
                    filter,
                    &dimensions,
                    query.group_by,
                    query.output,
                    &mut TerminalSelector::new(),
                )
                .await?;
            }
        },

        Commands::ClusterResults { action } => match action {
            ClusterResultsAction::List { query, selector } => {
                let label_filter = cluster.label_filter();
                let labels = selector.as_deref().map(|s| (&label_filter, s));

                commands::list_command(
                    client,
                    Scope::Cluster,
                    &query.filter(),
                    query.group_by,
                    query.output,
                    labels,
                )
                .await?;
            }
            ClusterResultsAction::Search { query } => {
                let dimensions = commands::search_options(Scope::Cluster, &query, false);

                commands::search_command(
                    client,
                    Scope::Cluster,
                    query.filter(),
                    &dimensions,
                    query.group_by,
                    query.output,
                    &mut TerminalSelector::new(),
                )
                .await?;
            }
        },
    }

    Ok(())
}
