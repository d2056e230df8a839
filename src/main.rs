#![allow(clippy::print_stdout)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use resource_forge::{
    ActionKind, Dispatcher, MemoryGateway, ModelGateway, OverwritePolicy, PgGateway, ResourceRegistry, Scaffolder,
    Settings, API_PREFIX,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod init;

#[derive(Parser)]
#[command(name = "resource-forge")]
#[command(about = "Serve a directory of resource descriptors as a REST API")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Resource root (overrides RESOURCE_ROOT)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover resources and serve the API
    Serve {
        /// Listen address (overrides LISTEN_ADDR)
        #[arg(short, long)]
        listen: Option<String>,

        /// Keep records in memory instead of PostgreSQL
        #[arg(long)]
        memory: bool,
    },

    /// Print the discovered route table
    Routes,

    /// Generate action descriptors for one or more entities
    Forge {
        /// Entity (table or view) names, e.g. `order_item`
        #[arg(required = true)]
        entities: Vec<String>,

        /// Action kind to generate; repeatable. Defaults to search
        #[arg(short, long = "action", conflicts_with = "all")]
        actions: Vec<ActionKind>,

        /// Generate every action kind
        #[arg(long)]
        all: bool,

        /// Overwrite existing artifacts
        #[arg(long)]
        force: bool,
    },

    /// Create a .env file interactively
    Init {
        #[arg(short, long, default_value = ".env")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("resource_forge=info")))
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env()?;
    if let Some(root) = cli.root {
        settings.resource_root = root;
    }

    match cli.command {
        Commands::Serve { listen, memory } => {
            if let Some(listen) = listen {
                settings.listen_addr = listen;
            }
            run_server(settings, memory).await
        }
        Commands::Routes => print_routes(&settings),
        Commands::Forge {
            entities,
            actions,
            all,
            force,
        } => run_forge(&settings, &entities, actions, all, force),
        Commands::Init { output, force } => init::run_init(output, force),
    }
}

async fn run_server(settings: Settings, memory: bool) -> Result<()> {
    let gateway: Arc<dyn ModelGateway> = if memory {
        tracing::warn!("using in-memory gateway; records are lost on exit");
        Arc::new(MemoryGateway::new())
    } else {
        Arc::new(PgGateway::connect_lazy(settings.database.connect_options()?))
    };
    let listen_addr = settings.listen_addr.clone();
    let dispatcher = Dispatcher::bootstrap(settings, gateway)?;
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("unable to bind {}", listen_addr))?;
    dispatcher.serve(listener).await?;
    Ok(())
}

fn print_routes(settings: &Settings) -> Result<()> {
    let registry = ResourceRegistry::from_root(&settings.resource_root)?;
    for binding in registry.bindings() {
        println!(
            "{:<7} {}{:<32} {} ({})",
            binding.method.as_str(),
            API_PREFIX,
            binding.path,
            binding.resource,
            binding.label
        );
    }
    Ok(())
}

fn run_forge(settings: &Settings, entities: &[String], actions: Vec<ActionKind>, all: bool, force: bool) -> Result<()> {
    let kinds = if all {
        ActionKind::ALL.to_vec()
    } else if actions.is_empty() {
        vec![ActionKind::Search]
    } else {
        actions
    };
    let policy = if force {
        OverwritePolicy::Overwrite
    } else {
        OverwritePolicy::Reject
    };
    let scaffolder = Scaffolder::new(&settings.resource_root)?.with_policy(policy);

    let mut failures = 0;
    for outcome in scaffolder.forge_batch(entities, &kinds) {
        match outcome.result {
            Ok(path) => println!("created {}", path.display()),
            Err(e) => {
                failures += 1;
                eprintln!("{} {}: {}", outcome.entity, outcome.kind, e);
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("{} of {} artifacts failed", failures, entities.len() * kinds.len());
    }
    Ok(())
}
