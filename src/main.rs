use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use flowmap::app::{InitializeUseCase, Session, Startup};
use flowmap::config::{parse_override, AppOptions};
use flowmap::infra::DefaultFetcher;
use flowmap::observability::{init_logging, init_metrics};
use flowmap::render::ConfigEdit;

#[derive(Parser)]
#[command(name = "flowmap")]
#[command(about = "Validate location/flow datasets and emit the flow-map layer description")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML file of initial options (defaults to $FLOWMAP_CONFIG, then ./flowmap.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Initial option override, e.g. --option maxDistance=500 (repeatable)
    #[arg(long = "option", short = 'o', global = true, value_parser = parse_option)]
    options: Vec<(String, String)>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load both datasets and report what was kept and dropped
    Summary {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the JSON layer description for the renderer
    Layers {
        /// Knob edit applied after startup, e.g. --set opacity=0.5 (repeatable)
        #[arg(long = "set", value_parser = parse_edit)]
        edits: Vec<ConfigEdit>,
        /// Reset every knob to its startup default after applying edits
        #[arg(long)]
        reset: bool,
        /// Re-derive flows with this distance threshold in km
        #[arg(long)]
        max_distance: Option<f64>,
    },
}

fn parse_option(raw: &str) -> Result<(String, String), String> {
    parse_override(raw).map_err(|e| e.to_string())
}

fn parse_edit(raw: &str) -> Result<ConfigEdit, String> {
    raw.parse::<ConfigEdit>().map_err(|e| e.to_string())
}

fn print_summary(session: &Session, json: bool) -> anyhow::Result<()> {
    let summary = session.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\n📊 Flow map summary:");
    println!(
        "   Locations: {} ({} rejected, {} duplicate ids)",
        summary.locations, summary.locations_rejected, summary.duplicate_location_ids
    );
    println!("   Flows parsed: {} ({} rejected)", summary.flows, summary.flows_rejected);
    println!("   Flows kept: {}", summary.filter.kept);
    println!("   Dangling references: {}", summary.filter.dangling);
    println!("   Self-loops dropped: {}", summary.filter.self_loops);
    println!("   Too far: {}", summary.filter.too_far);
    println!("   Raised to threshold: {}", summary.filter.clamped);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();
    init_metrics();

    let cli = Cli::parse();
    let options = AppOptions::resolve(cli.config.as_deref(), &cli.options)?;

    let use_case = InitializeUseCase::new(Box::new(DefaultFetcher::new()));
    let mut session = match use_case.run(&options).await {
        Startup::Ready(session) => session,
        Startup::Failed(failure) => {
            eprintln!("❌ {}", failure.message);
            eprintln!("   {}", failure.retry_hint);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Summary { json } => print_summary(&session, json)?,
        Commands::Layers { edits, reset, max_distance } => {
            if let Some(km) = max_distance {
                if let Err(e) = session.set_max_distance(Some(km)) {
                    warn!("Ignoring --max-distance {}: {}", km, e);
                    eprintln!("⚠️  {} (keeping the previous flow set)", e);
                }
            }
            for edit in edits {
                session.set(edit);
            }
            if reset {
                session.reset_to_default();
            }
            info!("Rendering with config state {:?}", session.config_state());
            println!("{}", session.layer_description()?.to_json()?);
        }
    }
    Ok(())
}
