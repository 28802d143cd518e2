//! Cubo Mágico — sales journey, attribution and agent analytics CLI.
//!
//! Reads project tables from a data directory, runs one analysis and
//! prints the result as JSON on stdout. Logs go to stderr.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};

use cubo_agents::{evaluate, Agent, ContactContext, Prediction};
use cubo_core::config::AppConfig;
use cubo_core::fetch::MemorySource;
use cubo_core::types::DateRange;
use cubo_journey::types::{JourneyFilter, JourneyQuery};
use cubo_magico::{read_json, Pipeline};
use cubo_personalization::{build_directive, PersonalizationInput};
use cubo_reporting::attribution::UtmDimension;
use cubo_reporting::breakdown::BreakdownDimension;

#[derive(Parser, Debug)]
#[command(name = "cubo-magico")]
#[command(about = "Sales journey, attribution and agent analytics over exported project tables")]
#[command(version)]
struct Cli {
    /// Directory holding sales.json, offer_mappings.json, funnels.json and contacts.json
    #[arg(long, env = "CUBO__DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Project identifier (overrides config)
    #[arg(long, env = "CUBO__PROJECT_ID")]
    project_id: Option<String>,

    /// Optional config file (TOML, JSON or YAML)
    #[arg(long)]
    config: Option<String>,

    /// Rows per page when reading tables (overrides config)
    #[arg(long)]
    page_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Customer journeys with summary and product flows
    Journeys(JourneyArgs),
    /// Grouped counts per dimension over every sale
    Breakdown {
        /// Dimensions to break down (defaults to reporting.default_dimensions)
        #[arg(long = "dimension")]
        dimensions: Vec<BreakdownDimension>,
    },
    /// LTV cohorts by entry funnel or product
    Cohorts,
    /// Conversion metrics per first-touch UTM value
    Attribution {
        #[arg(long, default_value = "source")]
        dimension: UtmDimension,
    },
    /// Hierarchical UTM drilldown (source, campaign, adset, creative, placement)
    Drilldown {
        /// Values selected at each level, outermost first
        #[arg(long = "select")]
        selections: Vec<String>,
    },
    /// Offer/funnel integrity diagnostics
    Integrity,
    /// Next-best-action decision for one agent and contact
    Decide {
        #[arg(long)]
        agent: PathBuf,
        #[arg(long)]
        predictions: PathBuf,
        #[arg(long)]
        context: PathBuf,
    },
    /// Message personalization directive
    Personalize {
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct JourneyArgs {
    #[arg(long, group = "entry")]
    entry_product: Option<String>,
    #[arg(long, group = "entry")]
    entry_funnel: Option<String>,
    #[arg(long, group = "entry")]
    entry_offer: Option<String>,
    #[arg(long, group = "target")]
    target_product: Option<String>,
    #[arg(long, group = "target")]
    target_funnel: Option<String>,
    #[arg(long, group = "target")]
    target_offer: Option<String>,
    /// Earliest first-purchase date (RFC 3339)
    #[arg(long)]
    from: Option<DateTime<Utc>>,
    /// Latest first-purchase date (RFC 3339)
    #[arg(long)]
    to: Option<DateTime<Utc>>,
    /// Maximum journeys to print
    #[arg(long)]
    limit: Option<usize>,
}

fn journey_filter(
    product: Option<String>,
    funnel: Option<String>,
    offer: Option<String>,
) -> Option<JourneyFilter> {
    product
        .map(JourneyFilter::Product)
        .or(funnel.map(JourneyFilter::Funnel))
        .or(offer.map(JourneyFilter::Offer))
}

impl JourneyArgs {
    fn into_query(self) -> (JourneyQuery, Option<usize>) {
        let query = JourneyQuery {
            entry: journey_filter(self.entry_product, self.entry_funnel, self.entry_offer),
            target: journey_filter(self.target_product, self.target_funnel, self.target_offer),
            date_range: DateRange::new(self.from, self.to),
        };
        (query, self.limit)
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_pipeline(data_dir: &Path, config: AppConfig) -> anyhow::Result<Pipeline<MemorySource>> {
    let project_id = config
        .project_id
        .clone()
        .ok_or_else(|| anyhow::anyhow!("--project-id (or CUBO__PROJECT_ID) is required"))?;

    info!(
        project_id = %project_id,
        data_dir = %data_dir.display(),
        page_size = config.fetch.page_size,
        "Configuration loaded"
    );

    Ok(Pipeline::from_data_dir(data_dir, config, project_id)?)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(project_id) = cli.project_id {
        config.project_id = Some(project_id);
    }
    if let Some(page_size) = cli.page_size {
        config.fetch.page_size = page_size;
    }

    match cli.command {
        Command::Journeys(args) => {
            let (query, limit) = args.into_query();
            let pipeline = open_pipeline(&cli.data_dir, config)?;
            print_json(&pipeline.journeys(&query, limit).await?)
        }
        Command::Breakdown { dimensions } => {
            let pipeline = open_pipeline(&cli.data_dir, config)?;
            let dimensions = if dimensions.is_empty() {
                pipeline.default_dimensions()?
            } else {
                dimensions
            };
            print_json(&pipeline.breakdowns(&dimensions).await?)
        }
        Command::Cohorts => {
            let pipeline = open_pipeline(&cli.data_dir, config)?;
            print_json(&pipeline.cohorts().await?)
        }
        Command::Attribution { dimension } => {
            let pipeline = open_pipeline(&cli.data_dir, config)?;
            print_json(&pipeline.attribution(dimension).await?)
        }
        Command::Drilldown { selections } => {
            let pipeline = open_pipeline(&cli.data_dir, config)?;
            print_json(&pipeline.drilldown(&selections).await?)
        }
        Command::Integrity => {
            let pipeline = open_pipeline(&cli.data_dir, config)?;
            print_json(&pipeline.integrity().await?)
        }
        Command::Decide {
            agent,
            predictions,
            context,
        } => {
            let agent: Agent = read_json(&agent)?;
            let predictions: Vec<Prediction> = read_json(&predictions)?;
            let context: ContactContext = read_json(&context)?;
            let decision = evaluate(&agent, &predictions, &context);
            info!(
                agent_id = %agent.id,
                decided = decision.is_some(),
                "Agent evaluated"
            );
            print_json(&decision)
        }
        Command::Personalize { input } => {
            let input: PersonalizationInput = read_json(&input)?;
            print_json(&build_directive(&input))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cubo_magico=info,cubo_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "Command failed");
        return Err(e);
    }
    Ok(())
}
