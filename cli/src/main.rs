//! Cohort CLI: search, cluster and describe profile sets

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use cohort::http::{AppState, HttpServer};
use cohort::profile::write_profiles;
use cohort::summary::ChatClient;
use cohort::{
    load_profiles, visualize, CohortConfig, DescriptionGenerator, DescriptorMode, Match, Profile,
    QueryService, VectorEncoder, Visualization, VisualizeOptions,
};
use comfy_table::{ContentArrangement, Table};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cohort", version, about = "Semantic profile search and community layout")]
struct Cli {
    /// YAML configuration file
    #[arg(long, short, global = true, env = "COHORT_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Clone, clap::ValueEnum)]
enum Mode {
    Full,
    Content,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the profiles closest to a free-text query
    Search {
        /// Profiles file (JSON array or JSON Lines)
        profiles: PathBuf,
        /// Query text
        query: String,
        /// Number of matches
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Cluster profiles and write an interactive HTML graph
    Visualize {
        profiles: PathBuf,
        /// HTML output path
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Only use the first N profiles
        #[arg(long)]
        limit: Option<usize>,
        /// Seed for the layout jitter
        #[arg(long)]
        seed: Option<u64>,
        /// Also write the raw artifact as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Print the descriptor string of every profile
    Describe {
        profiles: PathBuf,
        #[arg(long, default_value = "full")]
        mode: Mode,
    },
    /// Generate LLM descriptions and write the enriched profiles as JSON Lines
    Summarize {
        profiles: PathBuf,
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Serve the search API and graph page
    Serve {
        profiles: PathBuf,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = CohortConfig::load_or_default(cli.config.as_deref())
        .context("loading configuration")?;

    match cli.command {
        Commands::Search { profiles, query, top_k } => {
            run_search(&config, &profiles, &query, top_k, &cli.format)
        }
        Commands::Visualize { profiles, output, limit, seed, json } => {
            run_visualize(&config, &profiles, output, limit, seed, json)
        }
        Commands::Describe { profiles, mode } => run_describe(&profiles, mode, &cli.format),
        Commands::Summarize { profiles, output } => run_summarize(&config, &profiles, &output),
        Commands::Serve { profiles, address, port, seed } => {
            run_serve(&config, &profiles, address, port, seed)
        }
    }
}

fn read_profiles(path: &Path) -> Result<Vec<Profile>> {
    load_profiles(path).with_context(|| format!("reading profiles from {}", path.display()))
}

fn encoder(config: &CohortConfig) -> Result<VectorEncoder> {
    VectorEncoder::from_config(&config.embedding).context("creating embedding backend")
}

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn run_search(
    config: &CohortConfig,
    profiles: &Path,
    query: &str,
    top_k: Option<usize>,
    format: &OutputFormat,
) -> Result<()> {
    let profiles = read_profiles(profiles)?;
    let service = QueryService::new(encoder(config)?).with_index_kind(config.search.index);
    let matches = service.search(query, &profiles, top_k.unwrap_or(config.search.top_k))?;

    print_matches(&matches, format)
}

fn print_matches(matches: &[Match], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "matches": matches }))?);
        }
        OutputFormat::Csv => {
            println!("name,score");
            for m in matches {
                println!("{},{:.4}", csv_field(m.identity()), m.score());
            }
        }
        OutputFormat::Table => {
            if matches.is_empty() {
                println!("(no results)");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["#", "Name", "Score"]);
            for (rank, m) in matches.iter().enumerate() {
                table.add_row(vec![
                    (rank + 1).to_string(),
                    m.identity().to_string(),
                    format!("{:.4}", m.score()),
                ]);
            }

            println!("{}", table);
            println!("{} match(es)", matches.len());
        }
    }
    Ok(())
}

fn build_visualization(
    config: &CohortConfig,
    profiles: &[Profile],
    encoder: &VectorEncoder,
    limit: Option<usize>,
    seed: Option<u64>,
) -> Result<Visualization> {
    let mut options = VisualizeOptions::from_config(config);
    if limit.is_some() {
        options.limit = limit;
    }
    Ok(visualize(profiles, encoder, &options, &mut rng(seed))?)
}

fn run_visualize(
    config: &CohortConfig,
    profiles: &Path,
    output: Option<PathBuf>,
    limit: Option<usize>,
    seed: Option<u64>,
    json: Option<PathBuf>,
) -> Result<()> {
    let profiles = read_profiles(profiles)?;
    let encoder = encoder(config)?;
    let vis = build_visualization(config, &profiles, &encoder, limit, seed)?;

    let output = output.unwrap_or_else(|| config.visualize.output.clone());
    vis.write_html(&output, "Profile communities")?;
    if let Some(json) = json {
        std::fs::write(&json, vis.to_json()?)
            .with_context(|| format!("writing {}", json.display()))?;
    }

    println!(
        "{} profiles, {} communities, {} edges -> {}",
        vis.nodes.len(),
        vis.communities,
        vis.edges.len(),
        output.display()
    );
    Ok(())
}

fn run_describe(profiles: &Path, mode: Mode, format: &OutputFormat) -> Result<()> {
    let profiles = read_profiles(profiles)?;
    let mode = match mode {
        Mode::Full => DescriptorMode::FullProfile,
        Mode::Content => DescriptorMode::ContentOnly,
    };

    let rows: Vec<(String, String)> = profiles
        .iter()
        .map(|p| (p.name().unwrap_or_default().to_string(), p.descriptor(mode)))
        .collect();

    match format {
        OutputFormat::Json => {
            let json: Vec<_> = rows
                .iter()
                .map(|(name, text)| serde_json::json!({ "name": name, "descriptor": text }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Csv => {
            println!("name,descriptor");
            for (name, text) in &rows {
                println!("{},{}", csv_field(name), csv_field(text));
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Name", "Descriptor"]);
            for (name, text) in rows {
                table.add_row(vec![name, text]);
            }
            println!("{}", table);
        }
    }
    Ok(())
}

fn run_summarize(config: &CohortConfig, profiles: &Path, output: &Path) -> Result<()> {
    let mut profiles = read_profiles(profiles)?;
    let client = ChatClient::new(&config.summary).context("creating language-model client")?;
    let generator = DescriptionGenerator::new(Arc::new(client));

    let described = generator.enrich(&mut profiles)?;
    write_profiles(output, &profiles)
        .with_context(|| format!("writing {}", output.display()))?;

    println!("{} of {} profiles described -> {}", described, profiles.len(), output.display());
    Ok(())
}

fn run_serve(
    config: &CohortConfig,
    profiles: &Path,
    address: Option<String>,
    port: Option<u16>,
    seed: Option<u64>,
) -> Result<()> {
    let profiles = read_profiles(profiles)?;
    let encoder = encoder(config)?;

    // everything that may block on the embedding backend happens before the runtime starts
    let service = QueryService::new(encoder.clone()).with_index_kind(config.search.index);
    let index = service.index_profiles(&profiles)?;
    let vis = build_visualization(config, &profiles, &encoder, None, seed)?;
    info!(profiles = index.len(), communities = vis.communities, "Serving");

    let state = AppState::new(service, index, vis, config.search.top_k);
    let server = HttpServer::new(
        state,
        address.unwrap_or_else(|| config.server.address.clone()),
        port.unwrap_or(config.server.port),
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime
        .block_on(server.start())
        .map_err(|e| anyhow!("server error: {}", e))
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
