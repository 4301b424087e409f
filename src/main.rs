use clap::{Parser, Subcommand};
use media_catalog::{
    CatalogClient, CatalogConfig, ConfigError, CourseChoices, Episode, FailurePolicy, HttpTransport,
    InstanceId, JsonMappingStore, MediaCatalogError, Series, connect, course_choices,
};
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Browse series and episodes of a remote media catalog
#[derive(Debug, Parser)]
#[command(name = "media-catalog", version, about)]
struct Cli {
    /// Path to the configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Instance to query (defaults to the configured default instance)
    #[arg(short, long, global = true)]
    instance: Option<u32>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show a series
    Series {
        /// Series identifier
        id: String,
    },
    /// Show an episode
    Episode {
        /// Episode identifier
        id: String,
        /// Only accept the episode if it belongs to this series
        #[arg(long)]
        series: Option<String>,
    },
    /// List the episodes of a series, newest first
    Episodes {
        /// Series identifier
        series: String,
    },
    /// Tell whether an identifier names an episode, a series, or neither
    Classify {
        /// Identifier to probe
        id: String,
    },
    /// Build the series and episode choices of a course
    Course {
        /// Course identifier
        course_id: u64,
        /// JSON file holding the course series mappings
        #[arg(long)]
        mappings: PathBuf,
        /// Skip series whose instance cannot be reached instead of aborting
        #[arg(long)]
        skip_failed: bool,
    },
}

/// Outcome of a command
enum Outcome {
    Done,
    NotFound(String),
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Renders an error followed by its causes, one line each
///
/// A cause whose message is already part of the previous line is left out.
fn error_chain(error: &dyn Error) -> Vec<String> {
    let mut lines = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !lines.last().is_some_and(|previous| previous.contains(&message)) {
            lines.push(message);
        }
        source = cause.source();
    }
    lines
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to encode JSON output: {}", e),
    }
}

fn print_series(series: &Series) {
    println!("{}  {}", series.identifier, series.title);
}

fn print_episode(episode: &Episode) {
    println!(
        "{}  {}  (series: {})",
        episode.identifier,
        episode.title,
        episode.is_part_of.as_deref().unwrap_or("-")
    );
}

fn print_course_choices(choices: &CourseChoices) {
    if choices.series.is_empty() {
        println!("No series found for this course.");
        return;
    }

    for (key, title) in choices.series.iter() {
        println!("{}  {}", key, title);
        if let Some(episodes) = choices.episodes.get(key) {
            for (id, episode_title) in episodes.iter() {
                println!("    {}  {}", id, episode_title);
            }
        }
    }
}

fn client_for(
    config: &CatalogConfig,
    instance: Option<u32>,
) -> Result<CatalogClient<HttpTransport>, MediaCatalogError> {
    let Some(instance) = instance.map(InstanceId).or_else(|| config.default_instance()) else {
        return Err(ConfigError::NoInstances.into());
    };
    tracing::info!(instance = %instance, "using instance");
    connect(config, instance)
}

fn run(cli: Cli) -> Result<Outcome, MediaCatalogError> {
    let config = CatalogConfig::load_or_default_location(cli.config.as_deref())?;

    match cli.command {
        Command::Series { id } => {
            let client = client_for(&config, cli.instance)?;
            match client.get_series(&id)? {
                Some(series) if cli.json => print_json(&series),
                Some(series) => print_series(&series),
                None => return Ok(Outcome::NotFound(format!("Series not found: {}", id))),
            }
        }
        Command::Episode { id, series } => {
            let client = client_for(&config, cli.instance)?;
            match client.get_episode(&id, series.as_deref())? {
                Some(episode) if cli.json => print_json(&episode),
                Some(episode) => print_episode(&episode),
                None => return Ok(Outcome::NotFound(format!("Episode not found: {}", id))),
            }
        }
        Command::Episodes { series } => {
            let client = client_for(&config, cli.instance)?;
            match client.list_episodes_in_series(&series)? {
                Some(episodes) if cli.json => print_json(&episodes),
                Some(episodes) if episodes.is_empty() => println!("No episodes."),
                Some(episodes) => episodes.iter().for_each(print_episode),
                None => return Ok(Outcome::NotFound(format!("Series not found: {}", series))),
            }
        }
        Command::Classify { id } => {
            let client = client_for(&config, cli.instance)?;
            let classification = client.classify_identifier(&id)?;
            if cli.json {
                print_json(&classification);
            } else {
                println!("{}", classification);
            }
        }
        Command::Course {
            course_id,
            mappings,
            skip_failed,
        } => {
            let store = JsonMappingStore::open(&mappings)?;
            let policy = if skip_failed {
                FailurePolicy::SkipFailed
            } else {
                FailurePolicy::Abort
            };

            let choices = course_choices(&config, &store, course_id, policy)?;
            if cli.json {
                print_json(&choices);
            } else {
                print_course_choices(&choices);
            }
        }
    }

    Ok(Outcome::Done)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(Outcome::Done) => {}
        Ok(Outcome::NotFound(message)) => {
            eprintln!("{}", message);
            process::exit(1);
        }
        Err(e) => {
            let mut lines = error_chain(&e).into_iter();
            if let Some(first) = lines.next() {
                eprintln!("\nError: {}", first);
            }
            for cause in lines {
                eprintln!("  caused by: {}", cause);
            }
            process::exit(1);
        }
    }
}
