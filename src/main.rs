use clap::{Args as ClapArgs, Parser, Subcommand};
use legisbot::prelude::*;
use legisbot::source::{collect_records, readable_lines};
use legisbot::{brasilia_hour, QuietHours};
use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

/// Keyword matching and priority scoring of legislative proposals
#[derive(Parser, Debug)]
#[command(name = "legisbot")]
#[command(about = "Filter and prioritise legislative proposals against a keyword taxonomy")]
#[command(version)]
struct Args {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Where proposals are read from and which taxonomy applies
#[derive(ClapArgs, Debug)]
struct InputArgs {
    /// Taxonomy file (.toml, .yml or .yaml)
    #[arg(long, env = "LEGISBOT_TAXONOMY")]
    taxonomy: PathBuf,

    /// Directory of fetched API responses (*.json)
    #[arg(long, env = "LEGISBOT_DIR")]
    dir: Option<PathBuf>,

    /// Read JSON documents or file paths from stdin instead of a directory
    /// Useful for stdio pipelines: find ... | legisbot scan --stdin
    #[arg(long)]
    stdin: bool,

    /// Maximum number of files to read from the directory
    #[arg(long)]
    max_files: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match and score proposals, printing one JSON entry per line
    Scan {
        #[command(flatten)]
        input: InputArgs,

        /// Only print entries at or above this level (critical, high, medium, low, info)
        #[arg(long, default_value = "info")]
        min_level: String,

        /// Limit number of results
        #[arg(long)]
        limit: Option<usize>,

        /// File of already-delivered keys (one per line) to leave out
        #[arg(long)]
        seen: Option<PathBuf>,

        /// Apply notification rules: only entries at or above --min-level,
        /// and only critical ones during quiet hours
        #[arg(long)]
        notify: bool,

        /// Quiet hours as START-END in Brasília time, e.g. 22-7
        #[arg(long, requires = "notify")]
        quiet_hours: Option<String>,

        /// Hour of day (0-23) used for quiet hours (default: current hour in Brasília)
        #[arg(long, requires = "notify", value_parser = clap::value_parser!(u32).range(0..24))]
        hour: Option<u32>,
    },

    /// Print a summary of the cycle as JSON
    Digest {
        #[command(flatten)]
        input: InputArgs,
    },

    /// List the topics of a taxonomy
    Topics {
        /// Taxonomy file (.toml, .yml or .yaml)
        #[arg(long, env = "LEGISBOT_TAXONOMY")]
        taxonomy: PathBuf,
    },
}

fn print_available_commands() {
    println!("Available commands:");
    println!("  scan    Match and score proposals, printing one JSON entry per line");
    println!("  digest  Print a summary of the cycle as JSON");
    println!("  topics  List the topics of a taxonomy");
}

/// Load the taxonomy and run the filter over every readable record
async fn load_results(input: &InputArgs) -> anyhow::Result<ResultSet> {
    let taxonomy = Taxonomy::from_path(&input.taxonomy)
        .map_err(|e| anyhow::anyhow!("Failed to load taxonomy {}: {}", input.taxonomy.display(), e))?;
    if taxonomy.is_empty() {
        log::warn!("Taxonomy {} has no topics; nothing will match", input.taxonomy.display());
    }

    let (records, errors) = if input.stdin {
        let stdin = io::stdin();
        collect_records(ProposalSource::from_stdin(readable_lines(stdin.lock()))).await
    } else {
        let dir = input
            .dir
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Either --dir (or LEGISBOT_DIR) or --stdin is required"))?;
        let mut builder = ScanConfigBuilder::new(dir);
        if let Some(max_files) = input.max_files {
            builder = builder.max_files(max_files);
        }
        let source = ProposalSource::new(builder.build()?);
        collect_records(source.process()).await
    };

    if !errors.is_empty() {
        log::warn!("{} source documents could not be read", errors.len());
    }

    let results = filter_records(records, &taxonomy);
    for diagnostic in results.diagnostics() {
        log::warn!(
            "Skipped record {} from {}: {}",
            diagnostic.id.as_deref().unwrap_or("?"),
            diagnostic.origin.as_deref().unwrap_or("input"),
            diagnostic.reason
        );
    }
    Ok(results)
}

fn read_seen_keys(path: &PathBuf) -> anyhow::Result<HashSet<String>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read seen keys {}: {}", path.display(), e))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[allow(clippy::too_many_arguments)]
async fn run_scan_command(
    input: InputArgs,
    min_level: String,
    limit: Option<usize>,
    seen: Option<PathBuf>,
    notify: bool,
    quiet_hours: Option<String>,
    hour: Option<u32>,
) -> anyhow::Result<()> {
    let min_level: PriorityLevel = min_level.parse()?;
    let quiet_hours = quiet_hours
        .as_deref()
        .map(str::parse::<QuietHours>)
        .transpose()?;
    let seen = match seen {
        Some(path) => read_seen_keys(&path)?,
        None => HashSet::new(),
    };

    let results = load_results(&input).await?;

    let threshold = if notify {
        let policy = NotificationPolicy {
            min_level,
            quiet_hours,
        };
        let hour = hour.unwrap_or_else(|| brasilia_hour(chrono::Utc::now()));
        policy.threshold_at(hour)
    } else {
        min_level
    };

    let selected = results
        .unseen(&seen)
        .filter(|entry| entry.priority() >= threshold)
        .take(limit.unwrap_or(usize::MAX));

    // Write JSON to stdout (one per line)
    for entry in selected {
        let json = serde_json::to_string(entry)?;
        println!("{}", json);
    }

    Ok(())
}

async fn run_digest_command(input: InputArgs) -> anyhow::Result<()> {
    let results = load_results(&input).await?;
    let digest = Digest::from_results(&results);
    println!("{}", serde_json::to_string_pretty(&digest)?);
    Ok(())
}

fn run_topics_command(taxonomy: PathBuf) -> anyhow::Result<()> {
    let taxonomy = Taxonomy::from_path(&taxonomy)?;
    for topic in taxonomy.topics() {
        let flag = if topic.is_always_critical() { " [always critical]" } else { "" };
        println!("{} (weight {}){}", topic.name(), topic.weight(), flag);
        for keyword in topic.keywords() {
            let marker = if keyword.is_critical() { "!" } else { "-" };
            println!("  {} {}", marker, keyword.pattern());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match args.command {
        Some(Command::Scan {
            input,
            min_level,
            limit,
            seen,
            notify,
            quiet_hours,
            hour,
        }) => run_scan_command(input, min_level, limit, seen, notify, quiet_hours, hour).await,
        Some(Command::Digest { input }) => run_digest_command(input).await,
        Some(Command::Topics { taxonomy }) => run_topics_command(taxonomy),
        None => {
            print_available_commands();
            Ok(())
        }
    }
}
