//! namesake-merge
//!
//! Batch tool: loads raw name counts, deduplicates them and writes a
//! registry snapshot.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use indexmap::IndexMap;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use namesake::{
    ConfigError, NamesakeResult, OrgDictionary, OverrideTable, PersonRegistry, PositionHint,
    RegistryConfig,
};

/// Deduplicate raw author/recipient names into a person registry.
#[derive(Debug, Parser)]
#[command(name = "namesake-merge", version)]
struct Args {
    /// JSON object mapping raw names to occurrence counts.
    names: PathBuf,

    /// Where to write the registry snapshot.
    #[arg(short, long, default_value = "people.nmsk")]
    output: PathBuf,

    /// Organization dictionary (JSON: clean name -> raw variants).
    #[arg(short, long)]
    dictionary: Option<PathBuf>,

    /// Registry configuration (JSON).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override table (JSON); the built-in table is used when omitted.
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Number of people to list in the summary.
    #[arg(long, default_value_t = 20)]
    top: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> NamesakeResult<()> {
    let dictionary = match &args.dictionary {
        Some(path) => OrgDictionary::from_path(path)?,
        None => OrgDictionary::new(),
    };
    let config = match &args.config {
        Some(path) => RegistryConfig::from_path(path)?,
        None => RegistryConfig::default(),
    };
    let overrides = match &args.overrides {
        Some(path) => OverrideTable::from_path(path)?,
        None => OverrideTable::builtin(),
    };
    let names = read_name_counts(&args.names)?;

    let min_occurrences = config.min_occurrences;
    let mut registry = PersonRegistry::with_config(dictionary, config)?;

    let mut loaded = 0usize;
    let mut skipped = 0usize;
    for (raw, count) in &names {
        if *count < min_occurrences {
            continue;
        }
        if registry.add_person_raw(raw, *count, PositionHint::None).is_skipped() {
            skipped += 1;
        } else {
            loaded += 1;
        }
    }
    info!(total = names.len(), loaded, skipped, people = registry.len(), "loaded raw names");

    let merges = registry.merge_duplicates()?;
    let report = registry.apply_overrides(&overrides)?;
    let dropped = registry.drop_company_accounts();
    registry.verify_index()?;

    println!(
        "{} raw names -> {} people ({} merges, {} manual merges, {} company accounts dropped)",
        loaded,
        registry.len(),
        merges.merges,
        report.merged,
        dropped
    );
    let mut people: Vec<_> = registry.iter().collect();
    people.sort_by(|a, b| b.count().cmp(&a.count()).then_with(|| a.id().cmp(&b.id())));
    for person in people.into_iter().take(args.top) {
        println!(
            "{:>8}  {:<40} {}",
            person.count(),
            person.full_name(),
            person.most_likely_position()
        );
    }

    registry.store_to_path(&args.output)?;
    Ok(())
}

fn read_name_counts(path: &Path) -> Result<IndexMap<String, u64>, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&json).map_err(|e| ConfigError::Decode {
        what: "name counts".to_string(),
        message: e.to_string(),
    })
}
