//! Kirikae command-line tool
//!
//! Builds rename plans from episode-list exports, applies them with
//! rollback, and undoes them later from the saved plan.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use kirikae_core::fs::describe_file;
use kirikae_core::oracle::{EpisodeKey, EpisodeListCache, FixedEpisodeList};
use kirikae_core::plan::{PlanBuilder, PlexRuleSet, write_plan};
use kirikae_core::resolver::AnthologyResolver;
use kirikae_core::{
    ApplyOptions, EpisodeCandidate, MediaFile, MediaType, PlanStatus, Resolution, RuleSetConfig,
    apply_plan, load_plan, save_plan, undo_plan,
};
use serde::Serialize;
use tracing::{info, warn};

/// Default directory for saved plans
fn default_plan_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kirikae")
        .join("plans")
}

/// CLI arguments
#[derive(Parser)]
#[command(name = "kirikae")]
#[command(about = "Resolve TV episodes and rename media files safely")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory plans are saved to and looked up in
    #[arg(short = 'D', long, env = "KIRIKAE_PLAN_DIR")]
    plan_dir: Option<PathBuf>,
}

/// Options shared by commands that resolve episodes
#[derive(clap::Args)]
struct ResolveArgs {
    /// JSON array of episodes (season_number, episode_number, title, ...)
    #[arg(short, long)]
    episodes: PathBuf,

    /// Show name to use instead of the one parsed from filenames
    #[arg(long)]
    show: Option<String>,

    /// Season to use instead of the one parsed from filenames
    #[arg(long)]
    season: Option<u32>,

    /// Treat files as anthology episodes holding several stories
    #[arg(long)]
    anthology: bool,

    /// Ignore titles and pair episodes by runtime, up to this many minutes
    #[arg(long, value_name = "MINUTES")]
    untrusted_titles: Option<u32>,
}

impl ResolveArgs {
    fn config(&self) -> RuleSetConfig {
        let mut config = RuleSetConfig::new().with_anthology(self.anthology);
        if let Some(show) = &self.show {
            config = config.with_show_name(show.clone());
        }
        if let Some(season) = self.season {
            config = config.with_season(season);
        }
        if let Some(minutes) = self.untrusted_titles {
            config = config.with_untrusted_titles(minutes);
        }
        config
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Tv,
    Movie,
}

impl From<Kind> for MediaType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Tv => MediaType::Tv,
            Kind::Movie => MediaType::Movie,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build and save a rename plan for the given files
    Plan {
        #[command(flatten)]
        resolve: ResolveArgs,

        /// Library root the destinations are computed under
        #[arg(short, long)]
        root: PathBuf,

        /// Media type of every input file
        #[arg(long, value_enum, default_value = "tv")]
        kind: Kind,

        /// Movie release year
        #[arg(long)]
        year: Option<u16>,

        /// Record each file's SHA-256 so apply and undo can verify it
        #[arg(long)]
        verify: bool,

        /// Files to plan
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Execute a saved plan
    Apply {
        /// Plan file or plan id
        plan: String,

        /// Re-hash moved files and roll back on mismatch
        #[arg(long)]
        verify_hash: bool,

        /// Leave items whose destination already holds the same content
        #[arg(long)]
        skip_identical: bool,
    },
    /// Move the files of an applied plan back
    Undo {
        /// Plan file or plan id
        plan: String,
    },
    /// Resolve filenames read from stdin and print one JSON line each
    Resolve {
        #[command(flatten)]
        resolve: ResolveArgs,
    },
}

#[derive(Serialize)]
struct ResolvedLine<'a> {
    file: &'a str,
    resolutions: Vec<Resolution>,
}

fn load_episodes(path: &Path) -> Result<Vec<EpisodeCandidate>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read episode list {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse episode list {}", path.display()))
}

/// Accepts either a path to a plan file or the id of a plan in `plan_dir`.
fn locate_plan(plan: &str, plan_dir: &Path) -> PathBuf {
    let as_path = PathBuf::from(plan);
    if as_path.exists() {
        as_path
    } else {
        plan_dir.join(format!("plan_{plan}.json"))
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{json}");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let plan_dir = cli.plan_dir.unwrap_or_else(default_plan_dir);

    match cli.command {
        Commands::Plan {
            resolve,
            root,
            kind,
            year,
            verify,
            files,
        } => {
            let mut config = resolve.config();
            if let Some(year) = year {
                config = config.with_movie_year(year);
            }
            let mut oracle = FixedEpisodeList::named("episode-file", load_episodes(&resolve.episodes)?);
            let rules = PlexRuleSet::new()?;
            let mut builder = PlanBuilder::new(&rules, &config, &mut oracle)?;

            let media = files
                .iter()
                .map(|path| {
                    let path = absolute(path)?;
                    describe_file(&path, kind.into(), verify)
                        .with_context(|| format!("Failed to read {}", path.display()))
                })
                .collect::<Result<Vec<_>>>()?;

            let plan = builder.build(absolute(&root)?, media)?;
            let saved = save_plan(&plan, &plan_dir)
                .with_context(|| format!("Failed to save plan to {}", plan_dir.display()))?;
            info!(plan = %plan.id, path = %saved.display(), "Plan saved");
            print_json(&plan)?;
        }
        Commands::Apply {
            plan,
            verify_hash,
            skip_identical,
        } => {
            let path = locate_plan(&plan, &plan_dir);
            let mut plan = load_plan(&path)
                .with_context(|| format!("Failed to load plan {}", path.display()))?;
            let pending = plan.count(PlanStatus::Pending);
            info!(plan = %plan.id, pending, "Applying plan...");

            let options = ApplyOptions::new()
                .with_verify_hash(verify_hash)
                .with_skip_identical(skip_identical);
            let result = apply_plan(&mut plan, &options);
            write_plan(&plan, &path)
                .with_context(|| format!("Failed to update plan {}", path.display()))?;
            print_json(&result)?;

            if !result.success {
                bail!("Apply failed; {} move(s) rolled back", result.rolled_back);
            }
        }
        Commands::Undo { plan } => {
            let path = locate_plan(&plan, &plan_dir);
            let mut plan = load_plan(&path)
                .with_context(|| format!("Failed to load plan {}", path.display()))?;
            info!(plan = %plan.id, "Undoing plan...");

            let outcome = undo_plan(&mut plan);
            // Restored items are recorded even when undo stopped part way.
            write_plan(&plan, &path)
                .with_context(|| format!("Failed to update plan {}", path.display()))?;
            let report = outcome.context("Undo aborted")?;
            print_json(&report)?;

            if report.failed > 0 {
                warn!(failed = report.failed, "Some restored files no longer match their hash");
            }
        }
        Commands::Resolve { resolve } => {
            let config = resolve.config();
            let resolver = AnthologyResolver::new()?;
            let mut oracle = FixedEpisodeList::named("episode-file", load_episodes(&resolve.episodes)?);
            let mut cache = EpisodeListCache::new();

            let stdin = io::stdin();
            let mut stdout = io::stdout().lock();
            for line in stdin.lock().lines() {
                let line = line.context("Failed to read stdin")?;
                let name = line.trim();
                if name.is_empty() {
                    continue;
                }

                let file = MediaFile::new(name, MediaType::Tv);
                let info = resolver.parser().show_info(&file, &config);
                let key = EpisodeKey::new(info.show.as_str(), info.season, info.year);
                if !cache.contains(&key) {
                    cache.fetch(&mut oracle, &key);
                }

                let resolved = ResolvedLine {
                    file: name,
                    resolutions: resolver.resolve(&file, &info, &cache, &config),
                };
                let json = serde_json::to_string(&resolved).context("Failed to encode output")?;
                writeln!(stdout, "{json}").context("Failed to write stdout")?;
            }
        }
    }

    Ok(())
}
