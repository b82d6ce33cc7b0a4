//! dep-ledger: dependency history ledger for git repositories
//!
//! Scans manifests at recorded commits and keeps a tamper-evident, per-ref history of
//! the dependencies each commit declared.

#![allow(
    clippy::too_many_lines,
    clippy::struct_excessive_bools,
    clippy::needless_pass_by_value
)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use dep_ledger::{
    cli,
    config::{AppConfig, ConfigOverrides, Validatable},
    parsers::MavenMode,
    pipeline::{exit_codes, IngestTask, OutputTarget},
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build long version string with supported manifests
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nSupported manifests:",
        "\n  requirements.txt, environment.yml, meta.yaml",
        "\n  package.json, glide.yaml, pom.xml"
    )
}

#[derive(Parser)]
#[command(name = "dep-ledger")]
#[command(version, long_version = build_long_version())]
#[command(about = "Dependency history ledger for git repositories", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success
    1  Dependencies changed (diff --fail-on-change)
    2  Repository, ref, tag or document not found
    3  Error occurred

EXAMPLES:
    # Scan a working tree without recording anything
    dep-ledger scan ./checkout

    # Record one commit
    dep-ledger ingest --repo acme/api --sha 4f2c9e1 --ref refs/heads/main

    # Record a batch of push events (JSON lines)
    dep-ledger ingest --tasks events.jsonl

    # Dependencies declared at a tag
    dep-ledger report acme/api --tag v1.2.0

    # What changed between two branches
    dep-ledger diff acme/api main release --refs")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store directory (overrides `store.path`)
    #[arg(long, global = true, env = "DEP_LEDGER_STORE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// How `pom.xml` files are read
#[derive(Debug, Clone, Copy, ValueEnum)]
enum MavenModeArg {
    /// Run the Maven resolver
    Resolve,
    /// Read declared dependencies only
    Declared,
}

impl From<MavenModeArg> for MavenMode {
    fn from(arg: MavenModeArg) -> Self {
        match arg {
            MavenModeArg::Resolve => Self::Resolve,
            MavenModeArg::Declared => Self::Declared,
        }
    }
}

// ============================================================================
// Command argument structs
// ============================================================================

/// Arguments for the `scan` subcommand
#[derive(Parser)]
struct ScanArgs {
    /// Directory to scan
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Repository name to stamp on the result (defaults to the directory name)
    #[arg(long)]
    repo: Option<String>,

    /// Sha to stamp on the result
    #[arg(long)]
    sha: Option<String>,

    #[arg(long, value_enum)]
    maven: Option<MavenModeArg>,

    /// Include test-scoped dependencies
    #[arg(long)]
    include_test_deps: bool,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,
}

/// Arguments for the `ingest` subcommand
#[derive(Parser)]
struct IngestArgs {
    /// Repository full name, e.g. `acme/api`
    #[arg(long, requires_all = ["sha", "ref_name"])]
    repo: Option<String>,

    /// Commit sha to record
    #[arg(long)]
    sha: Option<String>,

    /// Ref the commit was pushed to
    #[arg(long = "ref")]
    ref_name: Option<String>,

    /// JSON-lines task file (`-` reads stdin)
    #[arg(long)]
    tasks: Option<PathBuf>,

    /// Resolve-stage worker count
    #[arg(short, long)]
    workers: Option<usize>,

    /// Commit-stage worker count
    #[arg(long)]
    commit_workers: Option<usize>,

    #[arg(long, value_enum)]
    maven: Option<MavenModeArg>,

    /// Include test-scoped dependencies
    #[arg(long)]
    include_test_deps: bool,

    /// Do not record a diff against the previous tip
    #[arg(long)]
    no_diffs: bool,

    /// Do not update the commit history tree
    #[arg(long)]
    no_history: bool,

    /// Base URL repositories are cloned from
    #[arg(long)]
    remote_base: Option<String>,

    /// Output file path for the run statistics
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,
}

/// Arguments for the `report` subcommand
#[derive(Parser)]
#[command(group(clap::ArgGroup::new("selector").required(true).args(["sha", "ref_name", "tag"])))]
struct ReportArgs {
    /// Repository full name
    repo: String,

    #[arg(long)]
    sha: Option<String>,

    /// Newest recorded commit of a ref
    #[arg(long = "ref")]
    ref_name: Option<String>,

    #[arg(long)]
    tag: Option<String>,

    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,
}

/// Arguments for the `diff` subcommand
#[derive(Parser)]
struct DiffArgs {
    /// Repository full name
    repo: String,

    /// Old sha (or ref with --refs)
    old: String,

    /// New sha (or ref with --refs)
    new: String,

    /// Treat OLD and NEW as ref names
    #[arg(long)]
    refs: bool,

    /// Store the result as a difference document
    #[arg(long)]
    record: bool,

    /// Exit with code 1 if dependencies were added or removed
    #[arg(long)]
    fail_on_change: bool,

    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory's manifests and print the result
    Scan(ScanArgs),

    /// Record commits into the ledger
    Ingest(IngestArgs),

    /// Print the dependencies recorded for a commit
    Report(ReportArgs),

    /// Compare the dependencies of two recorded commits
    Diff(DiffArgs),

    /// List repositories, refs of a repository, or recorded shas of a ref
    List {
        repo: Option<String>,

        #[arg(long = "ref", requires = "repo")]
        ref_name: Option<String>,

        /// Only repositories of this organization
        #[arg(long)]
        org: Option<String>,

        #[arg(short = 'O', long)]
        output_file: Option<PathBuf>,
    },

    /// Find recorded commits that use a dependency
    Search {
        /// Exact dependency name
        name: String,

        /// Version prefix, e.g. `1.0` matches `1.0.2`
        #[arg(long)]
        version: Option<String>,

        /// Only commits of this repository (repeatable)
        #[arg(long = "repo")]
        repos: Vec<String>,

        /// Only repositories of this organization
        #[arg(long)]
        org: Option<String>,

        #[arg(short = 'O', long)]
        output_file: Option<PathBuf>,
    },

    /// Print the commit history graph of a repository
    History {
        repo: String,

        /// Generations around each leaf to include
        #[arg(long)]
        depth: Option<usize>,

        #[arg(short = 'O', long)]
        output_file: Option<PathBuf>,
    },

    /// Plan (or run) scans of tagged commits that were never recorded
    Backfill {
        repo: String,

        /// Run the planned scans
        #[arg(long)]
        run: bool,

        #[arg(short = 'O', long)]
        output_file: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (merged from defaults + file + flags)
    Show,
    /// Generate an example .dep-ledger.yaml in the current directory
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .init();

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            cli::exit_code_for(&err)
        }
    };
    if exit_code != exit_codes::SUCCESS {
        std::process::exit(exit_code);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<i32> {
    let mut overrides = command_overrides(&cli.command);
    overrides.store_path = cli.store.clone();

    let (config, loaded_from) = AppConfig::from_file_with_overrides(cli.config.as_deref(), &overrides)
        .context("failed to load configuration")?;
    if let Some(path) = &loaded_from {
        tracing::debug!(path = %path.display(), "loaded configuration");
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "dep-ledger", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }

        Commands::ConfigSchema { output } => {
            let schema = dep_ledger::config::generate_json_schema();
            match output {
                Some(path) => {
                    std::fs::write(&path, &schema)?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => {
                    println!("{schema}");
                }
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if let Some(path) = &loaded_from {
                    eprintln!("# Loaded from: {}", path.display());
                } else {
                    eprintln!("# No config file found; showing defaults");
                }
                let yaml = serde_yaml::to_string(&config).context("failed to serialize config")?;
                print!("{yaml}");
                Ok(exit_codes::SUCCESS)
            }
            ConfigAction::Init => {
                let target = std::env::current_dir()
                    .context("cannot determine current directory")?
                    .join(".dep-ledger.yaml");
                if target.exists() {
                    anyhow::bail!(
                        "{} already exists. Remove it first to re-initialize.",
                        target.display()
                    );
                }
                std::fs::write(&target, dep_ledger::config::generate_example_config())
                    .with_context(|| format!("failed to write {}", target.display()))?;
                eprintln!("Created {}", target.display());
                Ok(exit_codes::SUCCESS)
            }
        },

        command => {
            let errors = config.validate();
            if !errors.is_empty() {
                for error in &errors {
                    eprintln!("config error: {error}");
                }
                anyhow::bail!("invalid configuration ({} errors)", errors.len());
            }
            dispatch(&config, command)
        }
    }
}

/// Config values set by subcommand flags
fn command_overrides(command: &Commands) -> ConfigOverrides {
    let mut overrides = ConfigOverrides::default();
    match command {
        Commands::Scan(args) => {
            overrides.maven_mode = args.maven.map(MavenMode::from);
            overrides.include_test_deps = args.include_test_deps.then_some(true);
        }
        Commands::Ingest(args) => {
            overrides.workers = args.workers;
            overrides.commit_workers = args.commit_workers;
            overrides.maven_mode = args.maven.map(MavenMode::from);
            overrides.include_test_deps = args.include_test_deps.then_some(true);
            overrides.record_diffs = args.no_diffs.then_some(false);
            overrides.track_history = args.no_history.then_some(false);
            overrides.remote_base.clone_from(&args.remote_base);
        }
        Commands::History { depth, .. } => {
            overrides.subtree_depth = *depth;
        }
        _ => {}
    }
    overrides
}

fn dispatch(config: &AppConfig, command: Commands) -> Result<i32> {
    match command {
        Commands::Scan(args) => cli::run_scan(
            config,
            cli::ScanRequest {
                dir: args.dir,
                repository: args.repo,
                sha: args.sha,
                output: OutputTarget::from_option(args.output_file),
            },
        ),

        Commands::Ingest(args) => {
            let mut tasks = Vec::new();
            if let (Some(repo), Some(sha), Some(ref_name)) = (args.repo, args.sha, args.ref_name) {
                tasks.push(IngestTask::new(repo, sha, ref_name));
            }
            cli::run_ingest(
                config,
                cli::IngestRequest {
                    tasks,
                    task_file: args.tasks,
                    output: OutputTarget::from_option(args.output_file),
                },
            )
        }

        Commands::Report(args) => {
            let selector = match (args.sha, args.ref_name, args.tag) {
                (Some(sha), _, _) => cli::Selector::Sha(sha),
                (None, Some(ref_name), _) => cli::Selector::Ref(ref_name),
                (None, None, Some(tag)) => cli::Selector::Tag(tag),
                (None, None, None) => anyhow::bail!("one of --sha, --ref or --tag is required"),
            };
            cli::run_report(
                config,
                cli::ReportRequest {
                    repository: args.repo,
                    selector,
                    output: OutputTarget::from_option(args.output_file),
                },
            )
        }

        Commands::Diff(args) => cli::run_diff(
            config,
            cli::DiffRequest {
                repository: args.repo,
                old: args.old,
                new: args.new,
                refs: args.refs,
                record: args.record,
                fail_on_change: args.fail_on_change,
                output: OutputTarget::from_option(args.output_file),
            },
        ),

        Commands::List {
            repo,
            ref_name,
            org,
            output_file,
        } => cli::run_list(
            config,
            cli::ListRequest {
                repository: repo,
                ref_name,
                org,
                output: OutputTarget::from_option(output_file),
            },
        ),

        Commands::Search {
            name,
            version,
            repos,
            org,
            output_file,
        } => cli::run_search(
            config,
            cli::SearchRequest {
                name,
                version,
                repositories: repos,
                org,
                output: OutputTarget::from_option(output_file),
            },
        ),

        Commands::History {
            repo,
            depth,
            output_file,
        } => cli::run_history(
            config,
            cli::HistoryRequest {
                repository: repo,
                depth,
                output: OutputTarget::from_option(output_file),
            },
        ),

        Commands::Backfill {
            repo,
            run,
            output_file,
        } => cli::run_backfill(
            config,
            cli::BackfillRequest {
                repository: repo,
                run,
                output: OutputTarget::from_option(output_file),
            },
        ),

        Commands::Completions { .. } | Commands::ConfigSchema { .. } | Commands::Config { .. } => {
            Ok(exit_codes::SUCCESS)
        }
    }
}
