#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};

use multitrans::app_config::{self, Config};
use multitrans::app_controller::Controller;
use multitrans::translation::orchestrator::{CancellationHandle, ProviderStatus};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate text with every selected provider
    Translate(TranslateArgs),

    /// List the known providers and whether they are ready
    Providers,

    /// Manage the glossary applied to translations
    Glossary {
        #[command(subcommand)]
        command: GlossaryCommand,
    },

    /// Browse past translations
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Generate shell completions for multitrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Input text file, or '-' for stdin
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Source language code, or 'auto'
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'de', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Providers to use, comma separated
    #[arg(short, long, value_delimiter = ',')]
    providers: Vec<String>,

    /// Maximum number of provider calls in flight
    #[arg(short, long)]
    workers: Option<usize>,

    /// Maximum chunk size in characters
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Time limit for the whole translation in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Ask the evaluator provider to rank the translations
    #[arg(short, long)]
    evaluate: bool,

    /// Provider used for evaluation
    #[arg(long)]
    evaluator: Option<String>,

    /// Do not record this translation in the history
    #[arg(long)]
    no_history: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum GlossaryCommand {
    /// Show every glossary entry
    List,
    /// Add or replace an entry
    Add {
        source: String,
        target: String,
        /// Match the source term case-sensitively
        #[arg(long)]
        case_sensitive: bool,
    },
    /// Remove an entry
    Remove { source: String },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// Show the most recent translations
    List {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one translation in full
    Show { id: String },
    /// Delete every recorded translation
    Clear,
}

/// multitrans - translate text with several providers at once
#[derive(Parser, Debug)]
#[command(name = "multitrans")]
#[command(version)]
#[command(about = "Parallel multi-provider text translation")]
#[command(long_about = "multitrans sends text to several translation providers in parallel, applies a glossary to the results and can ask an LLM to rank them.

EXAMPLES:
    multitrans translate notes.txt -t de                 # Translate with the configured providers
    echo 'Hello world.' | multitrans translate -t fr     # Read text from stdin
    multitrans translate notes.txt -p deepl,google -e    # Pick providers and evaluate
    multitrans glossary add 'New York' 'Nueva York'      # Add a glossary term
    multitrans history list                              # Show past translations
    multitrans completions bash > multitrans.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in multitrans.json by default. If the file does not
    exist, a default one is created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "multitrans.json", global = true)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(LevelFilter::Trace)))?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();
    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "multitrans", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    match &cli.log_level {
        Some(level) => config.log_level = level.clone().into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    match cli.command {
        Commands::Translate(args) => run_translate(config, args).await,
        Commands::Providers => {
            let controller = Controller::with_config(config)?;
            print!("{}", Controller::render_providers(&controller.providers()));
            Ok(())
        }
        Commands::Glossary { command } => run_glossary(config, command),
        Commands::History { command } => run_history(config, command).await,
        Commands::Completions { .. } => Ok(()),
    }
}

async fn run_translate(mut config: Config, args: TranslateArgs) -> Result<()> {
    if let Some(source_language) = args.source_language {
        config.source_language = source_language;
    }
    if let Some(target_language) = args.target_language {
        config.target_language = target_language;
    }
    if !args.providers.is_empty() {
        config.selected_providers = args.providers;
    }
    if let Some(workers) = args.workers {
        config.max_workers = workers;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.max_chunk_size = chunk_size;
    }
    if args.timeout.is_some() {
        config.timeout_secs = args.timeout;
    }
    if args.evaluator.is_some() {
        config.evaluator_provider = args.evaluator;
    }

    let controller = Controller::with_config(config)?.with_progress_bar(!args.no_progress);
    let text = Controller::read_input(args.input.as_deref())?;

    let cancellation = CancellationHandle::new();
    let on_interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing tasks already in flight");
            on_interrupt.cancel();
        }
    });

    let outcome = controller
        .translate(&text, args.evaluate, !args.no_history, cancellation)
        .await
        .context("Translation failed")?;
    print!("{}", Controller::render_outcome(&outcome));

    let any_translated = outcome
        .report
        .results
        .iter()
        .any(|r| r.status != ProviderStatus::Failed);
    if !any_translated && outcome.report.chunk_count() > 0 {
        return Err(anyhow!("No provider produced a translation"));
    }
    Ok(())
}

fn run_glossary(config: Config, command: GlossaryCommand) -> Result<()> {
    let controller = Controller::with_config(config)?;
    match command {
        GlossaryCommand::List => {
            let glossary = controller.glossary_entries()?;
            if glossary.is_empty() {
                info!("Glossary is empty");
            }
            print!("{}", Controller::render_glossary(&glossary));
        }
        GlossaryCommand::Add {
            source,
            target,
            case_sensitive,
        } => match controller.glossary_add(&source, &target, case_sensitive)? {
            Some(previous) => info!("Replaced '{}' => '{}'", previous.source, previous.target),
            None => info!("Added '{}' => '{}'", source, target),
        },
        GlossaryCommand::Remove { source } => {
            let removed = controller.glossary_remove(&source)?;
            info!("Removed '{}' => '{}'", removed.source, removed.target);
        }
    }
    Ok(())
}

async fn run_history(config: Config, command: HistoryCommand) -> Result<()> {
    let controller = Controller::with_config(config)?;
    match command {
        HistoryCommand::List { limit } => {
            let records = controller.history_list(limit).await?;
            if records.is_empty() {
                info!("History is empty");
            }
            print!("{}", Controller::render_history_list(&records));
        }
        HistoryCommand::Show { id } => {
            let record = controller.history_show(&id).await?;
            print!("{}", Controller::render_history_record(&record));
        }
        HistoryCommand::Clear => {
            let removed = controller.history_clear().await?;
            info!("Removed {} history records", removed);
        }
    }
    Ok(())
}
