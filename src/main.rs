// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info};

use subvoice::app_config::{Config, LogLevel};
use subvoice::app_controller::Controller;
use subvoice::errors::AppError;

/// Exit status when same-voice clips overlap and the operator must fix the script
const EXIT_OVERLAP: u8 = 2;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

fn level_filter(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a subtitle script to a multi-channel WAV file (default command)
    #[command(alias = "render")]
    Run(RunArgs),

    /// Generate shell completions for subvoice
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Subtitle script (.srt or .vtt)
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Merge same-speaker lines separated by at most this many milliseconds
    #[arg(short = 'm', long)]
    merge_lines_threshold_ms: Option<i64>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// subvoice - render subtitle scripts to voiced audio tracks
///
/// Every subtitle line is spoken by the voice configured for its speaker and
/// placed at its timestamp, one channel per voice.
#[derive(Parser, Debug)]
#[command(name = "subvoice")]
#[command(version)]
#[command(about = "Render subtitle scripts to multi-channel voice tracks")]
#[command(long_about = "subvoice synthesizes every line of a subtitle script with the voice of its speaker \
and mixes the clips into one WAV file, one channel per voice.

EXAMPLES:
    subvoice script.srt                         # Render using config.json
    subvoice run -c voices.json script.vtt      # Use a specific configuration
    subvoice -m 500 script.srt                  # Merge lines less than 500ms apart
    subvoice completions bash > subvoice.bash   # Generate bash completions

SPEAKERS:
    A line's speaker comes from a WebVTT <v Name> tag, the first comment before
    the line, or a leading [Name] in its text. Lines without one use the default
    voice.

EXIT STATUS:
    0 on success, 1 on error, 2 when same-voice lines overlap.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Subtitle script (.srt or .vtt)
    #[arg(value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Merge same-speaker lines separated by at most this many milliseconds
    #[arg(short = 'm', long)]
    merge_lines_threshold_ms: Option<i64>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and tag for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
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
            let (colour, tag) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                colour, now, tag, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // The logger accepts everything; the effective level is set once the config is read
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
        return ExitCode::FAILURE;
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    let args = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subvoice", &mut std::io::stdout());
            return ExitCode::SUCCESS;
        }
        Some(Commands::Run(args)) => args,
        None => {
            // Default behavior - top-level args render a script
            let Some(script) = cli.script else {
                error!("SCRIPT is required when no subcommand is specified");
                return ExitCode::FAILURE;
            };
            RunArgs {
                script,
                config: cli.config,
                merge_lines_threshold_ms: cli.merge_lines_threshold_ms,
                log_level: cli.log_level,
            }
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<AppError>() {
            Some(AppError::Overlap(report)) => {
                println!("{}", report);
                ExitCode::from(EXIT_OVERLAP)
            }
            _ => {
                error!("{:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(options: RunArgs) -> Result<()> {
    // A command line level applies before the config is read
    if let Some(cli_level) = &options.log_level {
        log::set_max_level(level_filter(&cli_level.clone().into()));
    }

    let mut config = Config::load(&options.config)
        .with_context(|| format!("Failed to load config file: {:?}", options.config))?;

    match &options.log_level {
        Some(cli_level) => config.log_level = cli_level.clone().into(),
        None => log::set_max_level(level_filter(&config.log_level)),
    }

    let controller = Controller::with_config(config)?.with_progress(true);
    let outcome = controller
        .run(&options.script, options.merge_lines_threshold_ms)
        .await?;

    info!(
        "Rendered {} clips ({} synthesized, {} cached) to {}",
        outcome.clips,
        outcome.stats.synthesized,
        outcome.stats.cached,
        outcome.output_path.display()
    );
    Ok(())
}
