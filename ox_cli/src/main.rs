use clap::{Parser, Subcommand, ValueEnum};
use ox_core::analytics::summary;
use ox_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "ox")]
#[command(about = "Plain-text training log analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Training log to read (defaults to data.log_file from the config)
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// Output format for tables
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Csv,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Table => OutputFormat::Table,
            Format::Csv => OutputFormat::Csv,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Per-exercise summary and session counts
    Stats,

    /// Dated history of one exercise
    History {
        exercise: String,
    },

    /// Run a named report, or list reports when no name is given
    Report {
        name: Option<String>,

        /// Report flags, e.g. `-m bench-press -b monthly`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run a named generator, or list generators when no name is given
    Generate {
        name: Option<String>,

        /// Generator flags, e.g. `-m squat -t 315`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run SQL against the relational projection
    Query {
        sql: String,
    },

    /// List tables and views in the projection
    Tables,

    /// Report syntax problems; exits non-zero on errors
    Lint,

    /// Print the log in canonical form, keeping entry order
    Fmt,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    ox_core::logging::init_for_verbosity(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load()?;
    let format = OutputFormat::from(cli.format);
    let file = cli.file.or_else(|| config.data.log_file.clone());
    tracing::debug!("Log file: {:?}", file);

    match cli.command {
        Commands::Stats => cmd_stats(&log_path(file)?, format),
        Commands::History { exercise } => cmd_history(&log_path(file)?, &exercise, format),
        Commands::Report { name, args } => cmd_report(file, name, &args, format, &config),
        Commands::Generate { name, args } => cmd_generate(file, name, &args, &config),
        Commands::Query { sql } => cmd_query(&log_path(file)?, &sql, format),
        Commands::Tables => cmd_tables(&log_path(file)?, format),
        Commands::Lint => cmd_lint(&log_path(file)?, format),
        Commands::Fmt => cmd_fmt(&log_path(file)?),
    }
}

fn log_path(file: Option<PathBuf>) -> Result<PathBuf> {
    file.ok_or_else(|| {
        Error::Config("No log file given. Pass --file or set data.log_file in the config".into())
    })
}

fn print_table(table: &ReportTable, format: OutputFormat) -> Result<()> {
    let stdout = io::stdout();
    write_table(table, format, stdout.lock())
}

fn cmd_stats(path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let log = parse_file(path)?;
    let stats = summary::stats(&log);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Csv => print_table(&stats.table, format)?,
        OutputFormat::Table => {
            print_table(&stats.table, format)?;
            println!();
            println!("Completed sessions: {}", stats.completed_sessions);
            println!("Planned sessions:   {}", stats.planned_sessions);
            println!("Unique exercises:   {}", stats.unique_exercises);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_history(path: &Path, exercise: &str, format: OutputFormat) -> Result<ExitCode> {
    let log = parse_file(path)?;
    let table = summary::history(&log, exercise)?;
    print_table(&table, format)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_report(
    file: Option<PathBuf>,
    name: Option<String>,
    args: &[String],
    format: OutputFormat,
    config: &Config,
) -> Result<ExitCode> {
    let registry = Registry::with_builtins(config);

    let Some(name) = name else {
        println!("Available reports:");
        for report in registry.reports() {
            println!("  {:<12} {}", report.name, report.description);
            println!("  {:<12} usage: {}", "", registry.report_usage(&report.name)?);
        }
        return Ok(ExitCode::SUCCESS);
    };

    let report = registry.report(&name)?;
    if args.is_empty() && report.params.iter().any(|p| p.required) {
        println!("{}", report.description);
        println!("usage: {}", registry.report_usage(&name)?);
        return Ok(ExitCode::SUCCESS);
    }

    let live = LiveStore::open(log_path(file)?)?;
    let table = registry.run_report(&name, live.store(), &join_args(args))?;
    print_table(&table, format)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_generate(
    file: Option<PathBuf>,
    name: Option<String>,
    args: &[String],
    config: &Config,
) -> Result<ExitCode> {
    let registry = Registry::with_builtins(config);

    let Some(name) = name else {
        println!("Available generators:");
        for generator in registry.generators() {
            println!("  {:<12} {}", generator.name, generator.description);
            println!("  {:<12} usage: {}", "", registry.generator_usage(&generator.name)?);
        }
        return Ok(ExitCode::SUCCESS);
    };

    let generator = registry.generator(&name)?;
    if args.is_empty() && generator.params.iter().any(|p| p.required) {
        println!("{}", generator.description);
        println!("usage: {}", registry.generator_usage(&name)?);
        return Ok(ExitCode::SUCCESS);
    }

    let live = if generator.needs_store {
        Some(LiveStore::open(log_path(file)?)?)
    } else {
        None
    };
    let text = registry.run_generator(&name, live.as_ref().map(LiveStore::store), &join_args(args))?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_query(path: &Path, sql: &str, format: OutputFormat) -> Result<ExitCode> {
    let live = LiveStore::open(path)?;
    let table = ReportTable::from(live.store().query(sql)?);
    print_table(&table, format)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_tables(path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let live = LiveStore::open(path)?;
    let mut table = ReportTable::new(["name", "kind"]);
    for info in live.store().tables()? {
        table.push(vec![Cell::Text(info.name), Cell::Text(info.kind)]);
    }
    print_table(&table, format)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_lint(path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let log = parse_file(path)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&log.diagnostics)?),
        _ if log.diagnostics.is_empty() => println!("No problems found"),
        _ => {
            for diagnostic in &log.diagnostics {
                println!("{}", diagnostic);
            }
        }
    }

    if log.has_errors() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn cmd_fmt(path: &Path) -> Result<ExitCode> {
    let text = std::fs::read_to_string(path)?;
    print!("{}", format_source(&text));
    Ok(ExitCode::SUCCESS)
}

/// Re-join shell words, quoting any that contain spaces or quotes
fn join_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if !arg.is_empty() && !arg.contains(|c: char| c.is_whitespace() || "\"'\\".contains(c)) {
                arg.clone()
            } else {
                format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
