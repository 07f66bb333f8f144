use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gscq::gcp::http::format_api_error;
use gscq::output::{JsonLinesSink, YamlSink};
use gscq::table::{get_all_table_names, get_table};
use gscq::{Config, Connection, Quals, RowSink, VERSION};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Query Google Search Console and PageSpeed Insights as tables
#[derive(Parser, Debug)]
#[command(name = "gscq", version, about, long_about = None)]
struct Args {
    /// Config file (defaults to <config dir>/gscq/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Service account key file or inline JSON
    #[arg(long)]
    credentials: Option<String>,

    /// Static OAuth access token
    #[arg(long)]
    access_token: Option<String>,

    /// URLs per batch when fanning out over a sitemap
    #[arg(long)]
    batch_size: Option<usize>,

    /// Cap on concurrent remote calls during a list
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Deadline in seconds for a whole list
    #[arg(long)]
    timeout: Option<u64>,

    /// Row output format
    #[arg(short, long, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available tables
    Tables,
    /// Show the columns of a table
    Columns { table: String },
    /// List the rows of a table
    List {
        table: String,
        /// Equality qualifier, e.g. -w site_url=sc-domain:example.com
        #[arg(short = 'w', long = "where", value_parser = parse_qual)]
        quals: Vec<(String, String)>,
    },
    /// Get a single row of a table
    Get {
        table: String,
        #[arg(short = 'w', long = "where", value_parser = parse_qual)]
        quals: Vec<(String, String)>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn parse_qual(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

/// Rows go to stdout, so logs always go to a file
fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gscq {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gscq").join("gscq.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gscq").join("gscq.log");
    }
    PathBuf::from("gscq.log")
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(credentials) = &args.credentials {
        config.credentials = Some(credentials.clone());
    }
    if let Some(token) = &args.access_token {
        config.access_token = Some(token.clone());
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(max_in_flight) = args.max_in_flight {
        config.max_in_flight = Some(max_in_flight);
    }
    if let Some(timeout) = args.timeout {
        config.list_timeout_secs = Some(timeout);
    }

    config.validate()?;
    Ok(config)
}

fn print_tables(out: &mut impl Write) -> Result<()> {
    for name in get_all_table_names() {
        if let Some(table) = get_table(name) {
            writeln!(out, "{:<52} {}", name, table.description)?;
        }
    }
    Ok(())
}

fn print_columns(out: &mut impl Write, name: &str) -> Result<()> {
    let table = get_table(name).ok_or_else(|| anyhow!("Unknown table: {}", name))?;
    for column in &table.columns {
        writeln!(
            out,
            "{:<28} {:<10} {}",
            column.name, column.column_type, column.description
        )?;
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let mut out = io::stdout();

    match &args.command {
        Command::Tables => print_tables(&mut out.lock()),
        Command::Columns { table } => print_columns(&mut out.lock(), table),
        Command::List { table, quals } => {
            let conn = Connection::new(load_config(&args)?)?;
            let quals: Quals = quals.iter().cloned().collect();

            let rows = match args.output {
                OutputFormat::Json => {
                    let mut sink = JsonLinesSink::new(&mut out);
                    conn.list(table, &quals, &mut sink).await?;
                    sink.rows()
                }
                OutputFormat::Yaml => {
                    let mut sink = YamlSink::new(&mut out);
                    conn.list(table, &quals, &mut sink).await?;
                    sink.rows()
                }
            };
            tracing::info!("{} rows", rows);
            Ok(())
        }
        Command::Get { table, quals } => {
            let conn = Connection::new(load_config(&args)?)?;
            let quals: Quals = quals.iter().cloned().collect();

            if let Some(row) = conn.get(table, &quals).await? {
                let mut sink: Box<dyn RowSink + '_> = match args.output {
                    OutputFormat::Json => Box::new(JsonLinesSink::new(&mut out)),
                    OutputFormat::Yaml => Box::new(YamlSink::new(&mut out)),
                };
                sink.push(row)?;
            }
            Ok(())
        }
    }
}

/// Report the outcome, flushing buffered log lines before the process exits
fn finish(
    result: Result<()>,
    log_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
) -> ExitCode {
    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {}", format_api_error(&err));
            ExitCode::FAILURE
        }
    };

    drop(log_guard);
    code
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let log_guard = match setup_logging(args.log_level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = run(args).await;
    finish(result, log_guard)
}
