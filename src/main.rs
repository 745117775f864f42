use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ibm_datasource::config::{Config, Overrides};
use ibm_datasource::datasource::{self, describe_data_source, list_data_sources};
use ibm_datasource::ibm::client::ClientSession;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Read IBM Cloud data sources and print their state
#[derive(Parser, Debug)]
#[command(name = "ibm-datasource", version, about, long_about = None)]
struct Args {
    /// IBM Cloud region to use
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available data sources
    List,
    /// Print the schema of one data source, or of all of them
    Schema {
        /// Data source name, e.g. ibm_en_topics
        name: Option<String>,
    },
    /// Read a data source and print its state
    Read {
        /// Data source name, e.g. ibm_en_topics
        name: String,
        /// Attribute as key=value (repeatable)
        #[arg(short = 'a', long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, String)>,
        /// JSON or YAML file with the attribute map
        #[arg(short = 'f', long)]
        config_file: Option<PathBuf>,
    },
    /// Save default settings to the config file
    Configure {
        /// IAM endpoint override
        #[arg(long)]
        iam_endpoint: Option<String>,
        /// Event Notifications endpoint override
        #[arg(long)]
        event_notifications_endpoint: Option<String>,
        /// Schematics endpoint override
        #[arg(long)]
        schematics_endpoint: Option<String>,
    },
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

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Logging disabled, cannot open {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // IBM_DATASOURCE_LOG narrows per-module levels, e.g. "ibm_datasource::ibm=trace"
    let filter = EnvFilter::try_from_env("IBM_DATASOURCE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(tracing_level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ibm-datasource started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("ibm-datasource").join("ibm-datasource.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".ibm-datasource").join("ibm-datasource.log");
    }
    PathBuf::from("ibm-datasource.log")
}

fn parse_attr(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

/// Attribute map from an optional file, with `--attr` values layered on top
fn build_config(config_file: Option<&Path>, attrs: &[(String, String)]) -> Result<Value> {
    let mut map = match config_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {:?}", path))?;
            // YAML is a superset of JSON, so one parser covers both
            let value: Value = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {:?}", path))?;
            match value {
                Value::Object(map) => map,
                Value::Null => Map::new(),
                _ => anyhow::bail!("Config file {:?} must contain a map of attributes", path),
            }
        }
        None => Map::new(),
    };

    for (key, value) in attrs {
        map.insert(key.clone(), Value::String(value.clone()));
    }

    Ok(Value::Object(map))
}

fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).context("Failed to render JSON"),
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to render YAML"),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::load();

    match args.command {
        Command::List => {
            let entries: Vec<Value> = list_data_sources()
                .iter()
                .map(|d| serde_json::json!({"name": d.name, "description": d.description}))
                .collect();
            println!("{}", render(&entries, args.output)?);
        }
        Command::Schema { name } => {
            let schemas = match name {
                Some(name) => vec![describe_data_source(&name)
                    .ok_or_else(|| anyhow::anyhow!("Unknown data source: {}", name))?],
                None => list_data_sources()
                    .iter()
                    .filter_map(|d| describe_data_source(d.name))
                    .collect(),
            };
            println!("{}", render(&schemas, args.output)?);
        }
        Command::Read {
            name,
            attrs,
            config_file,
        } => {
            let attributes = build_config(config_file.as_deref(), &attrs)?;
            let overrides = Overrides {
                region: args.region.clone(),
            };
            let session = ClientSession::new(config.session_config(&overrides))?;
            tracing::info!("Reading {} in region {}", name, session.region());

            let result = tokio::select! {
                result = datasource::read_data_source(&name, &session, &attributes) => result,
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("Read of {} cancelled", name);
                    eprintln!("Read cancelled");
                    return Ok(ExitCode::from(130));
                }
            };

            match result {
                Ok(state) => println!("{}", render(&state, args.output)?),
                Err(diag) => {
                    tracing::error!("{}", diag);
                    eprintln!("{}", render(&diag, args.output)?);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Configure {
            iam_endpoint,
            event_notifications_endpoint,
            schematics_endpoint,
        } => {
            config.merge(Config {
                region: args.region.clone(),
                iam_endpoint,
                event_notifications_endpoint,
                schematics_endpoint,
            });
            config.save()?;
            match Config::config_path() {
                Some(path) => println!("Saved {}", path.display()),
                None => println!("No config directory available; nothing saved"),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
