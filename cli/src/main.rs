//! PortPilot CLI - See what is listening on your machine
//!
//! A command-line tool for listing listening ports grouped by category or
//! runtime, and for watching ports start and stop.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use portpilot_core::{GroupBy, RuntimeTag};
use tracing::{debug, Level};

use commands::list::ListOptions;

#[derive(Parser)]
#[command(name = "portpilot")]
#[command(author, version, about = "List and watch listening TCP ports")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to ~/.portpilot/config.json)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Log level written to stderr
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,
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

#[derive(Subcommand)]
enum Commands {
    /// List all listening ports
    #[command(alias = "ls")]
    List {
        /// Grouping: category, runtime or none
        #[arg(short, long)]
        group_by: Option<GroupBy>,

        /// Filter by port number
        #[arg(short, long)]
        port: Option<u16>,

        /// Search port, PID, process name and command
        #[arg(short = 's', long, visible_alias = "name", short_alias = 'n')]
        search: Option<String>,

        /// Only show these runtimes (e.g. node,python,database)
        #[arg(short, long, value_delimiter = ',', value_name = "RUNTIME")]
        runtime: Vec<RuntimeTag>,

        /// Hide a port (repeatable)
        #[arg(long = "ignore-port", value_name = "PORT")]
        ignore_ports: Vec<u16>,

        /// Hide ports below 1024
        #[arg(long)]
        ignore_system: bool,
    },

    /// Report ports as they start and stop listening
    Watch {
        /// Seconds between scans
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show current configuration
    Config,
}

/// Installs a stderr fmt subscriber unless logging is off.
fn setup_logging(level: LogLevel) {
    let max_level = match level {
        LogLevel::Off => return,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    debug!("Logging initialized with level: {:?}", level);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level);

    let (store, config) = commands::load_config(cli.config).await?;

    match cli.command {
        Some(Commands::List {
            group_by,
            port,
            search,
            runtime,
            ignore_ports,
            ignore_system,
        }) => {
            let options = ListOptions {
                group_by,
                port,
                search,
                runtimes: runtime,
                ignore_ports,
                ignore_system,
                json: cli.json,
            };
            commands::list::run(options, &config).await?;
        }
        Some(Commands::Watch { interval }) => {
            commands::watch::run(interval, &config, cli.json).await?;
        }
        Some(Commands::Config) => {
            commands::config::show(&store, &config, cli.json)?;
        }
        None => {
            commands::list::run(ListOptions::new(cli.json), &config).await?;
        }
    }

    Ok(())
}
