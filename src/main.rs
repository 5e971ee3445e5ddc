//! # pgschema CLI
//!
//! Offline access to the type and trigger helpers, handy when checking what
//! the UI will show for a catalog row.
//!
//! ## Usage
//!
//! ```bash
//! pgschema format-type numeric --schema pg_catalog --typmod 655366
//! pgschema parse-type "timestamp(3) with time zone"
//! pgschema length-precision "numeric(10,2)" --length --precision
//! pgschema trigger 7
//! ```
//!
//! Logging follows `pgschema.toml` / `PGSCHEMA_LOGGING__*`; `RUST_LOG`
//! overrides the configured level.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pgschema::config::LoggingConfig;
use pgschema::datatype::{get_length_precision, TYPMOD_UNSET};
use pgschema::{get_full_type, parse_length_precision, parse_type_name, trigger_definition, Config};

use std::env;
use std::sync::OnceLock;

static TRACE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Debug, Parser)]
#[command(name = "pgschema", version, about = "PostgreSQL catalog helpers")]
struct Cli {
    /// Configuration file (defaults to pgschema.toml + pgschema.local.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Display type for a catalog type name and typmod
    FormatType {
        typname: String,
        #[arg(long)]
        schema: Option<String>,
        #[arg(long, default_value_t = 0)]
        dims: u32,
        #[arg(long, default_value_t = TYPMOD_UNSET, allow_hyphen_values = true)]
        typmod: i32,
    },
    /// Strip length and precision from a display type
    ParseType { type_name: String },
    /// Extract length and precision digits from a display type
    LengthPrecision {
        fulltype: String,
        /// The type takes a length (defaults to the type's classification)
        #[arg(long)]
        length: bool,
        /// The type takes a precision (defaults to the type's classification)
        #[arg(long)]
        precision: bool,
    },
    /// Decode a pg_trigger.tgtype value
    Trigger { tgtype: i64 },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path).with_context(|| format!("loading {path}"))?,
        None => Config::load().unwrap_or_default(),
    };
    init_tracing(&config.logging);

    match cli.command {
        Command::FormatType {
            typname,
            schema,
            dims,
            typmod,
        } => {
            tracing::debug!(%typname, dims, typmod, "format_type");
            println!("{}", get_full_type(schema.as_deref(), &typname, dims, typmod));
        }
        Command::ParseType { type_name } => {
            println!("{}", parse_type_name(&type_name));
        }
        Command::LengthPrecision {
            fulltype,
            length,
            precision,
        } => {
            let (is_tlength, is_precision) = if length || precision {
                (length || precision, precision)
            } else {
                let lp = get_length_precision(parse_type_name(&fulltype).as_str());
                (lp.length, lp.precision)
            };
            let (len, prec) = parse_length_precision(&fulltype, is_tlength, is_precision);
            let json = serde_json::json!({ "length": len, "precision": prec });
            println!("{json}");
        }
        Command::Trigger { tgtype } => {
            let flags = trigger_definition(tgtype);
            println!("{}", serde_json::to_string_pretty(&flags)?);
        }
    }

    Ok(())
}

fn init_tracing(logging_config: &LoggingConfig) {
    // RUST_LOG takes precedence over the configured level
    let level = env::var("RUST_LOG").unwrap_or_else(|_| logging_config.level.clone());
    let json = logging_config.format == "json";

    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = match &logging_config.file {
        Some(path) => {
            let file = match std::fs::OpenOptions::new().create(true).append(true).open(path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("ERROR: Unable to open log file '{}': {e}", path.display());
                    return;
                }
            };
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let _ = TRACE_GUARD.set(guard);

            let base = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(non_blocking);
            if json {
                Box::new(base.json().finish())
            } else {
                Box::new(base.compact().finish())
            }
        }
        None => {
            let base = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr);
            if json {
                Box::new(base.json().finish())
            } else {
                Box::new(base.compact().finish())
            }
        }
    };

    let _ = tracing::subscriber::set_global_default(subscriber);
}
