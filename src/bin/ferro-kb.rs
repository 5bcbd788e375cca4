// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-kb CLI
//!
//! Command-line interface for variant notation parsing and knowledge-base
//! query building.

use std::io::{self, BufRead, BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ferro_kb::cli::{
    numbered_lines, open_input, output_error, output_parsed, output_statement, summarize_histone,
    summarize_variant, OutputFormat,
};
use ferro_kb::config::KbConfig;
use ferro_kb::notation::{parse, parse_histone, parse_multi_feature, parse_position};
use ferro_kb::query::SelectionQuery;
use ferro_kb::schema::Schema;
use ferro_kb::FerroError;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "ferro-kb")]
#[command(author, version, about = "Variant notation parser and knowledge-base query builder")]
#[command(
    long_about = "Parse compact variant notation and build parameterised knowledge-base queries.

Examples:
  ferro-kb parse 'p.G12D'
  ferro-kb parse -i variants.txt.gz -f json
  echo 'H3K27me3' | ferro-kb parse --histone
  ferro-kb position y 'p11.1'
  ferro-kb query --schema schema.json --class Statement '{\"reviewStatus\": \"passed\"}'"
)]
struct Cli {
    /// Configuration file (default: .ferro-kb.toml, then ~/.config/ferro/kb.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `ferro_kb=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse variant notation into a structured description
    Parse {
        /// Variant notation (reads --input or stdin when omitted)
        variant: Option<String>,

        /// Input file, one notation per line (gzip-aware, use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, value_enum)]
        format: Option<OutputFormat>,

        /// Parse histone modification notation (e.g. H3K27me3)
        #[arg(long, conflicts_with = "multi_feature")]
        histone: bool,

        /// Parse multi-feature notation (e.g. fusion(e.1,e.3))
        #[arg(long)]
        multi_feature: bool,
    },

    /// Parse one position under a coordinate prefix
    Position {
        /// Coordinate prefix (g, c, e, y or p)
        prefix: char,

        /// Position text without the prefix
        text: String,

        /// Output format
        #[arg(short = 'f', long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Build a parameterised selection query
    Query {
        /// JSON filter (reads --input or stdin when omitted, one document per line)
        filter: Option<String>,

        /// Schema snapshot (JSON array of class models)
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Class to select from
        #[arg(long)]
        class: String,

        /// Input file, one JSON filter per line (gzip-aware, use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Keep soft-deleted records
        #[arg(long)]
        no_active_only: bool,

        /// Print the statement with parameters substituted
        #[arg(long)]
        display: bool,

        /// Output format
        #[arg(short = 'f', long, value_enum)]
        format: Option<OutputFormat>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = KbConfig::load(cli.config.as_deref())?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_tracing(&level)?;

    let failures = match cli.command {
        Commands::Parse {
            variant,
            input,
            format,
            histone,
            multi_feature,
        } => {
            let config = config.merge_with_cli(false, format, None);
            let mode = if histone {
                Mode::Histone
            } else if multi_feature {
                Mode::MultiFeature
            } else {
                Mode::Notation
            };
            let reader = input_reader(variant, input.as_deref())?;
            run_parse(reader, mode, config.output.format)?
        }
        Commands::Position {
            prefix,
            text,
            format,
        } => {
            let config = config.merge_with_cli(false, format, None);
            run_position(prefix, &text, config.output.format)?
        }
        Commands::Query {
            filter,
            schema,
            class,
            input,
            no_active_only,
            display,
            format,
        } => {
            let config = config.merge_with_cli(no_active_only, format, None);
            let schema_path = schema.or_else(|| config.schema.path.clone()).ok_or_else(|| {
                FerroError::Config {
                    msg: "a schema snapshot is required (--schema or [schema] path)".to_string(),
                }
            })?;
            let reader = input_reader(filter, input.as_deref())?;
            run_query(reader, &schema_path, &class, display, &config)?
        }
    };

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_new(level).map_err(|e| format!("Invalid log level '{}': {}", level, e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    debug!("Tracing initialized with level: {}", level);
    Ok(())
}

/// A positional argument wins over --input, which wins over stdin
fn input_reader(
    argument: Option<String>,
    input: Option<&Path>,
) -> Result<Box<dyn BufRead>, Box<dyn std::error::Error>> {
    match (argument, input) {
        (Some(text), _) => Ok(Box::new(Cursor::new(text.into_bytes()))),
        (None, Some(path)) => Ok(open_input(path)?),
        (None, None) => Ok(open_input(Path::new("-"))?),
    }
}

#[derive(Clone, Copy)]
enum Mode {
    Notation,
    Histone,
    MultiFeature,
}

fn run_parse(
    reader: Box<dyn BufRead>,
    mode: Mode,
    format: OutputFormat,
) -> Result<usize, Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let stderr = io::stderr();
    let mut err = stderr.lock();

    let mut total = 0usize;
    let mut failures = 0usize;
    for line in numbered_lines(reader) {
        let (number, text) = line?;
        total += 1;
        let written = match mode {
            Mode::Histone => parse_histone(&text)
                .map(|v| output_parsed(&mut out, &text, &summarize_histone(&v), &v, format)),
            Mode::MultiFeature => parse_multi_feature(&text)
                .map(|v| output_parsed(&mut out, &text, &summarize_variant(&v), &v, format)),
            Mode::Notation => parse(&text)
                .map(|v| output_parsed(&mut out, &text, &summarize_variant(&v), &v, format)),
        };
        match written {
            Ok(result) => result?,
            Err(e) => {
                failures += 1;
                output_error(&mut err, &text, &e, format, Some(number))?;
            }
        }
    }
    out.flush()?;
    info!("parsed {} notations, {} failed", total, failures);
    Ok(failures)
}

fn run_position(
    prefix: char,
    text: &str,
    format: OutputFormat,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut out = io::stdout().lock();
    match parse_position(prefix, text) {
        Ok(position) => {
            let input = format!("{}.{}", prefix, text);
            output_parsed(&mut out, &input, &position.to_string(), &position, format)?;
            Ok(0)
        }
        Err(e) => {
            output_error(&mut io::stderr().lock(), text, &e, format, None)?;
            Ok(1)
        }
    }
}

fn run_query(
    reader: Box<dyn BufRead>,
    schema_path: &Path,
    class: &str,
    display: bool,
    config: &KbConfig,
) -> Result<usize, Box<dyn std::error::Error>> {
    let schema = Schema::from_json(schema_path)?;
    let options = config.query_options();
    let format = config.output.format;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let stderr = io::stderr();
    let mut err = stderr.lock();

    let mut failures = 0usize;
    for line in numbered_lines(reader) {
        let (number, text) = line?;
        let built = serde_json::from_str::<serde_json::Value>(&text)
            .map_err(FerroError::from)
            .and_then(|filter| SelectionQuery::parse(&schema, class, &filter, &options));
        match built {
            Ok(query) => {
                debug!("built query: {}", query.display_string());
                output_statement(&mut out, &query.to_statement(), display, format)?;
            }
            Err(e) => {
                failures += 1;
                output_error(&mut err, &text, &e, format, Some(number))?;
            }
        }
    }
    out.flush()?;
    Ok(failures)
}
