//! `lambda-validate` — a command-line front end over the structural
//! validator (spec §6 "Validator CLI surface").
//!
//! `validate [-f <format>] [-s <schema-file>] <data-file>` reads a data
//! file, parses it (currently JSON is the only wired-up reader, `format.rs`
//! still resolves the rest so the default-schema table stays complete),
//! validates it against a schema read with the `schema` module's mini
//! reader, and prints a pass/fail report.

mod json;
mod schema;

use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;
use lambda_core::EvalContext;
use lambda_runtime::{format, path_string, validate, Limits};
use tracing::info;

#[derive(ClapParser)]
#[command(name = "lambda-validate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate a data file against a Lambda schema", long_about = None)]
struct Cli {
    /// Data file to read and validate.
    data_file: PathBuf,

    /// Input format (`json`, `xml`, `html`, ... or `auto` to sniff).
    #[arg(short = 'f', long, default_value = "auto")]
    format: String,

    /// Schema file (defaults to the format's `<fmt>_schema.ls` convention).
    #[arg(short = 's', long)]
    schema: Option<PathBuf>,

    /// Maximum recursion depth the validator will walk (spec §4.5 global controls).
    #[arg(long, default_value_t = Limits::default().max_depth)]
    max_depth: usize,

    /// Validator wall-clock budget in milliseconds.
    #[arg(long, default_value_t = Limits::default().timeout_ms)]
    timeout_ms: u64,

    /// Stop collecting errors after this many (0 = unbounded).
    #[arg(long, default_value_t = Limits::default().max_errors)]
    max_errors: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lambda_cli=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(&cli);
}

fn run(cli: &Cli) {
    let data_bytes = match std::fs::read(&cli.data_file) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: could not read {}: {}", cli.data_file.display(), e);
            process::exit(2);
        }
    };

    let fmt = if cli.format == "auto" {
        format::resolve(&cli.data_file, &data_bytes)
    } else {
        match format::Format::from_flag(&cli.format) {
            Some(f) => f,
            None => {
                eprintln!("error: unrecognized format '{}'", cli.format);
                process::exit(2);
            }
        }
    };
    info!(?fmt, file = %cli.data_file.display(), "resolved input format");

    let schema_path = cli
        .schema
        .clone()
        .unwrap_or_else(|| PathBuf::from(fmt.default_schema()));
    let schema_src = match std::fs::read_to_string(&schema_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: could not read schema {}: {}", schema_path.display(), e);
            process::exit(2);
        }
    };

    let mut ctx = EvalContext::new();
    let root_type = match schema::parse_schema(&mut ctx, &schema_src) {
        Ok(name) => name,
        Err(e) => {
            eprintln!("error: could not parse schema {}: {}", schema_path.display(), e);
            process::exit(2);
        }
    };

    let data_text = match std::str::from_utf8(&data_bytes) {
        Ok(s) => s,
        Err(_) => {
            eprintln!("error: {} is not valid UTF-8", cli.data_file.display());
            process::exit(2);
        }
    };
    let item = match fmt {
        format::Format::Json => match json::parse(&mut ctx, data_text) {
            Ok(item) => item,
            Err(e) => {
                println!("❌ Validation FAILED");
                println!("  1. {} at input.root", e);
                process::exit(1);
            }
        },
        other => {
            eprintln!("error: no reader registered for format {other:?} yet");
            process::exit(2);
        }
    };

    let limits = Limits {
        max_depth: cli.max_depth,
        timeout_ms: cli.timeout_ms,
        max_errors: cli.max_errors,
    };
    let result = validate(&ctx, &item, &root_type, limits);

    if result.valid {
        println!("✅ Validation PASSED");
        process::exit(0);
    }

    println!("❌ Validation FAILED");
    for (i, error) in result.errors.iter().enumerate() {
        println!("  {}. {} at {}", i + 1, error.message, path_string(&error.path));
    }
    for warning in &result.warnings {
        eprintln!("warning: {} at {}", warning.message, path_string(&warning.path));
    }
    process::exit(1);
}
