//! The Sift command-line driver.
//!
//! Provides the `siftc` command with the following subcommands:
//!
//! - `siftc tokens <query>` - Print the token stream
//! - `siftc fmt <query>` - Print the canonical (wire) form
//! - `siftc check <query> --schema <file>` - Print the typed tree
//! - `siftc eval <query> --schema <file> --data <file>` - Run a query over JSON data
//! - `siftc repl` - Start an interactive session
//!
//! Options:
//! - `--config` - Engine configuration (sift.toml)
//! - `--json` - Output diagnostics as JSON (one object per line)
//!
//! Logging is controlled by `RUST_LOG`, e.g. `RUST_LOG=sift_typeck=trace`.

mod repl;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use sift::json::{from_json, to_json};
use sift::{diagnostics, Engine, QueryError, Schema, SiftConfig, Type};
use sift_lexer::Lexer;
use sift_typeck::render_typed;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "siftc", version, about = "The Sift query tool")]
struct Cli {
    /// Engine configuration file (sift.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output diagnostics as JSON (one object per line) instead of human-readable format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Model {
    /// TOML schema declaring the record types
    #[arg(long)]
    schema: PathBuf,

    /// Root record; defaults to the schema's `root`
    #[arg(long)]
    root: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream of a query
    Tokens { query: String },
    /// Print the canonical form of a query
    Fmt { query: String },
    /// Type-check a query and print the typed tree
    Check {
        query: String,
        #[command(flatten)]
        model: Model,
    },
    /// Evaluate a query over JSON data
    Eval {
        query: String,
        #[command(flatten)]
        model: Model,
        /// JSON document (`-` for stdin). An array is filtered by a
        /// predicate and mapped by any other query.
        #[arg(long)]
        data: PathBuf,
    },
    /// Start an interactive session
    Repl {
        /// TOML schema declaring the record types
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Root record; defaults to the schema's `root`
        #[arg(long)]
        root: Option<String>,
    },
}

/// Why a command failed.
enum Failure {
    Query(QueryError),
    Other(String),
}

impl From<QueryError> for Failure {
    fn from(err: QueryError) -> Self {
        Failure::Query(err)
    }
}

impl From<String> for Failure {
    fn from(msg: String) -> Self {
        Failure::Other(msg)
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(failure) = run(&cli) {
        report(&failure, cli.json);
        process::exit(1);
    }
}

fn report(failure: &Failure, json: bool) {
    match failure {
        Failure::Query(err) if json => eprintln!("{}", diagnostics::to_json(err)),
        Failure::Query(err) => eprint!("{}", diagnostics::render(err)),
        Failure::Other(msg) if json => {
            eprintln!("{}", json!({ "code": "X0001", "message": msg }));
        }
        Failure::Other(msg) => eprintln!("error: {msg}"),
    }
}

fn run(cli: &Cli) -> Result<(), Failure> {
    let config = match &cli.config {
        Some(path) => SiftConfig::load(path).map_err(|e| e.to_string())?,
        None => SiftConfig::default(),
    };
    let engine = Engine::new(config);

    match &cli.command {
        Commands::Tokens { query } => tokens(query, cli.json),
        Commands::Fmt { query } => {
            println!("{}", engine.format(query)?);
            Ok(())
        }
        Commands::Check { query, model } => {
            let root = model.root_type()?;
            let typed = engine.check(query, &root)?;
            if cli.json {
                println!("{}", json!({ "type": typed.ann.ty.to_string() }));
            } else {
                print!("{}", render_typed(&typed));
            }
            Ok(())
        }
        Commands::Eval { query, model, data } => {
            let root = model.root_type()?;
            eval(&engine, query, &root, data)
        }
        Commands::Repl { schema, root } => {
            let schema = match schema {
                Some(path) => Some(Schema::load(path).map_err(|e| e.to_string())?),
                None => None,
            };
            repl::run(&engine, schema, root.as_deref()).map_err(Failure::Other)
        }
    }
}

impl Model {
    fn root_type(&self) -> Result<Type, Failure> {
        let schema = Schema::load(&self.schema).map_err(|e| e.to_string())?;
        resolve_root(&schema, self.root.as_deref()).map_err(Failure::Other)
    }
}

/// The named record, or the schema's declared root.
pub(crate) fn resolve_root(schema: &Schema, name: Option<&str>) -> Result<Type, String> {
    match name {
        Some(name) => schema
            .get(name)
            .ok_or_else(|| format!("schema has no record `{name}`")),
        None => schema.root().map_err(|e| e.to_string()),
    }
}

fn tokens(query: &str, json: bool) -> Result<(), Failure> {
    for token in Lexer::new(query) {
        let token = token
            .map_err(|e| QueryError::new(query, None, sift::QueryErrorKind::Parse(e.into())))?;
        if json {
            println!("{}", serde_json::to_string(&token).map_err(|e| e.to_string())?);
        } else {
            println!(
                "{:?} {}..{} {}",
                token.kind,
                token.span.start,
                token.span.end,
                token.text()
            );
        }
    }
    Ok(())
}

fn eval(engine: &Engine, query: &str, root: &Type, data: &Path) -> Result<(), Failure> {
    let text = if data.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        buf
    } else {
        std::fs::read_to_string(data)
            .map_err(|e| format!("failed to read {}: {e}", data.display()))?
    };
    let document: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| format!("invalid JSON: {e}"))?;

    let compiled = engine.compile(query, root)?;
    let rows: Vec<&serde_json::Value> = match &document {
        serde_json::Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };
    tracing::debug!(rows = rows.len(), predicate = compiled.is_predicate(), "evaluating");

    for row in rows {
        let value = from_json(row, root).map_err(|e| e.to_string())?;
        let result = compiled
            .call(value.clone())
            .map_err(|e| QueryError::new(query, Some(root), e))?;
        let output = match (&document, compiled.is_predicate()) {
            // Filtering an array prints the rows that pass.
            (serde_json::Value::Array(_), true) => match result.as_bool() {
                Ok(true) => to_json(&value),
                _ => continue,
            },
            _ => to_json(&result),
        };
        println!("{output}");
    }
    Ok(())
}
