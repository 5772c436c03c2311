//! irlens CLI entry point.

use std::io::{self, BufWriter, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use rhizome_irlens_core::{CallableIndex, FormatConfig, Formatter, PrintOptions, Schema};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Schema files inside a YDB source checkout, loaded by `--repo`.
const REPO_SCHEMAS: &[&str] = &[
    "ydb/library/yql/dq/expr_nodes/dq_expr_nodes.json",
    "ydb/core/kqp/expr_nodes/kqp_expr_nodes.json",
    "yql/essentials/core/expr_nodes/yql_expr_nodes.json",
];

#[derive(Parser)]
#[command(name = "irlens")]
#[command(about = "Pretty-print S-expression IR dumps")]
struct Cli {
    /// Input dump (or - for stdin)
    #[arg(default_value = "-")]
    file: String,

    /// Node schema JSON file; may be repeated, later files override earlier ones
    #[arg(short, long, value_name = "PATH")]
    nodes: Vec<PathBuf>,

    /// Source checkout providing the standard node schema files
    #[arg(short, long, value_name = "DIR")]
    repo: Option<PathBuf>,

    /// Draw indentation guides
    #[arg(short, long)]
    tabstops: bool,

    /// Heuristics file (TOML)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// When to color the output
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Color when stdout is a terminal
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn enabled(self) -> bool {
        match self {
            ColorChoice::Auto => io::stdout().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

/// Schema files in load order: repository files first, then `--nodes`.
fn schema_paths(cli: &Cli) -> Vec<PathBuf> {
    let repo = cli
        .repo
        .iter()
        .flat_map(|repo| REPO_SCHEMAS.iter().map(move |path| repo.join(path)));
    repo.chain(cli.nodes.iter().cloned()).collect()
}

fn load_schema(paths: &[PathBuf]) -> Result<Schema, Box<dyn std::error::Error>> {
    let mut schema = Schema::new();
    for path in paths {
        schema.merge(Schema::from_file(path)?);
    }
    info!("Loaded {} schema nodes from {} file(s)", schema.len(), paths.len());
    Ok(schema)
}

fn read_input(file: &str) -> io::Result<String> {
    if file == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(Path::new(file))
    }
}

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the listing
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("irlens: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => FormatConfig::from_file(path)?,
        None => FormatConfig::default(),
    };
    let schema = load_schema(&schema_paths(cli))?;
    let index = CallableIndex::build(&schema, &config.schema);
    info!("{} callables", index.len());

    let color = cli.color.enabled();
    // The flag decides, not colored's own environment checks
    colored::control::set_override(color);
    let options = PrintOptions {
        color,
        tabstops: cli.tabstops,
    };
    debug!(?options, "print options");

    let input = read_input(&cli.file)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    Formatter::new(&index, &config, options).render(&input, &mut out)?;
    out.flush()?;

    Ok(())
}
