use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use abnfgen::Options;

/// Print the ABNF description of a flex/bison language.
#[derive(Debug, Parser)]
#[command(name = "abnfgen", version)]
struct Args {
    /// Flex source with the token definitions.
    lexer: PathBuf,
    /// Bison source with the grammar rules.
    grammar: PathBuf,
    /// Column to wrap rule bodies at.
    #[arg(long, default_value_t = Options::default().width)]
    width: usize,
    /// Prefix stripped from token names referenced in the grammar.
    #[arg(long, default_value_t = Options::default().token_prefix)]
    token_prefix: String,
    /// Keyword of the /*#...#*/ comment marking top level rules.
    #[arg(long, default_value_t = Options::default().marker)]
    marker: String,
    /// Write to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Log more, may be repeated.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn options(&self) -> Options {
        Options {
            width: self.width,
            token_prefix: self.token_prefix.clone(),
            marker: self.marker.clone(),
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let lexer = read(&args.lexer)?;
    let grammar = read(&args.grammar)?;
    let options = args.options();

    let abnf = abnfgen::generate(&lexer, &grammar, &options).with_context(|| {
        format!(
            "failed to generate abnf from {} and {}",
            args.lexer.display(),
            args.grammar.display()
        )
    })?;

    match &args.output {
        Some(path) => fs::write(path, abnf)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => io::stdout()
            .write_all(abnf.as_bytes())
            .context("failed to write to stdout")?,
    }
    Ok(())
}
