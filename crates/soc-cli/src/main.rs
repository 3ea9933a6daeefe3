//! `soc`: a command-line tool for maintaining a stream-of-consciousness log.
//!
//! One shot (`soc today`, `soc todo foo`, ...) or, with no subcommand,
//! an interactive shell that re-parses each line against the same loaded
//! [`Context`].

mod cli;
mod commands;
mod context;
mod items;
mod store;

use std::io::{self, BufRead, BufWriter, Write};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use context::Context;

fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;
    let mut ctx = Context::open(cli.file.clone(), &cwd)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match cli.command {
        Some(command) => {
            commands::dispatch(&mut ctx, command, &mut out)?;
            out.flush()?;
        }
        None => repl(&mut ctx, &mut out)?,
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("soc=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

/// Reads lines from stdin until EOF, re-parsing each against [`Cli`] (with
/// the leading `soc` token implied) and dispatching it against the one
/// already-loaded context.
fn repl(ctx: &mut Context, out: &mut impl Write) -> anyhow::Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let words = std::iter::once("soc").chain(trimmed.split_whitespace());
        match Cli::try_parse_from(words) {
            Ok(parsed) => {
                let Some(command) = parsed.command else {
                    continue;
                };
                if let Err(e) = commands::dispatch(ctx, command, out) {
                    writeln!(out, "error: {e}")?;
                }
            }
            Err(e) => {
                writeln!(out, "{e}")?;
            }
        }
        out.flush()?;
    }
    Ok(())
}
