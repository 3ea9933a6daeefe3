//! Argument grammar shared by the one-shot front door and the interactive
//! shell's per-line re-parse (`Cli::try_parse_from`).

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "soc", version, about = "A plain-text, append-mostly stream-of-consciousness log")]
pub struct Cli {
    /// Overrides the stream file location; otherwise `soc` walks up from the
    /// current directory looking for `stream.md`.
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Prints usage, or the usage of a single subcommand.
    Help { topic: Option<String> },
    /// Prints the outline: every day-section's date, its numbered
    /// sub-sections, and their items.
    List,
    /// Prints (creating via rollover if necessary) today's section.
    Today,
    /// Prints the TODO sub-section, optionally filtered by a regex.
    Todo { filter: Vec<String> },
    /// Prints the WIP sub-section, optionally filtered by a regex.
    Wip { filter: Vec<String> },
    /// Prints the Done sub-section, optionally filtered by a regex.
    Done { filter: Vec<String> },
    /// Prints an arbitrarily-named configured sub-section, optionally
    /// filtered by a regex. Reaches item types beyond the built-in three
    /// when `.soc.toml` overrides the default list.
    Item { name: String, filter: Vec<String> },
}

/// Prints clap's generated help: overall, or for a single named subcommand.
pub fn print_help(topic: Option<&str>) {
    let mut cmd = Cli::command();
    match topic {
        Some(name) => match cmd.find_subcommand_mut(name) {
            Some(sub) => {
                let _ = sub.print_help();
            }
            None => {
                let _ = cmd.print_help();
            }
        },
        None => {
            let _ = cmd.print_help();
        }
    }
    println!();
}
