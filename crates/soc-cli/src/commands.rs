//! Handlers for each [`crate::cli::Command`], writing their output through
//! `out` rather than touching stdout directly so the REPL and the one-shot
//! front door share one code path.

use std::io::Write;

use soc_core::GrainedTime;

use crate::cli::{print_help, Command};
use crate::context::Context;
use crate::items;

const EMPTY_STREAM_HINT: &str = "stream is empty, run `soc today` to initialize\n... or just start adding items with `soc <todo|wip|done> ...`\n";

pub fn dispatch(ctx: &mut Context, command: Command, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::Help { topic } => {
            print_help(topic.as_deref());
            Ok(())
        }
        Command::List => list(ctx, out),
        Command::Today => today(ctx, out),
        Command::Todo { filter } => named_item(ctx, "TODO", &filter, out),
        Command::Wip { filter } => named_item(ctx, "WIP", &filter, out),
        Command::Done { filter } => named_item(ctx, "Done", &filter, out),
        Command::Item { name, filter } => named_item(ctx, &name, &filter, out),
    }
}

fn list(ctx: &mut Context, out: &mut impl Write) -> anyhow::Result<()> {
    if ctx.is_empty()? {
        write!(out, "{EMPTY_STREAM_HINT}")?;
        return Ok(());
    }
    let arena = ctx.store.open()?;
    let rendered = items::render_outline(arena)?;
    write!(out, "{rendered}")?;
    Ok(())
}

fn today(ctx: &mut Context, out: &mut impl Write) -> anyhow::Result<()> {
    let outcome = ctx.engine.collect(&ctx.store)?;
    match &outcome {
        soc_core::RolloverOutcome::AlreadyCurrent => {}
        soc_core::RolloverOutcome::Created => writeln!(out, "Created new Today section at top of stream")?,
        soc_core::RolloverOutcome::RolledOver { from } => {
            writeln!(out, "Created Today by rolling {from:?} forward")?
        }
    }
    let body = ctx.engine.section_body(ctx.engine.today())?;
    let today = GrainedTime::today_local().format();
    // `body` already opens with the blank separator line's own `\n`.
    write!(out, "# {today}\n{}", String::from_utf8_lossy(&body))?;
    Ok(())
}

fn named_item(ctx: &mut Context, name: &str, filter: &[String], out: &mut impl Write) -> anyhow::Result<()> {
    ctx.engine.collect(&ctx.store)?;
    let index = ctx
        .engine
        .items()
        .iter()
        .position(|it| it.name.eq_ignore_ascii_case(name));
    let Some(index) = index else {
        anyhow::bail!("no configured item type named {name:?}");
    };
    let section = ctx.engine.item(index);
    let body = if section.is_set() { ctx.engine.section_body(section)? } else { Vec::new() };
    let parsed = items::list_items(&body)?;
    let rendered = items::render_numbered(&parsed, filter)?;

    let today = GrainedTime::today_local().format();
    let display_name = ctx.engine.items()[index].name.as_str();
    write!(out, "# {today} {display_name}\n{rendered}")?;
    Ok(())
}
