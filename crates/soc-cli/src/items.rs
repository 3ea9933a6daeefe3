//! Reads numbered item lines out of a sub-section's body, and renders the
//! whole-stream outline for `soc list`.

use std::collections::HashSet;

use regex::Regex;
use soc_core::{ArenaBacking, BlockType, OutlineScanner, ScanEvent, Tokenizer};
use std::sync::Arc;

/// The first paragraph under each top-level `Item` in `bytes`, in document
/// order. `bytes` is expected to be a sub-section's body (a `List` of
/// `Item`s), but any block structure is tolerated.
pub fn list_items(bytes: &[u8]) -> anyhow::Result<Vec<String>> {
    let arena = soc_core::ByteArena::new();
    arena.write(bytes);
    let mut tok = Tokenizer::new(arena);
    let mut out = Vec::new();
    let mut seen: HashSet<u64> = HashSet::new();

    while let Some(ev) = tok.scan()? {
        if let ScanEvent::Close { block, content, .. } = &ev {
            if block.kind != BlockType::Paragraph {
                continue;
            }
            let depth = tok.depth();
            if depth < 2 {
                continue;
            }
            let parent = tok.block(depth - 2);
            if parent.kind != BlockType::Item {
                continue;
            }
            let parent_id = tok.id(depth - 2);
            if !seen.insert(parent_id) {
                continue;
            }
            let text = String::from_utf8_lossy(content).trim().to_string();
            if !text.is_empty() {
                out.push(text);
            }
        }
    }
    Ok(out)
}

/// Renders `items` numbered one-indexed, optionally filtered to lines whose
/// text matches `filter` (a case-insensitive regex built from the joined
/// filter words; no filter words means "everything").
pub fn render_numbered(items: &[String], filter: &[String]) -> anyhow::Result<String> {
    let matcher = if filter.is_empty() {
        None
    } else {
        let pattern = filter.join(" ");
        Some(Regex::new(&format!("(?i){}", regex::escape(&pattern)))?)
    };

    let mut out = String::new();
    let mut n = 0usize;
    for item in items {
        if matcher.as_ref().is_some_and(|re| !re.is_match(item)) {
            continue;
        }
        n += 1;
        out.push_str(&format!("{n}. {item}\n"));
    }
    Ok(out)
}

/// Walks the whole stream and prints each day-section's date, its numbered
/// H2 sub-sections, their items, and any loose body text that sits directly
/// under the day heading with no sub-section wrapping it.
pub fn render_outline(arena: Arc<dyn ArenaBacking>) -> anyhow::Result<String> {
    let mut outline = OutlineScanner::new(Tokenizer::new(arena));
    let mut out = String::new();
    let mut sub_count = 0usize;

    while let Some(ev) = outline.next()? {
        let ScanEvent::Close { block, content, .. } = &ev else {
            continue;
        };
        match (block.kind, block.width) {
            (BlockType::Heading, 1) => {
                let text = String::from_utf8_lossy(content);
                out.push_str(&format!("# {}\n", text.trim()));
                sub_count = 0;
            }
            (BlockType::Heading, 2) => {
                sub_count += 1;
                let text = String::from_utf8_lossy(content);
                out.push_str(&format!("{sub_count}. {}\n", text.trim()));
            }
            (BlockType::Paragraph, _) => {
                let parent = outline.path().last();
                let direct_under_day = parent
                    .map(|t| t.block.kind == BlockType::Heading && t.block.width == 1)
                    .unwrap_or(false);
                let text = String::from_utf8_lossy(content);
                if text.trim().is_empty() {
                    continue;
                }
                if direct_under_day {
                    out.push_str(&format!("{}\n", text.trim()));
                } else if nested_under_h2(outline.path()) {
                    out.push_str(&format!("   - {}\n", text.trim()));
                }
            }
            _ => {}
        }
    }
    Ok(out)
}

fn nested_under_h2(path: &[soc_core::TitledBlock]) -> bool {
    path.iter()
        .rev()
        .find(|t| t.block.kind == BlockType::Heading)
        .is_some_and(|t| t.block.width == 2)
}
