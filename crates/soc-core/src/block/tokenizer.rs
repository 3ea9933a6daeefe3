use std::sync::Arc;

use crate::arena::{ArenaBacking, ArenaError, Span, Token};

use super::kinds::indent::{is_blank, leading_indent_cols, trim_indent_at_least};
use super::kinds::{BlockQuote, CodeFence, Heading, ListItem, Ruler};
use super::stack::BlockStack;
use super::types::{Block, BlockType};

/// Errors surfaced while scanning.
#[derive(Debug, thiserror::Error)]
pub enum TokenizeError {
    #[error(transparent)]
    Arena(#[from] ArenaError),
}

/// One step of the block scan: a container opening (empty token) or any
/// block's final close. `Scan` never emits a close for a block
/// before the closes of all its descendants.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Open {
        id: u64,
        block: Block,
        at: usize,
    },
    Close {
        id: u64,
        block: Block,
        token: Token,
        /// The block's logical content: container markers stripped, and for
        /// `Paragraph`/`Heading` runs of whitespace coalesced to single
        /// spaces. Seekable via `std::io::Cursor::new(content)`.
        content: Vec<u8>,
    },
}

impl ScanEvent {
    pub fn id(&self) -> u64 {
        match self {
            ScanEvent::Open { id, .. } => *id,
            ScanEvent::Close { id, .. } => *id,
        }
    }

    pub fn block(&self) -> Block {
        match self {
            ScanEvent::Open { block, .. } => *block,
            ScanEvent::Close { block, .. } => *block,
        }
    }
}

struct MatchInfo {
    /// How many stack entries, from `Document` down, match this line's
    /// container prefixes (a leaf tail entry is never counted here).
    priori: usize,
    consumed: usize,
    col: usize,
}

enum Opener {
    Fence { delim: u8, width: u32, indent: u32 },
    Ruler(u8),
    Heading(u32, usize),
    Blockquote,
    Item { delim: u8, width: u32, indent: u32 },
}

fn classify_opener(remainder: &str) -> Option<Opener> {
    if let Some((delim, width, indent)) = CodeFence::opens(remainder) {
        return Some(Opener::Fence { delim, width, indent });
    }
    if let Some(delim) = Ruler::opens(remainder) {
        return Some(Opener::Ruler(delim));
    }
    if let Some((level, mark_bytes)) = Heading::opens(remainder) {
        return Some(Opener::Heading(level, mark_bytes));
    }
    if BlockQuote::opens(remainder).is_some() {
        return Some(Opener::Blockquote);
    }
    if let Some((delim, width, indent)) = ListItem::opens(remainder) {
        return Some(Opener::Item { delim, width, indent });
    }
    None
}

/// A `-`/`=` underline turns a preceding open paragraph into a setext
/// heading (CommonMark; this takes priority over treating a lone `---` as a
/// thematic break when a paragraph is open).
fn setext_level(remainder: &str) -> Option<u32> {
    let trimmed = remainder.trim_end_matches(['\r', '\n']);
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().all(|c| c == '=') {
        Some(1)
    } else if trimmed.chars().all(|c| c == '-') {
        Some(2)
    } else {
        None
    }
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::new();
    let mut in_ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_ws && !out.is_empty() {
                out.push(' ');
            }
            in_ws = true;
        } else {
            out.push(ch);
            in_ws = false;
        }
    }
    out.trim_end().to_string()
}

/// Streaming block-structure scanner over an arena-backed byte range.
/// `scan()` pulls one event at a time; the whole document is never
/// required to be resident, only the current line.
pub struct Tokenizer {
    arena: Arc<dyn ArenaBacking>,
    size: usize,
    pos: usize,
    stack: BlockStack,
    starts: Vec<usize>,
    content: Vec<Vec<String>>,
    done: bool,
}

impl Tokenizer {
    pub fn new(arena: Arc<dyn ArenaBacking>) -> Self {
        let size = arena.size();
        Tokenizer {
            arena,
            size,
            pos: 0,
            stack: BlockStack::new(),
            starts: Vec::new(),
            content: Vec::new(),
            done: false,
        }
    }

    /// Pulls the next block event, or `None` once the whole range has been
    /// scanned and every block (down to `Document`) has closed.
    pub fn scan(&mut self) -> Result<Option<ScanEvent>, TokenizeError> {
        loop {
            self.retire();
            if self.stack.is_empty() {
                if self.done {
                    return Ok(None);
                }
                self.push_block(Block::document(), 0);
            }
            if let Some(ev) = self.step()? {
                return Ok(Some(ev));
            }
        }
    }

    /// The block currently at stack depth `i` (0 is always `Document`),
    /// reflecting state as of the last event returned by `scan()`.
    pub fn block(&self, i: usize) -> Block {
        self.stack.block(i)
    }

    pub fn id(&self, i: usize) -> u64 {
        self.stack.id(i)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn retire(&mut self) {
        self.stack.retire_closed_tail();
        let n = self.stack.len();
        self.starts.truncate(n);
        self.content.truncate(n);
    }

    fn push_block(&mut self, block: Block, start: usize) -> (u64, usize) {
        let (id, idx) = self.stack.push(block);
        self.starts.push(start);
        self.content.push(Vec::new());
        (id, idx)
    }

    fn extend_leaf(&mut self, idx: usize, text: String) {
        self.content[idx].push(text);
    }

    fn finalize_content(&self, kind: BlockType, lines: &[String]) -> Vec<u8> {
        match kind {
            BlockType::Paragraph | BlockType::Heading => {
                collapse_whitespace(&lines.join("")).into_bytes()
            }
            BlockType::Codefence | BlockType::Codeblock | BlockType::HtmlBlock => {
                lines.join("").into_bytes()
            }
            _ => Vec::new(),
        }
    }

    fn close_block(&mut self, idx: usize, end: usize) -> ScanEvent {
        let block = self.stack.block(idx);
        let id = self.stack.id(idx);
        let start = self.starts[idx];
        self.stack.close_at(idx, end);
        let content = self.finalize_content(block.kind, &self.content[idx]);
        let token = Token::new(self.arena.clone(), start, end);
        ScanEvent::Close { id, block, token, content }
    }

    fn read_line(&self, pos: usize) -> Result<(String, Span), TokenizeError> {
        let mut chunk = 256usize;
        loop {
            let end = (pos + chunk).min(self.size);
            let bytes = self.arena.bytes(pos, end)?;
            if let Some(nl) = bytes.iter().position(|&b| b == b'\n') {
                let line_end = pos + nl + 1;
                let text = String::from_utf8_lossy(&bytes[..=nl]).into_owned();
                return Ok((text, Span::new(pos, line_end)));
            }
            if end == self.size {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                return Ok((text, Span::new(pos, end)));
            }
            chunk *= 4;
        }
    }

    /// Walks the open container entries (`Blockquote`/`List`/`Item`) from
    /// `Document` down, returning how far this line's prefix matches. Stops
    /// at the first leaf entry or the first mismatch.
    fn match_stack(&self, line: &str) -> MatchInfo {
        let mut consumed = 0usize;
        let mut col = 0usize;
        let mut priori = 1usize;
        let len = self.stack.len();
        for i in 1..len {
            let blk = self.stack.block(i);
            let rest = &line[consumed..];
            match blk.kind {
                BlockType::Blockquote => {
                    if let Some(n) = BlockQuote::continues(rest) {
                        consumed += n;
                        col += n;
                        priori += 1;
                    } else {
                        break;
                    }
                }
                BlockType::List => {
                    if is_blank(rest) || ListItem::opens(rest).is_some() {
                        priori += 1;
                    } else {
                        break;
                    }
                }
                BlockType::Item => {
                    let (c, b, enough) = trim_indent_at_least(rest, blk.width as usize);
                    if enough {
                        consumed += b;
                        col += c;
                        priori += 1;
                    }
                    break;
                }
                _ => break,
            }
        }
        MatchInfo { priori, consumed, col }
    }

    fn close_for_eof(&mut self) -> Option<ScanEvent> {
        if let Some(idx) = self.stack.head_index() {
            let ev = self.close_block(idx, self.size);
            if idx == 0 {
                self.done = true;
            }
            Some(ev)
        } else {
            self.done = true;
            None
        }
    }

    fn convert_paragraph_to_setext(&mut self, idx: usize, level: u32, line_span: Span) -> ScanEvent {
        let indent = self.stack.block(idx).indent;
        let delim = if level == 1 { b'=' } else { b'-' };
        self.stack.set_block(idx, Block::new(BlockType::Heading, delim, level, indent));
        self.pos = line_span.end;
        self.close_block(idx, line_span.end)
    }

    fn handle_leaf(
        &mut self,
        idx: usize,
        blk: Block,
        remainder: &str,
        line_span: Span,
    ) -> Result<Option<ScanEvent>, TokenizeError> {
        match blk.kind {
            BlockType::Codefence => {
                if CodeFence::closes(remainder, blk.delim, blk.width) {
                    self.pos = line_span.end;
                    return Ok(Some(self.close_block(idx, line_span.end)));
                }
                self.extend_leaf(idx, remainder.to_string());
                self.pos = line_span.end;
                Ok(None)
            }
            BlockType::Codeblock => {
                let (_, bytes, enough) = trim_indent_at_least(remainder, 4);
                if enough {
                    self.extend_leaf(idx, remainder[bytes..].to_string());
                    self.pos = line_span.end;
                    Ok(None)
                } else if is_blank(remainder) {
                    self.extend_leaf(idx, "\n".to_string());
                    self.pos = line_span.end;
                    Ok(None)
                } else {
                    Ok(Some(self.close_block(idx, line_span.start)))
                }
            }
            BlockType::Blank => {
                if is_blank(remainder) {
                    self.pos = line_span.end;
                    Ok(None)
                } else {
                    Ok(Some(self.close_block(idx, line_span.start)))
                }
            }
            BlockType::HtmlBlock => {
                if !is_blank(remainder) {
                    self.extend_leaf(idx, remainder.to_string());
                    self.pos = line_span.end;
                    Ok(None)
                } else {
                    Ok(Some(self.close_block(idx, line_span.start)))
                }
            }
            BlockType::Paragraph => {
                if let Some(level) = setext_level(remainder) {
                    return Ok(Some(self.convert_paragraph_to_setext(idx, level, line_span)));
                }
                if is_blank(remainder) || classify_opener(remainder).is_some() {
                    return Ok(Some(self.close_block(idx, line_span.start)));
                }
                self.extend_leaf(idx, remainder.to_string());
                self.pos = line_span.end;
                Ok(None)
            }
            _ => unreachable!("only leaf kinds reach handle_leaf"),
        }
    }

    fn classify_and_open(
        &mut self,
        remainder: &str,
        line_span: Span,
        col: usize,
    ) -> Result<Option<ScanEvent>, TokenizeError> {
        if is_blank(remainder) {
            self.push_block(Block::new(BlockType::Blank, 0, 0, 0), line_span.start);
            self.pos = line_span.end;
            return Ok(None);
        }
        if let Some((delim, width, indent)) = CodeFence::opens(remainder) {
            self.push_block(
                Block::new(BlockType::Codefence, delim, width, col as u32 + indent),
                line_span.start,
            );
            self.pos = line_span.end;
            return Ok(None);
        }
        if let Some(delim) = Ruler::opens(remainder) {
            let (_, idx) = self.push_block(Block::new(BlockType::Ruler, delim, 3, col as u32), line_span.start);
            self.pos = line_span.end;
            return Ok(Some(self.close_block(idx, line_span.end)));
        }
        if let Some((level, mark_bytes)) = Heading::opens(remainder) {
            let (_, idx) = self.push_block(Block::new(BlockType::Heading, b'#', level, col as u32), line_span.start);
            self.extend_leaf(idx, remainder[mark_bytes..].to_string());
            self.pos = line_span.end;
            return Ok(Some(self.close_block(idx, line_span.end)));
        }
        if BlockQuote::opens(remainder).is_some() {
            let (id, idx) = self.push_block(Block::new(BlockType::Blockquote, b'>', 0, col as u32), line_span.start);
            let block = self.stack.block(idx);
            return Ok(Some(ScanEvent::Open { id, block, at: line_span.start }));
        }
        if let Some((delim, width, indent)) = ListItem::opens(remainder) {
            let top_idx = self.stack.len() - 1;
            let top = self.stack.block(top_idx);
            if top.kind == BlockType::List {
                let list_ordered = matches!(top.delim, b'.' | b')');
                if ListItem::is_conflicting_sibling(remainder, top.indent, top.delim, list_ordered) {
                    return Ok(Some(self.close_block(top_idx, line_span.start)));
                }
                let item_indent = col as u32 + indent;
                let (id, idx) =
                    self.push_block(Block::new(BlockType::Item, delim, width, item_indent), line_span.start);
                let block = self.stack.block(idx);
                return Ok(Some(ScanEvent::Open { id, block, at: line_span.start }));
            }
            let list_indent = col as u32 + indent;
            let (id, idx) = self.push_block(Block::new(BlockType::List, delim, 0, list_indent), line_span.start);
            let block = self.stack.block(idx);
            return Ok(Some(ScanEvent::Open { id, block, at: line_span.start }));
        }
        if leading_indent_cols(remainder) >= 4 {
            let (_, bytes, _) = trim_indent_at_least(remainder, 4);
            let (_, idx) = self.push_block(Block::new(BlockType::Codeblock, 0, 0, col as u32), line_span.start);
            self.extend_leaf(idx, remainder[bytes..].to_string());
            self.pos = line_span.end;
            return Ok(None);
        }
        let (_, idx) = self.push_block(Block::new(BlockType::Paragraph, 0, 0, col as u32), line_span.start);
        self.extend_leaf(idx, remainder.to_string());
        self.pos = line_span.end;
        Ok(None)
    }

    fn step(&mut self) -> Result<Option<ScanEvent>, TokenizeError> {
        if self.pos >= self.size {
            return Ok(self.close_for_eof());
        }
        let (raw, line_span) = self.read_line(self.pos)?;
        let m = self.match_stack(&raw);

        if self.stack.len() > 1 {
            let tail_idx = self.stack.len() - 1;
            let tail = self.stack.block(tail_idx);
            let is_leaf = matches!(
                tail.kind,
                BlockType::Paragraph
                    | BlockType::Codefence
                    | BlockType::Codeblock
                    | BlockType::Blank
                    | BlockType::HtmlBlock
            );
            if is_leaf {
                if m.priori == tail_idx {
                    let remainder = raw[m.consumed..].to_string();
                    return self.handle_leaf(tail_idx, tail, &remainder, line_span);
                }
                return Ok(Some(self.close_block(tail_idx, line_span.start)));
            }
        }

        if m.priori < self.stack.len() {
            let idx = self.stack.len() - 1;
            return Ok(Some(self.close_block(idx, line_span.start)));
        }

        let remainder = raw[m.consumed..].to_string();
        self.classify_and_open(&remainder, line_span, m.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ByteArena;
    use rstest::rstest;

    fn tokenize(src: &str) -> Vec<ScanEvent> {
        let arena = ByteArena::new();
        arena.write(src.as_bytes());
        let mut tok = Tokenizer::new(arena);
        let mut events = Vec::new();
        while let Some(ev) = tok.scan().expect("scan") {
            events.push(ev);
        }
        events
    }

    fn closes(events: &[ScanEvent]) -> Vec<(BlockType, String)> {
        events
            .iter()
            .filter_map(|e| match e {
                ScanEvent::Close { block, content, .. } => {
                    Some((block.kind, String::from_utf8_lossy(content).into_owned()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn heading_then_paragraph() {
        let events = tokenize("# Today\nhello world\n");
        let c = closes(&events);
        assert_eq!(c[0], (BlockType::Heading, "Today".to_string()));
        assert_eq!(c[1], (BlockType::Paragraph, "hello world".to_string()));
        assert_eq!(c.last().unwrap().0, BlockType::Document);
    }

    #[test]
    fn blank_line_separates_paragraphs() {
        let events = tokenize("first\n\nsecond\n");
        let c = closes(&events);
        let kinds: Vec<_> = c.iter().map(|(k, _)| *k).collect();
        assert!(kinds.contains(&BlockType::Paragraph));
        assert!(kinds.contains(&BlockType::Blank));
    }

    #[test]
    fn list_items_open_and_close() {
        let events = tokenize("- one\n- two\n");
        let opens: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ScanEvent::Open { block, .. } => Some(block.kind),
                _ => None,
            })
            .collect();
        assert_eq!(opens, vec![BlockType::List, BlockType::Item, BlockType::Item]);
        let c = closes(&events);
        let paragraphs: Vec<_> = c.iter().filter(|(k, _)| *k == BlockType::Paragraph).collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].1, "one");
        assert_eq!(paragraphs[1].1, "two");
    }

    #[test]
    fn heading_closes_open_list() {
        let events = tokenize("- one\n\n## Next\n");
        let c = closes(&events);
        let kinds: Vec<_> = c.iter().map(|(k, _)| *k).collect();
        assert!(kinds.contains(&BlockType::Item));
        assert!(kinds.contains(&BlockType::List));
        assert!(kinds.contains(&BlockType::Heading));
    }

    #[test]
    fn fenced_code_block_preserves_content() {
        let events = tokenize("```\nlet x = 1;\n```\n");
        let c = closes(&events);
        assert_eq!(c[0].0, BlockType::Codefence);
        assert_eq!(c[0].1, "let x = 1;\n");
    }

    #[test]
    fn ruler_is_its_own_block() {
        let events = tokenize("---\n");
        let c = closes(&events);
        assert_eq!(c[0].0, BlockType::Ruler);
    }

    #[rstest]
    #[case::atx_heading("# Title\n", BlockType::Heading, "Title")]
    #[case::bullet_paragraph("- item\n", BlockType::Paragraph, "item")]
    #[case::ordered_paragraph("1. item\n", BlockType::Paragraph, "item")]
    #[case::blockquote_paragraph("> quoted\n", BlockType::Paragraph, "quoted")]
    #[case::ruler("***\n", BlockType::Ruler, "")]
    #[case::bare_paragraph("just text\n", BlockType::Paragraph, "just text")]
    fn first_leaf_close_matches_kind_and_content(
        #[case] src: &str,
        #[case] kind: BlockType,
        #[case] content: &str,
    ) {
        let events = tokenize(src);
        let c = closes(&events);
        let first_leaf = c
            .iter()
            .find(|(k, _)| *k != BlockType::Document && *k != BlockType::List && *k != BlockType::Item && *k != BlockType::Blockquote)
            .expect("at least one leaf close");
        assert_eq!(first_leaf.0, kind);
        assert_eq!(first_leaf.1, content);
    }

    #[rstest]
    #[case::three_backticks("```\n", b'`', 3)]
    #[case::four_backticks("````\n", b'`', 4)]
    #[case::three_tildes("~~~\n", b'~', 3)]
    fn code_fence_opener_recognizes_delim_and_width(#[case] line: &str, #[case] delim: u8, #[case] width: u32) {
        let (d, w, indent) = CodeFence::opens(line).expect("should open a fence");
        assert_eq!(d, delim);
        assert_eq!(w, width);
        assert_eq!(indent, 0);
    }
}
