//! Outline scanner: layers a path of `{inheritedTime, titleRemnant}` levels
//! on top of the block tokenizer.

use crate::block::{Block, BlockType, ScanEvent, TokenizeError, Tokenizer};
use crate::time::GrainedTime;

#[derive(Debug, thiserror::Error)]
pub enum OutlineError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
}

/// One level of the outline path: the block that opened it, the time
/// inherited or parsed at this level, and its title remnant.
#[derive(Debug, Clone)]
pub struct TitledBlock {
    pub id: u64,
    pub block: Block,
    pub time: GrainedTime,
    pub title: Vec<u8>,
}

fn title_matches(title: &[u8], name: &str) -> bool {
    std::str::from_utf8(title).map(|s| s.eq_ignore_ascii_case(name)).unwrap_or(false)
}

/// First `. ` or `;` in `s` ends the title.
fn trim_at_sentence_boundary(s: &str) -> &str {
    let dot = s.find(". ");
    let semi = s.find(';');
    match (dot, semi) {
        (Some(d), Some(sc)) => &s[..d.min(sc)],
        (Some(d), Option::None) => &s[..d],
        (Option::None, Some(sc)) => &s[..sc],
        (Option::None, Option::None) => s,
    }
}

pub struct OutlineScanner {
    tok: Tokenizer,
    path: Vec<TitledBlock>,
    titled: bool,
}

impl OutlineScanner {
    pub fn new(tok: Tokenizer) -> Self {
        OutlineScanner { tok, path: Vec::new(), titled: false }
    }

    fn inherited_time(&self) -> GrainedTime {
        self.path.last().map(|e| e.time).unwrap_or_else(GrainedTime::none)
    }

    fn pop_headings_at_or_above(&mut self, level: u32) {
        while let Some(top) = self.path.last() {
            if top.block.kind == BlockType::Heading && top.block.width >= level {
                self.path.pop();
            } else {
                break;
            }
        }
    }

    /// Pulls the next tokenizer event, updating the outline path, and
    /// returns it unchanged for callers that also want raw block structure.
    pub fn next(&mut self) -> Result<Option<ScanEvent>, OutlineError> {
        self.titled = false;
        let ev = self.tok.scan()?;
        match &ev {
            Some(ScanEvent::Open { id, block, .. }) => {
                if matches!(block.kind, BlockType::List | BlockType::Item) {
                    let time = self.inherited_time();
                    self.path.push(TitledBlock { id: *id, block: *block, time, title: Vec::new() });
                }
            }
            Some(ScanEvent::Close { id, block, content, .. }) => match block.kind {
                BlockType::Heading => {
                    self.pop_headings_at_or_above(block.width);
                    let parent_time = self.inherited_time();
                    let text = String::from_utf8_lossy(content).into_owned();
                    let (time, remainder) = GrainedTime::parse_with_base(&text, parent_time);
                    let title = trim_at_sentence_boundary(remainder.trim()).as_bytes().to_vec();
                    self.path.push(TitledBlock { id: *id, block: *block, time, title });
                    self.titled = true;
                }
                BlockType::Paragraph => {
                    if let Some(top) = self.path.last_mut() {
                        if top.title.is_empty() {
                            let text = String::from_utf8_lossy(content).into_owned();
                            let (time, remainder) = GrainedTime::parse_with_base(&text, top.time);
                            top.time = time;
                            top.title = trim_at_sentence_boundary(remainder.trim()).as_bytes().to_vec();
                            self.titled = true;
                        }
                    }
                }
                BlockType::List | BlockType::Item => {
                    self.path.retain(|e| e.id != *id);
                }
                BlockType::Document => {
                    self.path.clear();
                }
                _ => {}
            },
            None => {}
        }
        Ok(ev)
    }

    /// The n-th (1-indexed) non-empty title on the current path, and whether
    /// it is the deepest non-empty title.
    pub fn heading(&self, n: usize) -> Option<(&[u8], bool)> {
        if n == 0 {
            return None;
        }
        let total = self.path.iter().filter(|e| !e.title.is_empty()).count();
        let mut seen = 0;
        for e in &self.path {
            if !e.title.is_empty() {
                seen += 1;
                if seen == n {
                    return Some((&e.title, seen == total));
                }
            }
        }
        None
    }

    pub fn last_time(&self) -> GrainedTime {
        self.inherited_time()
    }

    /// Whether the most recent `next()` call produced a newly titled level.
    pub fn titled(&self) -> bool {
        self.titled
    }

    /// `0` outside `name`; `1` for the named section itself; higher inside
    /// its descendants. Depth keeps incrementing for *any* non-empty title
    /// seen after entering, not just direct children.
    pub fn section_depth(&self, name: &str) -> usize {
        let mut depth = 0;
        let mut inside = false;
        for e in &self.path {
            if e.title.is_empty() {
                continue;
            }
            if !inside {
                if title_matches(&e.title, name) {
                    inside = true;
                    depth = 1;
                }
            } else {
                depth += 1;
            }
        }
        depth
    }

    pub fn path(&self) -> &[TitledBlock] {
        &self.path
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ByteArena;

    fn outline(src: &str) -> OutlineScanner {
        let arena = ByteArena::new();
        arena.write(src.as_bytes());
        OutlineScanner::new(Tokenizer::new(arena))
    }

    #[test]
    fn heading_title_and_date_parse() {
        let mut o = outline("# 2020-07-23\n\nhello\n");
        while o.next().unwrap().is_some() {}
        // after full scan the path should be empty (everything closed)
        assert!(o.path().is_empty());
    }

    #[test]
    fn heading_extracts_date_and_remainder_title() {
        let mut o = outline("# 2020-07-23 Diary\n");
        let mut titled_time = None;
        let mut titled_text = None;
        while let Some(ev) = o.next().unwrap() {
            if let ScanEvent::Close { block, .. } = &ev {
                if block.kind == BlockType::Heading && o.titled() {
                    let h = o.heading(1).unwrap();
                    titled_text = Some(String::from_utf8_lossy(h.0).into_owned());
                    titled_time = Some(o.last_time());
                }
            }
        }
        assert_eq!(titled_text.as_deref(), Some("Diary"));
        assert!(titled_time.unwrap().equal(&GrainedTime::from_ymd(2020, 7, 23)));
    }

    #[test]
    fn section_depth_tracks_named_subsection() {
        let mut o = outline("# 2020-07-23\n## TODO\n- one\n");
        let mut depths = Vec::new();
        while let Some(_ev) = o.next().unwrap() {
            depths.push(o.section_depth("TODO"));
        }
        assert!(depths.iter().any(|&d| d >= 1));
    }
}
