//! Present-day rollover engine: locates today's, yesterday's,
//! and each configured item-type's section within a stream, and performs
//! the "new day" rewrite that promotes open items forward and files
//! everything else into yesterday.

use std::sync::Arc;

use regex::Regex;

use crate::arena::{Area, ArenaBacking, ArenaError, Editor, Span, Token};
use crate::block::{BlockType, Tokenizer};
use crate::outline::{OutlineError, OutlineScanner};
use crate::time::{Grain, GrainedTime};

#[derive(Debug, thiserror::Error)]
pub enum PresentError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error(transparent)]
    Outline(#[from] OutlineError),
    #[error(transparent)]
    WriteTo(#[from] crate::arena::WriteToError),
    #[error("invalid item-type configuration: {0}")]
    Config(String),
}

/// Where the stream lives: an in-memory buffer for tests, or an on-disk file
/// replaced atomically via temp-file rename. Implementations are
/// glue, not core; this trait is just the shape the engine calls through.
pub trait Store: std::fmt::Debug {
    /// Opens the store. A store with no existing content returns
    /// [`crate::arena::FileArena::empty`]-shaped backing (size zero), not an error.
    fn open(&self) -> std::io::Result<Arc<dyn ArenaBacking>>;

    /// Atomically replaces the store's entire contents with `bytes`.
    fn commit(&self, bytes: &[u8]) -> std::io::Result<()>;
}

/// One configured item type, e.g. `TODO` (carried forward) or `Done`
/// (left behind unless `remains` keeps its header only).
#[derive(Debug, Clone)]
pub struct Item {
    pub name: String,
    /// If true, only the section's header moves forward; its body stays
    /// with yesterday. If false, the whole section (header and body) moves.
    pub remains: bool,
}

/// `TODO` and `WIP` carry forward whole; `Done` leaves its body behind.
pub fn default_items() -> Vec<Item> {
    vec![
        Item { name: "TODO".to_string(), remains: false },
        Item { name: "WIP".to_string(), remains: false },
        Item { name: "Done".to_string(), remains: true },
    ]
}

/// A recognized region of the stream: `id` is the tokenizer id of the block
/// that opened it, `byte_range` spans header and body together, `body_range`
/// is the part after the header line. `id == 0` means "not found" (the
/// tokenizer's `Document` block always takes id `0`, so no recognized
/// section ever collides with the sentinel).
#[derive(Debug, Clone, Copy)]
pub struct Section {
    pub id: u64,
    pub byte_range: Span,
    pub body_range: Span,
}

impl Section {
    fn unset() -> Self {
        Section { id: 0, byte_range: Span::new(0, 0), body_range: Span::new(0, 0) }
    }

    fn open(id: u64, header_start: usize, body_start: usize) -> Self {
        Section {
            id,
            byte_range: Span::new(header_start, header_start),
            body_range: Span::new(body_start, body_start),
        }
    }

    pub fn is_set(&self) -> bool {
        self.id != 0
    }

    pub fn header_span(&self) -> Span {
        Span::new(self.byte_range.start, self.body_range.start)
    }
}

/// What a [`PresentEngine::collect`] call actually did, for CLI messaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloverOutcome {
    /// Today's section was already present; nothing was written.
    AlreadyCurrent,
    /// The store had no recognizable yesterday; a bare today was created.
    Created,
    /// Today's section was rolled forward from the named prior day.
    RolledOver { from: String },
}

/// Locates and rewrites the present-day section of a stream.
///
/// `sections[0]` is today, `sections[1]` is yesterday, and `sections[2..]`
/// are each configured [`Item`] in order.
#[derive(Debug)]
pub struct PresentEngine {
    items: Vec<Item>,
    regex: Regex,
    sections: Vec<Section>,
    yesterday_label: Option<String>,
    arena: Arc<dyn ArenaBacking>,
    size: usize,
}

impl PresentEngine {
    pub fn new(items: Vec<Item>) -> Result<Self, PresentError> {
        let alternation = items
            .iter()
            .map(|it| regex::escape(&it.name))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!("(?i)^(?:{alternation})$");
        let regex = Regex::new(&pattern).map_err(|e| PresentError::Config(e.to_string()))?;
        let empty = crate::arena::FileArena::empty();
        let n = items.len();
        Ok(PresentEngine {
            items,
            regex,
            sections: vec![Section::unset(); 2 + n],
            yesterday_label: None,
            arena: empty,
            size: 0,
        })
    }

    pub fn today(&self) -> Section {
        self.sections[0]
    }

    pub fn yesterday(&self) -> Section {
        self.sections[1]
    }

    pub fn item(&self, index: usize) -> Section {
        self.sections[2 + index]
    }

    fn token(&self, span: Span) -> Token {
        Token::new(self.arena.clone(), span.start, span.end)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The body bytes of `section` (header excluded), for callers that want
    /// to re-scan a single sub-section (e.g. to print its items) without
    /// walking the whole stream again.
    pub fn section_body(&self, section: Section) -> Result<Vec<u8>, PresentError> {
        Ok(self.token(section.body_range).bytes()?)
    }

    /// Rescans `store` from scratch, locating today, yesterday, and every
    /// configured item-type's section.
    pub fn load(&mut self, store: &dyn Store) -> Result<(), PresentError> {
        let n = self.items.len();
        self.sections = vec![Section::unset(); 2 + n];
        self.yesterday_label = None;

        let arena = store.open()?;
        self.size = arena.size();
        self.arena = arena.clone();

        let today = GrainedTime::today_local();
        let mut outline = OutlineScanner::new(Tokenizer::new(arena));
        let mut yesterday_locked = false;
        let mut prev_ids: std::collections::HashSet<u64> = std::collections::HashSet::new();

        while let Some(ev) = outline.next()? {
            let left_start = match &ev {
                crate::block::ScanEvent::Close { block, .. } if block.kind == BlockType::Document => self.size,
                crate::block::ScanEvent::Close { token, .. } => token.start,
                crate::block::ScanEvent::Open { at, .. } => *at,
            };
            let now_ids: std::collections::HashSet<u64> = outline.path().iter().map(|e| e.id).collect();
            for sec in self.sections.iter_mut() {
                if sec.id != 0 && sec.byte_range.end == sec.byte_range.start && !now_ids.contains(&sec.id) {
                    sec.byte_range.end = left_start;
                    sec.body_range.end = left_start;
                }
            }
            prev_ids = now_ids;

            if outline.titled() {
                if let crate::block::ScanEvent::Close { id, block, token, .. } = &ev {
                    if block.kind == BlockType::Heading {
                        let entry = outline.path().last().expect("just pushed by this event");
                        let is_temporal = entry.title.is_empty() && entry.time.grain != Grain::None;
                        if is_temporal && entry.time.grain == Grain::Day {
                            if entry.time.equal(&today) && !self.sections[0].is_set() {
                                self.sections[0] = Section::open(*id, token.start, token.end);
                            } else if !yesterday_locked && !self.sections[1].is_set() {
                                self.sections[1] = Section::open(*id, token.start, token.end);
                                self.yesterday_label = Some(entry.time.format());
                            }
                        } else if !entry.title.is_empty() {
                            let depth = outline.path().iter().filter(|e| !e.title.is_empty()).count();
                            let title = String::from_utf8_lossy(&entry.title);
                            let mut matched = false;
                            if depth == 1 && self.regex.is_match(&title) {
                                if let Some(pos) = self.items.iter().position(|it| it.name.eq_ignore_ascii_case(&title)) {
                                    matched = true;
                                    let slot = 2 + pos;
                                    if !self.sections[slot].is_set() {
                                        self.sections[slot] = Section::open(*id, token.start, token.end);
                                    }
                                }
                            }
                            if !matched {
                                yesterday_locked = true;
                            }
                        }
                    }
                }
            }
        }
        let _ = prev_ids;

        for sec in self.sections.iter_mut() {
            if sec.id != 0 && sec.byte_range.end == sec.byte_range.start {
                sec.byte_range.end = self.size;
                sec.body_range.end = self.size;
            }
        }
        Ok(())
    }

    /// Rewrites the store so that today has its own section, carrying
    /// forward any open items from yesterday.
    /// A no-op if today is already present.
    pub fn collect(&mut self, store: &dyn Store) -> Result<RolloverOutcome, PresentError> {
        if self.sections[0].is_set() {
            return Ok(RolloverOutcome::AlreadyCurrent);
        }

        let today = GrainedTime::today_local();
        let mut remnants = Area::from_span(Span::new(0, self.size));
        let mut editor = Editor::new();

        let had_yesterday = self.sections[1].is_set();
        if had_yesterday {
            remnants.sub_span(self.sections[1].header_span());
        }

        editor.write(format!("# {}\n\n", today.format()).as_bytes());

        for (i, item) in self.items.iter().enumerate() {
            let sec = self.sections[2 + i];
            if !sec.is_set() {
                editor.write(format!("## {}\n\n", item.name).as_bytes());
                continue;
            }
            if !item.remains {
                editor.append(self.token(sec.byte_range));
                remnants.sub_span(sec.byte_range);
            } else {
                let hdr = sec.header_span();
                editor.append(self.token(hdr));
                let elides = remnants.ranges().first().map(|r| r.start == hdr.start).unwrap_or(false);
                if elides {
                    remnants.sub_span(hdr);
                }
            }
        }

        if had_yesterday {
            editor.append(self.token(self.sections[1].header_span()));
        }

        for r in remnants.ranges() {
            editor.append(self.token(r));
        }

        store.commit(&editor.to_bytes()?)?;

        let outcome = match &self.yesterday_label {
            Some(label) if had_yesterday => RolloverOutcome::RolledOver { from: label.clone() },
            _ => RolloverOutcome::Created,
        };
        self.load(store)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct MemStore {
        data: Mutex<Vec<u8>>,
    }

    impl MemStore {
        fn new(initial: &str) -> Self {
            MemStore { data: Mutex::new(initial.as_bytes().to_vec()) }
        }
    }

    impl Store for MemStore {
        fn open(&self) -> std::io::Result<Arc<dyn ArenaBacking>> {
            let bytes = self.data.lock().unwrap().clone();
            let arena = crate::arena::ByteArena::new();
            arena.write(&bytes);
            Ok(arena as Arc<dyn ArenaBacking>)
        }

        fn commit(&self, bytes: &[u8]) -> std::io::Result<()> {
            *self.data.lock().unwrap() = bytes.to_vec();
            Ok(())
        }
    }

    #[test]
    fn empty_store_creates_bare_today() {
        let store = MemStore::new("");
        let mut engine = PresentEngine::new(default_items()).unwrap();
        engine.load(&store).unwrap();
        assert!(!engine.today().is_set());
        let outcome = engine.collect(&store).unwrap();
        assert_eq!(outcome, RolloverOutcome::Created);
        let written = store.data.lock().unwrap().clone();
        let text = String::from_utf8(written).unwrap();
        assert!(text.starts_with(&format!("# {}", GrainedTime::today_local().format())));
        assert!(text.contains("## TODO"));
        assert!(text.contains("## WIP"));
        assert!(text.contains("## Done"));
    }

    #[test]
    fn present_today_is_a_no_op() {
        let today = GrainedTime::today_local().format();
        let store = MemStore::new(&format!("# {today}\n\n## TODO\n- a thing\n"));
        let mut engine = PresentEngine::new(default_items()).unwrap();
        engine.load(&store).unwrap();
        assert!(engine.today().is_set());
        let outcome = engine.collect(&store).unwrap();
        assert_eq!(outcome, RolloverOutcome::AlreadyCurrent);
    }

    #[test]
    fn rollover_carries_open_items_and_elides_remains_header() {
        let src = "# 2020-07-23\n## TODO\n- the other thing\n## WIP\n- that\n## Done\n- this\n# 2020-07-22\n- different things\n";
        let store = MemStore::new(src);
        let mut engine = PresentEngine::new(default_items()).unwrap();
        engine.load(&store).unwrap();
        assert!(!engine.today().is_set());
        assert!(engine.yesterday().is_set());

        let outcome = engine.collect(&store).unwrap();
        assert_eq!(outcome, RolloverOutcome::RolledOver { from: "2020-07-23".to_string() });

        let written = store.data.lock().unwrap().clone();
        let text = String::from_utf8(written).unwrap();
        let today = GrainedTime::today_local().format();
        assert!(text.starts_with(&format!("# {today}\n\n")));
        assert!(text.contains("## TODO\n- the other thing\n"));
        assert!(text.contains("## WIP\n- that\n"));
        assert!(text.contains("## Done\n# 2020-07-23\n- this\n"));
        assert!(text.ends_with("# 2020-07-22\n- different things\n"));
    }

    #[test]
    fn rollover_output_matches_expected_bytes_exactly() {
        let today = GrainedTime::today_local().format();
        let src = "# 2020-07-23\n## TODO\n- the other thing\n## WIP\n- that\n## Done\n- this\n# 2020-07-22\n- different things\n";
        let store = MemStore::new(src);
        let mut engine = PresentEngine::new(default_items()).unwrap();
        engine.load(&store).unwrap();
        engine.collect(&store).unwrap();

        let written = store.data.lock().unwrap().clone();
        let text = String::from_utf8(written).unwrap();
        let expected = format!(
            "# {today}\n\n## TODO\n- the other thing\n## WIP\n- that\n## Done\n# 2020-07-23\n- this\n# 2020-07-22\n- different things\n"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn running_collect_twice_on_the_same_day_is_idempotent() {
        let today = GrainedTime::today_local().format();
        let store = MemStore::new(&format!("# {today}\n\n## TODO\n- a thing\n"));
        let mut engine = PresentEngine::new(default_items()).unwrap();
        engine.load(&store).unwrap();
        engine.collect(&store).unwrap();
        let after_first = store.data.lock().unwrap().clone();

        engine.collect(&store).unwrap();
        let after_second = store.data.lock().unwrap().clone();
        assert_eq!(after_first, after_second);
    }
}
