use std::io::Write;

/// The recognized CommonMark block subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Blank,
    Document,
    Heading,
    Ruler,
    Blockquote,
    List,
    Item,
    Paragraph,
    Codefence,
    Codeblock,
    HtmlBlock,
}

/// A block record: `{type, delim, width, indent}`.
///
/// - `delim` is the single marker byte (`#`, `>`, `-`, `.`, `)`, `~`, `` ` ``).
/// - `width` holds, per type, the heading level / ordinal width / item mark
///   width / fence length.
/// - `indent` is the column of the block's opening mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockType,
    pub delim: u8,
    pub width: u32,
    pub indent: u32,
}

impl Block {
    pub fn new(kind: BlockType, delim: u8, width: u32, indent: u32) -> Self {
        Block {
            kind,
            delim,
            width,
            indent,
        }
    }

    pub fn document() -> Self {
        Block::new(BlockType::Document, 0, 0, 0)
    }

    /// The total width, in columns, of this block's own marker (not
    /// counting inherited indent from parent containers).
    pub fn mark_width(&self) -> u32 {
        match self.kind {
            BlockType::Heading => self.width + 1, // "#" * level + space
            BlockType::Blockquote => if self.delim == 0 { 0 } else { 2 }, // "> "
            BlockType::Item => self.width,
            BlockType::Codefence => self.width,
            _ => 0,
        }
    }

    /// Renders this block's own marker text.
    pub fn mark_string(&self) -> String {
        let mut buf = Vec::new();
        self.write_mark_into(&mut buf).expect("writing to a Vec never fails");
        String::from_utf8(buf).expect("markers are ASCII")
    }

    /// Writes this block's own marker text into `w`.
    pub fn write_mark_into<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        match self.kind {
            BlockType::Heading => {
                for _ in 0..self.width {
                    w.write_all(b"#")?;
                }
                w.write_all(b" ")
            }
            BlockType::Ruler => {
                for _ in 0..self.width.max(3) {
                    w.write_all(&[self.delim])?;
                }
                Ok(())
            }
            BlockType::Blockquote => w.write_all(b"> "),
            BlockType::Codefence => {
                for _ in 0..self.width.max(3) {
                    w.write_all(&[self.delim])?;
                }
                Ok(())
            }
            BlockType::Item => {
                if self.delim == b'.' || self.delim == b')' {
                    write!(w, "1{}", self.delim as char)?;
                    w.write_all(b" ")
                } else {
                    w.write_all(&[self.delim])?;
                    w.write_all(b" ")
                }
            }
            BlockType::List | BlockType::Paragraph | BlockType::Codeblock
            | BlockType::Document | BlockType::Blank | BlockType::HtmlBlock => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_mark_string() {
        let b = Block::new(BlockType::Heading, b'#', 2, 0);
        assert_eq!(b.mark_string(), "## ");
    }

    #[test]
    fn bullet_item_mark_string() {
        let b = Block::new(BlockType::Item, b'-', 2, 0);
        assert_eq!(b.mark_string(), "- ");
    }

    #[test]
    fn ruler_mark_string() {
        let b = Block::new(BlockType::Ruler, b'-', 3, 0);
        assert_eq!(b.mark_string(), "---");
    }
}
