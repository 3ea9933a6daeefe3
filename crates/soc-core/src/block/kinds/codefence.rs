use super::indent::trim_indent;

/// Fenced code block: 3+ `` ` `` or `~` at ≤3 indent.
pub struct CodeFence;

impl CodeFence {
    pub const BACKTICK: u8 = b'`';
    pub const TILDE: u8 = b'~';

    /// Returns `(delim, width, indent)` if `line` opens a fence.
    pub fn opens(line: &str) -> Option<(u8, u32, u32)> {
        let (indent, indent_bytes) = trim_indent(line, 3);
        let rest = &line[indent_bytes..];
        let b = rest.as_bytes();
        let delim = *b.first()?;
        if delim != Self::BACKTICK && delim != Self::TILDE {
            return None;
        }
        let mut n = 0u32;
        while b.get(n as usize) == Some(&delim) {
            n += 1;
        }
        if n < 3 {
            return None;
        }
        if delim == Self::BACKTICK {
            // an info string after a backtick fence may not itself contain a backtick
            let info = &rest[n as usize..];
            if info.trim_end_matches(['\r', '\n']).contains('`') {
                return None;
            }
        }
        Some((delim, n, indent as u32))
    }

    /// Whether `line` is an unindented closing fence of the same delim and
    /// width at least the opening width.
    pub fn closes(line: &str, delim: u8, width: u32) -> bool {
        let (indent, indent_bytes) = trim_indent(line, 3);
        if indent > 3 {
            return false;
        }
        let rest = &line[indent_bytes..];
        let b = rest.as_bytes();
        let mut n = 0u32;
        while b.get(n as usize) == Some(&delim) {
            n += 1;
        }
        if n < width {
            return false;
        }
        rest[n as usize..].trim_end_matches(['\r', '\n']).trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_backtick_fence() {
        assert_eq!(CodeFence::opens("```rust\n"), Some((b'`', 3, 0)));
    }

    #[test]
    fn opens_tilde_fence() {
        assert_eq!(CodeFence::opens("~~~~\n"), Some((b'~', 4, 0)));
    }

    #[test]
    fn backtick_info_string_cannot_contain_backtick() {
        assert_eq!(CodeFence::opens("```a`b\n"), None);
    }

    #[test]
    fn closes_matching_and_wider_fence() {
        assert!(CodeFence::closes("```\n", b'`', 3));
        assert!(CodeFence::closes("````\n", b'`', 3));
        assert!(!CodeFence::closes("``\n", b'`', 3));
    }

    #[test]
    fn close_fence_must_be_unindented_past_3() {
        assert!(!CodeFence::closes("     ```\n", b'`', 3));
    }
}
