/// A tab is worth 4 columns relative to the previous stop.
pub fn tab_stop(col: usize) -> usize {
    4 * (col / 4 + 1)
}

/// Consumes up to `limit` columns of leading whitespace from `line`,
/// returning `(consumed_cols, consumed_bytes)`.
pub fn trim_indent(line: &str, limit: usize) -> (usize, usize) {
    let mut col = 0usize;
    let mut bytes = 0usize;
    for ch in line.chars() {
        if col >= limit {
            break;
        }
        match ch {
            ' ' => {
                col += 1;
                bytes += 1;
            }
            '\t' => {
                let next = tab_stop(col);
                if next > limit {
                    break;
                }
                col = next;
                bytes += 1;
            }
            _ => break,
        }
    }
    (col, bytes)
}

/// Like [`trim_indent`] but reports whether at least `needed` columns were
/// actually available to consume.
pub fn trim_indent_at_least(line: &str, needed: usize) -> (usize, usize, bool) {
    let (col, bytes) = trim_indent(line, needed);
    (col, bytes, col >= needed)
}

/// Counts leading spaces/tabs (in columns), uncapped.
pub fn leading_indent_cols(line: &str) -> usize {
    let mut col = 0usize;
    for ch in line.chars() {
        match ch {
            ' ' => col += 1,
            '\t' => col = tab_stop(col),
            _ => break,
        }
    }
    col
}

pub fn is_blank(line: &str) -> bool {
    line.trim_matches(['\r', '\n']).chars().all(char::is_whitespace)
}
