/// Thematic break: 3+ of `-`, `_`, `*`, separated only by spaces/tabs.
pub struct Ruler;

impl Ruler {
    pub const DELIMS: [u8; 3] = [b'-', b'_', b'*'];

    pub fn opens(remainder: &str) -> Option<u8> {
        let trimmed = remainder.trim_end_matches(['\r', '\n']);
        let mut delim = None;
        let mut count = 0u32;
        for ch in trimmed.chars() {
            match ch {
                ' ' | '\t' => continue,
                c if Self::DELIMS.contains(&(c as u8)) => {
                    match delim {
                        None => delim = Some(c as u8),
                        Some(d) if d == c as u8 => {}
                        _ => return None,
                    }
                    count += 1;
                }
                _ => return None,
            }
        }
        if count >= 3 { delim } else { None }
    }
}
