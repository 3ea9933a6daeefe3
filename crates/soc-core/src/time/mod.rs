//! Variable-granularity date/time value and its prefix parser.
//!
//! A [`GrainedTime`] only ever carries components up to its `grain`; this is
//! what lets an H1 (`# 2020-07-23`) and a nested `## 14:30` both parse
//! through the same machinery while comparing only the components each
//! actually populated.

use chrono::{Datelike, Local};

/// The finest populated component of a [`GrainedTime`] (the GLOSSARY's
/// "grain"). Declaration order is significant: `Ord` follows it, coarsest
/// first, matching the parse progression year → … → second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grain {
    None,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl Grain {
    fn next(self) -> Option<Grain> {
        use Grain::*;
        match self {
            None => Some(Year),
            Year => Some(Month),
            Month => Some(Day),
            Day => Some(Hour),
            Hour => Some(Minute),
            Minute => Some(Second),
            Second => Option::None,
        }
    }

    fn in_range(self, v: i64) -> bool {
        match self {
            Grain::None => false,
            Grain::Year => v >= 0,
            Grain::Month => (1..=12).contains(&v),
            Grain::Day => (1..=31).contains(&v),
            Grain::Hour => (0..=24).contains(&v),
            Grain::Minute => (0..=59).contains(&v),
            Grain::Second => (0..=59).contains(&v),
        }
    }
}

/// `{grain, year, month, day, hour, minute, second}`. Time zone is
/// not tracked on the value itself; "today" is always resolved against the
/// caller's local clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrainedTime {
    pub grain: Grain,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl Default for GrainedTime {
    fn default() -> Self {
        GrainedTime::none()
    }
}

impl GrainedTime {
    pub fn none() -> Self {
        GrainedTime { grain: Grain::None, year: 0, month: 0, day: 0, hour: 0, minute: 0, second: 0 }
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Self {
        GrainedTime { grain: Grain::Day, year, month, day, hour: 0, minute: 0, second: 0 }
    }

    /// Today's date at day grain, in local time.
    pub fn today_local() -> Self {
        let now = Local::now().date_naive();
        GrainedTime::from_ymd(now.year(), now.month(), now.day())
    }

    fn set(&mut self, grain: Grain, value: i64) {
        match grain {
            Grain::Year => self.year = value as i32,
            Grain::Month => self.month = value as u32,
            Grain::Day => self.day = value as u32,
            Grain::Hour => self.hour = value as u32,
            Grain::Minute => self.minute = value as u32,
            Grain::Second => self.second = value as u32,
            Grain::None => {}
        }
        self.grain = grain;
    }

    /// Greedily consumes `-`/`/`-separated date components, a literal `T`
    /// bridging the date and time parts (optional: a nested level's
    /// time-only text has no date prefix to split from), then
    /// `:`-separated time components from the start of `s`. Returns the
    /// parsed time, the unconsumed remainder, and whether anything was
    /// consumed at all.
    ///
    /// An out-of-range component aborts the parse, leaving the
    /// already-accumulated time and the remainder exactly as it stood before
    /// that iteration began.
    pub fn parse(s: &str) -> (GrainedTime, &str, bool) {
        Self::parse_from(s, GrainedTime::none())
    }

    /// Like [`GrainedTime::parse`], but continues accumulating from `base`'s
    /// grain/components instead of starting fresh at `Grain::None`. This is
    /// what lets a nested level (e.g. `### 14:30` under a day heading)
    /// narrow its parent's date down to the minute rather than replacing it
    /// with a bogus from-scratch parse.
    fn parse_from(s: &str, base: GrainedTime) -> (GrainedTime, &str, bool) {
        let mut t = base;
        let mut rest = s;
        let mut consumed = false;
        loop {
            let before = rest;
            let mut cursor = rest.trim_start_matches(' ');
            let next_grain = match t.grain.next() {
                Some(g) => g,
                Option::None => return (t, before, consumed),
            };
            match next_grain {
                Grain::Year => {}
                Grain::Month | Grain::Day => match cursor.chars().next() {
                    Some(c) if c == '-' || c == '/' => cursor = &cursor[1..],
                    _ => return (t, before, consumed),
                },
                Grain::Hour => {
                    if let Some(stripped) = cursor.strip_prefix('T') {
                        cursor = stripped;
                    }
                }
                Grain::Minute | Grain::Second => match cursor.chars().next() {
                    Some(':') => cursor = &cursor[1..],
                    _ => return (t, before, consumed),
                },
                Grain::None => unreachable!("Grain::next() never yields None"),
            }
            let digit_len = cursor.chars().take_while(char::is_ascii_digit).count();
            if digit_len == 0 {
                return (t, before, consumed);
            }
            let value: i64 = match cursor[..digit_len].parse() {
                Ok(v) => v,
                Err(_) => return (t, before, consumed),
            };
            if !next_grain.in_range(value) {
                return (t, before, consumed);
            }
            cursor = &cursor[digit_len..];
            t.set(next_grain, value);
            rest = cursor;
            consumed = true;
            if next_grain == Grain::Second {
                return (t, rest, consumed);
            }
        }
    }

    /// Parses `s`, inheriting `base` entirely when nothing is consumed (used
    /// by the outline scanner to let a nested level narrow, rather than
    /// replace, an ancestor's time).
    pub fn parse_with_base(s: &str, base: GrainedTime) -> (GrainedTime, String) {
        let (t, rest, consumed) = GrainedTime::parse_from(s, base);
        if consumed {
            (t, rest.to_string())
        } else {
            (base, s.to_string())
        }
    }

    /// Equality compares only the components at or finer than the shared
    /// grain; times at different grains are never equal.
    pub fn equal(&self, other: &GrainedTime) -> bool {
        if self.grain != other.grain {
            return false;
        }
        use Grain::*;
        match self.grain {
            None => true,
            Year => self.year == other.year,
            Month => self.year == other.year && self.month == other.month,
            Day => self.year == other.year && self.month == other.month && self.day == other.day,
            Hour => self.equal_at(other, Day) && self.hour == other.hour,
            Minute => self.equal_at(other, Hour) && self.minute == other.minute,
            Second => self.equal_at(other, Minute) && self.second == other.second,
        }
    }

    fn equal_at(&self, other: &GrainedTime, grain: Grain) -> bool {
        let mut a = *self;
        let mut b = *other;
        a.grain = grain;
        b.grain = grain;
        a.equal(&b)
    }

    /// ISO 8601 down to the current grain; empty string at `Grain::None`.
    pub fn format(&self) -> String {
        use Grain::*;
        match self.grain {
            None => String::new(),
            Year => format!("{:04}", self.year),
            Month => format!("{:04}-{:02}", self.year, self.month),
            Day => format!("{:04}-{:02}-{:02}", self.year, self.month, self.day),
            Hour => format!("{:04}-{:02}-{:02}T{:02}", self.year, self.month, self.day, self.hour),
            Minute => format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}",
                self.year, self.month, self.day, self.hour, self.minute
            ),
            Second => format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
                self.year, self.month, self.day, self.hour, self.minute, self.second
            ),
        }
    }
}

impl std::fmt::Display for GrainedTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_full_date_with_trailing_text() {
        let (t, rest, consumed) = GrainedTime::parse("2020-07-23 extra");
        assert!(consumed);
        assert_eq!(t.grain, Grain::Day);
        assert_eq!((t.year, t.month, t.day), (2020, 7, 23));
        assert_eq!(rest, " extra");
    }

    #[test]
    fn invalid_month_aborts_at_year_grain() {
        let (t, rest, consumed) = GrainedTime::parse("2020/13/01");
        assert!(consumed);
        assert_eq!(t.grain, Grain::Year);
        assert_eq!(t.year, 2020);
        assert_eq!(rest, "/13/01");
    }

    #[test]
    fn no_leading_digits_consumes_nothing() {
        let (t, rest, consumed) = GrainedTime::parse("TODO items");
        assert!(!consumed);
        assert_eq!(t.grain, Grain::None);
        assert_eq!(rest, "TODO items");
    }

    #[rstest]
    #[case::year(GrainedTime { grain: Grain::Year, year: 2020, month: 0, day: 0, hour: 0, minute: 0, second: 0 })]
    #[case::month(GrainedTime { grain: Grain::Month, year: 2020, month: 7, day: 0, hour: 0, minute: 0, second: 0 })]
    #[case::day(GrainedTime::from_ymd(2020, 7, 23))]
    #[case::hour(GrainedTime { grain: Grain::Hour, year: 2020, month: 7, day: 23, hour: 14, minute: 0, second: 0 })]
    #[case::minute(GrainedTime { grain: Grain::Minute, year: 2020, month: 7, day: 23, hour: 14, minute: 30, second: 0 })]
    #[case::second(GrainedTime { grain: Grain::Second, year: 2020, month: 7, day: 23, hour: 14, minute: 30, second: 45 })]
    fn round_trips_through_string_form(#[case] t: GrainedTime) {
        let (parsed, _, consumed) = GrainedTime::parse(&t.format());
        assert!(consumed);
        assert!(parsed.equal(&t));
    }

    #[test]
    fn equality_requires_same_grain() {
        let day = GrainedTime::from_ymd(2020, 7, 23);
        let mut year = day;
        year.grain = Grain::Year;
        assert!(!day.equal(&year));
    }

    #[test]
    fn parse_with_base_narrows_parent_date_instead_of_replacing_it() {
        let base = GrainedTime::from_ymd(2020, 7, 23);
        let (t, rest) = GrainedTime::parse_with_base("14:30 meeting", base);
        assert_eq!(t.grain, Grain::Minute);
        assert_eq!((t.year, t.month, t.day, t.hour, t.minute), (2020, 7, 23, 14, 30));
        assert_eq!(rest, " meeting");
    }

    #[test]
    fn parse_with_base_falls_back_to_base_when_nothing_consumed() {
        let base = GrainedTime::from_ymd(2020, 7, 23);
        let (t, rest) = GrainedTime::parse_with_base("no time here", base);
        assert!(t.equal(&base));
        assert_eq!(rest, "no time here");
    }
}
