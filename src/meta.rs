//! Date inference from archive file names.
//!
//! File names in the archive carry dates in a handful of loose conventions
//! (`2025-01-15`, `250115`, `p250115`, `2025 0115`, ...). Patterns are tried
//! from most specific to least specific so that ambiguous short numeric
//! substrings don't shadow an explicit separator form. A candidate that
//! fails range validation is discarded and the next pattern is still tried.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Year/month/day candidate extracted by one pattern.
type DateParts = (i32, u32, u32);

struct DatePattern {
    re: Regex,
    parts: fn(&Captures) -> Option<DateParts>,
}

static DATE_PATTERNS: LazyLock<Vec<DatePattern>> = LazyLock::new(|| {
    vec![
        // 2025-01-15, 2025.01.15, 2025/01/15
        DatePattern {
            re: Regex::new(r"([0-9]{4})[-./]([0-9]{2})[-./]([0-9]{2})").unwrap(),
            parts: |c| Some((num(c, 1)?, num(c, 2)? as u32, num(c, 3)? as u32)),
        },
        // 25-01-15, 25.01.15 (two-digit year, prefixed with 20)
        DatePattern {
            re: Regex::new(r"([0-9]{2})[-./]([0-9]{2})[-./]([0-9]{2})").unwrap(),
            parts: |c| Some((2000 + num(c, 1)?, num(c, 2)? as u32, num(c, 3)? as u32)),
        },
        // 2025 0115 (year, whitespace, MMDD)
        DatePattern {
            re: Regex::new(r"([0-9]{4})\s+([0-9]{4})").unwrap(),
            parts: |c| {
                let md = c.get(2)?.as_str();
                Some((num(c, 1)?, md[..2].parse().ok()?, md[2..].parse().ok()?))
            },
        },
        // p250115, B)250115 (letter or ')' prefix, six digits, YYMMDD)
        DatePattern {
            re: Regex::new(r"[a-zA-Z)]+([0-9]{6})").unwrap(),
            parts: |c| split_yymmdd(c.get(1)?.as_str()),
        },
        // 20250115 (eight contiguous digits)
        DatePattern {
            re: Regex::new(r"([0-9]{8})").unwrap(),
            parts: |c| {
                let s = c.get(1)?.as_str();
                Some((s[..4].parse().ok()?, s[4..6].parse().ok()?, s[6..].parse().ok()?))
            },
        },
        // 250115 (six contiguous digits, most permissive, tried last)
        DatePattern {
            re: Regex::new(r"([0-9]{6})").unwrap(),
            parts: |c| split_yymmdd(c.get(1)?.as_str()),
        },
    ]
});

fn num(caps: &Captures, idx: usize) -> Option<i32> {
    caps.get(idx)?.as_str().parse().ok()
}

fn split_yymmdd(s: &str) -> Option<DateParts> {
    Some((
        2000 + s[..2].parse::<i32>().ok()?,
        s[2..4].parse().ok()?,
        s[4..].parse().ok()?,
    ))
}

/// Parses a calendar date out of a file name.
///
/// Returns an ISO `YYYY-MM-DD` string for the first pattern whose candidate
/// passes range validation (month 1-12, day 1-31, year 1990-2099), or `None`
/// when nothing matches.
pub fn parse_date(file_name: &str) -> Option<String> {
    for pattern in DATE_PATTERNS.iter() {
        if let Some(caps) = pattern.re.captures(file_name) {
            if let Some((y, m, d)) = (pattern.parts)(&caps) {
                if (1990..=2099).contains(&y) && (1..=12).contains(&m) && (1..=31).contains(&d) {
                    return Some(format!("{:04}-{:02}-{:02}", y, m, d));
                }
            }
        }
    }
    None
}

/// Title is the file name with its final extension removed.
pub fn title_from_file_name(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => file_name[..pos].to_string(),
        _ => file_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_digit_yymmdd() {
        assert_eq!(parse_date("230521_sermon.docx").as_deref(), Some("2023-05-21"));
    }

    #[test]
    fn eight_digit_yyyymmdd() {
        assert_eq!(parse_date("20230521.docx").as_deref(), Some("2023-05-21"));
    }

    #[test]
    fn dashed_full_year() {
        assert_eq!(parse_date("2023-05-21 note.docx").as_deref(), Some("2023-05-21"));
    }

    #[test]
    fn dotted_two_digit_year() {
        assert_eq!(parse_date("23.05.21 메모.hwp").as_deref(), Some("2023-05-21"));
    }

    #[test]
    fn letter_prefixed_six_digits() {
        assert_eq!(parse_date("p220703.hwp").as_deref(), Some("2022-07-03"));
    }

    #[test]
    fn year_space_mmdd() {
        assert_eq!(parse_date("2023 0521.docx").as_deref(), Some("2023-05-21"));
    }

    #[test]
    fn no_digits_no_date() {
        assert_eq!(parse_date("random_file.docx"), None);
    }

    #[test]
    fn out_of_range_month_falls_through() {
        // 991301 fails as YYMMDD (month 13) and no other pattern applies.
        assert_eq!(parse_date("991301.txt"), None);
    }

    #[test]
    fn title_strips_extension() {
        assert_eq!(title_from_file_name("230521_설교.docx"), "230521_설교");
        assert_eq!(title_from_file_name("no_extension"), "no_extension");
        assert_eq!(title_from_file_name(".hidden"), ".hidden");
    }
}
