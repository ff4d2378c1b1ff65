//! Canonical scripture book tables and reference tagging.
//!
//! The 66-book canonical order drives three things: validity filtering of
//! tags (anything outside the list is discarded), canonical sorting in the
//! query layer, and the Old/New Testament split in statistics.
//!
//! Tagging matches in three tiers, most specific first: full book names,
//! multi-character abbreviations, then single-character abbreviations.
//! A book only counts when an adjacent chapter number follows it; a bare
//! mention is never a tag.

use std::sync::LazyLock;

use regex::Regex;

/// Traditional 66-book order: 39 Old Testament followed by 27 New Testament.
pub const CANONICAL_ORDER: [&str; 66] = [
    "창세기",
    "출애굽기",
    "레위기",
    "민수기",
    "신명기",
    "여호수아",
    "사사기",
    "룻기",
    "사무엘상",
    "사무엘하",
    "열왕기상",
    "열왕기하",
    "역대상",
    "역대하",
    "에스라",
    "느헤미야",
    "에스더",
    "욥기",
    "시편",
    "잠언",
    "전도서",
    "아가",
    "이사야",
    "예레미야",
    "예레미야애가",
    "에스겔",
    "다니엘",
    "호세아",
    "요엘",
    "아모스",
    "오바댜",
    "요나",
    "미가",
    "나훔",
    "하박국",
    "스바냐",
    "학개",
    "스가랴",
    "말라기",
    "마태복음",
    "마가복음",
    "누가복음",
    "요한복음",
    "사도행전",
    "로마서",
    "고린도전서",
    "고린도후서",
    "갈라디아서",
    "에베소서",
    "빌립보서",
    "골로새서",
    "데살로니가전서",
    "데살로니가후서",
    "디모데전서",
    "디모데후서",
    "디도서",
    "빌레몬서",
    "히브리서",
    "야고보서",
    "베드로전서",
    "베드로후서",
    "요한1서",
    "요한2서",
    "요한3서",
    "유다서",
    "요한계시록",
];

/// Number of Old Testament books at the head of [`CANONICAL_ORDER`].
pub const OLD_TESTAMENT_COUNT: usize = 39;

/// Multi-character abbreviations (2+ chars, low false-positive risk).
const MULTI_CHAR_ABBREVIATIONS: [(&str, &str); 17] = [
    ("삼상", "사무엘상"),
    ("삼하", "사무엘하"),
    ("왕상", "열왕기상"),
    ("왕하", "열왕기하"),
    ("대상", "역대상"),
    ("대하", "역대하"),
    ("고전", "고린도전서"),
    ("고후", "고린도후서"),
    ("살전", "데살로니가전서"),
    ("살후", "데살로니가후서"),
    ("딤전", "디모데전서"),
    ("딤후", "디모데후서"),
    ("벧전", "베드로전서"),
    ("벧후", "베드로후서"),
    ("요일", "요한1서"),
    ("요이", "요한2서"),
    ("요삼", "요한3서"),
];

/// Single-character abbreviations. Highly ambiguous ("마" appears in many
/// ordinary words), so matching is gated by a word-boundary requirement.
const SINGLE_CHAR_ABBREVIATIONS: [(&str, &str); 49] = [
    ("창", "창세기"),
    ("출", "출애굽기"),
    ("레", "레위기"),
    ("민", "민수기"),
    ("신", "신명기"),
    ("수", "여호수아"),
    ("삿", "사사기"),
    ("룻", "룻기"),
    ("스", "에스라"),
    ("느", "느헤미야"),
    ("에", "에스더"),
    ("욥", "욥기"),
    ("시", "시편"),
    ("잠", "잠언"),
    ("전", "전도서"),
    ("아", "아가"),
    ("사", "이사야"),
    ("렘", "예레미야"),
    ("애", "예레미야애가"),
    ("겔", "에스겔"),
    ("단", "다니엘"),
    ("호", "호세아"),
    ("욜", "요엘"),
    ("암", "아모스"),
    ("옵", "오바댜"),
    ("욘", "요나"),
    ("미", "미가"),
    ("나", "나훔"),
    ("합", "하박국"),
    ("습", "스바냐"),
    ("학", "학개"),
    ("슥", "스가랴"),
    ("말", "말라기"),
    ("마", "마태복음"),
    ("막", "마가복음"),
    ("눅", "누가복음"),
    ("요", "요한복음"),
    ("행", "사도행전"),
    ("롬", "로마서"),
    ("갈", "갈라디아서"),
    ("엡", "에베소서"),
    ("빌", "빌립보서"),
    ("골", "골로새서"),
    ("딛", "디도서"),
    ("몬", "빌레몬서"),
    ("히", "히브리서"),
    ("야", "야고보서"),
    ("유", "유다서"),
    ("계", "요한계시록"),
];

/// Delimiters accepted before a single-character abbreviation.
const BOUNDARY_CLASS: &str = r"[\s:;,.()\[\]「」『』]";

/// Tier 1: full name immediately followed by optional whitespace and digits.
static FULL_NAME_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    CANONICAL_ORDER
        .iter()
        .map(|name| (*name, chapter_pattern(name)))
        .collect()
});

/// Tier 2: multi-character abbreviation + digits, mapped to the full name.
static MULTI_CHAR_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    MULTI_CHAR_ABBREVIATIONS
        .iter()
        .map(|(short, full)| (*full, chapter_pattern(short)))
        .collect()
});

/// Tier 3: single-character abbreviation + digits, word boundary required.
static SINGLE_CHAR_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    SINGLE_CHAR_ABBREVIATIONS
        .iter()
        .map(|(short, full)| {
            let pattern = format!("(?:^|{}){}\\s*([0-9]+)", BOUNDARY_CLASS, short);
            let re = Regex::new(&pattern).expect("single-char book pattern must compile");
            (*full, re)
        })
        .collect()
});

fn chapter_pattern(token: &str) -> Regex {
    // Korean book tokens contain no regex metacharacters.
    Regex::new(&format!("{}\\s*([0-9]+)", token)).expect("book pattern must compile")
}

/// Position of a canonical book name within [`CANONICAL_ORDER`].
pub fn canonical_index(book: &str) -> Option<usize> {
    CANONICAL_ORDER.iter().position(|b| *b == book)
}

/// Whether a canonical book name belongs to the Old Testament.
pub fn is_old_testament(book: &str) -> bool {
    canonical_index(book).is_some_and(|i| i < OLD_TESTAMENT_COUNT)
}

/// Extracts scripture tags from a title plus a bounded window of content.
///
/// The search window is `title + " " + first window_chars chars of content`;
/// bounding it avoids false hits deep in unrelated text and keeps cost
/// constant. Returns the deduplicated, alphabetically sorted canonical names
/// and the chapter number of the first match in tier order (0 if none).
pub fn extract_tags(content: &str, title: &str, window_chars: usize) -> (Vec<String>, u32) {
    let window: String = {
        let head: String = content.chars().take(window_chars).collect();
        format!("{} {}", title, head)
    };

    let mut found: Vec<(&str, u32)> = Vec::new();

    let tiers: [&[(&str, Regex)]; 3] = [
        &FULL_NAME_PATTERNS,
        &MULTI_CHAR_PATTERNS,
        &SINGLE_CHAR_PATTERNS,
    ];
    for tier in tiers {
        for (full, re) in tier {
            if found.iter().any(|(book, _)| book == full) {
                continue;
            }
            if let Some(caps) = re.captures(&window) {
                if let Ok(chapter) = caps[1].parse::<u32>() {
                    found.push((full, chapter));
                }
            }
        }
    }

    let first_chapter = found.first().map(|(_, ch)| *ch).unwrap_or(0);

    let mut tags: Vec<String> = found.iter().map(|(book, _)| (*book).to_string()).collect();
    tags.sort();
    tags.dedup();

    (tags, first_chapter)
}

/// Serializes a tag set the way the store expects it: comma-joined.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}
