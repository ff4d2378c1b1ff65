//! Core data types for the sermon library.

/// One indexed document, keyed uniquely by `file_name`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SermonRecord {
    pub file_name: String,
    /// File name minus extension.
    pub title: String,
    /// ISO `YYYY-MM-DD`, or `None` when no filename pattern matched.
    pub date: Option<String>,
    /// Extracted plain text; empty when extraction failed.
    pub content: String,
    /// Comma-joined canonical book names, sorted and deduplicated.
    pub bible_tags: String,
    /// Chapter of the first tag found in tier order; 0 if none.
    pub bible_chapter: i64,
    /// Filesystem mtime fingerprint used for change detection.
    pub last_modified: f64,
}

impl SermonRecord {
    /// Tag set as individual canonical names.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.bible_tags.split(',').filter(|t| !t.is_empty())
    }

    /// First tag in the serialized set, if any.
    pub fn first_tag(&self) -> Option<&str> {
        self.tags().next()
    }
}

/// Worker output for one file: extraction plus metadata, no store access.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub file_name: String,
    pub title: String,
    pub date: Option<String>,
    pub content: String,
    pub bible_tags: String,
    pub bible_chapter: i64,
    pub last_modified: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tag_string_yields_no_tags() {
        let record = SermonRecord {
            file_name: "a.txt".into(),
            title: "a".into(),
            date: None,
            content: String::new(),
            bible_tags: String::new(),
            bible_chapter: 0,
            last_modified: 0.0,
        };
        assert_eq!(record.tags().count(), 0);
        assert_eq!(record.first_tag(), None);
    }

    #[test]
    fn first_tag_is_leading_entry() {
        let record = SermonRecord {
            file_name: "a.txt".into(),
            title: "a".into(),
            date: None,
            content: String::new(),
            bible_tags: "마태복음,창세기".into(),
            bible_chapter: 5,
            last_modified: 0.0,
        };
        assert_eq!(record.first_tag(), Some("마태복음"));
        assert_eq!(record.tags().count(), 2);
    }
}
