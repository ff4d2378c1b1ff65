//! Per-format plain-text extraction for archive documents.
//!
//! The public contract is best-effort: [`extract_text`] never fails; any
//! internal decode error yields an empty string and the caller treats that
//! as "no content". Formats are selected by (case-insensitive) extension;
//! unsupported extensions are filtered out upstream by the scanner.

use std::io::Read;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Extensions the pipeline knows how to extract.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["docx", "hwp", "hwpx", "pdf", "txt"];

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb
/// protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// External converter consulted first for legacy `.hwp` files.
const HWP_CONVERTER: &str = "hwp5txt";

/// Internal extraction error. Not part of the public contract: callers of
/// [`extract_text`] only ever see empty text on failure.
#[derive(Debug)]
enum ExtractError {
    Container(String),
    Xml(String),
    Pdf(String),
    Io(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Container(e) => write!(f, "container error: {}", e),
            ExtractError::Xml(e) => write!(f, "XML error: {}", e),
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        ExtractError::Io(e.to_string())
    }
}

/// Extracts best-effort plain text from a document. Never errors outward.
pub fn extract_text(path: &Path) -> String {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let result = match ext.as_str() {
        "docx" => extract_docx(path),
        "hwp" => return extract_hwp(path),
        "hwpx" => extract_hwpx(path),
        "pdf" => extract_pdf(path),
        "txt" => extract_txt(path),
        _ => return String::new(),
    };

    match result {
        Ok(text) => text,
        Err(e) => {
            debug!(file = %path.display(), error = %e, "extraction failed, treating as empty");
            String::new()
        }
    }
}

fn extract_txt(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn open_zip(path: &Path) -> Result<zip::ZipArchive<std::io::Cursor<Vec<u8>>>, ExtractError> {
    let bytes = std::fs::read(path)?;
    zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Container(e.to_string()))
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<Vec<u8>>>,
    name: &str,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Container(e.to_string()))?;
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Container(e.to_string()))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Container(format!(
            "ZIP entry {} exceeds size limit",
            name
        )));
    }
    Ok(out)
}

/// docx: run text (`w:t`) concatenated per paragraph (`w:p`), paragraphs
/// joined with newlines, in document order.
fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let mut archive = open_zip(path)?;
    let xml = read_zip_entry_bounded(&mut archive, "word/document.xml")?;

    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_text => {
                current.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n"))
}

/// Legacy `.hwp`: two-tier, both best-effort. Tier one shells out to an
/// `hwp5txt` converter when one is on PATH; tier two reads the `PrvText`
/// preview stream out of the OLE container and decodes it as UTF-16LE.
fn extract_hwp(path: &Path) -> String {
    if let Some(text) = hwp_convert(path) {
        if !text.trim().is_empty() {
            return text.trim().to_string();
        }
    }
    hwp_preview_text(path).unwrap_or_default()
}

fn hwp_convert(path: &Path) -> Option<String> {
    let converter = which::which(HWP_CONVERTER).ok()?;
    let output = Command::new(converter).arg(path).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn hwp_preview_text(path: &Path) -> Option<String> {
    let mut container = cfb::open(path).ok()?;
    let mut stream = container.open_stream("PrvText").ok()?;
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes).ok()?;

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let text: String = char::decode_utf16(units).filter_map(|r| r.ok()).collect();
    Some(text.trim().to_string())
}

/// hwpx: ZIP of XML parts; all `Contents/section*.xml` parts are walked in
/// name order, collecting the text of `t` elements.
fn extract_hwpx(path: &Path) -> Result<String, ExtractError> {
    let mut archive = open_zip(path)?;
    let mut section_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("Contents/section") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    section_names.sort();

    let mut parts: Vec<String> = Vec::new();
    for name in section_names {
        let xml = match read_zip_entry_bounded(&mut archive, &name) {
            Ok(xml) => xml,
            // A single corrupt section should not sink the whole document.
            Err(_) => continue,
        };
        if let Ok(section_parts) = collect_t_elements(&xml) {
            parts.extend(section_parts);
        }
    }
    Ok(parts.join("\n").trim().to_string())
}

fn collect_t_elements(xml: &[u8]) -> Result<Vec<String>, ExtractError> {
    let mut parts = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut depth_in_text = 0usize;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    depth_in_text += 1;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if depth_in_text > 0 => {
                let text = te.unescape().unwrap_or_default();
                if !text.is_empty() {
                    parts.push(text.into_owned());
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"t" {
                    depth_in_text = depth_in_text.saturating_sub(1);
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(parts)
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    let raw = pdf_extract::extract_text(path).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(reflow(&raw))
}

/// Sentence-terminal characters: a line ending in one keeps its hard break.
const END_CHARS: [char; 11] = ['.', '?', '!', ':', ';', '”', '"', '\'', '>', '）', ')'];
/// List-item markers besides a leading digit.
const BULLETS: [char; 4] = ['-', '*', '•', '·'];
/// Characters that glue onto the previous line without a space.
const STICKY_CHARS: [char; 14] = [
    '.', ',', '!', '?', ':', ';', '”', '"', '\'', ')', '}', ']', '>', '）',
];
/// Korean particles that get orphaned onto their own line by hard wrapping.
const PARTICLES: [&str; 15] = [
    "가", "이", "는", "은", "를", "을", "에", "와", "과", "도", "만", "의", "로", "으로", "고",
];

static REPEATED_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("whitespace pattern must compile"));

/// Reconstructs paragraph structure from hard-wrapped extracted text.
///
/// Lines are merged into the growing current line with a single space unless
/// the current line already ends a sentence or the next line begins a list
/// item. Lines starting with closing punctuation or an orphaned particle are
/// glued on without a space. Blank lines always force a paragraph break.
pub fn reflow(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut merged: Vec<String> = Vec::new();
    let mut current = String::new();

    for raw in text.split('\n') {
        let line = raw.trim();
        if line.is_empty() {
            if !current.is_empty() {
                merged.push(std::mem::take(&mut current));
            }
            merged.push(String::new());
            continue;
        }

        let first = line.chars().next().unwrap_or(' ');
        let is_list_item = first.is_ascii_digit() || BULLETS.contains(&first);

        if current.is_empty() {
            current = line.to_string();
        } else if current.ends_with(END_CHARS) || is_list_item {
            merged.push(std::mem::replace(&mut current, line.to_string()));
        } else if STICKY_CHARS.contains(&first) || PARTICLES.contains(&line) {
            current.push_str(line);
        } else {
            current.push(' ');
            current.push_str(line);
        }
    }
    if !current.is_empty() {
        merged.push(current);
    }

    REPEATED_SPACES
        .replace_all(&merged.join("\n"), " ")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reflow_merges_wrapped_sentence() {
        let text = "This sentence wraps\nacross two lines.";
        assert_eq!(reflow(text), "This sentence wraps across two lines.");
    }

    #[test]
    fn reflow_keeps_break_after_sentence_end() {
        let text = "First sentence ends here.\nSecond sentence starts.";
        assert_eq!(
            reflow(text),
            "First sentence ends here.\nSecond sentence starts."
        );
    }

    #[test]
    fn reflow_keeps_break_before_list_items() {
        let text = "Overview of the passage\n1. first point\n2. second point";
        assert_eq!(
            reflow(text),
            "Overview of the passage\n1. first point\n2. second point"
        );
    }

    #[test]
    fn reflow_blank_line_is_paragraph_break() {
        let text = "para one line a\nline b\n\npara two";
        assert_eq!(reflow(text), "para one line a line b\n\npara two");
    }

    #[test]
    fn reflow_glues_sticky_punctuation() {
        let text = "quoted words\n\" and more";
        assert_eq!(reflow(text), "quoted words\" and more");
    }

    #[test]
    fn reflow_glues_orphaned_particle() {
        let text = "하나님\n이 세상을 사랑하사";
        // A longer line starting with "이" merges with a space; only a line
        // that is exactly a particle glues on directly.
        assert_eq!(reflow(text), "하나님 이 세상을 사랑하사");
        assert_eq!(reflow("하나님\n은"), "하나님은");
        assert_eq!(reflow("믿음\n으로"), "믿음으로");
    }

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, content) in entries {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn docx_paragraphs_join_with_newlines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.docx");
        let xml = concat!(
            "<?xml version=\"1.0\"?>",
            "<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
            "<w:body>",
            "<w:p><w:r><w:t>first paragraph</w:t></w:r></w:p>",
            "<w:p><w:r><w:t>second </w:t></w:r><w:r><w:t>paragraph</w:t></w:r></w:p>",
            "</w:body></w:document>"
        );
        write_zip(&path, &[("word/document.xml", xml)]);
        assert_eq!(extract_text(&path), "first paragraph\nsecond paragraph");
    }

    #[test]
    fn hwpx_sections_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.hwpx");
        let section = |text: &str| {
            format!(
                "<?xml version=\"1.0\"?><hs:sec xmlns:hp=\"http://example.com/p\" \
                 xmlns:hs=\"http://example.com/s\"><hp:p><hp:run><hp:t>{}</hp:t></hp:run>\
                 </hp:p></hs:sec>",
                text
            )
        };
        let s0 = section("section zero");
        let s1 = section("section one");
        write_zip(
            &path,
            &[
                ("Contents/section1.xml", s1.as_str()),
                ("Contents/section0.xml", s0.as_str()),
                ("mimetype", "application/hwp+zip"),
            ],
        );
        assert_eq!(extract_text(&path), "section zero\nsection one");
    }

    #[test]
    fn corrupt_container_yields_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["bad.docx", "bad.hwpx", "bad.pdf", "bad.hwp"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"definitely not a valid container").unwrap();
            assert_eq!(extract_text(&path), "", "{} should extract empty", name);
        }
    }

    #[test]
    fn txt_reads_verbatim_ignoring_bad_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        let mut bytes = "유효한 한글 ".as_bytes().to_vec();
        bytes.push(0xFF);
        bytes.extend_from_slice(" and ascii".as_bytes());
        std::fs::write(&path, bytes).unwrap();
        let text = extract_text(&path);
        assert!(text.starts_with("유효한 한글 "));
        assert!(text.ends_with(" and ascii"));
    }

    #[test]
    fn hwp_preview_stream_decodes_utf16le() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.hwp");
        {
            let mut container = cfb::create(&path).unwrap();
            let mut stream = container.create_stream("PrvText").unwrap();
            let preview = "미리보기 본문";
            let encoded: Vec<u8> = preview
                .encode_utf16()
                .flat_map(|u| u.to_le_bytes())
                .collect();
            stream.write_all(&encoded).unwrap();
            stream.flush().unwrap();
        }
        // Converter-less environments exercise the PrvText fallback here.
        assert_eq!(hwp_preview_text(&path).as_deref(), Some("미리보기 본문"));
    }
}
