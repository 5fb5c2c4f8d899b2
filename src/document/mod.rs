//! Markdown document rendering.
//!
//! This module handles:
//! - Rendering markdown to HTML with comrak
//! - Extracting the ordered header list used by the outline
//! - Recognizing markdown files and deriving display names

mod header;
mod markdown;

use std::path::Path;

pub use header::{Header, RenderedFile};
pub use markdown::render_markdown;

/// File extensions treated as markdown.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkd", "mkdn"];

/// Display name for documents that have no backing file.
pub const UNTITLED: &str = "Untitled";

/// Returns true if the file extension is a recognized markdown format.
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Derive the tab title for a document.
///
/// The file name with its markdown extension stripped, or [`UNTITLED`] when
/// there is no path.
pub fn display_name(path: Option<&Path>) -> String {
    let Some(name) = path.and_then(Path::file_name) else {
        return UNTITLED.to_string();
    };
    let name = name.to_string_lossy();
    if is_markdown_file(Path::new(name.as_ref())) {
        if let Some(stem) = Path::new(name.as_ref()).file_stem() {
            return stem.to_string_lossy().into_owned();
        }
    }
    name.into_owned()
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Decode the entities comrak and the render passes emit.
///
/// Numeric references are decoded generically; `&amp;` is handled last so
/// escaped entities round-trip to their literal text.
pub fn unescape_html(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let Some(end) = rest.find(';').filter(|end| *end <= 10) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => decode_numeric_entity(entity),
        };
        if let Some(ch) = decoded {
            out.push(ch);
            rest = &rest[end + 1..];
        } else {
            out.push('&');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_is_markdown_file_accepts_all_extensions() {
        for name in ["a.md", "a.markdown", "a.mdown", "a.mkd", "a.mkdn", "A.MD"] {
            assert!(is_markdown_file(Path::new(name)), "{name} should be markdown");
        }
    }

    #[test]
    fn test_is_markdown_file_rejects_other_files() {
        assert!(!is_markdown_file(Path::new("notes.txt")));
        assert!(!is_markdown_file(Path::new("README")));
        assert!(!is_markdown_file(Path::new("md")));
    }

    #[test]
    fn test_display_name_strips_markdown_extension() {
        let path = PathBuf::from("/docs/Getting Started.md");
        assert_eq!(display_name(Some(&path)), "Getting Started");
        assert_eq!(display_name(Some(Path::new("notes.MARKDOWN"))), "notes");
    }

    #[test]
    fn test_display_name_keeps_other_extensions() {
        assert_eq!(display_name(Some(Path::new("data.txt"))), "data.txt");
    }

    #[test]
    fn test_display_name_without_path_is_placeholder() {
        assert_eq!(display_name(None), UNTITLED);
    }

    #[test]
    fn test_escape_and_unescape_html() {
        let raw = r#"if a < b && c > "d" { 'e' }"#;
        let escaped = escape_html(raw);
        assert!(!escaped.contains('<'));
        assert_eq!(unescape_html(&escaped), raw);
    }

    #[test]
    fn test_unescape_numeric_entities() {
        assert_eq!(unescape_html("&#x27;a&#39; &#65;"), "'a' A");
    }

    #[test]
    fn test_unescape_leaves_unknown_entities() {
        assert_eq!(unescape_html("AT&T &bogus; &"), "AT&T &bogus; &");
    }
}
