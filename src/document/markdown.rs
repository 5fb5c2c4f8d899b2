//! Markdown to HTML rendering with comrak.

use anyhow::{Context, Result};
use comrak::nodes::{AstNode, NodeValue};
use comrak::{Anchorizer, Arena, Options, format_html, parse_document};

use super::header::{Header, RenderedFile};

/// Render markdown source to HTML and collect its headers.
///
/// Header ids match the anchors comrak writes into the HTML, so the outline
/// can locate each heading in the rendered output.
///
/// # Example
///
/// ```
/// use mkreader::document::render_markdown;
///
/// let rendered = render_markdown("# Hello\n\nWorld").unwrap();
/// assert_eq!(rendered.headers[0].id, "hello");
/// assert!(rendered.html.contains("<p>World</p>"));
/// ```
///
/// # Errors
///
/// Returns an error if comrak fails to format the document.
pub fn render_markdown(source: &str) -> Result<RenderedFile> {
    let _scope = crate::perf::scope("document.render_markdown");
    let arena = Arena::new();
    let options = create_options();
    let root = parse_document(&arena, source, &options);

    let headers = collect_headers(root);

    let mut html = Vec::with_capacity(source.len() * 2);
    format_html(root, &options, &mut html).context("Failed to format markdown as HTML")?;
    let html = String::from_utf8(html).context("Rendered HTML was not valid UTF-8")?;

    Ok(RenderedFile { html, headers })
}

fn create_options() -> Options {
    let mut options = Options::default();

    // Enable GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.superscript = true;
    options.extension.shortcodes = true;

    // Anchors for outline navigation
    options.extension.header_ids = Some(String::new());
    options.extension.description_lists = true;

    options
}

fn collect_headers<'a>(root: &'a AstNode<'a>) -> Vec<Header> {
    let mut anchorizer = Anchorizer::new();
    let mut headers = Vec::new();

    for node in root.descendants() {
        let data = node.data.borrow();
        let NodeValue::Heading(heading) = &data.value else {
            continue;
        };
        let line = data.sourcepos.start.line;
        let level = heading.level;
        drop(data);

        let mut anchor_text = String::new();
        collect_anchor_text(node, &mut anchor_text);
        let id = anchorizer.anchorize(anchor_text.clone());

        headers.push(Header {
            id,
            level,
            text: anchor_text.trim().to_string(),
            line,
        });
    }

    headers
}

// Mirrors the text comrak feeds its own anchorizer, so ids stay in sync.
fn collect_anchor_text<'a>(node: &'a AstNode<'a>, text: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(t) => text.push_str(t),
        NodeValue::Code(code) => text.push_str(&code.literal),
        NodeValue::LineBreak | NodeValue::SoftBreak => text.push(' '),
        _ => {
            for child in node.children() {
                collect_anchor_text(child, text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_extracts_headers_in_order() {
        let md = "# Title\n\nIntro\n\n## Install\n\ntext\n\n### Linux\n";
        let rendered = render_markdown(md).unwrap();

        let levels: Vec<u8> = rendered.headers.iter().map(|h| h.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
        let texts: Vec<&str> = rendered.headers.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["Title", "Install", "Linux"]);
    }

    #[test]
    fn test_render_records_source_lines() {
        let md = "# One\n\nbody\n\n## Two\n";
        let rendered = render_markdown(md).unwrap();
        assert_eq!(rendered.headers[0].line, 1);
        assert_eq!(rendered.headers[1].line, 5);
    }

    #[test]
    fn test_header_ids_appear_in_html() {
        let md = "# Getting Started\n\n## Getting Started\n";
        let rendered = render_markdown(md).unwrap();

        assert_eq!(rendered.headers[0].id, "getting-started");
        assert_eq!(rendered.headers[1].id, "getting-started-1");
        for header in &rendered.headers {
            assert!(
                rendered.html.contains(&format!("id=\"{}\"", header.id)),
                "html should contain anchor for {}",
                header.id
            );
        }
    }

    #[test]
    fn test_inline_code_in_heading_is_part_of_text() {
        let rendered = render_markdown("## The `open` call\n").unwrap();
        assert_eq!(rendered.headers[0].text, "The open call");
    }

    #[test]
    fn test_fenced_code_keeps_language_class() {
        let md = "```rust\nfn main() {}\n```\n\n```mermaid\ngraph TD; A-->B\n```\n";
        let rendered = render_markdown(md).unwrap();
        assert!(rendered.html.contains("<pre><code class=\"language-rust\">"));
        assert!(rendered.html.contains("<pre><code class=\"language-mermaid\">"));
    }

    #[test]
    fn test_document_without_headings_has_empty_header_list() {
        let rendered = render_markdown("just a paragraph").unwrap();
        assert!(rendered.headers.is_empty());
        assert!(rendered.html.contains("just a paragraph"));
    }

    #[test]
    fn test_render_empty_source() {
        let rendered = render_markdown("").unwrap();
        assert!(rendered.headers.is_empty());
    }
}
