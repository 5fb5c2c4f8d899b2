//! Mermaid diagram rendering.
//!
//! The diagram pass finds fenced `mermaid` blocks in rendered HTML and swaps
//! each for an inline SVG produced by `mermaid-rs-renderer`. A block that
//! fails to render is replaced by an error box carrying its source; the
//! other blocks are unaffected.

use std::sync::LazyLock;

use anyhow::Result;
use regex::{Captures, Regex};

use crate::document::{escape_html, unescape_html};
use crate::pipeline::{PassOutput, RenderPass};

static MERMAID_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<pre><code class="language-mermaid">(.*?)</code></pre>"#)
        .expect("valid mermaid block regex")
});

/// Turns diagram source into an SVG document.
pub trait DiagramRenderer {
    /// # Errors
    /// Returns an error if the source cannot be parsed or laid out.
    fn render_svg(&self, source: &str) -> Result<String>;
}

/// [`DiagramRenderer`] backed by `mermaid-rs-renderer`.
#[cfg(feature = "mermaid")]
#[derive(Debug, Default, Clone, Copy)]
pub struct MermaidRenderer;

#[cfg(feature = "mermaid")]
impl DiagramRenderer for MermaidRenderer {
    fn render_svg(&self, source: &str) -> Result<String> {
        render_to_svg(source)
    }
}

/// Render a mermaid diagram to an SVG string.
///
/// Generates SVG via `mermaid-rs-renderer` and fixes font-family quoting
/// so the result can be embedded in HTML. Panics inside the renderer are
/// reported as errors.
///
/// # Errors
///
/// Returns an error if the mermaid source cannot be parsed.
#[cfg(feature = "mermaid")]
pub fn render_to_svg(mermaid_source: &str) -> Result<String> {
    let _scope = crate::perf::scope("mermaid.render_to_svg");
    let rendered = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        mermaid_rs_renderer::render(mermaid_source)
    }));
    match rendered {
        Ok(result) => {
            let svg = result?;
            Ok(fix_svg_font_families(&svg))
        }
        Err(_) => anyhow::bail!("mermaid renderer panicked"),
    }
}

/// Render pass that replaces mermaid code blocks with diagrams.
pub struct DiagramPass {
    renderer: Box<dyn DiagramRenderer>,
}

impl std::fmt::Debug for DiagramPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramPass").finish_non_exhaustive()
    }
}

impl DiagramPass {
    pub fn new(renderer: impl DiagramRenderer + 'static) -> Self {
        Self {
            renderer: Box::new(renderer),
        }
    }

    /// The built-in mermaid pass, when the `mermaid` feature is enabled.
    pub fn standard() -> Option<Self> {
        #[cfg(feature = "mermaid")]
        {
            Some(Self::new(MermaidRenderer))
        }
        #[cfg(not(feature = "mermaid"))]
        {
            None
        }
    }
}

impl RenderPass for DiagramPass {
    fn name(&self) -> &'static str {
        "diagrams"
    }

    fn apply(&self, html: &str) -> PassOutput {
        if !MERMAID_BLOCK.is_match(html) {
            return PassOutput::unchanged();
        }

        let mut rendered = 0;
        let mut failed = 0;
        let html = MERMAID_BLOCK.replace_all(html, |caps: &Captures<'_>| {
            let source = unescape_html(&caps[1]);
            match self.renderer.render_svg(&source) {
                Ok(svg) => {
                    rendered += 1;
                    format!(
                        "<div class=\"mermaid-container\" data-diagram=\"{rendered}\">{svg}</div>"
                    )
                }
                Err(err) => {
                    failed += 1;
                    tracing::debug!(error = %err, "diagram block failed to render");
                    error_block(&format!("{err:#}"), &source)
                }
            }
        });

        PassOutput {
            html: Some(html.into_owned()),
            rendered,
            failed,
        }
    }
}

fn error_block(message: &str, source: &str) -> String {
    format!(
        "<div class=\"mermaid-error\"><p>Diagram error: {}</p><pre class=\"mermaid-source\"><code>{}</code></pre></div>",
        escape_html(message),
        escape_html(source)
    )
}

/// Fix unescaped double quotes inside font-family attributes.
///
/// `mermaid-rs-renderer` emits font-family values like:
///   `font-family="Inter, ... "Segoe UI", sans-serif"`
/// The inner `"Segoe UI"` breaks attribute parsing, so inner double quotes
/// become single quotes.
fn fix_svg_font_families(svg: &str) -> String {
    const MARKER: &str = "font-family=\"";
    let mut result = String::with_capacity(svg.len());
    let mut rest = svg;

    while let Some(pos) = rest.find(MARKER) {
        result.push_str(&rest[..pos + MARKER.len()]);
        rest = &rest[pos + MARKER.len()..];

        // The closing quote is a `"` followed by `>`, ` `, `/`, or end.
        let mut value = String::new();
        let mut end_offset = rest.len();
        for (i, ch) in rest.char_indices() {
            if ch == '"' {
                let after = rest.get(i + 1..i + 2).unwrap_or("");
                if after.is_empty()
                    || after.starts_with('>')
                    || after.starts_with(' ')
                    || after.starts_with('/')
                {
                    result.push_str(&value.replace('"', "'"));
                    result.push('"');
                    end_offset = i + 1;
                    break;
                }
                value.push('"');
            } else {
                value.push(ch);
            }
        }
        rest = &rest[end_offset..];
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeRenderer;

    impl DiagramRenderer for FakeRenderer {
        fn render_svg(&self, source: &str) -> Result<String> {
            if source.contains("broken") {
                anyhow::bail!("parse error near 'broken'");
            }
            Ok(format!("<svg><text>{}</text></svg>", source.trim()))
        }
    }

    #[test]
    fn test_fix_svg_font_families_replaces_inner_quotes() {
        let input = r#"<text font-family="Inter, "Segoe UI", sans-serif" font-size="14">"#;
        let fixed = fix_svg_font_families(input);
        assert_eq!(
            fixed,
            r#"<text font-family="Inter, 'Segoe UI', sans-serif" font-size="14">"#
        );
    }

    #[test]
    fn test_fix_svg_font_families_no_op_when_clean() {
        let input = r#"<text font-family="Inter, sans-serif" font-size="14">"#;
        let fixed = fix_svg_font_families(input);
        assert_eq!(fixed, input);
    }

    #[test]
    fn test_pass_replaces_mermaid_blocks() {
        let html = "<p>x</p>\n<pre><code class=\"language-mermaid\">graph TD; A--&gt;B\n</code></pre>\n";
        let output = DiagramPass::new(FakeRenderer).apply(html);

        let html = output.html.unwrap();
        assert_eq!(output.rendered, 1);
        assert!(html.contains("<div class=\"mermaid-container\" data-diagram=\"1\">"));
        assert!(html.contains("graph TD; A-->B"), "source should be unescaped");
        assert!(!html.contains("language-mermaid"));
    }

    #[test]
    fn test_failed_block_does_not_affect_others() {
        let html = concat!(
            "<pre><code class=\"language-mermaid\">broken</code></pre>\n",
            "<pre><code class=\"language-mermaid\">graph LR; A--&gt;B</code></pre>\n",
        );
        let output = DiagramPass::new(FakeRenderer).apply(html);
        let html = output.html.unwrap();

        assert_eq!(output.rendered, 1);
        assert_eq!(output.failed, 1);
        assert!(html.contains("mermaid-error"));
        assert!(html.contains("<pre class=\"mermaid-source\"><code>broken</code></pre>"));
        assert!(html.contains("mermaid-container"));
    }

    #[test]
    fn test_pass_ignores_other_code_blocks() {
        let html = "<pre><code class=\"language-rust\">fn main() {}</code></pre>";
        let output = DiagramPass::new(FakeRenderer).apply(html);
        assert_eq!(output, PassOutput::unchanged());
    }

    #[test]
    fn test_pass_is_idempotent() {
        let html = "<pre><code class=\"language-mermaid\">graph TD; A</code></pre>";
        let pass = DiagramPass::new(FakeRenderer);
        let once = pass.apply(html).html.unwrap();
        assert_eq!(pass.apply(&once), PassOutput::unchanged());
    }

    #[cfg(feature = "mermaid")]
    #[test]
    fn test_render_to_svg_returns_valid_svg() {
        let source = "flowchart LR\n    A[Start] --> B[End]";
        let svg = render_to_svg(source).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }
}
