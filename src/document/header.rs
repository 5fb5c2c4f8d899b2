use serde::{Deserialize, Serialize};

/// A heading extracted from a markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Anchor id assigned to the heading in the rendered HTML
    pub id: String,
    /// Heading level (1-6)
    pub level: u8,
    /// Heading text
    pub text: String,
    /// 1-based source line of the heading
    pub line: usize,
}

/// Output of rendering one markdown source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedFile {
    /// Semantic HTML for the document body
    pub html: String,
    /// Headers in document order
    pub headers: Vec<Header>,
}

impl RenderedFile {
    pub fn new(html: impl Into<String>, headers: Vec<Header>) -> Self {
        Self {
            html: html.into(),
            headers,
        }
    }
}
