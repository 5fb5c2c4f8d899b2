use super::{ContentSurface, WELCOME_HTML};

/// A [`ContentSurface`] that keeps the HTML in memory.
///
/// Positions are line numbers in the HTML text: an element's position is the
/// number of newlines before its `id` attribute.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    html: String,
    seq: u64,
    scroll: usize,
    welcome: bool,
    replacements: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times a render pass rewrote the content.
    pub const fn replacements(&self) -> usize {
        self.replacements
    }

    fn line_count(&self) -> usize {
        self.html.lines().count()
    }
}

impl ContentSurface for MemorySurface {
    fn install(&mut self, html: &str) -> u64 {
        self.html = html.to_string();
        self.seq += 1;
        self.scroll = 0;
        self.welcome = false;
        self.seq
    }

    fn install_seq(&self) -> u64 {
        self.seq
    }

    fn html(&self) -> &str {
        &self.html
    }

    fn replace(&mut self, html: String) {
        self.html = html;
        self.replacements += 1;
    }

    fn scroll_offset(&self) -> usize {
        self.scroll
    }

    fn set_scroll_offset(&mut self, offset: usize) {
        self.scroll = offset.min(self.line_count().saturating_sub(1));
    }

    fn header_position(&self, id: &str) -> Option<usize> {
        let needle = format!("id=\"{id}\"");
        let pos = self.html.find(&needle)?;
        Some(self.html[..pos].matches('\n').count())
    }

    fn show_welcome(&mut self) -> u64 {
        let seq = self.install(WELCOME_HTML);
        self.welcome = true;
        seq
    }

    fn is_welcome(&self) -> bool {
        self.welcome
    }
}
