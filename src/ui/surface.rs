use crate::view::layout::{TextLayout, layout_html};
use crate::view::{ContentSurface, WELCOME_HTML};

use super::viewport::Viewport;

/// Content pane of the terminal host.
///
/// Keeps the installed HTML, its terminal layout at the current width, and
/// the viewport over that layout.
#[derive(Debug, Clone)]
pub struct TerminalSurface {
    html: String,
    layout: TextLayout,
    viewport: Viewport,
    seq: u64,
    welcome: bool,
}

impl TerminalSurface {
    /// `width` and `height` are the content pane's size in cells.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            html: String::new(),
            layout: TextLayout::default(),
            viewport: Viewport::new(width, height, 0),
            seq: 0,
            welcome: false,
        }
    }

    pub const fn layout(&self) -> &TextLayout {
        &self.layout
    }

    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub const fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Resize the pane. A width change re-wraps the content and keeps the
    /// first visible line in view.
    pub fn resize(&mut self, width: u16, height: u16) {
        if width != self.viewport.width() {
            let offset = self.viewport.offset();
            let total_before = self.layout.line_count().max(1);
            self.viewport.resize(width, height);
            self.relayout();
            let total_after = self.layout.line_count();
            self.viewport.go_to_line(offset * total_after / total_before);
        } else {
            self.viewport.resize(width, height);
        }
    }

    fn relayout(&mut self) {
        let _scope = crate::perf::scope("surface.relayout");
        self.layout = layout_html(&self.html, self.viewport.width());
        self.viewport.set_total_lines(self.layout.line_count());
    }
}

impl ContentSurface for TerminalSurface {
    fn install(&mut self, html: &str) -> u64 {
        html.clone_into(&mut self.html);
        self.relayout();
        self.viewport.go_to_top();
        self.welcome = false;
        self.seq += 1;
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
        self.relayout();
    }

    fn scroll_offset(&self) -> usize {
        self.viewport.offset()
    }

    fn set_scroll_offset(&mut self, offset: usize) {
        self.viewport.go_to_line(offset);
    }

    fn header_position(&self, id: &str) -> Option<usize> {
        self.layout.anchor(id)
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
