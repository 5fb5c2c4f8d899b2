//! View binding for the content container.
//!
//! The session drives a [`ContentSurface`]: it installs a document's HTML,
//! lets render passes rewrite it in place, and saves and restores scroll
//! offsets. Hosts implement the trait for whatever actually draws the
//! content; [`MemorySurface`] keeps everything in memory for tests and
//! headless runs, and [`layout`] turns HTML into terminal lines.

pub mod layout;
mod memory;

pub use memory::MemorySurface;

/// Content shown when no document is active.
pub const WELCOME_HTML: &str = "<h1 id=\"welcome\">Welcome to MKReader</h1>\n\
<p>Open a Markdown file with Ctrl+O, or pass one or more paths on the command line.</p>\n\
<ul>\n\
<li>Ctrl+T or Ctrl+O opens a file in a new tab</li>\n\
<li>Ctrl+W closes the current tab</li>\n\
<li>Ctrl+Tab and Ctrl+Shift+Tab cycle through tabs</li>\n\
<li>Ctrl+1 to Ctrl+9 jump to a tab by position</li>\n\
<li>Ctrl+\\ shows or hides the outline</li>\n\
</ul>\n";

/// The on-screen content container owned by the active document.
pub trait ContentSurface {
    /// Replace the content with a new document's HTML and scroll to the
    /// top. Returns the new install sequence number.
    fn install(&mut self, html: &str) -> u64;

    /// Sequence number of the last [`install`] or [`show_welcome`].
    ///
    /// [`install`]: ContentSurface::install
    /// [`show_welcome`]: ContentSurface::show_welcome
    fn install_seq(&self) -> u64;

    /// HTML currently displayed.
    fn html(&self) -> &str;

    /// Swap in a render pass's rewrite of the current content. Keeps the
    /// install sequence and the scroll offset.
    fn replace(&mut self, html: String);

    fn scroll_offset(&self) -> usize;

    fn set_scroll_offset(&mut self, offset: usize);

    /// Rendered position of the element with `id`, in the same units as
    /// the scroll offset.
    fn header_position(&self, id: &str) -> Option<usize>;

    /// Install the welcome page.
    fn show_welcome(&mut self) -> u64;

    fn is_welcome(&self) -> bool;
}
