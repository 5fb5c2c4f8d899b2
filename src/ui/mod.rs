//! Terminal UI components.
//!
//! This module contains all UI-related code including:
//! - [`viewport`]: Scroll position and visible range management
//! - [`TerminalSurface`]: The content pane the session installs documents into
//! - [`style`]: Theming and colors

pub mod style;
pub mod viewport;

mod overlays;
mod render;
mod status;
mod surface;

pub use render::{
    TabLabel, content_height, document_content_width, main_area, outline_area,
    outline_focus_row, outline_scroll_start, render, split_main_columns, tab_at_column,
    tab_labels,
};
pub use surface::TerminalSurface;

pub const DOCUMENT_LEFT_PADDING: u16 = 2;
pub const OUTLINE_WIDTH_PERCENT: u16 = 30;
pub const DOC_WIDTH_PERCENT: u16 = 70;
pub const TAB_BAR_HEIGHT: u16 = 1;
pub const STATUS_BAR_HEIGHT: u16 = 1;
/// Longest tab title before it is truncated.
pub const MAX_TAB_TITLE: usize = 24;

#[cfg(test)]
mod tests;
