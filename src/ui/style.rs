//! Theming and color definitions.
//!
//! Content lines use semantic ANSI colors that follow the terminal's
//! palette; highlighted code carries its own RGB colors, downsampled to the
//! 256-color cube when the terminal lacks truecolor.

use ratatui::style::{Color, Modifier, Style};

use crate::view::layout::{InlineColor, InlineStyle, LineType};

/// Base style for a laid-out content line.
pub fn style_for_line_type(line_type: LineType) -> Style {
    let light_bg = crate::highlight::is_light_background();
    let pick = |light: u8, dark: Color| {
        if light_bg { Color::Indexed(light) } else { dark }
    };
    match line_type {
        LineType::Heading(1) => Style::default()
            .fg(pick(24, Color::Cyan))
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        LineType::Heading(2) => Style::default()
            .fg(pick(22, Color::Green))
            .add_modifier(Modifier::BOLD),
        LineType::Heading(3) => Style::default()
            .fg(pick(58, Color::Yellow))
            .add_modifier(Modifier::BOLD),
        LineType::Heading(4) => Style::default()
            .fg(pick(24, Color::Blue))
            .add_modifier(Modifier::BOLD),
        LineType::Heading(5) => Style::default()
            .fg(pick(54, Color::Magenta))
            .add_modifier(Modifier::BOLD),
        LineType::Heading(_) => Style::default()
            .fg(pick(24, Color::Cyan))
            .add_modifier(Modifier::BOLD),

        // Unhighlighted code is dimmed; highlighted spans override the color.
        LineType::CodeBlock => Style::default()
            .fg(pick(238, Color::Indexed(245)))
            .add_modifier(Modifier::DIM),

        LineType::BlockQuote => Style::default()
            .fg(pick(24, Color::Blue))
            .add_modifier(Modifier::ITALIC),

        LineType::HorizontalRule => Style::default()
            .fg(pick(241, Color::Indexed(240)))
            .add_modifier(Modifier::DIM),

        LineType::Diagram => Style::default()
            .fg(pick(90, Color::Magenta))
            .add_modifier(Modifier::ITALIC),

        LineType::ListItem(_) | LineType::Table | LineType::Paragraph | LineType::Empty => {
            Style::default()
        }
    }
}

/// Merge an inline span's style onto its line's base style.
pub fn style_for_inline(base: Style, inline: InlineStyle) -> Style {
    let mut style = base;

    if let Some(fg) = inline.fg {
        style = style
            .fg(fg_color_for_terminal(fg))
            .remove_modifier(Modifier::DIM);
    }
    if inline.emphasis {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if inline.strong {
        style = style.add_modifier(Modifier::BOLD);
    }
    if inline.strikethrough {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    if inline.link {
        style = style.add_modifier(Modifier::UNDERLINED);
        if inline.fg.is_none() {
            let light_bg = crate::highlight::is_light_background();
            style = style.fg(if light_bg {
                Color::Blue
            } else {
                Color::LightBlue
            });
        }
    }
    if inline.code && inline.fg.is_none() {
        let light_bg = crate::highlight::is_light_background();
        style = style
            .fg(if light_bg {
                Color::Indexed(88)
            } else {
                Color::Red
            })
            .add_modifier(Modifier::BOLD);
    }

    style
}

fn fg_color_for_terminal(fg: InlineColor) -> Color {
    if supports_truecolor() {
        Color::Rgb(fg.r, fg.g, fg.b)
    } else {
        Color::Indexed(rgb_to_xterm_256(fg.r, fg.g, fg.b))
    }
}

fn supports_truecolor() -> bool {
    if let Ok(force) = std::env::var("MKREADER_TRUECOLOR") {
        let value = force.to_ascii_lowercase();
        return matches!(value.as_str(), "1" | "true" | "yes" | "on");
    }
    supports_truecolor_from_env(
        std::env::var("COLORTERM").ok().as_deref(),
        std::env::var("TERM").ok().as_deref(),
    )
}

fn supports_truecolor_from_env(colorterm: Option<&str>, term: Option<&str>) -> bool {
    let mentions = |value: Option<&str>, needles: &[&str]| {
        value.is_some_and(|v| {
            let lower = v.to_ascii_lowercase();
            needles.iter().any(|needle| lower.contains(needle))
        })
    };
    mentions(colorterm, &["truecolor", "24bit"]) || mentions(term, &["direct", "truecolor"])
}

fn rgb_to_xterm_256(r: u8, g: u8, b: u8) -> u8 {
    // Each component maps to 0..=5.
    #[allow(clippy::cast_possible_truncation)]
    let to_cube = |v: u8| ((u16::from(v) * 5) / 255) as u8;
    16 + (36 * to_cube(r)) + (6 * to_cube(g)) + to_cube(b)
}

/// Colors for the host chrome: tab bar, outline and status line.
#[derive(Debug, Clone)]
pub struct Theme {
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub tab_bar: Style,
    pub modified_marker: Style,
    pub outline_border: Style,
    pub outline_border_focused: Style,
    pub outline_active: Style,
    pub outline_selected: Style,
    pub placeholder: Style,
    pub status: Style,
    pub prompt: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Pick the palette for the current background.
    pub fn current() -> Self {
        if crate::highlight::is_light_background() {
            Self::light()
        } else {
            Self::dark()
        }
    }

    pub fn dark() -> Self {
        Self {
            tab_active: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Indexed(250)).bg(Color::Indexed(236)),
            tab_bar: Style::default().bg(Color::Indexed(234)),
            modified_marker: Style::default().fg(Color::Yellow),
            outline_border: Style::default(),
            outline_border_focused: Style::default().fg(Color::Yellow),
            outline_active: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            outline_selected: Style::default().add_modifier(Modifier::REVERSED),
            placeholder: Style::default()
                .fg(Color::Indexed(245))
                .add_modifier(Modifier::ITALIC),
            status: Style::default().bg(Color::DarkGray).fg(Color::White),
            prompt: Style::default().bg(Color::Blue).fg(Color::White),
        }
    }

    pub fn light() -> Self {
        Self {
            tab_active: Style::default()
                .fg(Color::White)
                .bg(Color::Indexed(31))
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Indexed(235)).bg(Color::Indexed(252)),
            tab_bar: Style::default().bg(Color::Indexed(254)),
            modified_marker: Style::default().fg(Color::Indexed(136)),
            outline_border: Style::default(),
            outline_border_focused: Style::default().fg(Color::Indexed(136)),
            outline_active: Style::default()
                .fg(Color::Indexed(25))
                .add_modifier(Modifier::BOLD),
            outline_selected: Style::default().add_modifier(Modifier::REVERSED),
            placeholder: Style::default()
                .fg(Color::Indexed(241))
                .add_modifier(Modifier::ITALIC),
            status: Style::default().bg(Color::Indexed(252)).fg(Color::Indexed(235)),
            prompt: Style::default().bg(Color::Indexed(25)).fg(Color::White),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_styles_are_bold() {
        for level in 1..=6 {
            let style = style_for_line_type(LineType::Heading(level));
            assert!(style.add_modifier.contains(Modifier::BOLD));
        }
        let h1 = style_for_line_type(LineType::Heading(1));
        assert!(h1.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_diagram_placeholder_is_italic() {
        let style = style_for_line_type(LineType::Diagram);
        assert!(style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_inline_color_removes_dim_modifier() {
        let base = style_for_line_type(LineType::CodeBlock);
        let inline = InlineStyle {
            fg: Some(InlineColor { r: 255, g: 0, b: 0 }),
            ..InlineStyle::default()
        };
        let styled = style_for_inline(base, inline);
        assert!(!styled.add_modifier.contains(Modifier::DIM));
        assert!(styled.fg.is_some());
    }

    #[test]
    fn test_inline_flags_add_modifiers() {
        let inline = InlineStyle {
            emphasis: true,
            strong: true,
            strikethrough: true,
            link: true,
            ..InlineStyle::default()
        };
        let styled = style_for_inline(Style::default(), inline);
        for modifier in [
            Modifier::ITALIC,
            Modifier::BOLD,
            Modifier::CROSSED_OUT,
            Modifier::UNDERLINED,
        ] {
            assert!(styled.add_modifier.contains(modifier));
        }
    }

    #[test]
    fn test_truecolor_detection() {
        assert!(!supports_truecolor_from_env(None, Some("xterm-256color")));
        assert!(supports_truecolor_from_env(Some("truecolor"), Some("xterm-256color")));
        assert!(supports_truecolor_from_env(None, Some("xterm-direct")));
    }

    #[test]
    fn test_fallback_indexed_color_when_not_truecolor() {
        assert_eq!(rgb_to_xterm_256(255, 0, 0), 196);
        assert_eq!(rgb_to_xterm_256(0, 0, 0), 16);
    }

    #[test]
    fn test_active_tab_differs_from_inactive() {
        for theme in [Theme::dark(), Theme::light()] {
            assert_ne!(theme.tab_active, theme.tab_inactive);
        }
    }
}
