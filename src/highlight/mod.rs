//! Syntax highlighting for code blocks.
//!
//! Uses syntect for highlighting with Sublime Text syntax definitions. The
//! highlight pass rewrites fenced code blocks in rendered HTML into colored
//! spans; mermaid blocks are left for the diagram pass.

use std::fmt::Write as _;
use std::sync::{LazyLock, Mutex, OnceLock};

use regex::{Captures, Regex};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::document::{escape_html, unescape_html};
use crate::pipeline::{PassOutput, RenderPass};

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<pre><code(?: class="language-([^"]+)")?>(.*?)</code></pre>"#)
        .expect("valid code block regex")
});

/// Content patterns for fences without a language, checked in order.
static LANGUAGE_HINTS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?m)^\s*function\s+\w+\s*\(", "javascript"),
        (r"(?m)^\s*def\s+\w+\s*\(", "python"),
        (r"(?m)^\s*public\s+class\s+\w+", "java"),
        (r"(?m)^\s*#include\s*<", "cpp"),
        (r"(?m)^\s*using\s+System", "cs"),
        (r"(?m)^\s*package\s+main", "go"),
        (r"(?m)^\s*fn\s+main\(\)", "rust"),
        (r"(?m)^\s*<\?php", "php"),
        (r"(?i)<!DOCTYPE\s+html>", "html"),
        (r"(?i)^\s*<\?xml", "xml"),
        (r"(?im)^\s*SELECT\s+.+FROM", "sql"),
        (r"(?s)^\s*\{.*\}\s*$", "json"),
    ]
    .into_iter()
    .map(|(pattern, language)| {
        (
            Regex::new(pattern).expect("valid language hint regex"),
            language,
        )
    })
    .collect()
});

/// Render pass that syntax-highlights fenced code blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighlightPass;

impl RenderPass for HighlightPass {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn apply(&self, html: &str) -> PassOutput {
        let mut rendered = 0;
        let html = CODE_BLOCK.replace_all(html, |caps: &Captures<'_>| {
            let code = unescape_html(&caps[2]);
            let language = match caps.get(1) {
                Some(m) if m.as_str() == "mermaid" => return caps[0].to_string(),
                Some(m) => m.as_str().to_string(),
                None => match detect_language(&code) {
                    Some(language) => language,
                    None => return caps[0].to_string(),
                },
            };
            rendered += 1;
            format!(
                "<pre class=\"highlighted\" data-language=\"{}\"><code>{}</code></pre>",
                escape_html(&language),
                highlight_to_html(Some(&language), &code)
            )
        });

        if rendered == 0 {
            return PassOutput::unchanged();
        }
        PassOutput {
            html: Some(html.into_owned()),
            rendered,
            failed: 0,
        }
    }
}

/// Highlight `code` into HTML spans with inline foreground colors.
///
/// Unknown languages and lines the highlighter rejects come back as escaped
/// plain text.
pub fn highlight_to_html(language: Option<&str>, code: &str) -> String {
    let _scope = crate::perf::scope("highlight.to_html");
    let syntax_set = syntax_set();
    let mode = background_mode();
    let syntax = language
        .and_then(|lang| syntax_set.find_syntax_by_token(lang))
        .or_else(|| language.and_then(|lang| syntax_set.find_syntax_by_name(lang)));

    let Some(syntax) = syntax else {
        return escape_html(code);
    };

    let mut out = String::with_capacity(code.len() * 4);
    let mut highlighter = HighlightLines::new(syntax, theme());
    for line in LinesWithEndings::from(code) {
        let Ok(ranges) = highlighter.highlight_line(line, syntax_set) else {
            out.push_str(&escape_html(line));
            continue;
        };
        for (style, text) in ranges {
            let fg = adjust_fg_for_background(
                Rgb {
                    r: style.foreground.r,
                    g: style.foreground.g,
                    b: style.foreground.b,
                },
                mode,
            );
            let _ = write!(
                out,
                "<span style=\"color:#{:02x}{:02x}{:02x}\">{}</span>",
                fg.r,
                fg.g,
                fg.b,
                escape_html(text)
            );
        }
    }
    out
}

/// Guess the language of an unlabeled code block.
///
/// Shebangs and other first-line markers syntect knows win; otherwise the
/// content is matched against common openings. Returns a token
/// [`highlight_to_html`] accepts.
pub fn detect_language(code: &str) -> Option<String> {
    let syntax_set = syntax_set();
    let first_line = code.lines().next().unwrap_or_default();
    if let Some(syntax) = syntax_set.find_syntax_by_first_line(first_line) {
        return Some(
            syntax
                .file_extensions
                .first()
                .cloned()
                .unwrap_or_else(|| syntax.name.to_lowercase()),
        );
    }
    LANGUAGE_HINTS
        .iter()
        .find(|(pattern, language)| {
            pattern.is_match(code) && syntax_set.find_syntax_by_token(language).is_some()
        })
        .map(|(_, language)| (*language).to_string())
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

fn theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.theme.load_defaults");
        let theme_set = ThemeSet::load_defaults();
        let preferred = match background_mode() {
            BackgroundMode::Dark => [
                "Monokai Extended",
                "Monokai Extended Bright",
                "Dracula",
                "Solarized (dark)",
                "base16-ocean.dark",
            ]
            .as_slice(),
            BackgroundMode::Light => [
                "InspiredGitHub",
                "Solarized (light)",
                "base16-ocean.light",
            ]
            .as_slice(),
        };

        for name in preferred {
            if let Some(theme) = theme_set.themes.get(*name) {
                return theme.clone();
            }
        }

        theme_set
            .themes
            .values()
            .next()
            .cloned()
            .unwrap_or_default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rgb {
    r: u8,
    g: u8,
    b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackgroundMode {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightBackground {
    Light,
    Dark,
}

static BACKGROUND_OVERRIDE: Mutex<Option<HighlightBackground>> = Mutex::new(None);

/// Force the light/dark palette instead of reading `COLORFGBG`.
pub fn set_background_mode(mode: Option<HighlightBackground>) {
    let mut guard = BACKGROUND_OVERRIDE
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    *guard = mode;
}

fn background_mode() -> BackgroundMode {
    if let Ok(guard) = BACKGROUND_OVERRIDE.lock()
        && let Some(mode) = *guard
    {
        return match mode {
            HighlightBackground::Light => BackgroundMode::Light,
            HighlightBackground::Dark => BackgroundMode::Dark,
        };
    }
    background_mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

/// True when the terminal (or the forced theme) has a light background.
pub fn is_light_background() -> bool {
    background_mode() == BackgroundMode::Light
}

fn background_mode_from_colorfgbg(colorfgbg: Option<&str>) -> BackgroundMode {
    let Some(value) = colorfgbg else {
        return BackgroundMode::Dark;
    };
    let bg_str = value.rsplit(';').next().unwrap_or(value);
    let Ok(bg) = bg_str.parse::<u8>() else {
        return BackgroundMode::Dark;
    };

    if bg >= 7 {
        BackgroundMode::Light
    } else {
        BackgroundMode::Dark
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn adjust_fg_for_background(color: Rgb, mode: BackgroundMode) -> Rgb {
    match mode {
        BackgroundMode::Dark => color,
        BackgroundMode::Light => {
            let luma = 0.0722f32.mul_add(
                f32::from(color.b),
                0.2126f32.mul_add(f32::from(color.r), 0.7152 * f32::from(color.g)),
            );
            if luma < 155.0 {
                return color;
            }

            Rgb {
                r: (f32::from(color.r) * 0.42).round() as u8,
                g: (f32::from(color.g) * 0.42).round() as u8,
                b: (f32::from(color.b) * 0.42).round() as u8,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_rust_produces_colored_spans() {
        let code = "fn main() {\n    let x = 1;\n}\n";
        let html = highlight_to_html(Some("rust"), code);
        assert!(html.contains("<span style=\"color:#"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_highlight_unknown_language_falls_back_to_plain() {
        let html = highlight_to_html(Some("nope"), "a < b");
        assert_eq!(html, "a &lt; b");
    }

    #[test]
    fn test_pass_rewrites_fenced_code() {
        let html = "<pre><code class=\"language-rust\">let s = &quot;x&quot;;\n</code></pre>";
        let output = HighlightPass.apply(html);
        let html = output.html.unwrap();
        assert_eq!(output.rendered, 1);
        assert!(html.starts_with("<pre class=\"highlighted\" data-language=\"rust\"><code>"));
        assert!(html.contains("&quot;"), "text must stay escaped");
    }

    #[test]
    fn test_unlabeled_block_uses_detected_language() {
        let html = "<pre><code>fn main() {\n    println!(&quot;hi&quot;);\n}\n</code></pre>";
        let output = HighlightPass.apply(html);
        assert_eq!(output.rendered, 1);
        let html = output.html.unwrap();
        assert!(html.starts_with("<pre class=\"highlighted\" data-language=\"rust\"><code>"));
        assert!(html.contains("<span style=\"color:#"));
    }

    #[test]
    fn test_unlabeled_plain_text_is_left_alone() {
        let html = "<pre><code>just some words\n</code></pre>";
        assert_eq!(HighlightPass.apply(html), PassOutput::unchanged());
    }

    #[test]
    fn test_detect_language_from_shebang_and_content() {
        assert!(detect_language("#!/bin/bash\necho hi\n").is_some());
        assert_eq!(
            detect_language("def greet(name):\n    return name\n").as_deref(),
            Some("python")
        );
        assert_eq!(detect_language("{\n  \"a\": 1\n}\n").as_deref(), Some("json"));
        assert_eq!(detect_language("hello there"), None);
    }

    #[test]
    fn test_pass_leaves_mermaid_blocks() {
        let html = "<pre><code class=\"language-mermaid\">graph TD; A</code></pre>";
        assert_eq!(HighlightPass.apply(html), PassOutput::unchanged());
    }

    #[test]
    fn test_pass_without_code_blocks_is_noop() {
        assert_eq!(HighlightPass.apply("<p>text</p>"), PassOutput::unchanged());
        assert_eq!(HighlightPass.apply(""), PassOutput::unchanged());
    }

    #[test]
    fn test_pass_is_idempotent() {
        let html = "<pre><code class=\"language-python\">print(1)\n</code></pre>";
        let once = HighlightPass.apply(html).html.unwrap();
        assert_eq!(HighlightPass.apply(&once), PassOutput::unchanged());
    }

    #[test]
    fn test_colorfgbg_dark_background() {
        let mode = background_mode_from_colorfgbg(Some("15;0"));
        assert_eq!(mode, BackgroundMode::Dark);
    }

    #[test]
    fn test_colorfgbg_light_background() {
        let mode = background_mode_from_colorfgbg(Some("0;15"));
        assert_eq!(mode, BackgroundMode::Light);
    }

    #[test]
    fn test_background_override() {
        set_background_mode(Some(HighlightBackground::Light));
        assert_eq!(background_mode(), BackgroundMode::Light);
        set_background_mode(Some(HighlightBackground::Dark));
        assert_eq!(background_mode(), BackgroundMode::Dark);
        set_background_mode(None);
    }

    #[test]
    fn test_light_mode_darkens_bright_fg() {
        let bright = Rgb {
            r: 240,
            g: 230,
            b: 120,
        };
        let adjusted = adjust_fg_for_background(bright, BackgroundMode::Light);
        assert!(adjusted.r < bright.r);
        assert!(adjusted.g < bright.g);
        assert!(adjusted.b < bright.b);
    }
}
