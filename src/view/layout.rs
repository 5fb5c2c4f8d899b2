//! HTML to terminal line layout.
//!
//! Walks the HTML produced by the render pipeline and lays it out as styled,
//! word-wrapped lines. Element ids are recorded as anchors so headers can be
//! located by line.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use unicode_width::UnicodeWidthStr;

use crate::document::unescape_html;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<!--.*?-->|<(/?)([a-zA-Z][a-zA-Z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>|[^<]+|<"#)
        .expect("valid html token regex")
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_:][a-zA-Z0-9_:.-]*)(?:\s*=\s*"([^"]*)")?"#).expect("valid attribute regex")
});

static COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"color:\s*#([0-9a-fA-F]{6})").expect("valid color regex")
});

const MIN_WIDTH: usize = 20;
const DIAGRAM_PLACEHOLDER: &str = "[diagram]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub fg: Option<InlineColor>,
    pub emphasis: bool,
    pub strong: bool,
    pub strikethrough: bool,
    pub code: bool,
    pub link: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    text: String,
    style: InlineStyle,
}

impl InlineSpan {
    pub const fn new(text: String, style: InlineStyle) -> Self {
        Self { text, style }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn style(&self) -> InlineStyle {
        self.style
    }
}

/// Block kind a line belongs to; drives the base style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Heading(u8),
    Paragraph,
    /// List item at the given nesting depth (0 = top level)
    ListItem(usize),
    CodeBlock,
    BlockQuote,
    Table,
    HorizontalRule,
    Diagram,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    spans: Vec<InlineSpan>,
    line_type: LineType,
}

impl RenderedLine {
    pub const fn new(spans: Vec<InlineSpan>, line_type: LineType) -> Self {
        Self { spans, line_type }
    }

    pub fn spans(&self) -> &[InlineSpan] {
        &self.spans
    }

    pub const fn line_type(&self) -> LineType {
        self.line_type
    }

    /// Plain text of the line.
    pub fn text(&self) -> String {
        self.spans.iter().map(InlineSpan::text).collect()
    }
}

/// Laid-out document: lines plus anchor id → line index.
#[derive(Debug, Clone, Default)]
pub struct TextLayout {
    lines: Vec<RenderedLine>,
    anchors: HashMap<String, usize>,
}

impl TextLayout {
    pub fn lines(&self) -> &[RenderedLine] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn anchor(&self, id: &str) -> Option<usize> {
        self.anchors.get(id).copied()
    }
}

/// Lay out `html` for a terminal `width` columns wide.
pub fn layout_html(html: &str, width: u16) -> TextLayout {
    let _scope = crate::perf::scope("view.layout_html");
    let mut builder = LayoutBuilder::new(usize::from(width).max(MIN_WIDTH));

    for caps in TOKEN.captures_iter(html) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let token = whole.as_str();
        if token.starts_with("<!--") {
            continue;
        }
        if let Some(name) = caps.get(2) {
            let name = name.as_str().to_ascii_lowercase();
            let attrs = caps.get(3).map_or("", |m| m.as_str());
            if caps.get(1).is_some_and(|m| !m.as_str().is_empty()) {
                builder.close_tag(&name);
            } else {
                let self_closing = attrs.trim_end().ends_with('/');
                builder.open_tag(&name, attrs, self_closing);
            }
        } else {
            builder.push_text(&unescape_html(token));
        }
    }

    builder.finish()
}

fn attr(attrs: &str, name: &str) -> Option<String> {
    ATTR.captures_iter(attrs).find_map(|caps| {
        (caps.get(1)?.as_str() == name)
            .then(|| caps.get(2).map_or_else(String::new, |v| unescape_html(v.as_str())))
    })
}

fn parse_color(style: &str) -> Option<InlineColor> {
    let hex = COLOR.captures(style)?.get(1)?.as_str();
    let value = u32::from_str_radix(hex, 16).ok()?;
    let [_, r, g, b] = value.to_be_bytes();
    Some(InlineColor { r, g, b })
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() && ch != '\u{a0}' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

fn push_span(spans: &mut Vec<InlineSpan>, text: &str, style: InlineStyle) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = spans.last_mut()
        && last.style == style
    {
        last.text.push_str(text);
        return;
    }
    spans.push(InlineSpan::new(text.to_string(), style));
}

/// Greedy word wrap over styled spans.
fn wrap_spans(spans: Vec<InlineSpan>, width: usize) -> Vec<Vec<InlineSpan>> {
    let mut lines: Vec<Vec<InlineSpan>> = vec![Vec::new()];
    let mut col = 0;
    for span in spans {
        for token in span.text.split_inclusive(' ') {
            let word_width = token.trim_end_matches(' ').width();
            if col > 0 && col + word_width > width {
                trim_line_end(lines.last_mut());
                lines.push(Vec::new());
                col = 0;
            }
            if col == 0 && token.trim().is_empty() {
                continue;
            }
            if let Some(line) = lines.last_mut() {
                push_span(line, token, span.style);
            }
            col += token.width();
        }
    }
    trim_line_end(lines.last_mut());
    lines
}

fn trim_line_end(line: Option<&mut Vec<InlineSpan>>) {
    let Some(line) = line else {
        return;
    };
    if let Some(last) = line.last_mut() {
        let trimmed = last.text.trim_end_matches(' ').len();
        last.text.truncate(trimmed);
        if last.text.is_empty() {
            line.pop();
        }
    }
}

#[derive(Debug, Default)]
struct LayoutBuilder {
    width: usize,
    lines: Vec<RenderedLine>,
    anchors: HashMap<String, usize>,
    current: Vec<InlineSpan>,
    heading: Option<u8>,
    pre: bool,
    table: bool,
    row_cells: usize,
    quote_depth: usize,
    lists: Vec<Option<usize>>,
    marker: Option<String>,
    svg_depth: usize,
    emphasis: usize,
    strong: usize,
    strike: usize,
    code: usize,
    link: usize,
    colors: Vec<Option<InlineColor>>,
}

impl LayoutBuilder {
    fn new(width: usize) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    fn style(&self) -> InlineStyle {
        InlineStyle {
            fg: self.colors.iter().rev().find_map(|c| *c),
            emphasis: self.emphasis > 0,
            strong: self.strong > 0,
            strikethrough: self.strike > 0,
            code: self.code > 0,
            link: self.link > 0,
        }
    }

    fn line_type(&self) -> LineType {
        if let Some(level) = self.heading {
            LineType::Heading(level)
        } else if self.pre {
            LineType::CodeBlock
        } else if self.table {
            LineType::Table
        } else if !self.lists.is_empty() {
            LineType::ListItem(self.lists.len() - 1)
        } else if self.quote_depth > 0 {
            LineType::BlockQuote
        } else {
            LineType::Paragraph
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.svg_depth > 0 {
            return;
        }
        let style = self.style();
        if self.pre {
            for (i, part) in text.split('\n').enumerate() {
                if i > 0 {
                    self.flush_unwrapped(true);
                }
                push_span(&mut self.current, part, style);
            }
            return;
        }

        let collapsed = collapse_whitespace(text);
        let text = if self.current.is_empty() {
            collapsed.trim_start()
        } else {
            collapsed.as_str()
        };
        push_span(&mut self.current, text, style);
    }

    fn separate(&mut self) {
        if self.lists.is_empty()
            && self
                .lines
                .last()
                .is_some_and(|line| line.line_type != LineType::Empty)
        {
            self.lines.push(RenderedLine::new(Vec::new(), LineType::Empty));
        }
    }

    fn prefix(&self) -> Vec<InlineSpan> {
        let mut prefix = Vec::new();
        if self.quote_depth > 0 {
            push_span(&mut prefix, &"│ ".repeat(self.quote_depth), InlineStyle::default());
        }
        if self.lists.len() > 1 {
            push_span(&mut prefix, &"  ".repeat(self.lists.len() - 1), InlineStyle::default());
        }
        prefix
    }

    /// Emit the pending spans as one line, or an empty code line when
    /// `keep_empty` is set.
    fn flush_unwrapped(&mut self, keep_empty: bool) {
        if self.current.is_empty() && !keep_empty {
            return;
        }
        let mut spans = self.prefix();
        spans.append(&mut self.current);
        let line_type = self.line_type();
        self.lines.push(RenderedLine::new(spans, line_type));
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        if self.pre || self.table {
            self.flush_unwrapped(false);
            return;
        }

        let prefix = self.prefix();
        let marker = self.marker.take();
        let marker_width = marker.as_deref().map_or(0, UnicodeWidthStr::width);
        let prefix_width: usize = prefix.iter().map(|s| s.text.width()).sum();
        let available = self
            .width
            .saturating_sub(prefix_width + marker_width)
            .max(MIN_WIDTH / 2);

        let spans = std::mem::take(&mut self.current);
        let line_type = self.line_type();
        for (i, wrapped) in wrap_spans(spans, available).into_iter().enumerate() {
            let mut line = prefix.clone();
            match (&marker, i) {
                (Some(marker), 0) => push_span(&mut line, marker, InlineStyle::default()),
                (Some(_), _) => push_span(&mut line, &" ".repeat(marker_width), InlineStyle::default()),
                (None, _) => {}
            }
            line.extend(wrapped);
            self.lines.push(RenderedLine::new(line, line_type));
        }
    }

    fn open_tag(&mut self, name: &str, attrs: &str, self_closing: bool) {
        if name == "svg" {
            if self.svg_depth == 0 {
                self.flush();
                self.separate();
                let placeholder = InlineSpan::new(DIAGRAM_PLACEHOLDER.to_string(), InlineStyle::default());
                self.lines.push(RenderedLine::new(vec![placeholder], LineType::Diagram));
            }
            if !self_closing {
                self.svg_depth += 1;
            }
            return;
        }
        if self.svg_depth > 0 {
            return;
        }

        match name {
            "p" | "div" | "dt" | "dd" | "figure" => {
                self.flush();
                if !self.table {
                    self.separate();
                }
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                self.separate();
                self.heading = name[1..].parse().ok();
            }
            "pre" => {
                self.flush();
                self.separate();
                self.pre = true;
            }
            "blockquote" => {
                self.flush();
                self.separate();
                self.quote_depth += 1;
            }
            "ul" | "ol" => {
                self.flush();
                self.separate();
                let start = (name == "ol").then(|| {
                    attr(attrs, "start")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(1)
                });
                self.lists.push(start);
            }
            "li" => {
                self.flush();
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.marker = Some(marker);
            }
            "table" => {
                self.flush();
                self.separate();
                self.table = true;
            }
            "tr" => {
                self.flush();
                self.row_cells = 0;
            }
            "td" | "th" => {
                if self.row_cells > 0 {
                    push_span(&mut self.current, " │ ", InlineStyle::default());
                }
                self.row_cells += 1;
                if name == "th" {
                    self.strong += 1;
                }
            }
            "br" => {
                if self.pre {
                    self.flush_unwrapped(true);
                } else {
                    self.flush();
                }
            }
            "hr" => {
                self.flush();
                self.separate();
                let rule = InlineSpan::new("─".repeat(self.width.min(80)), InlineStyle::default());
                self.lines.push(RenderedLine::new(vec![rule], LineType::HorizontalRule));
            }
            "em" | "i" => self.emphasis += 1,
            "strong" | "b" => self.strong += 1,
            "del" | "s" => self.strike += 1,
            "code" if !self.pre => self.code += 1,
            "a" => self.link += 1,
            "span" => self.colors.push(attr(attrs, "style").and_then(|s| parse_color(&s))),
            "input" if attr(attrs, "type").as_deref() == Some("checkbox") => {
                let mark = if attr(attrs, "checked").is_some() { "[x] " } else { "[ ] " };
                let style = self.style();
                push_span(&mut self.current, mark, style);
            }
            "img" => {
                let alt = attr(attrs, "alt").unwrap_or_default();
                let style = InlineStyle {
                    emphasis: true,
                    ..self.style()
                };
                push_span(&mut self.current, &format!("[image: {alt}]"), style);
            }
            _ => {}
        }

        if let Some(id) = attr(attrs, "id") {
            self.anchors.entry(id).or_insert(self.lines.len());
        }
    }

    fn close_tag(&mut self, name: &str) {
        if name == "svg" {
            self.svg_depth = self.svg_depth.saturating_sub(1);
            return;
        }
        if self.svg_depth > 0 {
            return;
        }

        match name {
            "p" | "div" | "dt" | "dd" | "figure" | "tr" => self.flush(),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                self.heading = None;
            }
            "pre" => {
                self.flush_unwrapped(false);
                self.pre = false;
            }
            "blockquote" => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            "ul" | "ol" => {
                self.flush();
                self.lists.pop();
            }
            "li" => {
                self.flush();
                if let Some(marker) = self.marker.take() {
                    let mut line = self.prefix();
                    push_span(&mut line, &marker, InlineStyle::default());
                    let line_type = self.line_type();
                    self.lines.push(RenderedLine::new(line, line_type));
                }
            }
            "table" => {
                self.flush();
                self.table = false;
            }
            "th" => self.strong = self.strong.saturating_sub(1),
            "em" | "i" => self.emphasis = self.emphasis.saturating_sub(1),
            "strong" | "b" => self.strong = self.strong.saturating_sub(1),
            "del" | "s" => self.strike = self.strike.saturating_sub(1),
            "code" if !self.pre => self.code = self.code.saturating_sub(1),
            "a" => self.link = self.link.saturating_sub(1),
            "span" => {
                self.colors.pop();
            }
            _ => {}
        }
    }

    fn finish(mut self) -> TextLayout {
        self.flush();
        while self
            .lines
            .last()
            .is_some_and(|line| line.line_type == LineType::Empty)
        {
            self.lines.pop();
        }
        TextLayout {
            lines: self.lines,
            anchors: self.anchors,
        }
    }
}
