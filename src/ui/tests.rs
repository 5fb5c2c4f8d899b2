use std::path::{Path, PathBuf};

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use tempfile::{TempDir, tempdir};

use super::*;
use crate::app::{Message, Model, ToastLevel, update};
use crate::gateway::FsGateway;
use crate::session::{MemorySnapshotStore, SessionManager, SessionOptions};

fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).unwrap()
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn create_model(files: &[(&str, &str)]) -> (TempDir, Model) {
    let dir = tempdir().unwrap();
    let paths: Vec<PathBuf> = files
        .iter()
        .map(|(name, content)| write_file(dir.path(), name, content))
        .collect();
    let mut session = SessionManager::new(
        FsGateway::new(),
        MemorySnapshotStore::new(),
        TerminalSurface::new(80, 24),
        SessionOptions {
            watch_enabled: false,
            ..SessionOptions::default()
        },
    );
    session.startup::<PathBuf>(&[], false);
    for (_, result) in session.open_many(&paths) {
        result.unwrap();
    }
    if let Some(first) = session.registry().first() {
        session.switch_to(first).unwrap();
    }
    session.settle();
    (dir, Model::new(session, (80, 24)))
}

fn render_to_string(model: &Model) -> String {
    let mut terminal = create_test_terminal(80, 24);
    terminal.draw(|frame| render(model, frame)).unwrap();
    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

fn row(rendered: &str, y: usize) -> &str {
    rendered.lines().nth(y).unwrap_or_default()
}

#[test]
fn test_tab_bar_lists_open_documents() {
    let (_dir, model) = create_model(&[("alpha.md", "# A\n"), ("beta.md", "# B\n")]);
    let rendered = render_to_string(&model);
    let tabs = row(&rendered, 0);
    assert!(tabs.contains("1:alpha"), "tab bar was: {tabs}");
    assert!(tabs.contains("2:beta"), "tab bar was: {tabs}");
}

#[test]
fn test_modified_tab_shows_marker() {
    let (_dir, mut model) = create_model(&[("alpha.md", "# A\n")]);
    let id = model.session.active_id().unwrap();
    model.session.mark_modified(id, true).unwrap();
    let rendered = render_to_string(&model);
    assert!(row(&rendered, 0).contains("1:alpha*"));
}

#[test]
fn test_active_tab_uses_active_style() {
    let (_dir, model) = create_model(&[("alpha.md", "# A\n"), ("beta.md", "# B\n")]);
    let mut terminal = create_test_terminal(80, 24);
    terminal.draw(|frame| render(&model, frame)).unwrap();
    let buffer = terminal.backend().buffer();
    let active_bgs = [
        style::Theme::dark().tab_active.bg,
        style::Theme::light().tab_active.bg,
    ];
    // Column 1 is inside the first (active) tab.
    assert!(active_bgs.contains(&Some(buffer[(1, 0)].bg)));
    let labels = tab_labels(model.session.registry());
    let second = u16::try_from(labels[0].width()).unwrap() + 1;
    assert!(!active_bgs.contains(&Some(buffer[(second, 0)].bg)));
}

#[test]
fn test_content_and_outline_render() {
    let (_dir, model) = create_model(&[(
        "doc.md",
        "# Title\n\nSome body text.\n\n## Section\n\nMore text.\n",
    )]);
    let rendered = render_to_string(&model);
    assert!(rendered.contains("Outline"));
    assert!(rendered.contains("Some body text."));
    assert!(rendered.contains("> Title"), "active header is marked");
    assert!(rendered.contains("  Section"));
}

#[test]
fn test_outline_placeholder_for_document_without_headers() {
    let (_dir, model) = create_model(&[("plain.md", "just text\n")]);
    let rendered = render_to_string(&model);
    assert!(rendered.contains(crate::outline::EMPTY_PLACEHOLDER));
}

#[test]
fn test_outline_filter_without_matches() {
    let (_dir, model) = create_model(&[("doc.md", "# Title\n\n## Section\n")]);
    let model = update(model, Message::StartFilter);
    let model = update(model, Message::PromptInput("zzz".to_string()));
    let rendered = render_to_string(&model);
    assert!(rendered.contains("No matching headers"));
    assert!(rendered.contains("Outline [zzz]"));
    assert!(rendered.contains("Filter: zzz_"));
}

#[test]
fn test_hidden_outline_gives_content_full_width() {
    let (_dir, mut model) = create_model(&[("doc.md", "# Title\n\nBody.\n")]);
    model.session.outline_mut().set_visible(false);
    model.sync_layout();
    let rendered = render_to_string(&model);
    assert!(!rendered.contains("Outline"));
    // Content starts after the left padding.
    assert!(row(&rendered, 1).starts_with("  Title"));
}

#[test]
fn test_welcome_page_when_nothing_open() {
    let (_dir, model) = create_model(&[]);
    let rendered = render_to_string(&model);
    assert!(rendered.contains("Welcome to MKReader"));
    assert!(row(&rendered, 23).contains("no documents open"));
    assert!(row(&rendered, 0).contains("MKReader"));
}

#[test]
fn test_status_bar_shows_position() {
    let (_dir, model) = create_model(&[("alpha.md", "# A\n"), ("beta.md", "# B\n")]);
    let rendered = render_to_string(&model);
    let status = row(&rendered, 23);
    assert!(status.contains("alpha"), "status was: {status}");
    assert!(status.contains("Tab 1/2"), "status was: {status}");
    assert!(status.contains("[outline]"), "status was: {status}");
}

#[test]
fn test_toast_covers_last_content_row() {
    let (_dir, mut model) = create_model(&[("alpha.md", "# A\n")]);
    model.show_toast(ToastLevel::Error, "boom");
    let rendered = render_to_string(&model);
    assert!(row(&rendered, 22).contains("[error] boom"));
    assert!(row(&rendered, 23).contains("alpha"));
}

#[test]
fn test_help_overlay_lists_tab_keys() {
    let (_dir, model) = create_model(&[("alpha.md", "# A\n")]);
    let model = update(model, Message::ToggleHelp);
    let rendered = render_to_string(&model);
    assert!(rendered.contains("Help"));
    assert!(rendered.contains("Close tab"));
}

#[test]
fn test_render_survives_tiny_terminal() {
    let (_dir, model) = create_model(&[("alpha.md", "# A\n\nbody\n")]);
    let model = update(model, Message::Resize(10, 2));
    let mut terminal = create_test_terminal(10, 2);
    terminal.draw(|frame| render(&model, frame)).unwrap();
}
