//! End-to-end session behavior over the real file system.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use mkreader::export::{ExportCoordinator, ExportFormat};
use mkreader::gateway::FsGateway;
use mkreader::highlight::HighlightPass;
use mkreader::pipeline::RenderPipeline;
use mkreader::session::{
    Command, FileSnapshotStore, SessionEvent, SessionManager, SessionOptions, SnapshotStore,
};
use mkreader::view::{ContentSurface, MemorySurface};

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn long_markdown(title: &str) -> String {
    let mut md = format!("# {title}\n\n");
    for i in 0..40 {
        md.push_str(&format!("Paragraph {i}.\n\n"));
    }
    md.push_str("## Tail\n\nEnd.\n");
    md
}

fn session(snapshot: &Path, watch: bool) -> SessionManager<MemorySurface> {
    SessionManager::new(
        FsGateway::new(),
        FileSnapshotStore::new(snapshot),
        MemorySurface::new(),
        SessionOptions {
            watch_enabled: watch,
            watch_debounce: Duration::from_millis(50),
            ..SessionOptions::default()
        },
    )
}

#[test]
fn test_tabs_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("state").join("tabs.json");
    let a = write_file(dir.path(), "a.md", &long_markdown("Alpha"));
    let b = write_file(dir.path(), "b.md", &long_markdown("Beta"));
    let c = write_file(dir.path(), "c.md", "# Gamma\n");

    {
        let mut first = session(&snapshot, false);
        first.startup(&[&a], false);
        let b_id = first.open(&b).unwrap();
        first.open(&c).unwrap();
        first.switch_to(b_id).unwrap();
        first.scroll_to(5);
        first.persist();
    }

    let stored = FileSnapshotStore::new(&snapshot).load().unwrap().unwrap();
    assert_eq!(stored.tabs.len(), 3);
    assert_eq!(stored.tabs[1].scroll_position, 5);

    std::fs::remove_file(&c).unwrap();
    let mut second = session(&snapshot, false);
    let report = second.startup::<PathBuf>(&[], true);
    assert_eq!(report.restore.restored.len(), 2);
    assert_eq!(report.restore.skipped.len(), 1);
    assert!(
        second
            .drain_events()
            .iter()
            .any(|event| matches!(event, SessionEvent::Warning(_)))
    );

    let names: Vec<&str> = second
        .registry()
        .iter()
        .map(|document| document.display_name())
        .collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(second.active_document().unwrap().display_name(), "b");
    assert_eq!(second.surface().scroll_offset(), 5);
}

#[test]
fn test_same_file_opens_once() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("tabs.json");
    let path = write_file(dir.path(), "notes.md", "# Notes\n");
    let mut session = session(&snapshot, false);

    let first = session.open(&path).unwrap();
    let other_spelling = dir.path().join(".").join("notes.md");
    let second = session.open(&other_spelling).unwrap();
    assert_eq!(first, second);
    assert_eq!(session.registry().len(), 1);
}

#[test]
fn test_startup_skips_non_markdown_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("tabs.json");
    let text = write_file(dir.path(), "notes.txt", "plain");
    let md = write_file(dir.path(), "README.markdown", "# Readme\n");
    let mut session = session(&snapshot, false);

    let report = session.startup(&[text, md], false);
    assert!(report.opened.is_some());
    assert_eq!(session.active_document().unwrap().display_name(), "README");
}

#[test]
fn test_commands_cycle_and_close_to_welcome() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("tabs.json");
    let paths: Vec<PathBuf> = ["one.md", "two.md"]
        .iter()
        .map(|name| write_file(dir.path(), name, "# Heading\n"))
        .collect();
    let mut session = session(&snapshot, false);
    for (_, result) in session.open_many(&paths) {
        result.unwrap();
    }
    session.switch_to_position(1).unwrap();

    session.dispatch(Command::Next);
    assert_eq!(session.active_document().unwrap().display_name(), "two");
    session.dispatch(Command::Next);
    assert_eq!(session.active_document().unwrap().display_name(), "one");

    session.dispatch(Command::CloseActive);
    session.dispatch(Command::CloseActive);
    assert!(session.registry().is_empty());
    assert!(session.surface().is_welcome());

    let stored = FileSnapshotStore::new(&snapshot).load().unwrap().unwrap();
    assert!(stored.tabs.is_empty());
    assert_eq!(stored.active_tab_id, None);
}

#[test]
fn test_highlight_pass_rewrites_installed_html() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("tabs.json");
    let path = write_file(
        dir.path(),
        "code.md",
        "# Code\n\n```rust\nfn main() {}\n```\n",
    );
    let mut session = session(&snapshot, false)
        .with_pipeline(RenderPipeline::new().with_highlight(HighlightPass));

    session.open(&path).unwrap();
    assert!(session.is_busy());
    session.settle();
    assert!(!session.is_busy());

    let document_html = session.active_document().unwrap().html().to_string();
    let shown = session.surface().html();
    assert_ne!(shown, document_html);
    assert!(shown.contains("data-language=\"rust\""));
}

#[test]
fn test_export_writes_active_document() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("tabs.json");
    let path = write_file(dir.path(), "report.md", "# Report\n\nBody.\n");
    let mut session = session(&snapshot, false);
    session.open(&path).unwrap();
    session.settle();

    let dest = dir.path().join("out.html");
    let outcome = ExportCoordinator::new()
        .export(&session, ExportFormat::Html, Some(&dest))
        .unwrap();
    assert_eq!(outcome.path, dest);
    let page = std::fs::read_to_string(&dest).unwrap();
    assert!(page.contains("<title>report</title>"));
    assert!(page.contains("Body."));
}

#[test]
fn test_changed_file_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("tabs.json");
    let path = write_file(dir.path(), "live.md", "# Before\n");
    let mut session = session(&snapshot, true);
    let id = session.open(&path).unwrap();
    session.settle();

    // Give the watcher a moment to register before writing.
    std::thread::sleep(Duration::from_millis(100));
    std::fs::write(&path, "# After\n\nNew paragraph.\n").unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut reloaded = false;
    while Instant::now() < deadline {
        if session.tick().reloaded.contains(&id) {
            reloaded = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    assert!(reloaded, "document was not reloaded after the file changed");
    assert!(session.surface().html().contains("New paragraph."));
    assert_eq!(session.outline().entries()[0].header.text, "After");
}
