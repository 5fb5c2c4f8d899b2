use std::path::PathBuf;

use mkreader::config::{
    ConfigFlags, ThemeMode, clear_config_flags, load_config_flags, parse_flag_tokens,
    save_config_flags,
};
use mkreader::session::SessionOptions;

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".mkreaderrc");
    let content = r"
# comment
--no-watch

--theme light

--render-debug-log=render.log --max-tabs 3
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.no_watch);
    assert_eq!(flags.theme, Some(ThemeMode::Light));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
    assert_eq!(flags.max_tabs, Some(3));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".mkreaderrc");
    let content = "--no-watch\n--theme light\n--max-tabs 4\n--render-debug-log file.log\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "mkreader".to_string(),
        "--theme".to_string(),
        "dark".to_string(),
        "--max-tabs=6".to_string(),
        "--no-outline".to_string(),
        "notes.md".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.no_watch, "file flags should remain enabled");
    assert!(effective.no_outline, "cli flags should be applied");
    assert_eq!(effective.theme, Some(ThemeMode::Dark), "cli should override theme");
    assert_eq!(effective.max_tabs, Some(6), "cli should override max tabs");
    assert_eq!(
        effective.render_debug_log,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_local_override_layers_over_global() {
    let dir = tempfile::tempdir().unwrap();
    let global = dir.path().join("config");
    let local = dir.path().join(".mkreaderrc");
    std::fs::write(&global, "--theme light\n--no-diagrams\n").unwrap();
    std::fs::write(&local, "--theme dark\n").unwrap();

    let merged = load_config_flags(&global)
        .unwrap()
        .union(&load_config_flags(&local).unwrap());
    assert_eq!(merged.theme, Some(ThemeMode::Dark));
    assert!(merged.no_diagrams);
}

#[test]
fn test_save_then_load_keeps_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config");
    let flags = ConfigFlags {
        no_restore: true,
        no_highlight: true,
        max_tabs: Some(5),
        theme: Some(ThemeMode::Light),
        ..ConfigFlags::default()
    };
    save_config_flags(&path, &flags).unwrap();
    assert_eq!(load_config_flags(&path).unwrap(), flags);

    clear_config_flags(&path).unwrap();
    assert!(!path.exists());
    assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
}

#[test]
fn test_missing_config_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("absent")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
}

#[test]
fn test_flags_map_to_session_options() {
    let flags = parse_flag_tokens(&["--no-watch".to_string(), "--max-tabs=2".to_string()]);
    let options = flags.session_options();
    assert_eq!(options.max_documents, 2);
    assert!(!options.watch_enabled);
    assert_eq!(options.watch_debounce, SessionOptions::default().watch_debounce);

    let defaults = ConfigFlags::default().session_options();
    assert_eq!(defaults.max_documents, 10);
    assert!(defaults.watch_enabled);
}
