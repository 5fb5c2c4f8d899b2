use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::session::SessionOptions;

const APP_DIR: &str = "mkreader";

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Auto,
    Light,
    Dark,
}

impl ThemeMode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Flags that can be saved as defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub no_outline: bool,
    pub no_restore: bool,
    pub no_watch: bool,
    pub no_diagrams: bool,
    pub no_highlight: bool,
    pub max_tabs: Option<usize>,
    pub perf: bool,
    pub theme: Option<ThemeMode>,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge with `other` taking precedence for valued options.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            no_outline: self.no_outline || other.no_outline,
            no_restore: self.no_restore || other.no_restore,
            no_watch: self.no_watch || other.no_watch,
            no_diagrams: self.no_diagrams || other.no_diagrams,
            no_highlight: self.no_highlight || other.no_highlight,
            max_tabs: other.max_tabs.or(self.max_tabs),
            perf: self.perf || other.perf,
            theme: other.theme.or(self.theme),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        let defaults = SessionOptions::default();
        SessionOptions {
            max_documents: self.max_tabs.unwrap_or(defaults.max_documents),
            watch_enabled: !self.no_watch,
            ..defaults
        }
    }
}

/// Platform configuration directory for mkreader.
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR);
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR);
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR);
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join(APP_DIR);
        }
    }

    PathBuf::from(".mkreader")
}

pub fn global_config_path() -> PathBuf {
    config_dir().join("config")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".mkreaderrc")
}

/// Where the open-document snapshot is kept between runs.
pub fn snapshot_path() -> PathBuf {
    config_dir().join("tabs.json")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# mkreader defaults (saved with --save)".to_string()];
    let switches = [
        (flags.no_outline, "--no-outline"),
        (flags.no_restore, "--no-restore"),
        (flags.no_watch, "--no-watch"),
        (flags.no_diagrams, "--no-diagrams"),
        (flags.no_highlight, "--no-highlight"),
        (flags.perf, "--perf"),
    ];
    lines.extend(
        switches
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, flag)| (*flag).to_string()),
    );
    if let Some(max) = flags.max_tabs {
        lines.push(format!("--max-tabs {max}"));
    }
    if let Some(theme) = flags.theme {
        lines.push(format!("--theme {}", theme.as_str()));
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the saveable flags out of a token list. Unknown tokens are ignored.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        match token {
            "--no-outline" => flags.no_outline = true,
            "--no-restore" => flags.no_restore = true,
            "--no-watch" => flags.no_watch = true,
            "--no-diagrams" => flags.no_diagrams = true,
            "--no-highlight" => flags.no_highlight = true,
            "--perf" => flags.perf = true,
            "--theme" | "--max-tabs" | "--render-debug-log" => {
                if let Some(next) = tokens.get(i + 1) {
                    apply_valued(&mut flags, token, next);
                    i += 1;
                }
            }
            _ => {
                if let Some((name, value)) = token.split_once('=') {
                    apply_valued(&mut flags, name, value);
                }
            }
        }
        i += 1;
    }
    flags
}

fn apply_valued(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--theme" => flags.theme = parse_theme(value),
        "--max-tabs" => flags.max_tabs = value.parse().ok().filter(|n| *n > 0),
        "--render-debug-log" => flags.render_debug_log = Some(PathBuf::from(value)),
        _ => {}
    }
}

fn parse_theme(s: &str) -> Option<ThemeMode> {
    match s {
        "auto" => Some(ThemeMode::Auto),
        "light" => Some(ThemeMode::Light),
        "dark" => Some(ThemeMode::Dark),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&tokens(&[
            "mkreader",
            "--no-outline",
            "--no-watch",
            "--max-tabs",
            "4",
            "--theme",
            "dark",
            "--render-debug-log=render.log",
            "README.md",
        ]));
        assert!(flags.no_outline);
        assert!(flags.no_watch);
        assert!(!flags.no_restore);
        assert_eq!(flags.max_tabs, Some(4));
        assert_eq!(flags.theme, Some(ThemeMode::Dark));
        assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
    }

    #[test]
    fn test_invalid_values_are_dropped() {
        let flags = parse_flag_tokens(&tokens(&["--max-tabs=0", "--theme=neon"]));
        assert_eq!(flags.max_tabs, None);
        assert_eq!(flags.theme, None);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            no_diagrams: true,
            max_tabs: Some(3),
            theme: Some(ThemeMode::Light),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            no_outline: true,
            max_tabs: Some(6),
            theme: Some(ThemeMode::Dark),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.no_diagrams);
        assert!(merged.no_outline);
        assert_eq!(merged.max_tabs, Some(6));
        assert_eq!(merged.theme, Some(ThemeMode::Dark));
    }

    #[test]
    fn test_session_options_follow_flags() {
        let flags = ConfigFlags {
            no_watch: true,
            max_tabs: Some(2),
            ..ConfigFlags::default()
        };
        let options = flags.session_options();
        assert_eq!(options.max_documents, 2);
        assert!(!options.watch_enabled);

        let defaults = ConfigFlags::default().session_options();
        assert_eq!(defaults, SessionOptions::default());
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".mkreaderrc");
        let flags = ConfigFlags {
            no_outline: true,
            no_restore: true,
            no_watch: true,
            no_diagrams: true,
            no_highlight: true,
            max_tabs: Some(5),
            perf: true,
            theme: Some(ThemeMode::Dark),
            render_debug_log: Some(PathBuf::from("render.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }

    #[test]
    fn test_snapshot_lives_in_config_dir() {
        assert_eq!(snapshot_path().parent(), global_config_path().parent());
        assert!(snapshot_path().ends_with("tabs.json"));
    }
}
