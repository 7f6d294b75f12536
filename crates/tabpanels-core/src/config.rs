//! Settings for block recognition, rendering and indexing.
//!
//! Settings are stored as TOML and loaded with defaults for anything
//! missing, so configuration files written by older versions keep working.
//! The config directory can be overridden with `TABPANELS_CONFIG_DIR`.

use crate::error::{Error, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_KEYWORD: &str = "tabs";
const DEFAULT_MARKER: &str = "---";

/// User-facing configuration consumed by the core.
///
/// ## Example Configuration File
///
/// ```toml
/// codeblock_keyword = "tabs"
/// tab_marker = "---"
/// show_no_tab_warning = true
/// highlight_selected_tab_name = true
/// enable_indexing = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Info-string keyword that marks a fenced block as belonging to this
    /// system.
    pub codeblock_keyword: String,

    /// Per-line token that begins a new tab's title line.
    pub tab_marker: String,

    /// Whether a block with no recognizable tab markers gets a warning
    /// callout appended to its rendered content.
    pub show_no_tab_warning: bool,

    /// Whether the selected tab's title is visually highlighted.
    pub highlight_selected_tab_name: bool,

    /// Whether the indexing subsystem (extraction, merge, snapshot) runs at
    /// all. Rendering works either way.
    pub enable_indexing: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            codeblock_keyword: DEFAULT_KEYWORD.to_string(),
            tab_marker: DEFAULT_MARKER.to_string(),
            show_no_tab_warning: true,
            highlight_selected_tab_name: true,
            enable_indexing: false,
        }
    }
}

impl Settings {
    /// Load settings from the default location, falling back to defaults
    /// when no file exists yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load settings from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read settings: {e}")))?;
        let settings = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse settings: {e}")))?;
        Ok(settings)
    }

    /// Save settings to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config dir: {e}")))?;
        }
        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml).map_err(|e| Error::Config(format!("Failed to write settings: {e}")))?;
        Ok(())
    }

    /// The default settings file path, honoring `TABPANELS_CONFIG_DIR`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("TABPANELS_CONFIG_DIR") {
            let trimmed = dir.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed).join("settings.toml"));
            }
        }

        if let Some(dirs) = ProjectDirs::from("", "", "tabpanels") {
            return Ok(dirs.config_dir().join("settings.toml"));
        }

        if let Some(base) = BaseDirs::new() {
            return Ok(base.home_dir().join(".tabpanels").join("settings.toml"));
        }

        Err(Error::Config(
            "Failed to determine configuration directory".into(),
        ))
    }

    /// The effective tab marker; an empty or whitespace value falls back to
    /// `---`.
    #[must_use]
    pub fn marker(&self) -> &str {
        let trimmed = self.tab_marker.trim();
        if trimmed.is_empty() { DEFAULT_MARKER } else { trimmed }
    }

    /// The effective block keyword; an empty or whitespace value falls back
    /// to `tabs`.
    #[must_use]
    pub fn keyword(&self) -> &str {
        let trimmed = self.codeblock_keyword.trim();
        if trimmed.is_empty() { DEFAULT_KEYWORD } else { trimmed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.codeblock_keyword, "tabs");
        assert_eq!(settings.tab_marker, "---");
        assert!(settings.show_no_tab_warning);
        assert!(settings.highlight_selected_tab_name);
        assert!(!settings.enable_indexing);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let settings = Settings::load_from(&dir.path().join("nope.toml")).expect("load");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let settings = Settings {
            tab_marker: "===".to_string(),
            enable_indexing: true,
            ..Settings::default()
        };
        settings.save_to(&path).expect("save");

        let loaded = Settings::load_from(&path).expect("load");
        assert_eq!(loaded, settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "tab_marker = \"===\"\n").expect("write");

        let loaded = Settings::load_from(&path).expect("load");
        assert_eq!(loaded.tab_marker, "===");
        assert_eq!(loaded.codeblock_keyword, "tabs");
        assert!(loaded.show_no_tab_warning);
    }

    #[test]
    fn blank_marker_falls_back() {
        let settings = Settings {
            tab_marker: "  ".to_string(),
            codeblock_keyword: String::new(),
            ..Settings::default()
        };
        assert_eq!(settings.marker(), "---");
        assert_eq!(settings.keyword(), "tabs");
    }
}
