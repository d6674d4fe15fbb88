use std::fs;
use std::path::Path;

use log::{debug, error};
use serde::{Deserialize, Serialize};

/// Settings the hosting application passes in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Book folder or markup file url. `working` means the host is still
    /// preparing the book.
    pub url: String,

    pub landscape: bool,

    pub show_context_pages: bool,

    pub paused: bool,

    /// Language to show; the book's first language when unset or unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_language: Option<String>,

    pub use_original_page_size: bool,

    /// Base path of bundled activity assets.
    pub location_of_dist_folder: String,

    pub hide_next_prev_buttons: bool,

    /// JSON list of extra toolbar buttons, as the host provides it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_buttons: Option<String>,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_fetch_timeout() -> u64 {
    30
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            landscape: false,
            show_context_pages: false,
            paused: false,
            active_language: None,
            use_original_page_size: false,
            location_of_dist_folder: String::new(),
            hide_next_prev_buttons: false,
            extra_buttons: None,
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl PlayerConfig {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        debug!("Loaded player config from {path:?}");
        Ok(config)
    }

    pub fn show_navigation_buttons(&self) -> bool {
        !self.hide_next_prev_buttons
    }

    pub fn extra_buttons(&self) -> Vec<ExtraButton> {
        self.extra_buttons
            .as_deref()
            .map(parse_extra_buttons)
            .unwrap_or_default()
    }
}

/// A host-defined button shown next to the standard controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraButton {
    pub id: String,
    pub icon_url: String,
    #[serde(default)]
    pub description: String,
}

/// Parses the host's extra-button list. Bad input is logged and yields no
/// buttons rather than failing the viewer.
pub fn parse_extra_buttons(json: &str) -> Vec<ExtraButton> {
    if json.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<ExtraButton>>(json) {
        Ok(buttons) => buttons,
        Err(e) => {
            error!("Ignoring malformed extra buttons {json:?}: {e}");
            Vec::new()
        }
    }
}
