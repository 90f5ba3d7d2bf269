//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/monswitch/config.json`.
//! Every section is optional and falls back to compiled-in defaults that
//! match a qtile + picom session on a laptop with an `eDP` panel.
//!
//! # Example
//!
//! ```json
//! {
//!   "preference": { "width": 2560, "height": 1440 },
//!   "tools": {
//!     "chooser": ["rofi", "-dmenu", "-p", "Monitors", "-no-custom", "-format", "i", "-markup-rows"],
//!     "manual": { "command": ["arandr"], "label": "ARandr" }
//!   },
//!   "reset": {
//!     "builtin_prefix": "eDP",
//!     "compositor_start": ["picom", "-b"],
//!     "outputs_settle_ms": 3000
//!   }
//! }
//! ```

use crate::planner::DEFAULT_PREFERENCE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
///
/// Every field is optional; a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Resolution the layout planner aims for.
    #[serde(default)]
    pub preference: Preference,

    /// External programs for querying, choosing and configuring.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Programs and delays of the reset sequence.
    #[serde(default)]
    pub reset: ResetConfig,
}

/// Preferred resolution for the first connected output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preference {
    pub width: u32,
    pub height: u32,
}

impl Default for Preference {
    fn default() -> Self {
        let (width, height) = DEFAULT_PREFERENCE;
        Self { width, height }
    }
}

impl Preference {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// The manual-configuration fallback offered at the end of the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualConfig {
    pub command: Vec<String>,
    pub label: String,
}

impl Default for ManualConfig {
    fn default() -> Self {
        Self {
            command: vec!["arandr".into()],
            label: "ARandr".into(),
        }
    }
}

/// External programs used outside the reset sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Display query/configuration tool.
    pub xrandr: String,
    /// Profile tool (`--detected`, `<name>`).
    pub autorandr: String,
    /// Notification sender (`notify-send` compatible).
    pub notify_send: String,
    /// Chooser command; reads markup rows on stdin, prints the chosen index.
    pub chooser: Vec<String>,
    /// Error dialog command; the message is appended as the last argument.
    pub error_dialog: Vec<String>,
    /// Command run for the virtual `off` profile.
    pub dpms_off: Vec<String>,
    pub manual: ManualConfig,
}

fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            xrandr: "xrandr".into(),
            autorandr: "autorandr".into(),
            notify_send: "notify-send".into(),
            chooser: argv(&[
                "rofi",
                "-dmenu",
                "-p",
                "AutoRandR mode",
                "-no-custom",
                "-format",
                "i",
                "-markup-rows",
                "-l",
                "25",
            ]),
            error_dialog: argv(&["rofi", "-e"]),
            dpms_off: argv(&["xset", "dpms", "force", "off"]),
            manual: ManualConfig::default(),
        }
    }
}

/// Programs and delays of the reset sequence.
///
/// All durations are in **milliseconds**.  The defaults give the compositor
/// and the window manager time to notice output changes; invoking them
/// immediately races the display server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetConfig {
    /// Outputs whose name starts with this prefix are built-in panels.
    pub builtin_prefix: String,
    /// Hardware rescan helper; skipped when not installed.
    pub rescan: String,
    pub session_reload: Vec<String>,
    pub compositor_stop: Vec<String>,
    pub compositor_start: Vec<String>,
    pub wm_restart: Vec<String>,
    pub rescan_settle_ms: u64,
    pub outputs_settle_ms: u64,
    pub layout_settle_ms: u64,
    pub restart_settle_ms: u64,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            builtin_prefix: "eDP".into(),
            rescan: "pci-rescan".into(),
            session_reload: argv(&["qtile", "cmd-obj", "-o", "root", "-f", "reload_config"]),
            compositor_stop: argv(&["pkill", "-f", "picom"]),
            compositor_start: argv(&["picom", "-b"]),
            wm_restart: argv(&["qtile", "cmd-obj", "-o", "root", "-f", "restart"]),
            rescan_settle_ms: 500,
            outputs_settle_ms: 5000,
            layout_settle_ms: 5000,
            restart_settle_ms: 1000,
        }
    }
}

impl ResetConfig {
    pub fn rescan_settle(&self) -> Duration {
        Duration::from_millis(self.rescan_settle_ms)
    }

    pub fn outputs_settle(&self) -> Duration {
        Duration::from_millis(self.outputs_settle_ms)
    }

    pub fn layout_settle(&self) -> Duration {
        Duration::from_millis(self.layout_settle_ms)
    }

    pub fn restart_settle(&self) -> Duration {
        Duration::from_millis(self.restart_settle_ms)
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
