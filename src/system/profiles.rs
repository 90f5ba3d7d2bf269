//! [`ProfileSource`] implementation backed by autorandr's XDG config
//! directories.
//!
//! autorandr keeps each saved profile in `autorandr/<name>/config` under the
//! user config directory, with system-wide profiles under
//! `$XDG_CONFIG_DIRS` (default `/etc/xdg`).  The first existing file wins.

use crate::traits::ProfileSource;
use log::debug;
use std::path::PathBuf;

/// Reads saved profiles from the XDG config search path.
#[derive(Debug, Clone)]
pub struct XdgProfiles {
    dirs: Vec<PathBuf>,
}

impl Default for XdgProfiles {
    fn default() -> Self {
        Self::new()
    }
}

impl XdgProfiles {
    /// Search `$XDG_CONFIG_HOME` (or `~/.config`) and then `$XDG_CONFIG_DIRS`.
    pub fn new() -> Self {
        let mut dirs: Vec<PathBuf> = dirs::config_dir().into_iter().collect();
        let system = std::env::var("XDG_CONFIG_DIRS")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "/etc/xdg".into());
        dirs.extend(std::env::split_paths(&system));
        Self::with_dirs(dirs)
    }

    /// Search exactly `dirs`, in order.
    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    fn config_path(&self, name: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join("autorandr").join(name).join("config"))
            .find(|path| path.is_file())
    }
}

impl ProfileSource for XdgProfiles {
    fn read_config(&self, name: &str) -> Option<String> {
        // Profile names come from autorandr's stdout; never let one escape
        // the config directory.
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return None;
        }
        let path = self.config_path(name)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!("cannot read {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Monotonic counter to generate unique directories per test.
    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_dir() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "monswitch-test-{}-{}",
            std::process::id(),
            id
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_profile(base: &Path, name: &str, text: &str) {
        let dir = base.join("autorandr").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config"), text).unwrap();
    }

    #[test]
    fn first_directory_wins() {
        let user = tmp_dir();
        let system = tmp_dir();
        write_profile(&user, "docked", "output DP-1\n");
        write_profile(&system, "docked", "output HDMI-1\n");
        write_profile(&system, "mobile", "output eDP-1\n");

        let profiles = XdgProfiles::with_dirs(vec![user.clone(), system.clone()]);
        assert_eq!(profiles.read_config("docked").as_deref(), Some("output DP-1\n"));
        assert_eq!(profiles.read_config("mobile").as_deref(), Some("output eDP-1\n"));
        assert_eq!(profiles.read_config("common"), None);

        let _ = std::fs::remove_dir_all(&user);
        let _ = std::fs::remove_dir_all(&system);
    }

    #[test]
    fn rejects_path_like_names() {
        let base = tmp_dir();
        write_profile(&base, "docked", "output DP-1\n");
        let profiles = XdgProfiles::with_dirs(vec![base.clone()]);
        assert_eq!(profiles.read_config("../autorandr/docked"), None);
        assert_eq!(profiles.read_config(".."), None);
        assert_eq!(profiles.read_config(""), None);
        let _ = std::fs::remove_dir_all(&base);
    }
}
