//! Saved autorandr profiles.
//!
//! `autorandr --detected` lists the saved profiles that match the connected
//! hardware.  Each profile's `config` file is a list of per-output blocks:
//!
//! ```text
//! output eDP-1
//! off
//! output DP-1
//! crtc 0
//! mode 2560x1440
//! pos 0x0
//! primary
//! rate 59.95
//! ```
//!
//! A profile without a config file is *virtual*: autorandr synthesises it
//! (e.g. `common`, `horizontal`).

use crate::traits::ProfileSource;
use std::collections::BTreeMap;

/// The virtual profiles autorandr always offers, with their menu captions.
pub const VIRTUAL_PROFILES: [(&str, &str); 5] = [
    ("common", "Mirror using largest common resolution"),
    ("clone-largest", "Mirror using largest resolution"),
    ("horizontal", "Extend desktop horizontally"),
    ("vertical", "Extend desktop vertically"),
    ("off", "switch all displays off"),
];

/// Name of the virtual profile that blanks every display.
pub const OFF_PROFILE: &str = "off";

/// One `output` block of a saved profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileOutput {
    pub name: String,
    /// Keyword → value.  Bare keywords (`primary`, `off`) map to `""`.
    pub properties: BTreeMap<String, String>,
}

impl ProfileOutput {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn is_off(&self) -> bool {
        self.has("off")
    }

    pub fn is_primary(&self) -> bool {
        self.has("primary")
    }
}

/// A saved or virtual autorandr profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    /// Output blocks in file order; empty for virtual profiles.
    pub outputs: Vec<ProfileOutput>,
    pub is_virtual: bool,
}

impl Profile {
    /// Load `name` from `source`; a missing config makes it virtual.
    pub fn load(name: &str, source: &impl ProfileSource) -> Self {
        match source.read_config(name) {
            Some(text) => Self::parse(name, &text),
            None => Self::virtual_profile(name),
        }
    }

    pub fn virtual_profile(name: &str) -> Self {
        Self {
            name: name.to_string(),
            outputs: Vec::new(),
            is_virtual: true,
        }
    }

    /// Parse a profile config.  Lines before the first `output` keyword are
    /// ignored.
    pub fn parse(name: &str, text: &str) -> Self {
        let mut outputs: Vec<ProfileOutput> = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (key, value) = match line.split_once(char::is_whitespace) {
                Some((key, value)) => (key, value.trim()),
                None => (line, ""),
            };
            if key == "output" {
                outputs.push(ProfileOutput {
                    name: value.to_string(),
                    properties: BTreeMap::new(),
                });
            } else if let Some(output) = outputs.last_mut() {
                output.properties.insert(key.to_string(), value.to_string());
            }
        }
        Self {
            name: name.to_string(),
            outputs,
            is_virtual: false,
        }
    }

    /// Menu caption for virtual profiles.
    pub fn caption(&self) -> &'static str {
        VIRTUAL_PROFILES
            .iter()
            .find(|(name, _)| *name == self.name)
            .map_or("no saved configuration", |(_, caption)| *caption)
    }

    /// Enabled outputs, primary first, otherwise in file order.
    pub fn active_outputs(&self) -> Vec<&ProfileOutput> {
        let enabled = self.outputs.iter().filter(|o| !o.is_off());
        let (mut primary, others): (Vec<_>, Vec<_>) = enabled.partition(|o| o.is_primary());
        primary.extend(others);
        primary
    }

    /// One menu row in Pango markup.
    pub fn describe(&self) -> String {
        if self.is_virtual {
            return format!(
                "  \t<i>{}</i>\t<span color=\"gray\">{}</span>",
                self.name,
                self.caption()
            );
        }
        let outputs: Vec<String> = self
            .active_outputs()
            .into_iter()
            .map(|o| {
                format!(
                    r#"<span fgcolor="cyan">{}</span>: {} <span fgcolor="gray">({})</span>"#,
                    o.name,
                    o.get("mode").unwrap_or("?"),
                    o.get("pos").unwrap_or("?")
                )
            })
            .collect();
        format!("💾 \t<b>{}</b>\t{}", self.name, outputs.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCKED: &str = "\
output eDP-1
off
output DP-1
crtc 0
mode 2560x1440
pos 0x0
rate 59.95
output DP-2
crtc 1
mode 2560x1440
pos 2560x0
primary
rate 59.95
";

    #[test]
    fn parses_output_blocks() {
        let p = Profile::parse("docked", DOCKED);
        assert!(!p.is_virtual);
        assert_eq!(p.outputs.len(), 3);
        assert!(p.outputs[0].is_off());
        assert_eq!(p.outputs[1].get("mode"), Some("2560x1440"));
        assert_eq!(p.outputs[2].get("pos"), Some("2560x0"));
        assert!(p.outputs[2].is_primary());
        assert_eq!(p.outputs[2].get("primary"), Some(""));
    }

    #[test]
    fn active_outputs_put_primary_first() {
        let p = Profile::parse("docked", DOCKED);
        let names: Vec<&str> = p.active_outputs().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["DP-2", "DP-1"]);
    }

    #[test]
    fn describe_saved_profile() {
        let p = Profile::parse("docked", DOCKED);
        assert_eq!(
            p.describe(),
            "💾 \t<b>docked</b>\t<span fgcolor=\"cyan\">DP-2</span>: 2560x1440 \
             <span fgcolor=\"gray\">(2560x0)</span>, <span fgcolor=\"cyan\">DP-1</span>: 2560x1440 \
             <span fgcolor=\"gray\">(0x0)</span>"
        );
    }

    #[test]
    fn missing_config_is_virtual() {
        let source = |name: &str| (name == "docked").then(|| DOCKED.to_string());
        assert!(!Profile::load("docked", &source).is_virtual);
        let common = Profile::load("common", &source);
        assert!(common.is_virtual);
        assert_eq!(
            common.describe(),
            "  \t<i>common</i>\t<span color=\"gray\">Mirror using largest common resolution</span>"
        );
    }

    #[test]
    fn unknown_virtual_profile_gets_generic_caption() {
        let p = Profile::virtual_profile("mystery");
        assert_eq!(p.caption(), "no saved configuration");
    }

    #[test]
    fn lines_before_first_output_are_ignored() {
        let p = Profile::parse("x", "crtc 0\noutput HDMI-1\nmode 1920x1080\n");
        assert_eq!(p.outputs.len(), 1);
        assert_eq!(p.outputs[0].get("crtc"), None);
    }
}
