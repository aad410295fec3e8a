use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MenuError;

/// Form field whose options enumerate a source's channels.
pub const CHANNEL_SELECTOR: &str = "selector:ch";

/// A menu bound to one data source's form.
///
/// `id` is the data source name and doubles as the prefix of every page
/// element the menu owns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub id: String,
    pub allow_channel_map: bool,
    pub form_name: String,
    pub box_name: String,
    pub selector: String,
    pub time_shortcuts: Vec<String>,
}

impl Menu {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Static menu settings applied by a configurator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuConfig {
    #[serde(default = "default_allow_channel_map")]
    pub allow_channel_map: bool,
    pub form_name: String,
    pub box_name: String,
    #[serde(default = "default_selector")]
    pub selector: String,
    #[serde(default)]
    pub time_shortcuts: Vec<String>,
}

fn default_allow_channel_map() -> bool {
    true
}

fn default_selector() -> String {
    CHANNEL_SELECTOR.to_string()
}

impl MenuConfig {
    /// Waveform menus.
    pub fn wave() -> Self {
        Self::preset(
            "waveForm",
            "waveBox",
            &["-1i", "-2i", "-5i", "-10i", "-20i", "-30i", "-1h"],
        )
    }

    /// Earthworm RSAM menus.
    pub fn ewrsam() -> Self {
        Self::preset(
            "ewrsamForm",
            "ewrsamBox",
            &["-1m", "-6m", "-1y", "-2y", "-4y"],
        )
    }

    fn preset(form_name: &str, box_name: &str, shortcuts: &[&str]) -> Self {
        Self {
            allow_channel_map: true,
            form_name: form_name.to_string(),
            box_name: box_name.to_string(),
            selector: default_selector(),
            time_shortcuts: shortcuts.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Overwrite the menu's static fields. Applying twice is the same as once.
    pub fn apply(&self, menu: &mut Menu) {
        menu.allow_channel_map = self.allow_channel_map;
        menu.form_name.clone_from(&self.form_name);
        menu.box_name.clone_from(&self.box_name);
        menu.selector.clone_from(&self.selector);
        menu.time_shortcuts.clone_from(&self.time_shortcuts);
    }
}

pub fn configure_wave_menu(menu: &mut Menu) {
    MenuConfig::wave().apply(menu);
}

pub fn configure_ewrsam_menu(menu: &mut Menu) {
    MenuConfig::ewrsam().apply(menu);
}

/// The menu variants this crate knows how to configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuKind {
    Wave,
    EwRsam,
}

impl MenuKind {
    pub fn config(self) -> MenuConfig {
        match self {
            Self::Wave => MenuConfig::wave(),
            Self::EwRsam => MenuConfig::ewrsam(),
        }
    }

    /// Build a configured menu for data source `id`.
    pub fn create(self, id: impl Into<String>) -> Menu {
        let mut menu = Menu::new(id);
        self.config().apply(&mut menu);
        menu
    }
}

impl FromStr for MenuKind {
    type Err = MenuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wave" | "wavemenu" => Ok(Self::Wave),
            "ewrsam" | "ewrsammenu" => Ok(Self::EwRsam),
            other => Err(MenuError::UnknownKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_preset() {
        let mut menu = Menu::new("hvo_wave");
        configure_wave_menu(&mut menu);
        assert!(menu.allow_channel_map);
        assert_eq!(menu.form_name, "waveForm");
        assert_eq!(menu.box_name, "waveBox");
        assert_eq!(menu.selector, "selector:ch");
        assert_eq!(
            menu.time_shortcuts,
            ["-1i", "-2i", "-5i", "-10i", "-20i", "-30i", "-1h"]
        );
        assert_eq!(menu.id, "hvo_wave");
    }

    #[test]
    fn ewrsam_preset() {
        let menu = MenuKind::EwRsam.create("rsam");
        assert_eq!(menu.form_name, "ewrsamForm");
        assert_eq!(menu.box_name, "ewrsamBox");
        assert_eq!(menu.time_shortcuts, ["-1m", "-6m", "-1y", "-2y", "-4y"]);
    }

    #[test]
    fn configuring_twice_does_not_accumulate() {
        let mut once = Menu::new("m");
        configure_ewrsam_menu(&mut once);
        let mut twice = once.clone();
        configure_ewrsam_menu(&mut twice);
        assert_eq!(once, twice);

        // Switching presets overwrites rather than merges.
        configure_wave_menu(&mut twice);
        assert_eq!(twice.time_shortcuts.len(), 7);
    }

    #[test]
    fn config_from_json_uses_defaults() {
        let cfg = MenuConfig::from_json(
            r#"{"form_name":"tiltForm","box_name":"tiltBox","time_shortcuts":["-1d"]}"#,
        )
        .unwrap();
        assert!(cfg.allow_channel_map);
        assert_eq!(cfg.selector, CHANNEL_SELECTOR);
        assert!(MenuConfig::from_json("{}").is_err());
    }

    #[test]
    fn kind_parsing() {
        assert_eq!("wave".parse::<MenuKind>().unwrap(), MenuKind::Wave);
        assert_eq!("ewrsammenu".parse::<MenuKind>().unwrap(), MenuKind::EwRsam);
        assert!("tilt".parse::<MenuKind>().is_err());
    }
}
