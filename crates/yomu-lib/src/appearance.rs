use serde::{Deserialize, Serialize};

pub const KEY: &str = "settings:appearance";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    System,
    Dark,
    Light,
}

impl ThemeMode {
    pub const ALL: [ThemeMode; 3] = [ThemeMode::System, ThemeMode::Dark, ThemeMode::Light];

    pub fn label(&self) -> &'static str {
        match self {
            ThemeMode::System => "System",
            ThemeMode::Dark => "Dark",
            ThemeMode::Light => "Light",
        }
    }

    /// Resolves `System` with the media query result
    pub fn resolve(&self, prefers_dark: bool) -> ThemeMode {
        match self {
            ThemeMode::System if prefers_dark => ThemeMode::Dark,
            ThemeMode::System => ThemeMode::Light,
            mode => *mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppearanceSettings {
    pub theme_mode: ThemeMode,
    pub pure_black: bool,
    pub item_width: u32,
    pub thumbnail_backdrop: bool,
    pub dynamic_color_schemes: bool,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            theme_mode: ThemeMode::System,
            pure_black: false,
            item_width: Self::DEFAULT_ITEM_WIDTH,
            thumbnail_backdrop: true,
            dynamic_color_schemes: true,
        }
    }
}

impl AppearanceSettings {
    pub const DEFAULT_ITEM_WIDTH: u32 = 300;
    pub const MIN_ITEM_WIDTH: u32 = 100;
    pub const MAX_ITEM_WIDTH: u32 = 1000;
    pub const ITEM_WIDTH_STEP: u32 = 10;

    pub fn from_stored(value: Option<&str>) -> Self {
        let mut settings: Self = value
            .and_then(|value| serde_json::from_str(value).ok())
            .unwrap_or_default();
        settings.set_item_width(settings.item_width);
        settings
    }

    /// Snaps to the slider step inside the allowed range
    pub fn set_item_width(&mut self, width: u32) {
        let width = width.clamp(Self::MIN_ITEM_WIDTH, Self::MAX_ITEM_WIDTH);
        self.item_width = (width + Self::ITEM_WIDTH_STEP / 2) / Self::ITEM_WIDTH_STEP * Self::ITEM_WIDTH_STEP;
    }

    /// The pure black toggle only exists for dark themes
    pub fn can_use_pure_black(&self, prefers_dark: bool) -> bool {
        self.theme_mode.resolve(prefers_dark) == ThemeMode::Dark
    }

    pub fn is_pure_black(&self, prefers_dark: bool) -> bool {
        self.pure_black && self.can_use_pure_black(prefers_dark)
    }

    /// Value of the `data-theme` attribute on the root element
    pub fn data_theme(&self, prefers_dark: bool) -> &'static str {
        match (self.theme_mode.resolve(prefers_dark), self.is_pure_black(prefers_dark)) {
            (ThemeMode::Dark, true) => "black",
            (ThemeMode::Dark, false) => "dark",
            _ => "light",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_item_width_clamped() {
        let mut settings = AppearanceSettings::default();
        assert_eq!(settings.item_width, 300);

        settings.set_item_width(42);
        assert_eq!(settings.item_width, 100);
        settings.set_item_width(5000);
        assert_eq!(settings.item_width, 1000);
        settings.set_item_width(347);
        assert_eq!(settings.item_width, 350);
    }

    #[test]
    fn test_pure_black_only_in_dark() {
        let settings = AppearanceSettings {
            pure_black: true,
            ..Default::default()
        };
        assert_eq!(settings.data_theme(true), "black");
        assert_eq!(settings.data_theme(false), "light");

        let light = AppearanceSettings {
            theme_mode: ThemeMode::Light,
            pure_black: true,
            ..Default::default()
        };
        assert!(!light.can_use_pure_black(true));
        assert_eq!(light.data_theme(true), "light");
    }

    #[test]
    fn test_from_stored() {
        let settings = AppearanceSettings::from_stored(Some(r#"{"theme_mode":"dark","item_width":2000}"#));
        assert_eq!(settings.theme_mode, ThemeMode::Dark);
        assert_eq!(settings.item_width, 1000);
        assert!(settings.thumbnail_backdrop);

        assert_eq!(AppearanceSettings::from_stored(Some("oops")), AppearanceSettings::default());
    }
}
