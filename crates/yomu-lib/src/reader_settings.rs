use serde::{Deserialize, Serialize};

use crate::reader::{ReadingDirection, ReadingMode};

pub const KEY: &str = "settings:reader";

/// Storage key of the reader settings, per manga when `manga_id` is set
pub fn storage_key(manga_id: Option<i64>) -> String {
    match manga_id {
        Some(manga_id) if manga_id > 0 => format!("{}:{}", KEY, manga_id),
        _ => KEY.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum Fit {
    Height,
    Width,
    #[default]
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum Background {
    White,
    #[default]
    Black,
    Gray,
}

impl Background {
    pub fn css_color(&self) -> &'static str {
        match self {
            Background::White => "white",
            Background::Black => "black",
            Background::Gray => "#212121",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    pub const ALL: [BlendMode; 16] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Hue,
        BlendMode::Saturation,
        BlendMode::Color,
        BlendMode::Luminosity,
    ];

    /// Value of the `mix-blend-mode` css property
    pub fn css_value(&self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::ColorDodge => "color-dodge",
            BlendMode::ColorBurn => "color-burn",
            BlendMode::HardLight => "hard-light",
            BlendMode::SoftLight => "soft-light",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::Hue => "hue",
            BlendMode::Saturation => "saturation",
            BlendMode::Color => "color",
            BlendMode::Luminosity => "luminosity",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.css_value() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RgbaChannel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl RgbaChannel {
    pub const ALL: [RgbaChannel; 4] = [
        RgbaChannel::Red,
        RgbaChannel::Green,
        RgbaChannel::Blue,
        RgbaChannel::Alpha,
    ];

    pub fn max(&self) -> u8 {
        match self {
            RgbaChannel::Red | RgbaChannel::Green | RgbaChannel::Blue => 255,
            RgbaChannel::Alpha => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RgbaChannel::Red => "Red",
            RgbaChannel::Green => "Green",
            RgbaChannel::Blue => "Blue",
            RgbaChannel::Alpha => "Alpha",
        }
    }
}

/// Color overlay drawn over the pages, `alpha` is a percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
    pub blend_mode: BlendMode,
}

impl Rgba {
    pub fn get(&self, channel: RgbaChannel) -> u8 {
        match channel {
            RgbaChannel::Red => self.red,
            RgbaChannel::Green => self.green,
            RgbaChannel::Blue => self.blue,
            RgbaChannel::Alpha => self.alpha,
        }
    }

    /// Values above the channel's maximum are clamped
    pub fn set(&mut self, channel: RgbaChannel, value: u8) {
        let value = value.min(channel.max());
        match channel {
            RgbaChannel::Red => self.red = value,
            RgbaChannel::Green => self.green = value,
            RgbaChannel::Blue => self.blue = value,
            RgbaChannel::Alpha => self.alpha = value,
        }
    }

    pub fn reset(&mut self, channel: RgbaChannel) {
        self.set(channel, Rgba::default().get(channel));
    }

    pub fn css_color(&self) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            self.red,
            self.green,
            self.blue,
            self.alpha as f64 / 100.0
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Toggle<T> {
    pub enabled: bool,
    pub value: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CustomFilter {
    pub rgba: Toggle<Rgba>,
    /// Percentages, 100 leaves the page untouched
    pub brightness: Toggle<u16>,
    pub contrast: Toggle<u16>,
    pub grayscale: bool,
    pub invert: bool,
}

impl Default for CustomFilter {
    fn default() -> Self {
        Self {
            rgba: Toggle::default(),
            brightness: Toggle {
                enabled: false,
                value: 100,
            },
            contrast: Toggle {
                enabled: false,
                value: 100,
            },
            grayscale: false,
            invert: false,
        }
    }
}

impl CustomFilter {
    pub const MAX_PERCENTAGE: u16 = 200;

    /// Value of the css `filter` property applied to page images
    pub fn css_filter(&self) -> String {
        let mut filters = vec![];
        if self.brightness.enabled {
            filters.push(format!("brightness({}%)", self.brightness.value.min(Self::MAX_PERCENTAGE)));
        }
        if self.contrast.enabled {
            filters.push(format!("contrast({}%)", self.contrast.value.min(Self::MAX_PERCENTAGE)));
        }
        if self.grayscale {
            filters.push("grayscale(100%)".to_string());
        }
        if self.invert {
            filters.push("invert(100%)".to_string());
        }

        if filters.is_empty() {
            "none".to_string()
        } else {
            filters.join(" ")
        }
    }

    /// Color and blend mode of the overlay, if any
    pub fn overlay(&self) -> Option<(String, &'static str)> {
        self.rgba
            .enabled
            .then(|| (self.rgba.value.css_color(), self.rgba.value.blend_mode.css_value()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReaderSettings {
    pub reading_mode: ReadingMode,
    pub reading_direction: ReadingDirection,
    pub fit: Fit,
    pub background: Background,
    pub padding: bool,
    pub custom_filter: CustomFilter,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            reading_mode: ReadingMode::SinglePage,
            reading_direction: ReadingDirection::Ltr,
            fit: Fit::All,
            background: Background::Black,
            padding: false,
            custom_filter: CustomFilter::default(),
        }
    }
}

impl ReaderSettings {
    /// Unreadable stored settings fall back to the defaults
    pub fn from_stored(value: Option<&str>) -> Self {
        value
            .and_then(|value| match serde_json::from_str(value) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    warn!("invalid reader settings: {}", e);
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Per-manga settings, or the global ones when the manga has none
    pub fn resolve(manga: Option<&str>, global: Option<&str>) -> Self {
        match manga {
            Some(_) => Self::from_stored(manga),
            None => Self::from_stored(global),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key(None), "settings:reader");
        assert_eq!(storage_key(Some(0)), "settings:reader");
        assert_eq!(storage_key(Some(12)), "settings:reader:12");
    }

    #[test]
    fn test_rgba_clamps_and_resets() {
        let mut rgba = Rgba::default();
        rgba.set(RgbaChannel::Red, 255);
        rgba.set(RgbaChannel::Alpha, 180);
        assert_eq!(rgba.red, 255);
        assert_eq!(rgba.alpha, 100);

        rgba.reset(RgbaChannel::Red);
        assert_eq!(rgba.get(RgbaChannel::Red), 0);
        assert_eq!(rgba.alpha, 100);
    }

    #[test]
    fn test_overlay() {
        let mut filter = CustomFilter::default();
        assert_eq!(filter.overlay(), None);

        filter.rgba.enabled = true;
        filter.rgba.value.set(RgbaChannel::Blue, 200);
        filter.rgba.value.set(RgbaChannel::Alpha, 50);
        filter.rgba.value.blend_mode = BlendMode::ColorDodge;
        assert_eq!(
            filter.overlay(),
            Some(("rgba(0, 0, 200, 0.5)".to_string(), "color-dodge"))
        );
    }

    #[test]
    fn test_css_filter() {
        let mut filter = CustomFilter::default();
        assert_eq!(filter.css_filter(), "none");

        filter.brightness.enabled = true;
        filter.brightness.value = 250;
        filter.invert = true;
        assert_eq!(filter.css_filter(), "brightness(200%) invert(100%)");
    }

    #[test]
    fn test_blend_mode_serde() {
        assert_eq!(
            serde_json::to_string(&BlendMode::SoftLight).unwrap(),
            "\"soft-light\""
        );
        assert_eq!(BlendMode::parse("luminosity"), Some(BlendMode::Luminosity));
        assert_eq!(BlendMode::parse("nope"), None);
    }

    #[test]
    fn test_resolve_settings() {
        let manga = serde_json::to_string(&ReaderSettings {
            reading_mode: ReadingMode::Webtoon,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            ReaderSettings::resolve(Some(&manga), None).reading_mode,
            ReadingMode::Webtoon
        );
        assert_eq!(ReaderSettings::resolve(None, Some("{}")), ReaderSettings::default());
        assert_eq!(ReaderSettings::resolve(Some("garbage"), None), ReaderSettings::default());
    }
}
