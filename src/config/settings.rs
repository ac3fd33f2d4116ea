use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::render::{BlockMetrics, PageGeometry, PageLayoutPlanner, Rgb, Theme};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub theme: ThemeSettings,
    #[serde(default)]
    pub layout: LayoutSettings,
    pub pdf: PdfSettings,
}

/// Report colors as `#rrggbb` strings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThemeSettings {
    pub primary: String,
    pub on_primary: String,
    pub accent: String,
    pub foreground: String,
    pub eco_mode: bool,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        let theme = Theme::default();
        Self {
            primary: theme.primary.to_string(),
            on_primary: theme.on_primary.to_string(),
            accent: theme.accent.to_string(),
            foreground: theme.foreground.to_string(),
            eco_mode: theme.eco_mode,
        }
    }
}

impl ThemeSettings {
    pub fn to_theme(&self) -> Result<Theme> {
        Ok(Theme {
            primary: self.primary.parse::<Rgb>()?,
            on_primary: self.on_primary.parse::<Rgb>()?,
            accent: self.accent.parse::<Rgb>()?,
            foreground: self.foreground.parse::<Rgb>()?,
            eco_mode: self.eco_mode,
        })
    }
}

/// Page offsets and signature block heights, in points.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub top_offset: f64,
    pub bottom_margin: f64,
    pub signature_block_height: f64,
    pub image_block_height: f64,
    pub gap: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        let geometry = PageGeometry::a4();
        let metrics = BlockMetrics::default();
        Self {
            top_offset: geometry.top_offset,
            bottom_margin: geometry.bottom_margin,
            signature_block_height: metrics.signature_block_height,
            image_block_height: metrics.image_block_height,
            gap: metrics.gap,
        }
    }
}

impl LayoutSettings {
    pub fn planner(&self) -> PageLayoutPlanner {
        let geometry = PageGeometry {
            top_offset: self.top_offset,
            bottom_margin: self.bottom_margin,
            ..PageGeometry::a4()
        };
        let metrics = BlockMetrics {
            signature_block_height: self.signature_block_height,
            image_block_height: self.image_block_height,
            gap: self.gap,
        };
        PageLayoutPlanner::new(geometry, metrics)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PdfSettings {
    pub output_dir: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SituationError;

    #[test]
    fn missing_tables_fall_back_to_defaults() {
        let config: Config = toml::from_str("[pdf]\noutput_dir = \"out\"\n").unwrap();

        let theme = config.theme.to_theme().unwrap();
        assert_eq!(theme, Theme::default());
        assert_eq!(config.layout.planner(), PageLayoutPlanner::default());
    }

    #[test]
    fn partial_theme_keeps_other_colors() {
        let config: Config = toml::from_str(
            "[theme]\nprimary = \"#336699\"\neco_mode = true\n\n[pdf]\noutput_dir = \"out\"\n",
        )
        .unwrap();

        let theme = config.theme.to_theme().unwrap();
        assert_eq!(theme.primary, Rgb::new(0x33, 0x66, 0x99));
        assert_eq!(theme.on_primary, Rgb::WHITE);
        assert!(theme.eco_mode);
    }

    #[test]
    fn bad_color_is_reported() {
        let settings = ThemeSettings {
            accent: "teal".to_string(),
            ..ThemeSettings::default()
        };

        assert!(matches!(
            settings.to_theme(),
            Err(SituationError::InvalidColor(color)) if color == "teal"
        ));
    }

    #[test]
    fn layout_overrides_reach_the_planner() {
        let settings = LayoutSettings {
            gap: 30.0,
            bottom_margin: 20.0,
            ..LayoutSettings::default()
        };

        let planner = settings.planner();
        assert_eq!(planner.metrics().gap, 30.0);
        assert_eq!(planner.geometry().content_bottom(), PageGeometry::A4_HEIGHT - 20.0);
    }
}
