use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};
use crate::render::Color;

/// Number of distinct series colors before the palette repeats.
pub const PALETTE_LEN: usize = 8;

const PALETTE_RGB: [(u8, u8, u8); PALETTE_LEN] = [
    (0, 255, 0),
    (255, 0, 255),
    (0, 128, 255),
    (255, 128, 0),
    (0, 255, 191),
    (64, 0, 255),
    (255, 0, 64),
    (191, 255, 0),
];

const BAND_ALPHA: u8 = 160;

/// Colors, fonts and spacing used when building a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderTheme {
    pub major_grid_color: Color,
    pub minor_grid_color: Color,
    pub plot_background: Color,
    pub text_color: Color,
    pub legend_border_color: Color,
    pub palette: Vec<Color>,
    pub font_size_px: f64,
    pub small_font_size_px: f64,
    pub header_font_scale: f64,
    pub margin_px: f64,
    pub line_width_px: f64,
    pub empty_hint: String,
}

impl Default for RenderTheme {
    fn default() -> Self {
        Self {
            major_grid_color: Color::from_rgb8(140, 115, 60),
            minor_grid_color: Color::from_rgb8(80, 65, 34),
            plot_background: Color::BLACK,
            text_color: Color::BLACK,
            legend_border_color: Color::BLACK,
            palette: PALETTE_RGB
                .iter()
                .map(|&(red, green, blue)| Color::from_rgb8(red, green, blue))
                .collect(),
            font_size_px: 12.0,
            small_font_size_px: 10.0,
            header_font_scale: 1.2,
            margin_px: 2.0,
            line_width_px: 1.0,
            empty_hint: "Drop sensors from list here".to_owned(),
        }
    }
}

impl RenderTheme {
    #[must_use]
    pub fn header_font_size_px(&self) -> f64 {
        self.font_size_px * self.header_font_scale
    }

    /// Line color for the series at `index` within its panel.
    #[must_use]
    pub fn series_color(&self, index: usize) -> Color {
        if self.palette.is_empty() {
            return Color::WHITE;
        }
        self.palette[index % self.palette.len()]
    }

    /// Min/max band color: the line color at half intensity, translucent.
    #[must_use]
    pub fn band_color(&self, index: usize) -> Color {
        self.series_color(index)
            .half_intensity(f64::from(BAND_ALPHA) / 255.0)
    }

    pub fn validate(&self) -> GraphResult<()> {
        if self.palette.is_empty() {
            return Err(GraphError::InvalidConfig(
                "theme palette must not be empty".to_owned(),
            ));
        }
        for (name, value) in [
            ("font_size_px", self.font_size_px),
            ("small_font_size_px", self.small_font_size_px),
            ("header_font_scale", self.header_font_scale),
            ("line_width_px", self.line_width_px),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GraphError::InvalidConfig(format!(
                    "theme `{name}` must be finite and > 0"
                )));
            }
        }
        if !self.margin_px.is_finite() || self.margin_px < 0.0 {
            return Err(GraphError::InvalidConfig(
                "theme `margin_px` must be finite and >= 0".to_owned(),
            ));
        }
        for color in [
            self.major_grid_color,
            self.minor_grid_color,
            self.plot_background,
            self.text_color,
            self.legend_border_color,
        ]
        .iter()
        .chain(&self.palette)
        {
            color.validate()?;
        }
        Ok(())
    }
}
