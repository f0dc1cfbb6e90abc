//! Color tokens for the comparison chart.
//!
//! Dark background with one saturated color per series, so the two axes
//! read apart at a glance:
//! - **Time**: blue (left axis)
//! - **Size**: green (right axis)

use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    /// Near-black background
    pub background: Color,
    /// Border and title accent
    pub accent: Color,
    /// Time bars and left axis
    pub time: Color,
    /// Size bars and right axis
    pub size: Color,
    /// Axis lines and hints
    pub muted: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            background: Color::Rgb(18, 18, 20),
            accent: Color::Rgb(0, 255, 255),
            time: Color::Rgb(30, 144, 255),
            size: Color::Rgb(0, 200, 83),
            muted: Color::Rgb(100, 149, 237),
            text_primary: Color::White,
            text_secondary: Color::Rgb(170, 170, 170),
        }
    }

    /// Color of a series by axis side.
    pub fn series_color(&self, series: crate::chart::Series) -> Color {
        match series {
            crate::chart::Series::Time => self.time,
            crate::chart::Series::Size => self.size,
        }
    }
}
