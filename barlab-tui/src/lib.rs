//! barlab TUI: terminal rendering of benchmark results.
//!
//! - [`chart::ComparisonChart`]: dual-axis grouped bar widget
//! - [`viewer::show_chart`]: full-screen interactive display

pub mod chart;
pub mod theme;
pub mod viewer;

pub use chart::{ChartPoint, ComparisonChart};
pub use theme::Theme;
pub use viewer::show_chart;
