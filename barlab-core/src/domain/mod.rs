//! Domain types shared by the fetcher, the codecs and the runner.

pub mod bar;
pub mod dataset;
pub mod timeframe;

pub use bar::Bar;
pub use dataset::{fingerprint, Dataset};
pub use timeframe::{ParseTimeframeError, Timeframe};
