//! Accent-color extraction and theming.

mod extractor;
mod hsl;
pub mod sampler;
pub mod theme;

pub use extractor::{
    extract_from_bytes, extract_from_image, DominantColorExtractor, ImageSource,
    DEFAULT_DOWNLOAD_TIMEOUT,
};
pub use hsl::Hsl;
pub use theme::{clamp_accent, ExtractionToken, Theme, ThemeController, ThemeSink, ThemeUpdate};
