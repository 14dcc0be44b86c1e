#![warn(missing_docs)]
//! Vibrance - AI image generation with accent-color theming.
//!
//! This crate wraps a hosted text-to-image API and extracts a vibrant accent
//! color from generated images so a UI can retheme itself around them.
//!
//! # Quick Start
//!
//! ```no_run
//! use vibrance::{GenerationRequest, ImageProvider, PollinationsProvider};
//!
//! #[tokio::main]
//! async fn main() -> vibrance::Result<()> {
//!     let provider = PollinationsProvider::builder().build()?;
//!     let request = GenerationRequest::new("A lighthouse at dusk").with_seed(7);
//!     let image = provider.generate(&request).await?;
//!     image.save("lighthouse.jpg")?;
//!     Ok(())
//! }
//! ```
//!
//! # Accent colors
//!
//! ```no_run
//! use vibrance::{DominantColorExtractor, ImageSource, Theme};
//!
//! #[tokio::main]
//! async fn main() {
//!     let extractor = DominantColorExtractor::new();
//!     let source = ImageSource::parse("lighthouse.jpg");
//!     if let Some(hsl) = extractor.extract(Some(&source)).await {
//!         println!("{}", Theme::from_extracted(hsl).to_css());
//!     }
//! }
//! ```
//!
//! # Features
//!
//! - `pollinations` (default): the Pollinations image provider
//! - `cli`: the `vibrance` command-line tool

pub mod color;
mod error;
pub mod generation;

pub use error::{Result, VibranceError};

pub use color::{
    DominantColorExtractor, ExtractionToken, Hsl, ImageSource, Theme, ThemeController, ThemeSink,
    ThemeUpdate,
};
pub use generation::{
    AspectRatio, GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat, ImageModel,
    ImageProvider, ImageProviderExt, ImageProviderKind, StylePreset, IMAGE_MODELS,
};

#[cfg(feature = "pollinations")]
pub use generation::providers::{PollinationsProvider, PollinationsProviderBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::color::{DominantColorExtractor, Hsl, ImageSource, Theme};
    pub use crate::error::{Result, VibranceError};
    pub use crate::generation::{GeneratedImage, GenerationRequest, ImageProvider, ImageProviderExt};

    #[cfg(feature = "pollinations")]
    pub use crate::generation::providers::PollinationsProvider;
}
