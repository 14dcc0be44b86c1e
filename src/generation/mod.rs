//! Image generation module.

mod catalog;
mod provider;
pub mod providers;
mod types;

pub use catalog::{find_model, ImageModel, StylePreset, DEFAULT_MODEL, IMAGE_MODELS};
pub use provider::{batch_seeds, ImageProvider, ImageProviderExt, MAX_BATCH_SIZE};
pub use types::{
    AspectRatio, GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat,
    ImageProviderKind, DEFAULT_DIMENSION,
};
