//! Core types for image generation.

use crate::color::ImageSource;
use crate::error::{Result, VibranceError};
use crate::generation::catalog::{StylePreset, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Edge length used when neither size nor aspect ratio is requested.
pub const DEFAULT_DIMENSION: u32 = 1024;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    #[default]
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Image provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageProviderKind {
    /// Pollinations hosted image API.
    Pollinations,
}

impl std::fmt::Display for ImageProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pollinations => write!(f, "pollinations"),
        }
    }
}

/// Aspect-ratio presets, each mapped to a fixed pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square, 1024×1024.
    #[serde(rename = "1:1")]
    Square,
    /// 16:9 widescreen, 1920×1080.
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait, 1080×1920.
    #[serde(rename = "9:16")]
    Portrait,
    /// 4:3 standard, 1024×768.
    #[serde(rename = "4:3")]
    Standard,
    /// 3:4 portrait, 768×1024.
    #[serde(rename = "3:4")]
    StandardPortrait,
    /// 21:9 ultrawide, 2560×1080.
    #[serde(rename = "21:9")]
    Ultrawide,
}

impl AspectRatio {
    /// Every preset, in display order.
    pub const ALL: [AspectRatio; 6] = [
        Self::Square,
        Self::Landscape,
        Self::Portrait,
        Self::Standard,
        Self::StandardPortrait,
        Self::Ultrawide,
    ];

    /// Returns the aspect ratio as a string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Standard => "4:3",
            Self::StandardPortrait => "3:4",
            Self::Ultrawide => "21:9",
        }
    }

    /// Pixel size requested for this preset as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Square => (1024, 1024),
            Self::Landscape => (1920, 1080),
            Self::Portrait => (1080, 1920),
            Self::Standard => (1024, 768),
            Self::StandardPortrait => (768, 1024),
            Self::Ultrawide => (2560, 1080),
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Square => "Square",
            Self::Landscape => "Widescreen",
            Self::Portrait => "Portrait",
            Self::Standard => "Standard",
            Self::StandardPortrait => "Portrait 4:3",
            Self::Ultrawide => "Ultrawide",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = VibranceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| VibranceError::InvalidRequest(format!("unknown aspect ratio: {s}")))
    }
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Seed sent with the request.
    pub seed: Option<u64>,
    /// Requested pixel size.
    pub width: Option<u32>,
    /// Requested pixel size.
    pub height: Option<u32>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// A request to generate an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The text prompt describing the desired image.
    pub prompt: String,
    /// Model name (see [`crate::generation::IMAGE_MODELS`]).
    pub model: String,
    /// Desired width in pixels.
    pub width: Option<u32>,
    /// Desired height in pixels.
    pub height: Option<u32>,
    /// Aspect-ratio preset (used when width/height are unset).
    pub aspect_ratio: Option<AspectRatio>,
    /// Seed for reproducible generation.
    pub seed: Option<u64>,
    /// Let the service rewrite the prompt.
    pub enhance: bool,
    /// Ask the service to omit its watermark.
    pub nologo: bool,
    /// Enable the service's strict safety filter.
    pub safe: bool,
    /// Things the image should not contain.
    pub negative_prompt: Option<String>,
    /// Style appended to the prompt.
    pub style: StylePreset,
}

impl GenerationRequest {
    /// Creates a new request with the given prompt and default options.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: DEFAULT_MODEL.to_string(),
            width: None,
            height: None,
            aspect_ratio: None,
            seed: None,
            enhance: false,
            nologo: true,
            safe: false,
            negative_prompt: None,
            style: StylePreset::None,
        }
    }

    /// Sets the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the desired dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Sets the aspect-ratio preset.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    /// Sets the seed for reproducible generation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables or disables prompt enhancement.
    pub fn with_enhance(mut self, enhance: bool) -> Self {
        self.enhance = enhance;
        self
    }

    /// Enables or disables the watermark.
    pub fn with_nologo(mut self, nologo: bool) -> Self {
        self.nologo = nologo;
        self
    }

    /// Enables or disables the strict safety filter.
    pub fn with_safe(mut self, safe: bool) -> Self {
        self.safe = safe;
        self
    }

    /// Sets the negative prompt. Blank text clears it.
    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        let negative = negative.into();
        self.negative_prompt = (!negative.trim().is_empty()).then_some(negative);
        self
    }

    /// Sets the style preset.
    pub fn with_style(mut self, style: StylePreset) -> Self {
        self.style = style;
        self
    }

    /// Resolves the pixel size: explicit size, then aspect ratio, then 1024×1024.
    pub fn dimensions(&self) -> (u32, u32) {
        match (self.width, self.height, self.aspect_ratio) {
            (Some(w), Some(h), _) => (w, h),
            (_, _, Some(ratio)) => ratio.dimensions(),
            (w, h, None) => (
                w.unwrap_or(DEFAULT_DIMENSION),
                h.unwrap_or(DEFAULT_DIMENSION),
            ),
        }
    }

    /// The prompt actually sent, with the style suffix applied.
    pub fn effective_prompt(&self) -> String {
        self.style.apply(&self.prompt)
    }

    /// Rejects requests that can never succeed.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(VibranceError::InvalidRequest(
                "prompt must not be empty".into(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(VibranceError::InvalidRequest(
                "model must not be empty".into(),
            ));
        }
        let (width, height) = self.dimensions();
        if width == 0 || height == 0 {
            return Err(VibranceError::InvalidRequest(format!(
                "invalid size {width}x{height}"
            )));
        }
        Ok(())
    }
}

/// A generated image with its data and metadata.
#[derive(Debug, Clone)]
#[must_use = "generated image should be saved or processed"]
pub struct GeneratedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Image format.
    pub format: ImageFormat,
    /// Provider that generated this image.
    pub provider: ImageProviderKind,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    /// Creates a new generated image.
    pub fn new(
        data: Vec<u8>,
        format: ImageFormat,
        provider: ImageProviderKind,
        metadata: GenerationMetadata,
    ) -> Self {
        Self {
            data,
            format,
            provider,
            metadata,
        }
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// File name used when saving the `index`-th image of a gallery.
    pub fn gallery_file_name(&self, index: usize) -> String {
        format!("generated-image-{}.{}", index + 1, self.format.extension())
    }

    /// Saves the image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// An in-memory source for accent-color extraction.
    pub fn to_source(&self) -> ImageSource {
        ImageSource::Bytes(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"short"), None);
    }

    #[test]
    fn test_aspect_ratio_presets() {
        assert_eq!(AspectRatio::Square.dimensions(), (1024, 1024));
        assert_eq!(AspectRatio::Landscape.dimensions(), (1920, 1080));
        assert_eq!(AspectRatio::Ultrawide.dimensions(), (2560, 1080));
        assert_eq!(AspectRatio::StandardPortrait.label(), "Portrait 4:3");
    }

    #[test]
    fn test_aspect_ratio_from_str() {
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::Landscape);
        assert_eq!(" 3:4 ".parse::<AspectRatio>().unwrap(), AspectRatio::StandardPortrait);
        assert!("5:4".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_request_defaults() {
        let req = GenerationRequest::new("A lighthouse");
        assert_eq!(req.model, "flux");
        assert_eq!(req.dimensions(), (1024, 1024));
        assert!(req.nologo);
        assert!(!req.enhance);
        assert!(!req.safe);
        assert!(req.seed.is_none());
    }

    #[test]
    fn test_dimensions_precedence() {
        let req = GenerationRequest::new("x").with_aspect_ratio(AspectRatio::Portrait);
        assert_eq!(req.dimensions(), (1080, 1920));

        let req = req.with_size(640, 480);
        assert_eq!(req.dimensions(), (640, 480));
    }

    #[test]
    fn test_blank_negative_prompt_is_dropped() {
        let req = GenerationRequest::new("x").with_negative_prompt("   ");
        assert!(req.negative_prompt.is_none());

        let req = req.with_negative_prompt("blurry");
        assert_eq!(req.negative_prompt.as_deref(), Some("blurry"));
    }

    #[test]
    fn test_validate_rejects_empty_prompt() {
        let err = GenerationRequest::new("  \n").validate().unwrap_err();
        assert!(matches!(err, VibranceError::InvalidRequest(_)));

        let err = GenerationRequest::new("ok").with_size(0, 10).validate().unwrap_err();
        assert!(matches!(err, VibranceError::InvalidRequest(_)));

        assert!(GenerationRequest::new("ok").validate().is_ok());
    }

    #[test]
    fn test_effective_prompt_with_style() {
        let req = GenerationRequest::new("A fox").with_style(StylePreset::Watercolor);
        assert_eq!(req.effective_prompt(), "A fox, watercolor");
    }

    #[test]
    fn test_gallery_file_name() {
        let image = GeneratedImage::new(
            PNG_MAGIC.to_vec(),
            ImageFormat::Png,
            ImageProviderKind::Pollinations,
            GenerationMetadata::default(),
        );
        assert_eq!(image.gallery_file_name(0), "generated-image-1.png");
        assert_eq!(image.gallery_file_name(2), "generated-image-3.png");
        assert_eq!(image.to_source(), ImageSource::Bytes(PNG_MAGIC.to_vec()));
    }
}
