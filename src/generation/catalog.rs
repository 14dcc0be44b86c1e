//! Known models and style presets.

use serde::{Deserialize, Serialize};

/// Model used when the caller does not choose one.
pub const DEFAULT_MODEL: &str = "flux";

/// A model offered by the image service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageModel {
    /// Identifier sent as the `model` query parameter.
    pub name: &'static str,
    /// Short description for listings.
    pub description: &'static str,
}

/// Models the service is known to accept.
pub const IMAGE_MODELS: &[ImageModel] = &[
    ImageModel {
        name: "flux",
        description: "High quality, balanced speed",
    },
    ImageModel {
        name: "turbo",
        description: "Fast generation, good quality",
    },
    ImageModel {
        name: "gptimage",
        description: "GPT-powered image generation",
    },
    ImageModel {
        name: "kontext",
        description: "Context-aware generation",
    },
    ImageModel {
        name: "seedream",
        description: "Dreamlike artistic style",
    },
    ImageModel {
        name: "nanobanana",
        description: "Efficient, quick results",
    },
];

/// Looks up a known model by name.
pub fn find_model(name: &str) -> Option<&'static ImageModel> {
    IMAGE_MODELS.iter().find(|m| m.name.eq_ignore_ascii_case(name))
}

/// Style keyword appended to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StylePreset {
    /// Prompt is sent unchanged.
    #[default]
    None,
    /// 35mm film look.
    Film35mm,
    /// Minimal composition.
    Minimal,
    /// Cinematic lighting.
    Cinematic,
    /// Anime illustration.
    Anime,
    /// Watercolor painting.
    Watercolor,
    /// Oil painting.
    OilPainting,
    /// Digital art.
    DigitalArt,
    /// Photographic realism.
    Photography,
}

impl StylePreset {
    /// Every preset, in display order.
    pub const ALL: [StylePreset; 9] = [
        Self::None,
        Self::Film35mm,
        Self::Minimal,
        Self::Cinematic,
        Self::Anime,
        Self::Watercolor,
        Self::OilPainting,
        Self::DigitalArt,
        Self::Photography,
    ];

    /// Keyword added to the prompt, `None` for [`StylePreset::None`].
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Film35mm => Some("35mm film"),
            Self::Minimal => Some("minimal"),
            Self::Cinematic => Some("cinematic"),
            Self::Anime => Some("anime"),
            Self::Watercolor => Some("watercolor"),
            Self::OilPainting => Some("oil painting"),
            Self::DigitalArt => Some("digital art"),
            Self::Photography => Some("photography"),
        }
    }

    /// Returns `prompt` with this style's keyword appended.
    pub fn apply(&self, prompt: &str) -> String {
        match self.keyword() {
            Some(keyword) => format!("{}, {keyword}", prompt.trim_end()),
            None => prompt.to_string(),
        }
    }
}

impl std::str::FromStr for StylePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        if wanted == "none" {
            return Ok(Self::None);
        }
        Self::ALL
            .into_iter()
            .find(|style| style.keyword() == Some(wanted.as_str()))
            .ok_or_else(|| format!("unknown style: {s}"))
    }
}
