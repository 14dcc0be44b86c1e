//! Applying an extracted accent color to a theme.
//!
//! Extracted colors only reach the theme through a [`ThemeSink`]. A
//! [`ThemeController`] hands out an [`ExtractionToken`] per request and drops
//! any result whose token has been superseded, so a slow decode of an old
//! image can never overwrite the accent of a newer one.

use crate::color::extractor::{DominantColorExtractor, ImageSource};
use crate::color::hsl::Hsl;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Lowest saturation an accent may have.
pub const MIN_ACCENT_SATURATION: u8 = 55;
/// Accent lightness is kept within this band.
pub const MIN_ACCENT_LIGHTNESS: u8 = 40;
/// Upper end of the accent lightness band.
pub const MAX_ACCENT_LIGHTNESS: u8 = 60;

/// Names of the theme variables an accent is written to.
pub const THEME_VARIABLES: [&str; 3] = ["--primary", "--accent", "--ring"];

/// Clamps an extracted color into a band usable as a UI accent.
pub fn clamp_accent(hsl: Hsl) -> Hsl {
    Hsl::new(
        hsl.h,
        hsl.s.max(MIN_ACCENT_SATURATION),
        hsl.l.clamp(MIN_ACCENT_LIGHTNESS, MAX_ACCENT_LIGHTNESS),
    )
}

/// Accent variables of the active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// `--primary`.
    pub primary: Hsl,
    /// `--accent`.
    pub accent: Hsl,
    /// `--ring` (focus outline).
    pub ring: Hsl,
}

impl Theme {
    /// Theme derived from an extracted color; all three variables share the
    /// clamped accent.
    pub fn from_extracted(hsl: Hsl) -> Self {
        let accent = clamp_accent(hsl);
        Self {
            primary: accent,
            accent,
            ring: accent,
        }
    }

    /// `(variable, value)` pairs in [`THEME_VARIABLES`] order.
    pub fn css_variables(&self) -> [(&'static str, String); 3] {
        [
            (THEME_VARIABLES[0], self.primary.css_value()),
            (THEME_VARIABLES[1], self.accent.css_value()),
            (THEME_VARIABLES[2], self.ring.css_value()),
        ]
    }

    /// A `:root { ... }` stylesheet block setting the variables.
    pub fn to_css(&self) -> String {
        let mut css = String::from(":root {\n");
        for (name, value) in self.css_variables() {
            css.push_str(&format!("  {name}: {value};\n"));
        }
        css.push('}');
        css
    }
}

/// Receives theme updates.
pub trait ThemeSink: Send + Sync {
    /// Replaces the active accent variables.
    fn apply(&self, theme: &Theme);
}

/// Publishes the latest theme to every receiver of the channel.
impl ThemeSink for tokio::sync::watch::Sender<Option<Theme>> {
    fn apply(&self, theme: &Theme) {
        self.send_replace(Some(*theme));
    }
}

/// Identifies one extraction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExtractionToken(u64);

/// What a refresh did to the theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeUpdate {
    /// The theme now uses this accent.
    Applied(Theme),
    /// No color could be extracted; the theme is unchanged.
    NoColor,
    /// A newer request started meanwhile; the result was dropped.
    Stale,
}

/// Re-themes a sink whenever the displayed image changes.
pub struct ThemeController<S> {
    extractor: DominantColorExtractor,
    sink: S,
    generation: AtomicU64,
    apply_lock: Mutex<()>,
}

impl<S: ThemeSink> ThemeController<S> {
    /// Creates a controller with a default extractor.
    pub fn new(sink: S) -> Self {
        Self::with_extractor(DominantColorExtractor::new(), sink)
    }

    /// Creates a controller around an existing extractor.
    pub fn with_extractor(extractor: DominantColorExtractor, sink: S) -> Self {
        Self {
            extractor,
            sink,
            generation: AtomicU64::new(0),
            apply_lock: Mutex::new(()),
        }
    }

    /// The sink receiving theme updates.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Starts a new request, superseding all earlier tokens.
    pub fn begin(&self) -> ExtractionToken {
        ExtractionToken(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether no request has started since `token`.
    pub fn is_current(&self, token: ExtractionToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.0
    }

    /// Applies `hsl` unless `token` is stale.
    pub fn apply(&self, token: ExtractionToken, hsl: Hsl) -> ThemeUpdate {
        // a poisoned lock only means another apply panicked; the guard protects no data
        let _guard = self
            .apply_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !self.is_current(token) {
            tracing::debug!(?token, "dropping stale accent color");
            return ThemeUpdate::Stale;
        }
        let theme = Theme::from_extracted(hsl);
        self.sink.apply(&theme);
        tracing::debug!(accent = %theme.accent, "theme updated");
        ThemeUpdate::Applied(theme)
    }

    /// Extracts the accent of `source` and applies it if still current.
    ///
    /// Clearing the source (`None`) supersedes pending requests and leaves the
    /// theme as it is.
    pub async fn refresh(&self, source: Option<&ImageSource>) -> ThemeUpdate {
        let token = self.begin();
        match self.extractor.extract(source).await {
            Some(hsl) => self.apply(token, hsl),
            None => ThemeUpdate::NoColor,
        }
    }
}
