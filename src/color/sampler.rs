//! Vibrant-color sampling over an RGBA raster.
//!
//! The raster is bounded to [`MAX_SAMPLE_DIMENSION`] on its longer side, then
//! every [`SAMPLE_STRIDE`]-th pixel is considered. Pixels that are transparent,
//! near-black, near-white or gray are dropped; the rest are grouped into
//! buckets by rounding each channel to a multiple of [`QUANTIZATION_STEP`].
//! The bucket with the best [`vibrance_score`] wins.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbaImage};
use palette::Srgb;
use std::collections::HashMap;

/// Longest side of the raster that gets sampled.
pub const MAX_SAMPLE_DIMENSION: u32 = 100;

/// Only every n-th pixel (row-major) is sampled.
pub const SAMPLE_STRIDE: usize = 5;

/// Pixels with lower alpha count as transparent.
pub const MIN_ALPHA: u8 = 128;

/// Lightness band a pixel must fall in (inclusive).
pub const MIN_LIGHTNESS: f64 = 0.15;
/// Upper end of the lightness band.
pub const MAX_LIGHTNESS: f64 = 0.85;

/// Pixels below this saturation count as gray.
pub const MIN_SATURATION: f64 = 0.20;

/// Bucket width per channel.
pub const QUANTIZATION_STEP: u8 = 32;

/// Returned when no pixel qualifies.
pub const FALLBACK_COLOR: Srgb<u8> = Srgb::new(255, 120, 50);

/// Raster size used for sampling an image of `width × height`.
///
/// Images within the cap keep their size; larger ones are scaled so the
/// longer side equals the cap, with the other side truncated (never below 1).
pub fn sample_dimensions(width: u32, height: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= MAX_SAMPLE_DIMENSION {
        return (width, height);
    }
    let scale = |side: u32| {
        let scaled = u64::from(side) * u64::from(MAX_SAMPLE_DIMENSION) / u64::from(longest);
        (scaled as u32).max(1)
    };
    (scale(width), scale(height))
}

/// Rasterizes `img` into an RGBA buffer no larger than the sampling cap.
pub fn rasterize(img: &DynamicImage) -> RgbaImage {
    let (width, height) = img.dimensions();
    let (target_w, target_h) = sample_dimensions(width, height);
    if (target_w, target_h) == (width, height) {
        return img.to_rgba8();
    }
    tracing::trace!(width, height, target_w, target_h, "downscaling for sampling");
    img.resize_exact(target_w, target_h, FilterType::Triangle)
        .to_rgba8()
}

/// Lightness and saturation (both 0..=1) of an 8-bit pixel.
pub fn lightness_saturation(r: u8, g: u8, b: u8) -> (f64, f64) {
    let max = f64::from(r.max(g).max(b));
    let min = f64::from(r.min(g).min(b));
    let l = (max + min) / 2.0 / 255.0;
    let s = if max == min {
        0.0
    } else if l > 0.5 {
        (max - min) / (510.0 - max - min)
    } else {
        (max - min) / (max + min)
    };
    (l, s)
}

/// Rounds a channel to the nearest multiple of [`QUANTIZATION_STEP`], capped at 255.
pub fn quantize_channel(value: u8) -> u8 {
    let step = f64::from(QUANTIZATION_STEP);
    let rounded = (f64::from(value) / step).round() * step;
    rounded.min(255.0) as u8
}

/// Score of a bucket: frequency with a bonus for saturation.
pub fn vibrance_score(count: u32, saturation: f64) -> f64 {
    f64::from(count) * (1.0 + 2.0 * saturation)
}

/// Samples that quantized to the same color.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBucket {
    /// Quantized color of the bucket.
    pub color: Srgb<u8>,
    /// Number of samples that landed here.
    pub count: u32,
    /// Saturation of the sample that opened the bucket.
    pub saturation: f64,
}

impl ColorBucket {
    /// See [`vibrance_score`].
    pub fn score(&self) -> f64 {
        vibrance_score(self.count, self.saturation)
    }
}

/// Buckets in order of creation.
#[derive(Debug, Default)]
pub struct BucketTally {
    index: HashMap<[u8; 3], usize>,
    buckets: Vec<ColorBucket>,
}

impl BucketTally {
    /// Creates an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one qualifying sample.
    pub fn add(&mut self, r: u8, g: u8, b: u8, saturation: f64) {
        let key = [quantize_channel(r), quantize_channel(g), quantize_channel(b)];
        match self.index.get(&key) {
            Some(&i) => self.buckets[i].count += 1,
            None => {
                self.index.insert(key, self.buckets.len());
                self.buckets.push(ColorBucket {
                    color: Srgb::new(key[0], key[1], key[2]),
                    count: 1,
                    saturation,
                });
            }
        }
    }

    /// Filters and records one raw pixel. Returns whether it qualified.
    pub fn sample(&mut self, pixel: [u8; 4]) -> bool {
        let [r, g, b, a] = pixel;
        if a < MIN_ALPHA {
            return false;
        }
        let (l, s) = lightness_saturation(r, g, b);
        if !(MIN_LIGHTNESS..=MAX_LIGHTNESS).contains(&l) || s < MIN_SATURATION {
            return false;
        }
        self.add(r, g, b, s);
        true
    }

    /// Buckets in creation order.
    pub fn buckets(&self) -> &[ColorBucket] {
        &self.buckets
    }

    /// Number of distinct buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no sample qualified.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Highest-scoring bucket; on ties the earliest one wins.
    pub fn best(&self) -> Option<&ColorBucket> {
        self.buckets.iter().fold(None, |best: Option<&ColorBucket>, bucket| match best {
            Some(current) if current.score() >= bucket.score() => Some(current),
            _ => Some(bucket),
        })
    }
}

/// Tallies every [`SAMPLE_STRIDE`]-th pixel of a raster.
pub fn tally(raster: &RgbaImage) -> BucketTally {
    let mut tally = BucketTally::new();
    for pixel in raster.pixels().step_by(SAMPLE_STRIDE) {
        tally.sample(pixel.0);
    }
    tally
}

/// Most vibrant color of a raster, or [`FALLBACK_COLOR`] if nothing qualifies.
pub fn vibrant_color(raster: &RgbaImage) -> Srgb<u8> {
    let tally = tally(raster);
    match tally.best() {
        Some(bucket) => {
            tracing::trace!(
                buckets = tally.len(),
                count = bucket.count,
                score = bucket.score(),
                "selected vibrant bucket"
            );
            bucket.color
        }
        None => FALLBACK_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, pixel: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(pixel))
    }

    #[test]
    fn test_transparent_image_falls_back() {
        let raster = solid(20, 20, [200, 10, 10, 0]);
        assert_eq!(vibrant_color(&raster), FALLBACK_COLOR);
    }

    #[test]
    fn test_gray_image_falls_back() {
        let raster = solid(20, 20, [120, 125, 130, 255]);
        assert_eq!(vibrant_color(&raster), FALLBACK_COLOR);
    }

    #[test]
    fn test_too_dark_and_too_light_are_ignored() {
        // saturated but l ≈ 0.1
        assert!(!BucketTally::new().sample([50, 0, 0, 255]));
        // saturated but l ≈ 0.9
        assert!(!BucketTally::new().sample([255, 204, 204, 255]));
        assert!(BucketTally::new().sample([200, 30, 30, 255]));
    }

    #[test]
    fn test_solid_color_selected() {
        let raster = solid(10, 10, [30, 100, 200, 255]);
        // 30→32, 100→96, 200→192
        assert_eq!(vibrant_color(&raster), Srgb::new(32, 96, 192));
    }

    #[test]
    fn test_quantize_channel() {
        assert_eq!(quantize_channel(0), 0);
        assert_eq!(quantize_channel(15), 0);
        assert_eq!(quantize_channel(16), 32);
        assert_eq!(quantize_channel(100), 96);
        assert_eq!(quantize_channel(250), 255);
        assert_eq!(quantize_channel(255), 255);
    }

    #[test]
    fn test_score_frequency_beats_weak_saturation_bonus() {
        assert!((vibrance_score(900, 0.1) - 1080.0).abs() < 1e-9);
        assert!((vibrance_score(100, 0.9) - 280.0).abs() < 1e-9);
        assert!(vibrance_score(900, 0.1) > vibrance_score(100, 0.9));
    }

    #[test]
    fn test_saturation_bonus_flips_ranking() {
        let vivid = vibrance_score(100, 0.95);
        let dull = vibrance_score(105, 0.1);
        assert!((vivid - 290.0).abs() < 1e-9);
        assert!((dull - 126.0).abs() < 1e-9);
        assert!(vivid > dull);
    }

    #[test]
    fn test_vivid_minority_beats_dull_majority() {
        // stride 5 over a 10x10 raster samples columns 0 and 5 of every row
        let mut raster = solid(10, 10, [170, 110, 110, 255]);
        for y in 6..10 {
            for x in 0..10 {
                raster.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }

        let tally = tally(&raster);
        let dull = &tally.buckets()[0];
        let vivid = &tally.buckets()[1];
        assert_eq!(dull.color, Srgb::new(160, 96, 96));
        assert_eq!((dull.count, vivid.count), (12, 8));
        // s ≈ 0.26 gives 12 × 1.52 ≈ 18.3 against 8 × 3 = 24
        assert!(vivid.score() > dull.score());

        assert_eq!(vibrant_color(&raster), Srgb::new(255, 0, 0));
    }

    #[test]
    fn test_best_bucket_uses_score() {
        let mut tally = BucketTally::new();
        for _ in 0..105 {
            tally.add(100, 90, 90, 0.1);
        }
        for _ in 0..100 {
            tally.add(250, 0, 0, 0.95);
        }
        let best = tally.best().unwrap();
        assert_eq!(best.color, Srgb::new(255, 0, 0));
        assert_eq!(best.count, 100);
    }

    #[test]
    fn test_best_bucket_ties_keep_first() {
        let mut tally = BucketTally::new();
        tally.add(0, 0, 200, 0.5);
        tally.add(200, 0, 0, 0.5);
        assert_eq!(tally.best().unwrap().color, Srgb::new(0, 0, 192));
    }

    #[test]
    fn test_same_bucket_regardless_of_order() {
        let mut forward = BucketTally::new();
        forward.add(100, 40, 40, 0.4);
        forward.add(110, 47, 33, 0.5);

        let mut backward = BucketTally::new();
        backward.add(110, 47, 33, 0.5);
        backward.add(100, 40, 40, 0.4);

        assert_eq!(forward.len(), 1);
        assert_eq!(backward.len(), 1);
        assert_eq!(forward.buckets()[0].color, backward.buckets()[0].color);
        assert_eq!(forward.buckets()[0].count, 2);
        assert_eq!(backward.buckets()[0].count, 2);
    }

    #[test]
    fn test_bucket_keeps_first_saturation() {
        let mut tally = BucketTally::new();
        tally.add(100, 40, 40, 0.4);
        tally.add(100, 40, 40, 0.9);
        assert_eq!(tally.buckets()[0].saturation, 0.4);
    }

    #[test]
    fn test_stride_skips_pixels() {
        // one row: red at index 0 and 5, blue everywhere else
        let mut raster = solid(10, 1, [30, 30, 200, 255]);
        raster.put_pixel(0, 0, Rgba([200, 30, 30, 255]));
        raster.put_pixel(5, 0, Rgba([200, 30, 30, 255]));

        let tally = tally(&raster);
        assert_eq!(tally.len(), 1);
        assert_eq!(tally.buckets()[0].count, 2);
        assert_eq!(tally.buckets()[0].color, Srgb::new(192, 32, 32));
    }

    #[test]
    fn test_lightness_saturation() {
        let (l, s) = lightness_saturation(255, 0, 0);
        assert!((l - 0.5).abs() < 1e-9);
        assert!((s - 1.0).abs() < 1e-9);

        let (l, s) = lightness_saturation(128, 128, 128);
        assert!((l - 128.0 / 255.0).abs() < 1e-9);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_sample_dimensions() {
        assert_eq!(sample_dimensions(400, 200), (100, 50));
        assert_eq!(sample_dimensions(200, 400), (50, 100));
        assert_eq!(sample_dimensions(1920, 1080), (100, 56));
        assert_eq!(sample_dimensions(80, 60), (80, 60));
        assert_eq!(sample_dimensions(1000, 5), (100, 1));
    }

    #[test]
    fn test_rasterize_downscales_preserving_aspect() {
        let img = DynamicImage::ImageRgba8(solid(400, 200, [10, 200, 10, 255]));
        let raster = rasterize(&img);
        assert_eq!(raster.dimensions(), (100, 50));
    }

    #[test]
    fn test_rasterize_keeps_small_images() {
        let img = DynamicImage::ImageRgba8(solid(64, 32, [10, 200, 10, 255]));
        assert_eq!(rasterize(&img).dimensions(), (64, 32));
    }
}
