//! Dominant accent-color extraction from an image reference.

use crate::color::hsl::Hsl;
use crate::color::sampler::{rasterize, vibrant_color};
use crate::error::{Result, VibranceError};
use base64::Engine;
use image::DynamicImage;
use std::path::PathBuf;
use std::time::Duration;

/// How long a URL source may take to download.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can be decoded into pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// `http(s)://` or `data:` URL.
    Url(String),
    /// Local file.
    Path(PathBuf),
    /// Encoded image bytes (PNG, JPEG, WebP).
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Interprets a CLI-style reference: URLs are recognized by scheme,
    /// anything else is a path.
    pub fn parse(reference: &str) -> Self {
        let lower = reference.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
        {
            Self::Url(reference.to_string())
        } else {
            Self::Path(PathBuf::from(reference))
        }
    }
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) if url.starts_with("data:") => write!(f, "data URL"),
            Self::Url(url) => write!(f, "{url}"),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Bytes(bytes) => write!(f, "{} bytes", bytes.len()),
        }
    }
}

/// Extracts a vibrant accent color from images.
///
/// Every call starts from scratch; nothing is cached between images.
#[derive(Debug, Clone)]
pub struct DominantColorExtractor {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for DominantColorExtractor {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }
}

impl DominantColorExtractor {
    /// Creates an extractor with its own HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the download timeout for URL sources.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Accent color of `source`, or `None` when there is no source or it
    /// cannot be loaded and decoded.
    ///
    /// A missing source returns immediately without any I/O. Failures are
    /// logged and never retried.
    pub async fn extract(&self, source: Option<&ImageSource>) -> Option<Hsl> {
        let source = source?;
        match self.try_extract(source).await {
            Ok(hsl) => {
                tracing::debug!(%source, %hsl, "extracted accent color");
                Some(hsl)
            }
            Err(e) => {
                tracing::warn!(%source, "accent color extraction failed: {e}");
                None
            }
        }
    }

    /// Like [`extract`](Self::extract) but reports why extraction failed.
    pub async fn try_extract(&self, source: &ImageSource) -> Result<Hsl> {
        let data = self.load(source).await?;
        tokio::task::spawn_blocking(move || extract_from_bytes(&data))
            .await
            .map_err(|e| VibranceError::Decode(format!("extraction task failed: {e}")))?
    }

    async fn load(&self, source: &ImageSource) -> Result<Vec<u8>> {
        match source {
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
            ImageSource::Path(path) => Ok(tokio::fs::read(path).await?),
            ImageSource::Url(url) if url.starts_with("data:") => decode_data_url(url),
            ImageSource::Url(url) => {
                let response = self
                    .client
                    .get(url)
                    .timeout(self.timeout)
                    .send()
                    .await
                    .map_err(|e| self.map_download_error(e))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(VibranceError::Api {
                        status: status.as_u16(),
                        message: "failed to download image".into(),
                    });
                }
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| self.map_download_error(e))?;
                Ok(bytes.to_vec())
            }
        }
    }

    fn map_download_error(&self, e: reqwest::Error) -> VibranceError {
        if e.is_timeout() {
            VibranceError::Timeout(self.timeout)
        } else {
            VibranceError::Network(e)
        }
    }
}

/// Decodes encoded image bytes and extracts their accent color.
pub fn extract_from_bytes(data: &[u8]) -> Result<Hsl> {
    let img = image::load_from_memory(data)?;
    Ok(extract_from_image(&img))
}

/// Accent color of an already decoded image.
pub fn extract_from_image(img: &DynamicImage) -> Hsl {
    let raster = rasterize(img);
    Hsl::from_rgb(vibrant_color(&raster))
}

fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let (meta, payload) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| VibranceError::Decode("malformed data URL".into()))?;
    if !meta.ends_with(";base64") {
        return Err(VibranceError::Decode(
            "only base64 data URLs are supported".into(),
        ));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| VibranceError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::{Cursor, Read, Write};
    use std::net::TcpListener;

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn solid_png(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        png_bytes(&RgbaImage::from_pixel(width, height, Rgba(pixel)))
    }

    #[test]
    fn test_parse_source() {
        assert_eq!(
            ImageSource::parse("https://example.com/a.png"),
            ImageSource::Url("https://example.com/a.png".into())
        );
        assert!(matches!(
            ImageSource::parse("data:image/png;base64,AAAA"),
            ImageSource::Url(_)
        ));
        assert_eq!(
            ImageSource::parse("out/image-1.png"),
            ImageSource::Path(PathBuf::from("out/image-1.png"))
        );
    }

    #[tokio::test]
    async fn test_no_source_means_no_color() {
        let extractor = DominantColorExtractor::new();
        assert_eq!(extractor.extract(None).await, None);
    }

    #[tokio::test]
    async fn test_transparent_image_yields_fallback_hsl() {
        let extractor = DominantColorExtractor::new();
        let source = ImageSource::Bytes(solid_png(50, 50, [0, 0, 0, 0]));
        assert_eq!(extractor.extract(Some(&source)).await, Some(Hsl::new(20, 100, 60)));
    }

    #[tokio::test]
    async fn test_gray_image_yields_fallback_hsl() {
        let extractor = DominantColorExtractor::new();
        let source = ImageSource::Bytes(solid_png(300, 150, [128, 128, 128, 255]));
        assert_eq!(extractor.extract(Some(&source)).await, Some(Hsl::new(20, 100, 60)));
    }

    #[tokio::test]
    async fn test_red_image_yields_red() {
        let extractor = DominantColorExtractor::new();
        let source = ImageSource::Bytes(solid_png(40, 40, [255, 0, 0, 255]));
        assert_eq!(extractor.extract(Some(&source)).await, Some(Hsl::new(0, 100, 50)));
    }

    #[test]
    fn test_gray_majority_is_ignored() {
        // stride 5 over a 10-wide image samples columns 0 and 5
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([140, 100, 100, 255]));
        for y in 0..10 {
            img.put_pixel(5, y, Rgba([0, 200, 0, 255]));
        }
        // column 0 has s ≈ 0.17, below the gray cutoff
        let hsl = extract_from_bytes(&png_bytes(&img)).unwrap();
        assert_eq!(hsl.h, 120);
    }

    #[tokio::test]
    async fn test_undecodable_bytes_yield_none() {
        let extractor = DominantColorExtractor::new();
        let source = ImageSource::Bytes(b"definitely not an image".to_vec());
        assert_eq!(extractor.extract(Some(&source)).await, None);
        assert!(extractor.try_extract(&source).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_yields_none() {
        let extractor = DominantColorExtractor::new();
        let source = ImageSource::Path(PathBuf::from("/nonexistent/vibrance/image.png"));
        assert_eq!(extractor.extract(Some(&source)).await, None);
    }

    #[tokio::test]
    async fn test_data_url_source() {
        let png = solid_png(8, 8, [0, 0, 255, 255]);
        let url = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        let extractor = DominantColorExtractor::new();
        assert_eq!(
            extractor.extract(Some(&ImageSource::Url(url))).await,
            Some(Hsl::new(240, 100, 50))
        );
    }

    #[test]
    fn test_decode_data_url_rejects_plain_text() {
        assert!(decode_data_url("data:text/plain,hello").is_err());
        assert!(decode_data_url("data:image/png;base64").is_err());
    }

    #[tokio::test]
    async fn test_unresponsive_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        // accept the connection and never answer
        std::thread::spawn(move || {
            let (_stream, _) = listener.accept().unwrap();
            std::thread::sleep(Duration::from_secs(10));
        });

        let extractor = DominantColorExtractor::new().with_timeout(Duration::from_millis(200));
        let source = ImageSource::Url(format!("http://{addr}/slow.png"));

        let err = tokio::time::timeout(Duration::from_secs(5), extractor.try_extract(&source))
            .await
            .expect("download should time out on its own")
            .unwrap_err();
        assert!(matches!(err, VibranceError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_url_source_is_downloaded() {
        let png = solid_png(8, 8, [0, 200, 0, 255]);
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                png.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&png).unwrap();
        });

        let extractor = DominantColorExtractor::new();
        let source = ImageSource::Url(format!("http://{addr}/green.png"));
        assert_eq!(extractor.extract(Some(&source)).await, Some(Hsl::new(120, 100, 38)));
    }
}
