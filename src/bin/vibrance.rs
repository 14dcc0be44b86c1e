//! CLI for Vibrance - AI image generation with accent colors.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vibrance::generation::{AspectRatio, GenerationRequest, ImageProviderExt, StylePreset};
use vibrance::{DominantColorExtractor, ImageSource, PollinationsProvider, Theme, IMAGE_MODELS};

#[derive(Parser)]
#[command(name = "vibrance")]
#[command(about = "Generate images via the Pollinations API and derive accent colors from them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate images from a text prompt
    Generate(GenerateArgs),

    /// Print the accent color of an image file or URL
    Accent(AccentArgs),

    /// List known models
    Models,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Directory the images are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Model name
    #[arg(short, long, default_value = vibrance::generation::DEFAULT_MODEL)]
    model: String,

    /// Aspect ratio preset
    #[arg(long, value_enum, conflicts_with_all = ["width", "height"])]
    aspect_ratio: Option<AspectRatioArg>,

    /// Image width in pixels
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Seed for reproducible generation; batches use seed, seed+1, ...
    #[arg(long)]
    seed: Option<u64>,

    /// Number of images to generate
    #[arg(short = 'n', long, default_value_t = 1,
          value_parser = clap::value_parser!(u32).range(1..=vibrance::generation::MAX_BATCH_SIZE as i64))]
    count: u32,

    /// Let the service enhance the prompt
    #[arg(long)]
    enhance: bool,

    /// Enable the strict safety filter
    #[arg(long)]
    safe: bool,

    /// Keep the service watermark
    #[arg(long)]
    logo: bool,

    /// Things the image should not contain
    #[arg(long)]
    negative: Option<String>,

    /// Style appended to the prompt (e.g. "cinematic", "oil painting")
    #[arg(long, default_value = "none")]
    style: StylePreset,

    /// Retries per image on transient failures
    #[arg(long, default_value_t = 2)]
    retries: u32,

    /// Also print each image's accent color
    #[arg(long)]
    accent: bool,
}

#[derive(Args)]
struct AccentArgs {
    /// Image path or http(s) URL
    image: String,

    /// Download timeout in seconds for URL images
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "1:1")]
    Square,
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
    #[value(name = "4:3")]
    Standard,
    #[value(name = "3:4")]
    StandardPortrait,
    #[value(name = "21:9")]
    Ultrawide,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Square => AspectRatio::Square,
            AspectRatioArg::Landscape => AspectRatio::Landscape,
            AspectRatioArg::Portrait => AspectRatio::Portrait,
            AspectRatioArg::Standard => AspectRatio::Standard,
            AspectRatioArg::StandardPortrait => AspectRatio::StandardPortrait,
            AspectRatioArg::Ultrawide => AspectRatio::Ultrawide,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => generate(args, cli.json).await?,
        Commands::Accent(args) => accent(args, cli.json).await?,
        Commands::Models => list_models(cli.json)?,
    }

    Ok(())
}

fn build_request(args: &GenerateArgs) -> GenerationRequest {
    let mut request = GenerationRequest::new(&args.prompt)
        .with_model(&args.model)
        .with_enhance(args.enhance)
        .with_safe(args.safe)
        .with_nologo(!args.logo)
        .with_style(args.style);

    if let (Some(w), Some(h)) = (args.width, args.height) {
        request = request.with_size(w, h);
    }
    if let Some(ar) = args.aspect_ratio {
        request = request.with_aspect_ratio(ar.into());
    }
    if let Some(seed) = args.seed {
        request = request.with_seed(seed);
    }
    if let Some(negative) = &args.negative {
        request = request.with_negative_prompt(negative);
    }
    request
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let request = build_request(&args);
    request.validate()?;
    if vibrance::generation::find_model(&request.model).is_none() {
        tracing::warn!(model = %request.model, "model is not in the known list, sending anyway");
    }

    let provider = PollinationsProvider::builder().build()?;

    let images = if args.count == 1 {
        vec![provider.generate_with_retries(&request, args.retries).await?]
    } else {
        provider.generate_batch(&request, args.count, args.retries).await?
    };

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let extractor = DominantColorExtractor::new();
    let mut results = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        let path = args.output_dir.join(image.gallery_file_name(index));
        image
            .save(&path)
            .with_context(|| format!("saving {}", path.display()))?;

        let accent = if args.accent {
            extractor.extract(Some(&image.to_source())).await
        } else {
            None
        };

        results.push(serde_json::json!({
            "output": path.display().to_string(),
            "size_bytes": image.size(),
            "format": image.format.extension(),
            "seed": image.metadata.seed,
            "duration_ms": image.metadata.duration_ms,
            "accent": accent,
        }));

        if !json_output {
            print!("Saved {} ({} bytes)", path.display(), image.size());
            if let Some(seed) = image.metadata.seed {
                print!(" seed {seed}");
            }
            if let Some(hsl) = accent {
                print!(" accent {hsl} {}", hsl.to_hex());
            }
            println!();
        }
    }

    if json_output {
        let result = serde_json::json!({
            "type": "image",
            "success": true,
            "provider": provider_name(),
            "model": request.model,
            "images": results,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}

fn provider_name() -> String {
    vibrance::ImageProviderKind::Pollinations.to_string()
}

async fn accent(args: AccentArgs, json_output: bool) -> anyhow::Result<()> {
    let source = ImageSource::parse(&args.image);
    let extractor =
        DominantColorExtractor::new().with_timeout(std::time::Duration::from_secs(args.timeout));
    let hsl = extractor
        .try_extract(&source)
        .await
        .with_context(|| format!("extracting accent color from {source}"))?;
    let theme = Theme::from_extracted(hsl);

    if json_output {
        let result = serde_json::json!({
            "source": source.to_string(),
            "hsl": hsl,
            "hex": hsl.to_hex(),
            "theme": theme,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Accent: {hsl} ({})", hsl.to_hex());
        println!("{}", theme.to_css());
    }

    Ok(())
}

fn list_models(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(IMAGE_MODELS)?);
    } else {
        println!("Available models:\n");
        for model in IMAGE_MODELS {
            println!("  {:<12} {}", model.name, model.description);
        }
        println!("\nAspect ratios:");
        for ratio in AspectRatio::ALL {
            let (w, h) = ratio.dimensions();
            println!("  {:<6} {}x{} ({})", ratio.as_str(), w, h, ratio.label());
        }
        println!("\nStyles:");
        for style in StylePreset::ALL.iter().filter_map(|s| s.keyword()) {
            println!("  {style}");
        }
    }

    Ok(())
}
