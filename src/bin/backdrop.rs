use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "backdrop", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON config with `variant`, `color` and `intensity`; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    variant: Option<VariantChoice>,

    /// CSS-like color, e.g. `#3b82f6` or `rgba(59, 130, 246, 0.4)`.
    #[arg(long)]
    color: Option<String>,

    #[arg(long, value_enum)]
    intensity: Option<IntensityChoice>,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Seed for dot placement (random when omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// PNG painted above the animation; must match the output size.
    #[arg(long)]
    overlay: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Animation time in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Clip length in seconds.
    #[arg(long, default_value_t = 5.0)]
    seconds: f64,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Opaque color the animation is flattened over.
    #[arg(long, default_value = "#12141c")]
    background: String,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VariantChoice {
    Grid,
    Dots,
    Waves,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum IntensityChoice {
    Light,
    Medium,
    Strong,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn build_config(args: &CommonArgs) -> anyhow::Result<backdrop::BackdropConfig> {
    let mut config = match &args.config {
        Some(path) => backdrop::BackdropConfig::from_json_file(path)?,
        None => backdrop::BackdropConfig::default(),
    };

    if let Some(v) = args.variant {
        config.variant = match v {
            VariantChoice::Grid => backdrop::Variant::Grid,
            VariantChoice::Dots => backdrop::Variant::Dots,
            VariantChoice::Waves => backdrop::Variant::Waves,
        };
    }
    if let Some(i) = args.intensity {
        config.intensity = match i {
            IntensityChoice::Light => backdrop::Intensity::Light,
            IntensityChoice::Medium => backdrop::Intensity::Medium,
            IntensityChoice::Strong => backdrop::Intensity::Strong,
        };
    }
    if let Some(color) = &args.color {
        config.color = color.clone();
    }

    // The engine tolerates bad colors; the CLI reports them.
    backdrop::Rgba8::parse_css(&config.color)
        .with_context(|| format!("invalid color '{}'", config.color))?;
    Ok(config)
}

fn build_opts(args: &CommonArgs) -> anyhow::Result<backdrop::RenderOpts> {
    let dims = backdrop::Dimensions::new(args.width, args.height);
    let mut opts = backdrop::RenderOpts::new(dims);
    opts.seed = args.seed;
    if let Some(path) = &args.overlay {
        opts.content = Some(read_overlay_png(path, dims)?);
    }
    Ok(opts)
}

fn read_overlay_png(path: &Path, dims: backdrop::Dimensions) -> anyhow::Result<backdrop::FrameRGBA> {
    let img = image::open(path)
        .with_context(|| format!("open overlay '{}'", path.display()))?
        .to_rgba8();
    if img.width() != dims.width || img.height() != dims.height {
        anyhow::bail!(
            "overlay '{}' is {}x{}, expected {}x{}",
            path.display(),
            img.width(),
            img.height(),
            dims.width,
            dims.height
        );
    }
    let mut data = img.into_raw();
    backdrop::composite_cpu::premultiply_in_place(&mut data);
    Ok(backdrop::FrameRGBA {
        width: dims.width,
        height: dims.height,
        data,
        premultiplied: true,
    })
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = build_config(&args.common)?;
    let mut opts = build_opts(&args.common)?;
    opts.start_seconds = args.time;

    let frame = backdrop::render_frame(&config, &opts)?.to_straight();

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = build_config(&args.common)?;
    let mut opts = build_opts(&args.common)?;
    opts.fps = args.fps;

    if !args.seconds.is_finite() || args.seconds <= 0.0 {
        anyhow::bail!("--seconds must be positive");
    }
    let frames = (args.seconds * f64::from(args.fps)).round().max(1.0) as u64;

    let bg = backdrop::Rgba8::parse_css(&args.background)
        .with_context(|| format!("invalid background '{}'", args.background))?;

    backdrop::render_to_mp4(&config, &opts, frames, &args.out, [bg.r, bg.g, bg.b, 255])?;

    eprintln!("wrote {} ({frames} frames)", args.out.display());
    Ok(())
}
