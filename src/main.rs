use clap::{Args, Parser, Subcommand};
use instacrops::config::{self, Config};
use instacrops::counter::ConversionCounter;
use instacrops::imaging::{AspectPreset, RustBackend, Viewport, ViewportState, pan_to};
use instacrops::output;
use instacrops::session::{Session, SessionResult, is_image_upload};
use std::path::{Path, PathBuf};

const FAILURE_NOTICE: &str = "Processing the image failed. Please try again.";

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    match env!("GIT_HASH") {
        "" => "dev@unknown",
        // Leaked once at startup
        hash => Box::leak(format!("dev@{hash}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "instacrops")]
#[command(about = "Crop, resize and compress photos to fixed dimensions under 2 MiB")]
#[command(long_about = "\
Crop, resize and compress photos to fixed dimensions under 2 MiB

Automatic mode takes the largest centered 16:9 region and produces a
1920x1080 JPEG. Manual mode crops to one of the preset ratios; position the
crop with --scale and --offset-x/--offset-y as a cropper window would.

Output is JPEG. Quality starts at 95 and drops by 10 until the file is at
most 2 MiB, stopping above 50. The dimensions are never reduced.

Run 'instacrops ratios' for the manual presets and 'instacrops gen-config'
for a documented config file.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = "instacrops.toml", global = true)]
    config: PathBuf,

    /// Directory for the persisted conversion counter
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Log every encode attempt
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Center-crop to 16:9 and compress
    Auto(AutoArgs),
    /// Crop to a preset ratio with explicit zoom and pan
    Crop(CropArgs),
    /// List the manual crop ratios and their output sizes
    Ratios,
    /// Show how many images have been converted
    Stats,
    /// Print a stock instacrops.toml with all options documented
    GenConfig,
}

#[derive(Args)]
struct AutoArgs {
    /// Image to convert
    input: PathBuf,

    /// Output file (default: instacrops-WxH.jpg)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Override the configured output width
    #[arg(long)]
    width: Option<u32>,

    /// Override the configured output height
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Args)]
struct CropArgs {
    /// Image to convert
    input: PathBuf,

    /// Output file (default: instacrops-WxH.jpg)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Aspect ratio preset (16:9, 4:3, 1:1, 3:4, 9:16)
    #[arg(long, default_value = "16:9")]
    ratio: String,

    /// Cropper window size in screen pixels, e.g. 800x450 (default: the preset's output size)
    #[arg(long, value_parser = parse_viewport)]
    viewport: Option<Viewport>,

    /// Zoom, 1 (image just covers the window) to 3
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Horizontal position of the image's left edge relative to the window (<= 0)
    #[arg(long, allow_negative_numbers = true)]
    offset_x: Option<f64>,

    /// Vertical position of the image's top edge relative to the window (<= 0)
    #[arg(long, allow_negative_numbers = true)]
    offset_y: Option<f64>,
}

fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width: f64 = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let height: f64 = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
        return Err("viewport dimensions must be positive".into());
    }
    Ok(Viewport::new(width, height))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = config::load_config(&cli.config)?;
    let state_dir = cli
        .state_dir
        .clone()
        .or_else(|| config.state.counter_dir.clone())
        .unwrap_or_else(config::default_state_dir);

    match cli.command {
        Command::Auto(args) => {
            if let Some(width) = args.width {
                config.output.width = width;
            }
            if let Some(height) = args.height {
                config.output.height = height;
            }
            let bytes = read_upload(&args.input)?;
            let mut session = new_session(&config, &state_dir);
            let result = match session.submit_auto(&bytes) {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("{FAILURE_NOTICE}");
                    return Err(e.into());
                }
            };
            save_result(result, args.out.as_deref())?;
            output::print_stats(session.total_converted());
        }
        Command::Crop(args) => {
            let preset = AspectPreset::find(&args.ratio).ok_or_else(|| {
                format!(
                    "unknown ratio '{}'; run 'instacrops ratios' for the choices",
                    args.ratio
                )
            })?;
            let viewport = args
                .viewport
                .unwrap_or_else(|| Viewport::new(preset.width as f64, preset.height as f64));
            let bytes = read_upload(&args.input)?;
            let mut session = new_session(&config, &state_dir);

            let dims = match session.open_manual(&bytes) {
                Ok(dims) => dims,
                Err(e) => {
                    eprintln!("{FAILURE_NOTICE}");
                    return Err(e.into());
                }
            };
            let centered = ViewportState::centered(dims, viewport, args.scale);
            let state = pan_to(
                dims,
                viewport,
                centered,
                args.offset_x.unwrap_or(centered.offset_x),
                args.offset_y.unwrap_or(centered.offset_y),
            );

            let result = match session.confirm_manual(preset, viewport, state) {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("{FAILURE_NOTICE}");
                    return Err(e.into());
                }
            };
            save_result(result, args.out.as_deref())?;
            output::print_stats(session.total_converted());
        }
        Command::Ratios => output::print_ratios(),
        Command::Stats => {
            output::print_stats(ConversionCounter::load(&state_dir).total_converted);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn new_session(config: &Config, state_dir: &Path) -> Session<RustBackend> {
    Session::new(RustBackend::new(), config).with_state_dir(state_dir)
}

/// Read an input file, refusing anything that isn't an image.
fn read_upload(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    if !is_image_upload(&bytes) {
        return Err(format!("{} is not an image file", path.display()).into());
    }
    Ok(bytes)
}

fn save_result(result: &SessionResult, out: Option<&Path>) -> std::io::Result<()> {
    let path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(result.filename()));
    std::fs::write(&path, &result.processed.bytes)?;
    output::print_result(result);
    println!("    Saved: {}", path.display());
    Ok(())
}
