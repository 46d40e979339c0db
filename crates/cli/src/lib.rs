use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::{debug, info, LevelFilter};
use pdf_viewer_cache::{CacheConfig, CacheStats};
use pdf_viewer_core::{FitMode, ImageSurface, PageView, ViewMode};
use pdf_viewer_render::{Rect, Rotation, Size, SolidRenderer, SyntheticDocument, Vec2};
use serde::Serialize;
use simplelog::{Config, WriteLogger};
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "pdf-viewer-cli")]
#[command(about = "Tiled page cache simulator")]
pub struct Cli {
    /// Log more (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to a file instead of stderr.
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scroll through a synthetic document and report cache behaviour as JSON.
    Simulate {
        #[command(flatten)]
        document: DocumentArgs,
        #[command(flatten)]
        view: ViewArgs,
        /// Scroll distance per frame in pixels.
        #[arg(long, default_value_t = 300.0)]
        step: f64,
        /// Save the last frame as a PNG.
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,
    },
    /// Print page rectangles and zoom factors as JSON.
    Layout {
        #[command(flatten)]
        document: DocumentArgs,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Print the effective cache configuration as TOML.
    Config {
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Args)]
struct DocumentArgs {
    #[arg(long, default_value_t = 50)]
    pages: usize,
    /// Page width in PDF points.
    #[arg(long, default_value_t = 612.0)]
    page_width: f64,
    /// Page height in PDF points.
    #[arg(long, default_value_t = 792.0)]
    page_height: f64,
    /// Give every odd page a 90 degree rotation.
    #[arg(long)]
    mixed_rotation: bool,
}

#[derive(Debug, Args)]
struct ViewArgs {
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,
    #[arg(long, value_enum, default_value_t = Fit::None)]
    fit: Fit,
    #[arg(long, default_value_t = 800)]
    viewport_width: u32,
    #[arg(long, default_value_t = 600)]
    viewport_height: u32,
    #[arg(long, default_value_t = 96.0)]
    dpi: f64,
    /// Gap around and between pages in pixels.
    #[arg(long, default_value_t = 10.0)]
    indent: f64,
    /// View rotation in degrees (multiple of 90).
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    rotation: i32,
    /// Show one page at a time.
    #[arg(long)]
    single_page: bool,
    /// Maximum tile edge in pixels; overrides the configuration.
    #[arg(long)]
    tile_size: Option<u32>,
    /// Cache configuration file (TOML).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Fit {
    None,
    Width,
    Page,
}

impl From<Fit> for FitMode {
    fn from(fit: Fit) -> Self {
        match fit {
            Fit::None => FitMode::None,
            Fit::Width => FitMode::FitWidth,
            Fit::Page => FitMode::FitPage,
        }
    }
}

#[derive(Debug, Serialize)]
struct SizeOutput {
    width: f64,
    height: f64,
}

impl From<Size> for SizeOutput {
    fn from(size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

#[derive(Debug, Serialize)]
struct PageOutput {
    index: usize,
    zoom: f64,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Debug, Serialize)]
struct LayoutOutput {
    canvas: SizeOutput,
    pages: Vec<PageOutput>,
}

#[derive(Debug, Serialize)]
struct CacheOutput {
    cached_pages: usize,
    loaded_tiles: usize,
    full_bitmaps: usize,
    bytes: usize,
}

impl From<CacheStats> for CacheOutput {
    fn from(stats: CacheStats) -> Self {
        Self {
            cached_pages: stats.cached_pages,
            loaded_tiles: stats.loaded_tiles,
            full_bitmaps: stats.full_bitmaps,
            bytes: stats.bytes,
        }
    }
}

#[derive(Debug, Serialize)]
struct SimulationOutput {
    pages: usize,
    frames: usize,
    canvas: SizeOutput,
    max_cached_pages: usize,
    peak_bytes: usize,
    render_calls: u64,
    render_failures: u64,
    evictions: u64,
    invalidations: u64,
    tiles_blitted: usize,
    full_bitmaps_blitted: usize,
    final_cache: CacheOutput,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Simulate { document, view, step, snapshot } => {
            run_simulate(&document, &view, step, snapshot.as_deref())
        }
        Commands::Layout { document, view } => run_layout(&document, &view),
        Commands::Config { config } => run_config(config.as_deref()),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            WriteLogger::init(level, Config::default(), file)
        }
        None => WriteLogger::init(level, Config::default(), std::io::stderr()),
    }
    .context("failed to initialise logging")
}

fn run_simulate(
    document: &DocumentArgs,
    view: &ViewArgs,
    step: f64,
    snapshot: Option<&Path>,
) -> Result<()> {
    if !(step.is_finite() && step > 0.0) {
        bail!("--step must be a positive number of pixels");
    }

    let mut page_view = build_view(document, view)?;
    let width = f64::from(view.viewport_width);
    let height = f64::from(view.viewport_height);
    let viewport = Size::new(width, height);
    let clip = Rect::from_origin_size((0.0, 0.0), viewport);
    let mut surface = ImageSurface::new(view.viewport_width, view.viewport_height);

    let mut frames = 0usize;
    let mut max_cached_pages = 0usize;
    let mut peak_bytes = 0usize;
    let mut tiles_blitted = 0usize;
    let mut full_bitmaps_blitted = 0usize;

    let mut frame = |page_view: &mut PageView<SolidRenderer>| {
        let stats = page_view.draw(&mut surface, clip);
        let cache = page_view.cache_stats();
        frames += 1;
        max_cached_pages = max_cached_pages.max(cache.cached_pages);
        peak_bytes = peak_bytes.max(cache.bytes);
        tiles_blitted += stats.tiles_blitted;
        full_bitmaps_blitted += stats.full_bitmaps_blitted;
    };

    if view.single_page {
        for page in 0..page_view.page_count() {
            page_view.scroll_to_page(page);
            frame(&mut page_view);
        }
    } else {
        let canvas_height = page_view.canvas_size().height;
        let mut offset = 0.0;
        loop {
            page_view.set_scroll(Vec2::new(0.0, offset));
            frame(&mut page_view);
            if offset + clip.height() >= canvas_height {
                break;
            }
            offset += step;
        }
    }

    let cache = page_view.cache_stats();
    info!("simulated {frames} frame(s), peak {max_cached_pages} cached page(s)");

    if let Some(path) = snapshot {
        surface
            .image()
            .save(path)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
    }

    let payload = SimulationOutput {
        pages: page_view.page_count(),
        frames,
        canvas: page_view.canvas_size().into(),
        max_cached_pages,
        peak_bytes,
        render_calls: cache.render_calls,
        render_failures: cache.render_failures,
        evictions: cache.evictions,
        invalidations: cache.invalidations,
        tiles_blitted,
        full_bitmaps_blitted,
        final_cache: cache.into(),
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");
    Ok(())
}

fn run_layout(document: &DocumentArgs, view: &ViewArgs) -> Result<()> {
    let page_view = build_view(document, view)?;

    let pages = page_view
        .page_infos()
        .iter()
        .enumerate()
        .map(|(index, info)| {
            let rect = info.bounding_rect;
            PageOutput {
                index,
                zoom: page_view.page_zoom(index).unwrap_or(view.zoom),
                x: rect.x0,
                y: rect.y0,
                width: rect.width(),
                height: rect.height(),
            }
        })
        .collect();

    let payload = LayoutOutput {
        canvas: page_view.canvas_size().into(),
        pages,
    };
    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");
    Ok(())
}

fn run_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    print!("{}", config.to_toml()?);
    Ok(())
}

/// File settings (when given) with environment overrides on top
fn load_config(path: Option<&Path>) -> Result<CacheConfig> {
    let config = match path {
        Some(path) => CacheConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CacheConfig::default(),
    };
    config.merge_env().context("invalid cache configuration in environment")
}

fn build_view(document: &DocumentArgs, view: &ViewArgs) -> Result<PageView<SolidRenderer>> {
    let mut config = load_config(view.config.as_deref())?;
    if let Some(size) = view.tile_size {
        config = config.with_tile_max_size(size);
    }
    config.validate().context("invalid cache configuration")?;

    if !(view.zoom.is_finite() && view.zoom > 0.0) {
        bail!("--zoom must be positive");
    }
    if !(view.dpi.is_finite() && view.dpi > 0.0) {
        bail!("--dpi must be positive");
    }
    if view.rotation.rem_euclid(90) != 0 {
        bail!(
            "--rotation must be a multiple of 90 degrees, got {}",
            view.rotation
        );
    }

    debug!("cache config: {config:?}");
    let mut page_view = PageView::with_config(SolidRenderer::new(), config);
    page_view.set_dpi(view.dpi, view.dpi);
    page_view.set_page_indent(view.indent);
    page_view.set_zoom(view.zoom);
    page_view.set_fit(view.fit.into());
    page_view.set_rotation(Rotation::from_degrees(view.rotation));
    let mode = if view.single_page {
        ViewMode::SinglePage
    } else {
        ViewMode::Continuous
    };
    page_view.set_view_mode(mode);
    page_view.set_viewport_size(Size::new(
        f64::from(view.viewport_width),
        f64::from(view.viewport_height),
    ));
    page_view.set_document(Arc::new(synthetic_document(document)?));
    Ok(page_view)
}

fn synthetic_document(args: &DocumentArgs) -> Result<SyntheticDocument> {
    let valid = |value: f64| value.is_finite() && value > 0.0;
    if !valid(args.page_width) || !valid(args.page_height) {
        bail!("page dimensions must be positive");
    }

    let mut document = SyntheticDocument::uniform(args.pages, args.page_width, args.page_height);
    if args.mixed_rotation {
        for index in (1..args.pages).step_by(2) {
            document = document.with_rotation(index, Rotation::Degrees90);
        }
    }
    Ok(document)
}
