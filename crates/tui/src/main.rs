mod app;
mod renderer;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use flame_canvas_core::export::svg::render_svg;
use flame_canvas_core::{
    CanvasLayers, CanvasScheduler, Flamegraph, FlamegraphTheme, FlamegraphZoomView,
    ZoomViewConfig, load_flamegraph,
};
use simplelog::{LevelFilter, WriteLogger};

#[derive(Parser, Debug)]
#[command(name = "flame-canvas", version, about = "Interactive flamegraph viewer for the terminal")]
struct Args {
    /// Flamegraph model (JSON)
    flamegraph: PathBuf,

    /// Theme and renderer options (JSON)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Use the light palette
    #[arg(long)]
    light: bool,

    /// Write the initial view as SVG and exit instead of opening the viewer
    #[arg(long, value_name = "PATH")]
    export_svg: Option<PathBuf>,

    /// Logical width of the exported SVG
    #[arg(long, default_value_t = 1200.0)]
    width: f64,

    /// Logical height of the exported SVG
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Log file; the terminal itself is in raw mode
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(args: &Args) -> Result<()> {
    let path = args
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("flame-canvas.log"));
    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    WriteLogger::init(level, simplelog::Config::default(), file)?;
    Ok(())
}

fn load_config(args: &Args) -> Result<ZoomViewConfig> {
    let mut config = match &args.config {
        Some(path) => ZoomViewConfig::load(path)?,
        None => ZoomViewConfig::default(),
    };
    if args.light {
        config.theme.colors = FlamegraphTheme::light().colors;
    }
    Ok(config)
}

fn export_svg(
    flamegraph: Arc<Flamegraph>,
    config: ZoomViewConfig,
    args: &Args,
    path: &Path,
) -> Result<()> {
    let view = FlamegraphZoomView::new(config, CanvasScheduler::polling(), None);
    view.set_flamegraph(flamegraph);
    view.mount(CanvasLayers::new(args.width, args.height, 1.0));
    view.scheduler().tick();

    let svg = {
        let (primary, overlay) = view.canvases().context("nothing was drawn")?;
        let physical = primary.physical_space();
        render_svg(
            &[primary.commands(), overlay.commands()],
            physical.w,
            physical.h,
            !args.light,
        )
    };
    std::fs::write(path, svg).with_context(|| format!("writing {}", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let flamegraph = load_flamegraph(&args.flamegraph)?;
    let config = load_config(&args)?;

    if let Some(path) = &args.export_svg {
        return export_svg(flamegraph, config, &args, path);
    }

    app::run(app::App::new(flamegraph, config, !args.light))
}
