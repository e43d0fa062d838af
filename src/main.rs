use std::fs::{self, File};
use std::io::stdout;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use pagelens::event_source::TerminalEventSource;
use pagelens::geometry::Dimensions;
use pagelens::overlay::{DeepLink, ImageDimensions, RegionRegistry};
use pagelens::panic_handler::initialize_panic_handler;
use pagelens::settings::{get_theme_name, load_settings, settings_snapshot};
use pagelens::structure::{DirectorySource, PageStructure, StructureCache};
use pagelens::theme::{ThemeId, set_theme};
use pagelens::widget::CellSize;
use pagelens::{PageViewConfig, Viewer, ViewerOptions, run_viewer_with_event_source};

#[derive(Debug, Parser)]
#[command(
    name = "pagelens",
    about = "Interactive region overlay for document page images",
    version
)]
struct Cli {
    /// Log file path
    #[arg(long, global = true, default_value = "pagelens.log")]
    log_file: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    /// Settings file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the regions a structure file produces at a given image size
    Inspect(InspectArgs),

    /// Browse a document's pages interactively
    View(ViewArgs),
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Structure JSON for one page
    file: PathBuf,

    /// Natural pixel size of the page image, WIDTHxHEIGHT
    #[arg(long, value_parser = parse_dimensions, default_value = "1224x1584")]
    natural: Dimensions,

    /// Displayed pixel size of the page image, WIDTHxHEIGHT
    #[arg(long, value_parser = parse_dimensions, default_value = "612x792")]
    displayed: Dimensions,
}

#[derive(Debug, Args)]
struct ViewArgs {
    /// Directory holding `<document>/page-<n>.json` files
    root: PathBuf,

    /// Document name under the root
    document: String,

    /// Number of pages in the document
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// Link or query string selecting a chunk, e.g. "?chunk=chunk-0-page-1&page=1"
    #[arg(long)]
    link: Option<String>,

    /// Natural pixel size of the page images, WIDTHxHEIGHT
    #[arg(long, value_parser = parse_dimensions, default_value = "1224x1584")]
    natural: Dimensions,

    /// Terminal cell size in pixels, WIDTHxHEIGHT
    #[arg(long, value_parser = parse_cell_size, default_value = "8x16")]
    cell: CellSize,
}

fn parse_dimensions(value: &str) -> Result<Dimensions, String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let width: f64 = w.trim().parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
    let height: f64 = h.trim().parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
    let dims = Dimensions::new(width, height);
    if !dims.is_valid() {
        return Err(format!("dimensions must be positive, got {value:?}"));
    }
    Ok(dims)
}

fn parse_cell_size(value: &str) -> Result<CellSize, String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let width: u16 = w.trim().parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
    let height: u16 = h.trim().parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
    if width == 0 || height == 0 {
        return Err(format!("cell size must be positive, got {value:?}"));
    }
    Ok(CellSize::new(width, height))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(
        cli.log_level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("cannot create log file {:?}", cli.log_file))?,
    )?;
    info!("Starting pagelens");

    load_settings(cli.config.as_deref());
    if let Some(theme) = ThemeId::from_name(&get_theme_name()) {
        set_theme(theme);
    }

    let result = match cli.command {
        Commands::Inspect(args) => run_inspect(&args),
        Commands::View(args) => run_view(args),
    };

    if let Err(err) = &result {
        error!("Application error: {err:?}");
    }
    info!("Shutting down pagelens");
    result
}

fn run_inspect(args: &InspectArgs) -> Result<()> {
    let structure = read_structure(&args.file)?;
    let settings = settings_snapshot();
    let image = ImageDimensions::new(args.natural, args.displayed);
    let registry = RegionRegistry::build(&structure, image, &settings.registry_options())
        .context("cannot place regions at this image size")?;

    println!(
        "{} elements, {} regions drawn, {} keyboard-focusable",
        registry.len(),
        registry.overlay_len(),
        registry.interactable().count()
    );
    if let Some(native) = registry.native_dimensions() {
        println!(
            "native {}x{} -> displayed {}x{}",
            native.width, native.height, args.displayed.width, args.displayed.height
        );
    }

    for region in registry.regions() {
        match (&region.scaled, &region.exclusion) {
            (Some(b), _) => println!(
                "  {:<10} {:<24} x={:.1} y={:.1} w={:.1} h={:.1}{}",
                region.kind().label(),
                region.chunk_id(),
                b.x1,
                b.y1,
                b.width,
                b.height,
                if region.disabled { " (hidden)" } else { "" }
            ),
            (None, Some(reason)) => println!(
                "  {:<10} {:<24} excluded: {reason:?}",
                region.kind().label(),
                region.chunk_id()
            ),
            (None, None) => {}
        }
    }
    if registry.duplicate_count() > 0 {
        println!("{} duplicate chunk ids dropped", registry.duplicate_count());
    }
    Ok(())
}

fn read_structure(path: &Path) -> Result<PageStructure> {
    let payload =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    PageStructure::from_json(&payload).with_context(|| format!("cannot decode {}", path.display()))
}

fn run_view(args: ViewArgs) -> Result<()> {
    let settings = settings_snapshot();
    let config = PageViewConfig::from_settings(&settings);
    let cache = StructureCache::new(
        settings.structure_cache_capacity,
        settings.structure_cache_ttl(),
    );
    let options = ViewerOptions {
        document: args.document,
        page_count: args.pages,
        natural: args.natural,
        cell_size: args.cell,
        deep_link: args
            .link
            .as_deref()
            .map(DeepLink::parse)
            .unwrap_or_default(),
    };
    let mut viewer = Viewer::new(DirectorySource::new(args.root), options, config, cache);

    initialize_panic_handler();

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_viewer_with_event_source(&mut terminal, &mut viewer, &mut TerminalEventSource);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}
