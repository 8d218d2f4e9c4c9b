use crate::config::{Config, load_config};
use crate::layout::compute_layout;
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::parser::{TablePaths, load_table_files};
use crate::render::{render_svg, write_output_svg};
use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sankey-rs", version, about = "Layered Sankey diagram renderer")]
pub struct Args {
    /// Directory holding layers.csv, nodes.csv, structure.csv and flows.csv
    #[arg(short = 'd', long = "dir", default_value = ".")]
    pub dir: PathBuf,

    /// Layers table (overrides the file in --dir)
    #[arg(long = "layers")]
    pub layers: Option<PathBuf>,

    /// Nodes table (overrides the file in --dir)
    #[arg(long = "nodes")]
    pub nodes: Option<PathBuf>,

    /// Structure table (overrides the file in --dir)
    #[arg(long = "structure")]
    pub structure: Option<PathBuf>,

    /// Flows table (overrides the file in --dir)
    #[arg(long = "flows")]
    pub flows: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Figure width in inches
    #[arg(short = 'w', long = "width")]
    pub width: Option<f64>,

    /// Figure height in inches
    #[arg(short = 'H', long = "height")]
    pub height: Option<f64>,

    /// More logging (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args)?;

    let tables = load_table_files(&table_paths(&args))?;
    let layout = compute_layout(&tables, &config.geometry)?;
    let warnings = layout.warnings().count();
    if warnings > 0 {
        tracing::info!(warnings, "layout finished with warnings");
    }

    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(&layout, &config);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            let svg = render_svg(&layout, &config);
            write_png(&svg, &output, &config)?;
        }
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_layout_dump(path, &layout)?,
            None => println!("{}", LayoutDump::from_layout(&layout).to_json()?),
        },
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn apply_overrides(config: &mut Config, args: &Args) -> Result<()> {
    if let Some(width) = args.width {
        config.geometry.figure_size.0 = width;
    }
    if let Some(height) = args.height {
        config.geometry.figure_size.1 = height;
    }
    config.geometry.validate()?;
    Ok(())
}

fn table_paths(args: &Args) -> TablePaths {
    let mut paths = TablePaths::in_dir(&args.dir);
    if let Some(path) = &args.layers {
        paths.layers = path.clone();
    }
    if let Some(path) = &args.nodes {
        paths.nodes = path.clone();
    }
    if let Some(path) = &args.structure {
        paths.structure = path.clone();
    }
    if let Some(path) = &args.flows {
        paths.flows = path.clone();
    }
    paths
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, output, config)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}
