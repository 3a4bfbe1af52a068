// src/main.rs
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use glyphcache::{
    first_system_font, FontContext, FontDescription, FontSlant, FontdueRasterizer,
    GlyphCacheConfig, GlyphFont, MetricsMode,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Print cached glyph metrics for a string
#[derive(Parser)]
#[command(name = "glyphcache")]
#[command(version = "0.1.0")]
#[command(about = "Resolve glyph metrics through the glyph cache")]
struct Cli {
    /// Text to resolve
    text: String,

    /// Font file; the first system font is used when omitted
    #[arg(short, long)]
    font: Option<PathBuf>,

    /// Pixel size
    #[arg(short, long, default_value_t = 16)]
    size: u32,

    /// Apply the italic end-of-line advance correction
    #[arg(long)]
    italic: bool,

    /// Derive dimensions from bitmap placement instead of outlines
    #[arg(long)]
    bitmap: bool,

    /// Outline cache size; the glyph cache holds twice as many entries
    #[arg(long)]
    cache_size: Option<usize>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let font_path = match cli.font.clone().or_else(first_system_font) {
        Some(path) => path,
        None => bail!("no font given and no system font found"),
    };
    info!("Using font {}", font_path.display());

    let mut context = FontContext::new();
    let face = FontdueRasterizer::from_file(context.allocate_face_id(), &font_path, cli.size)
        .with_context(|| format!("failed to load {}", font_path.display()))?;

    let mut config = GlyphCacheConfig::new();
    if let Some(size) = cli.cache_size {
        config = config.with_outline_cache_size(size);
    }
    if cli.bitmap {
        config = config.with_metrics_mode(MetricsMode::Bitmap);
    }

    let slant = if cli.italic { FontSlant::Italic } else { FontSlant::Normal };
    let description = FontDescription::new(cli.size).with_slant(slant);
    let mut font = GlyphFont::new(face, description, &config)?;

    println!("char  code    glyph  adv  box      ofs      placeholder");
    for (ch, resolved) in font.resolve_text(&mut context, &cli.text) {
        match resolved {
            Ok(m) => println!(
                "{:<5} U+{:04X}  {:<5}  {:<3}  {:>3}x{:<3}  {:>3},{:<3}  {}",
                ch.escape_debug().to_string(),
                ch as u32,
                m.glyph_index,
                m.advance_width,
                m.box_width,
                m.box_height,
                m.offset_x,
                m.offset_y,
                m.is_placeholder
            ),
            Err(e) => warn!("{}", e),
        }
    }

    let stats = font.cache_stats();
    println!(
        "cache: {}/{} entries, {} hits, {} misses, {} evictions ({:.1}% hit ratio)",
        font.cached_glyphs(),
        font.cache_capacity(),
        stats.hits,
        stats.misses,
        stats.evictions,
        stats.hit_ratio() * 100.0
    );

    Ok(())
}
