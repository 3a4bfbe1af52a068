//! System font file discovery

use std::path::{Path, PathBuf};

use tracing::debug;

/// Family asked of fontconfig for the default face
pub const DEFAULT_FAMILY: &str = "sans-serif";

/// File stems preferred by the directory scan, best first
const PREFERRED_FACES: &[&str] = &[
    "DejaVuSans",
    "LiberationSans-Regular",
    "NotoSans-Regular",
    "Arial",
    "Helvetica",
];

/// Platform-specific font search paths
pub fn default_search_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let mut paths: Vec<PathBuf> = vec!["/usr/share/fonts".into(), "/usr/local/share/fonts".into()];
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(Path::new(&home).join(".fonts"));
            paths.push(Path::new(&home).join(".local/share/fonts"));
        }
        paths
    }

    #[cfg(target_os = "macos")]
    {
        let mut paths: Vec<PathBuf> = vec!["/System/Library/Fonts".into(), "/Library/Fonts".into()];
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(Path::new(&home).join("Library/Fonts"));
        }
        paths
    }

    #[cfg(target_os = "windows")]
    {
        vec!["C:\\Windows\\Fonts".into()]
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Font files fontdue can parse, found recursively under `search_paths`, sorted
pub fn find_font_files(search_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for search_path in search_paths {
        scan_dir(search_path, &mut found);
    }
    found.sort();
    debug!("Found {} font files", found.len());
    found
}

/// Default system face fontdue can read
///
/// Asks fontconfig for [`DEFAULT_FAMILY`] when the `font-discovery` feature is
/// enabled, then falls back to scanning the platform font directories.
pub fn first_system_font() -> Option<PathBuf> {
    #[cfg(all(target_os = "linux", feature = "font-discovery"))]
    {
        if let Some(path) = fontconfig_lookup(DEFAULT_FAMILY) {
            return Some(path);
        }
    }

    preferred_font(&find_font_files(&default_search_paths()))
}

/// Resolve `family` through fontconfig
#[cfg(all(target_os = "linux", feature = "font-discovery"))]
pub fn fontconfig_lookup(family: &str) -> Option<PathBuf> {
    let Some(fc) = fontconfig::Fontconfig::new() else {
        tracing::warn!("Fontconfig initialization failed");
        return None;
    };
    let font = fc.find(family, None)?;
    debug!("Fontconfig resolved {} to {} ({})", family, font.name, font.path.display());

    // fontdue cannot read collections or Type 1 faces
    is_font_file(&font.path).then_some(font.path)
}

/// Pick the best known face out of `candidates`, else the first one
pub fn preferred_font(candidates: &[PathBuf]) -> Option<PathBuf> {
    PREFERRED_FACES
        .iter()
        .find_map(|face| {
            candidates
                .iter()
                .find(|path| path.file_stem().and_then(|stem| stem.to_str()) == Some(*face))
        })
        .or_else(|| candidates.first())
        .cloned()
}

fn scan_dir(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            scan_dir(&path, found);
        } else if is_font_file(&path) {
            found.push(path);
        }
    }
}

/// Check if a file is a font fontdue reads
fn is_font_file(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf"),
        None => false,
    }
}
