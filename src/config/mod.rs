mod settings;

pub use settings::{Config, LayoutSettings, PdfSettings, ThemeSettings};

use crate::error::{Result, SituationError};
use crate::situation::Worksheet;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.toml";
pub const WORKSHEET_FILE: &str = "form.toml";

/// Get the config directory path (~/.situatie/ or the XDG equivalent)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "situatie") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.situatie/
    let home = dirs_home().ok_or_else(|| {
        SituationError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".situatie"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Output directory from config. Relative paths are taken from the config
/// directory.
pub fn resolve_output_dir(config_dir: &Path, config: &Config) -> PathBuf {
    let dir = expand_path(&config.pdf.output_dir);
    if dir.is_absolute() {
        dir
    } else {
        config_dir.join(dir)
    }
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Err(SituationError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| SituationError::ConfigParse { path, source: e })
}

/// Load form.toml, restoring the worksheet invariants
pub fn load_worksheet(config_dir: &Path) -> Result<Worksheet> {
    let path = config_dir.join(WORKSHEET_FILE);
    if !path.exists() {
        return Err(SituationError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    let mut sheet: Worksheet =
        toml::from_str(&content).map_err(|e| SituationError::ConfigParse { path, source: e })?;
    sheet.normalize();
    Ok(sheet)
}

/// Save form.toml
pub fn save_worksheet(config_dir: &Path, sheet: &Worksheet) -> Result<()> {
    let path = config_dir.join(WORKSHEET_FILE);
    let content = toml::to_string_pretty(sheet)
        .map_err(|e| SituationError::ConfigSerialize { path: path.clone(), source: e })?;
    fs::write(path, content)?;
    Ok(())
}

/// Content for a fresh form.toml
pub fn worksheet_template(year: i32) -> Result<String> {
    let sheet = Worksheet::new(year.to_string());
    let body = toml::to_string_pretty(&sheet).map_err(|e| SituationError::ConfigSerialize {
        path: PathBuf::from(WORKSHEET_FILE),
        source: e,
    })?;
    Ok(format!("{WORKSHEET_HEADER}{body}"))
}

const WORKSHEET_HEADER: &str = "# Work situation form. Edit it with the situatie subcommands,\n\
# or by hand: rows are renumbered and their values recomputed on load.\n\n";

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r##"[theme]
primary = "#1abd9c"      # banner background
on_primary = "#ffffff"   # banner text
accent = "#f0f0f0"       # table header background
foreground = "#000000"
eco_mode = false         # skip background fills

[layout]
# All values in points (1/72 inch). A4 is 595.28 x 841.89.
top_offset = 40.0
bottom_margin = 10.0
signature_block_height = 55.0
image_block_height = 35.0
gap = 15.0

[pdf]
output_dir = "output"    # relative to this directory, ~ is expanded
"##;
