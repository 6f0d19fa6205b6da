//! Shared command utilities
//!
//! - `open_store` - Open the transaction store
//! - `load_layout` - Resolve the statement layout

use std::path::Path;

use anyhow::{Context, Result};
use fie_core::{store::default_data_path, JsonStore, StatementLayout};
use tracing::debug;

/// Open the store at `--data`, or the default location
pub fn open_store(data_path: Option<&Path>) -> Result<JsonStore> {
    let path = data_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_data_path);
    debug!(path = %path.display(), "Opening transaction store");
    JsonStore::open(&path)
        .with_context(|| format!("Failed to open transaction store: {}", path.display()))
}

/// Load the layout from `--layout`, the data-dir override, or the built-in default
pub fn load_layout(layout_path: Option<&Path>) -> Result<StatementLayout> {
    let layout = StatementLayout::load(layout_path).context("Failed to load statement layout")?;
    debug!(layout = %layout.name, bands = layout.bands.len(), "Using statement layout");
    Ok(layout)
}
