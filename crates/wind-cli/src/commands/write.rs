//! Write command - hand text to the module's console writer

use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use wind_runtime::{console, DynamicLoader};

pub fn run(library_path: &Path, text: &str, cursor_persist: bool) -> Result<()> {
    let loader = DynamicLoader::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    console::write_text(&loader, library_path, text, cursor_persist, &mut out)
        .with_context(|| format!("Writing through {} failed", library_path.display()))
}
