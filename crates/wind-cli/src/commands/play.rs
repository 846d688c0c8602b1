//! Play command - play, wait, stop through the native module

use anyhow::{Context, Result};
use std::io;
use wind_runtime::{DynamicLoader, Session, SessionOptions};

/// Run one play/stop session against the configured module
///
/// Status lines go to stdout; the returned error carries the cause.
pub fn run(options: SessionOptions) -> Result<()> {
    let library = options.library_path.display().to_string();
    let loader = DynamicLoader::new();
    let mut session = Session::new(&loader, options);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    session
        .run(&mut out)
        .with_context(|| format!("Playback through {} did not complete", library))?;

    log::debug!("session history: {:?}", session.history());
    Ok(())
}
