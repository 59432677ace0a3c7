use std::path::Path;
use std::sync::{Arc, Once};
use anyhow::Result;
use tracing::Level;

static INIT: Once = Once::new();

/// Route diagnostics to a log file. The alternate screen owns the terminal,
/// so nothing may be written to stdout or stderr while the TUI runs.
pub fn init(log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .init();
    });

    Ok(())
}
