use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber. Console and log file (when configured)
/// receive the same lines. `RUST_LOG` overrides the default filter.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let writer = make_writer(config)?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,feedbackbot=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(config.log_file().is_none())
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}

/// stdout, teed into the log file when one is configured.
fn make_writer(config: &LoggingConfig) -> Result<BoxMakeWriter> {
    let Some(path) = config.log_file() else {
        return Ok(BoxMakeWriter::new(std::io::stdout));
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    rotate(path, config.max_file_bytes, config.keep_files)
        .with_context(|| format!("Failed to rotate log file: {}", path.display()))?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    Ok(BoxMakeWriter::new(std::io::stdout.and(Arc::new(file))))
}

/// Shift `path` to `path.1` (and older generations up by one) once it
/// grows past `max_bytes`. At most `keep` rotated files survive.
fn rotate(path: &Path, max_bytes: u64, keep: u32) -> std::io::Result<()> {
    let len = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if len <= max_bytes {
        return Ok(());
    }

    if keep == 0 {
        return std::fs::remove_file(path);
    }

    let oldest = generation(path, keep);
    if oldest.exists() {
        std::fs::remove_file(&oldest)?;
    }
    for n in (1..keep).rev() {
        let from = generation(path, n);
        if from.exists() {
            std::fs::rename(&from, generation(path, n + 1))?;
        }
    }
    std::fs::rename(path, generation(path, 1))
}

fn generation(path: &Path, n: u32) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}", n));
    PathBuf::from(name)
}
