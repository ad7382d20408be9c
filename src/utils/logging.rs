//! Diagnostic logging to a file.
//!
//! The terminal belongs to the UI, so nothing is installed unless a log
//! file was requested.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "NEOAI_LOG";
const DEFAULT_FILTER: &str = "neoai=info";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber writing to `log_file`, appending.
///
/// Installing twice is not an error; the first subscriber wins.
pub fn init(log_file: Option<&Path>) -> io::Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_ansi(false)
        .with_target(true)
        .with_writer(Arc::new(file))
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn without_a_file_nothing_is_created() {
        assert!(init(None).is_ok());
    }

    #[test]
    fn creates_the_log_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("neoai.log");
        init(Some(&path)).expect("init");
        assert!(path.exists());
    }

    #[test]
    fn unwritable_location_is_reported() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("neoai.log");
        assert!(init(Some(&path)).is_err());
    }
}
