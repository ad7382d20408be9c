use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Identifier of the model the runtime should provision
    pub model: Option<String>,
    /// Quantization preference passed along with the model request (e.g., "q4")
    pub dtype: Option<String>,
    /// Device preference for inference (e.g., "gpu", "cpu")
    pub device: Option<String>,
    /// Base URL of the local model runtime
    pub runtime_url: Option<String>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
