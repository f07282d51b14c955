//! Platform-specific path conventions.

use crate::config::RegistryConfig;
use crate::error::{RelinkError, Result};
use std::path::{Path, PathBuf};

/// Whether the default filesystem of this platform compares names
/// case-insensitively.
///
/// # Platform Behavior
/// - **Windows/macOS**: `true` (NTFS and APFS defaults)
/// - **Linux and others**: `false`
pub fn is_case_insensitive_fs() -> bool {
    cfg!(any(target_os = "windows", target_os = "macos"))
}

/// Remove the `\\?\` verbatim prefix that `canonicalize` adds on Windows.
///
/// UNC verbatim paths (`\\?\UNC\server\share`) are turned back into
/// `\\server\share`. Other paths are returned unchanged.
pub fn strip_verbatim_prefix(path: PathBuf) -> PathBuf {
    let Some(text) = path.to_str() else {
        return path;
    };
    if let Some(rest) = text.strip_prefix(r"\\?\UNC\") {
        PathBuf::from(format!(r"\\{rest}"))
    } else if let Some(rest) = text.strip_prefix(r"\\?\") {
        PathBuf::from(rest)
    } else {
        path
    }
}

/// Get the default registry file location.
///
/// Honors `RELINK_REGISTRY` when set, otherwise
/// `{config_dir}/relink/links.toml`:
/// - **Linux**: `~/.config/relink/links.toml`
/// - **Windows**: `%APPDATA%\relink\links.toml`
/// - **macOS**: `~/Library/Application Support/relink/links.toml`
pub fn default_registry_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(RegistryConfig::ENV_OVERRIDE) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let config_dir = dirs::config_dir().ok_or_else(|| RelinkError::Config {
        message: "Could not determine config directory".to_string(),
    })?;
    Ok(registry_path_in(&config_dir))
}

fn registry_path_in(config_dir: &Path) -> PathBuf {
    config_dir
        .join(RegistryConfig::APP_DIR_NAME)
        .join(RegistryConfig::FILE_NAME)
}
