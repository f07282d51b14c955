//! Platform abstraction layer for cross-platform compatibility.
//!
//! All `#[cfg]` blocks for OS-specific behavior live here or in
//! [`crate::link::primitive`], never in the workflow code.
//!
//! - `paths` - Default registry location and path-key conventions
//! - `privilege` - Advisory probe for symlink creation rights

pub mod paths;
pub mod privilege;

pub use paths::{default_registry_path, is_case_insensitive_fs, strip_verbatim_prefix};
pub use privilege::can_create_links;

/// Returns the current platform name.
pub fn current_platform() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "linux"
    }
    #[cfg(target_os = "windows")]
    {
        "windows"
    }
    #[cfg(target_os = "macos")]
    {
        "macos"
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        "unknown"
    }
}
