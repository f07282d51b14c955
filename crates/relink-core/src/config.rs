//! Centralized configuration for relink.
//!
//! Constants for relocation policy and registry layout. Runtime overrides are
//! applied through [`crate::RelinkerBuilder`].

/// Relocation policy parameters.
pub struct RelocationConfig;

impl RelocationConfig {
    /// Minimum percentage of files that must move for a walk-based move to
    /// count as successful.
    pub const DEFAULT_SUCCESS_THRESHOLD: f64 = 90.0;
    /// Number of directories and files listed by a move preview.
    pub const PREVIEW_SAMPLE: usize = 50;
}

/// Registry file layout.
pub struct RegistryConfig;

impl RegistryConfig {
    pub const CURRENT_VERSION: u32 = 1;
    pub const APP_DIR_NAME: &'static str = "relink";
    pub const FILE_NAME: &'static str = "links.toml";
    pub const ENV_OVERRIDE: &'static str = "RELINK_REGISTRY";
    pub const HEADER: &'static str = "# relink link registry (generated, edits are overwritten)";
}

/// Validate a success threshold expressed in percent.
pub fn validate_threshold(threshold: f64) -> crate::Result<f64> {
    if threshold.is_finite() && (0.0..=100.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(crate::RelinkError::Config {
            message: format!("success threshold must be within 0..=100, got {threshold}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_bounds() {
        assert_eq!(validate_threshold(90.0).unwrap(), 90.0);
        assert_eq!(validate_threshold(0.0).unwrap(), 0.0);
        assert_eq!(validate_threshold(100.0).unwrap(), 100.0);
        assert!(validate_threshold(100.5).is_err());
        assert!(validate_threshold(-1.0).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
    }
}
