//! Unified path management for vein data and configuration files.
//!
//! This ensures consistency across all platforms (Linux, macOS, Windows).

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for vein.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/vein/              # Config directory
/// └── config.toml              # Application configuration
///
/// ~/.local/share/vein/         # Data directory
/// └── accounts/                # One TOML file per account
/// ```
pub struct VeinPaths;

impl VeinPaths {
    /// Returns the vein configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/vein/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("vein"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the default path of the application configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the vein data directory, where account records live.
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join("vein"))
            .ok_or(PathError::HomeDirNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_lives_under_config_dir() {
        if let Ok(file) = VeinPaths::config_file() {
            assert!(file.ends_with("vein/config.toml") || file.ends_with("vein\\config.toml"));
        }
    }
}
