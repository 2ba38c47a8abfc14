use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    params,
};

/// Main configuration for note-reel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content assembly settings
    pub assembly: AssemblyConfig,

    /// Where output files go
    pub output: OutputConfig,

    /// External tool locations
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.assembly.validate()?;
        self.output.validate()?;
        self.tools.validate()?;
        Ok(())
    }
}

/// Content assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Seconds each still image is shown (minimum 1)
    pub image_duration: u32,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            image_duration: params::DEFAULT_IMAGE_DURATION,
        }
    }
}

impl AssemblyConfig {
    fn validate(&self) -> Result<()> {
        if self.image_duration < 1 {
            return Err(ConfigError::InvalidValue {
                key: "assembly.image_duration".to_string(),
                value: self.image_duration.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Output location configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives `<folder>.mp4` files
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "output.directory".to_string(),
                value: String::new()
            }.into());
        }

        Ok(())
    }
}

/// External tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// ffmpeg executable (name on PATH or absolute path)
    pub ffmpeg: PathBuf,

    /// ffprobe executable (name on PATH or absolute path)
    pub ffprobe: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl ToolsConfig {
    fn validate(&self) -> Result<()> {
        for (key, tool) in [("tools.ffmpeg", &self.ffmpeg), ("tools.ffprobe", &self.ffprobe)] {
            if tool.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: String::new()
                }.into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.assembly.image_duration, 4);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut saved_config = Config::default();
        saved_config.assembly.image_duration = 7;
        saved_config.output.directory = PathBuf::from("renders");

        saved_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded_config.assembly.image_duration, 7);
        assert_eq!(loaded_config.output.directory, PathBuf::from("renders"));
        assert_eq!(loaded_config.tools.ffmpeg, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[assembly]\nimage_duration = 2\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.assembly.image_duration, 2);
        assert_eq!(config.output.directory, PathBuf::from("."));
    }

    #[test]
    fn test_zero_image_duration_is_invalid() {
        let mut config = Config::default();
        config.assembly.image_duration = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/definitely/not/here.toml");
        assert!(matches!(
            result,
            Err(crate::error::ReelError::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}
