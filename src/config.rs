use crate::error::{Error, Result};
use std::path::PathBuf;

/// Configuration for the proposal source
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directory holding fetched API responses (`*.json`)
    pub input_dir: PathBuf,
    /// Maximum number of files to read, in path order
    pub max_files: Option<usize>,
}

impl ScanConfig {
    /// Create a new default configuration
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            max_files: None,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.input_dir.exists() {
            return Err(Error::Config(format!(
                "Input directory does not exist: {}",
                self.input_dir.display()
            )));
        }

        if !self.input_dir.is_dir() {
            return Err(Error::Config(format!(
                "Input directory is not a directory: {}",
                self.input_dir.display()
            )));
        }

        if self.max_files == Some(0) {
            return Err(Error::Config("max_files must be greater than 0".to_string()));
        }

        Ok(())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new("data/proposicoes")
    }
}

/// Builder for creating configurations
#[derive(Debug, Clone)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    /// Create a new builder with default settings
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            config: ScanConfig::new(input_dir),
        }
    }

    /// Set the input directory
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    /// Set the file limit
    pub fn max_files(mut self, limit: usize) -> Self {
        self.config.max_files = Some(limit);
        self
    }

    /// Clear the file limit
    pub fn no_limit(mut self) -> Self {
        self.config.max_files = None;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<ScanConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
