use anyhow::{Context, Result};
use filtermap::FilterMapConfig;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "filtermap.toml";

/// Loaded configuration and where it came from
pub struct ConfigContext {
    pub config_path: PathBuf,
    pub config: FilterMapConfig,
}

impl ConfigContext {
    /// Load the configuration named on the command line, or find
    /// `filtermap.toml` in the current directory or its ancestors.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let current_dir = std::env::current_dir().context("Failed to get current directory")?;
                Self::find_config(&current_dir)?
            }
        };
        let config = FilterMapConfig::from_path(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
        Ok(Self { config_path, config })
    }

    fn find_config(start: &Path) -> Result<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(candidate);
            }

            if !current.pop() {
                anyhow::bail!(
                    "Could not find {CONFIG_FILE_NAME} in {start:?} or any parent directory. \
                     Pass --config or set FILTERMAP_CONFIG."
                );
            }
        }
    }
}
