use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{ConfigPaths, Settings, settings};
use crate::error::AppResult;

/// The application's configuration together with the file it lives in.
#[derive(Debug, Clone)]
pub struct MapConf {
    paths: ConfigPaths,
    settings: Settings,
}

impl MapConf {
    /// Opens the configuration in the default location.
    pub fn open() -> AppResult<Self> {
        Self::open_with(ConfigPaths::discover()?)
    }

    /// Loads the configuration file under `paths`. If the file does not exist
    /// yet it is written straight away with the defaults that were just loaded.
    pub fn open_with(paths: ConfigPaths) -> AppResult<Self> {
        let config_file = paths.config_file();
        let existed = config_file.exists();

        let conf = Self {
            settings: settings::load(&config_file),
            paths,
        };

        if !existed {
            debug!(path = %config_file.display(), "creating configuration file");
            conf.save_to(&config_file)?;
        }

        Ok(conf)
    }

    /// Replaces the current settings with those stored at `path`.
    pub fn load(&mut self, path: impl AsRef<Path>) {
        self.settings = settings::load(path);
    }

    pub fn reload(&mut self) {
        let path = self.config_file();
        self.load(path);
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> AppResult<()> {
        settings::save(path, &self.settings)
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(self.config_file())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    pub fn config_file(&self) -> PathBuf {
        self.paths.config_file()
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }
}
