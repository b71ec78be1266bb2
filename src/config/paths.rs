use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{AppError, AppResult};

/// Directory holding `gmapcatcher.conf`.
pub const DEFAULT_PATH: &str = "~/.GMapCatcher";
pub const CONFIG_FILE: &str = "gmapcatcher.conf";
pub const USER_PATH: &str = "~";
pub const TILES_PATH: &str = ".googlemaps";

/// Replaces a leading `~` with the user's home directory.
///
/// Paths that do not start with `~`, or a `~` when no home directory can be
/// resolved, are returned unchanged.
pub fn expand_user(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let mut components = path.components();

    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

/// Expands `path`, creates it (and its parents) if missing, and returns the
/// expanded path.
pub fn ensure_dir(path: impl AsRef<Path>) -> AppResult<PathBuf> {
    let path = expand_user(path);

    if path.exists() && !path.is_dir() {
        return Err(AppError::NotADirectory(path));
    }

    fs::create_dir_all(&path)?;
    Ok(path)
}

/// Default tile repository: the `.googlemaps` folder in the user profile.
pub fn default_tiles_dir() -> PathBuf {
    expand_user(USER_PATH).join(TILES_PATH)
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    base_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> AppResult<Self> {
        let base_dir = expand_user(DEFAULT_PATH);
        if base_dir.starts_with("~") {
            return Err(AppError::Config(
                "unable to resolve home directory".to_string(),
            ));
        }

        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> AppResult<Self> {
        let base_dir = ensure_dir(base_dir)?;
        debug!(base_dir = %base_dir.display(), "resolved configuration directory");
        Ok(Self { base_dir })
    }

    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// Location of the configuration file under [`DEFAULT_PATH`], creating the
/// directory on demand.
pub fn resolve_config_path() -> AppResult<PathBuf> {
    Ok(ConfigPaths::discover()?.config_file())
}
