//! Stream file location and optional item-type overrides for `soc`.
//!
//! Two independent pieces of path resolution live here, both driven by the
//! same "walk up from here looking for a file" primitive: locating the
//! stream file itself (`stream.md`, or a `-file` override) and locating an
//! optional sidecar config (`.soc.toml`) that can replace the present-day
//! engine's default item list wholesale.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const STREAM_FILE_NAME: &str = "stream.md";
pub const CONFIG_FILE_NAME: &str = ".soc.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// One configured item type, mirroring [`soc_core`]'s `Item` but kept
/// dependency-free here so this crate stays a leaf with no engine dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemConfig {
    pub name: String,
    #[serde(default)]
    pub remains: bool,
}

/// The optional sidecar config. Its absence is the common case and is not an
/// error; it simply means "use the built-in default items".
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StreamConfig {
    /// When present, replaces the engine's default item list wholesale.
    #[serde(default)]
    pub items: Option<Vec<ItemConfig>>,
}

impl StreamConfig {
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: StreamConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(config))
    }

    /// Looks for [`CONFIG_FILE_NAME`] by walking up from `start`'s ancestors
    /// (the same primitive used to find the stream file).
    pub fn discover(start: &Path) -> Result<Option<Self>, ConfigError> {
        match find_upwards(start, CONFIG_FILE_NAME) {
            Some(path) => Self::load_from_path(path),
            None => Ok(None),
        }
    }
}

/// Walks `start` and its ancestors (innermost first) looking for a file
/// literally named `filename`. Returns the first match.
pub fn find_upwards(start: &Path, filename: &str) -> Option<PathBuf> {
    for dir in start.ancestors() {
        let candidate = dir.join(filename);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Resolves the path to the stream file: an explicit `-file` override always
/// wins, with `~`/env expansion applied; otherwise walk up from `cwd` looking
/// for [`STREAM_FILE_NAME`], falling back to creating one in `cwd` if none is
/// found anywhere above it.
pub fn resolve_stream_path(override_path: Option<&Path>, cwd: &Path) -> PathBuf {
    if let Some(p) = override_path {
        return expand(p);
    }
    find_upwards(cwd, STREAM_FILE_NAME).unwrap_or_else(|| cwd.join(STREAM_FILE_NAME))
}

fn expand(path: &Path) -> PathBuf {
    match shellexpand::full(&path.to_string_lossy()) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn override_path_wins_even_with_ancestor_stream() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join(STREAM_FILE_NAME), "").unwrap();
        let deep = root.path().join("a/b");
        std::fs::create_dir_all(&deep).unwrap();

        let explicit = deep.join("elsewhere.md");
        let resolved = resolve_stream_path(Some(&explicit), &deep);
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn walk_up_finds_nearest_ancestor() {
        let root = TempDir::new().unwrap();
        let near = root.path().join("near");
        let deep = near.join("deep");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(root.path().join(STREAM_FILE_NAME), "far").unwrap();
        std::fs::write(near.join(STREAM_FILE_NAME), "near").unwrap();

        let resolved = resolve_stream_path(None, &deep);
        assert_eq!(resolved, near.join(STREAM_FILE_NAME));
    }

    #[test]
    fn no_ancestor_match_defaults_to_cwd() {
        let root = TempDir::new().unwrap();
        let resolved = resolve_stream_path(None, root.path());
        assert_eq!(resolved, root.path().join(STREAM_FILE_NAME));
    }

    #[test]
    fn missing_config_is_not_an_error() {
        let root = TempDir::new().unwrap();
        let found = StreamConfig::discover(root.path()).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn config_overrides_items_wholesale() {
        let root = TempDir::new().unwrap();
        std::fs::write(
            root.path().join(CONFIG_FILE_NAME),
            "items = [{ name = \"Inbox\", remains = false }, { name = \"Archive\", remains = true }]\n",
        )
        .unwrap();

        let config = StreamConfig::discover(root.path()).unwrap().unwrap();
        let items = config.items.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Inbox");
        assert!(items[1].remains);
    }
}
