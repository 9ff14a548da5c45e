use log::{debug, warn};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

pub const VIEW_KEY: &str = "teamsSidebarView";
pub const DIVISION_FILTER_KEY: &str = "teamsSidebarDivisionFilter";
pub const PAST_SEASON_FILTER_KEY: &str = "teamsSidebarPastSeasonFilter";
const EXPANDED_GAMES_PREFIX: &str = "collapsedGames_";

/// Key holding the set of *expanded* game ids for `view`.
///
/// The key name says "collapsed" for compatibility with values already stored under it.
pub fn expanded_games_key(view: &str) -> String {
    format!("{EXPANDED_GAMES_PREFIX}{view}")
}

/// Small string key-value store that lives as long as the user's session.
pub trait SessionStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    values: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// Session store backed by a JSON object on disk, rewritten on every change.
///
/// Write failures are logged and the in-memory copy stays authoritative.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Discarding unreadable session file {}: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(e) => {
                debug!("Starting a new session file at {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Failed to create session directory {}: {e}", parent.display());
                return;
            }
        }
        let result = serde_json::to_string_pretty(&self.values)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(&self.path, json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!("Failed to write session file {}: {e}", self.path.display());
        }
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.flush();
    }

    fn remove(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.flush();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_expanded_games_key_is_per_view() {
        assert_eq!(expanded_games_key("all"), "collapsedGames_all");
        assert_ne!(expanded_games_key("all"), expanded_games_key("division"));
    }

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get(VIEW_KEY), None);
        storage.set(VIEW_KEY, "manage");
        assert_eq!(storage.get(VIEW_KEY).as_deref(), Some("manage"));
        storage.set(VIEW_KEY, "play");
        assert_eq!(storage.get(VIEW_KEY).as_deref(), Some("play"));
        storage.remove(VIEW_KEY);
        assert_eq!(storage.get(VIEW_KEY), None);
    }

    #[test]
    fn test_file_storage_persists() {
        let path = std::env::temp_dir().join(format!(
            "team-sidebar-session-test-{}.json",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);

        {
            let mut storage = FileStorage::open(&path);
            storage.set(DIVISION_FILTER_KEY, "Shooter");
            storage.set(PAST_SEASON_FILTER_KEY, "3");
            storage.remove(PAST_SEASON_FILTER_KEY);
        }

        let storage = FileStorage::open(&path);
        assert_eq!(storage.get(DIVISION_FILTER_KEY).as_deref(), Some("Shooter"));
        assert_eq!(storage.get(PAST_SEASON_FILTER_KEY), None);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_storage_ignores_garbage() {
        let path = std::env::temp_dir().join(format!(
            "team-sidebar-session-garbage-{}.json",
            std::process::id()
        ));
        fs::write(&path, "not json").unwrap();
        let storage = FileStorage::open(&path);
        assert_eq!(storage.get(VIEW_KEY), None);
        fs::remove_file(&path).unwrap();
    }
}
