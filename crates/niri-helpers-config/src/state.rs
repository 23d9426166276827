//! Small JSON state records that survive between invocations

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ConfigError;

/// A JSON file holding one record
///
/// Loading never fails: a missing or unreadable file yields the record's
/// default. Saving writes a sibling temp file and renames it into place.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<state_dir>/<name>.json`
    pub fn in_dir(state_dir: &Path, name: &str) -> Self {
        Self::new(state_dir.join(format!("{}.json", name)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load<T: DeserializeOwned + Default>(&self) -> T {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "No saved state, using defaults");
                return T::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Corrupt state file, using defaults");
                T::default()
            }
        }
    }

    pub fn save<T: Serialize>(&self, state: &T) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(state).map_err(|e| ConfigError::Invalid {
            message: format!("cannot serialize state: {}", e),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), "Saved state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Record {
        mode: String,
        column: Option<u64>,
        width: Option<i32>,
    }

    #[test]
    fn test_missing_file_loads_default() {
        let dir = tempdir().unwrap();
        let file = StateFile::in_dir(dir.path(), "nothing");

        assert_eq!(file.load::<Record>(), Record::default());
    }

    #[test]
    fn test_corrupt_file_loads_default() {
        let dir = tempdir().unwrap();
        let file = StateFile::in_dir(dir.path(), "broken");
        fs::write(file.path(), "{ not json").unwrap();

        assert_eq!(file.load::<Record>(), Record::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let file = StateFile::in_dir(&dir.path().join("nested"), "glancer");

        let record = Record {
            mode: "glance".to_string(),
            column: Some(3),
            width: Some(1280),
        };
        file.save(&record).unwrap();
        assert_eq!(file.load::<Record>(), record);

        let empty = Record {
            mode: "primary".to_string(),
            column: None,
            width: None,
        };
        file.save(&empty).unwrap();
        assert_eq!(file.load::<Record>(), empty);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let file = StateFile::in_dir(dir.path(), "state");
        file.save(&Record::default()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["state.json".to_string()]);
    }
}
