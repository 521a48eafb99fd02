use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Load a JSON configuration from disk, creating it with the provided
/// initializer if missing.
pub fn load_or_init<T, F>(path: &Path, initializer: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> T,
{
    match load_optional(path)? {
        Some(value) => Ok(value),
        None => {
            let value = initializer();
            save_pretty(path, &value)?;
            Ok(value)
        }
    }
}

/// Load a JSON value if the file exists; `None` otherwise.
pub fn load_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(value))
}

/// Write a value as pretty-printed JSON, creating parent directories first.
pub fn save_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        seed: u64,
        label: String,
    }

    #[test]
    fn load_or_init_writes_the_default_then_reads_it_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.json");

        let written: Sample = load_or_init(&path, || Sample {
            seed: 7,
            label: "first".into(),
        })
        .unwrap();
        assert!(path.exists());

        let reloaded: Sample = load_or_init(&path, || Sample {
            seed: 99,
            label: "ignored".into(),
        })
        .unwrap();
        assert_eq!(written, reloaded);
    }

    #[test]
    fn load_optional_returns_none_for_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing: Option<Sample> = load_optional(&dir.path().join("absent.json")).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value.json");
        let value = Sample {
            seed: 1337,
            label: "roundtrip".into(),
        };

        save_pretty(&path, &value).unwrap();
        let loaded: Option<Sample> = load_optional(&path).unwrap();
        assert_eq!(loaded, Some(value));
    }
}
