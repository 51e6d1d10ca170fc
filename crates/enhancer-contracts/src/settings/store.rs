use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;

use super::stored::StoredSettings;

/// The single persisted settings document.
///
/// Every save is a full read-modify-write of the file; there is no schema
/// version and no partial update on disk.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable documents load as defaults.
    pub fn load(&self) -> StoredSettings {
        read_json_value(&self.path)
            .filter(Value::is_object)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, settings: &StoredSettings) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    pub fn update<F>(&self, mutate: F) -> anyhow::Result<StoredSettings>
    where
        F: FnOnce(&mut StoredSettings),
    {
        let mut settings = self.load();
        mutate(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }
}

fn read_json_value(path: &Path) -> Option<Value> {
    let raw = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}
