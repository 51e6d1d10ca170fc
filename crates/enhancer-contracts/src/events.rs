use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub type EventPayload = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    ProcessStarted,
    ProcessSucceeded,
    ProcessFailed,
    SettingsSaved,
    ProviderVerified,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProcessStarted => "process_started",
            Self::ProcessSucceeded => "process_succeeded",
            Self::ProcessFailed => "process_failed",
            Self::SettingsSaved => "settings_saved",
            Self::ProviderVerified => "provider_verified",
        }
    }
}

/// Append-only `events.jsonl` activity log.
///
/// Each line is one compact JSON object with `type`, `session_id` and `ts`
/// first; the payload cannot replace those three.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    inner: Arc<ActivityLogInner>,
}

#[derive(Debug)]
struct ActivityLogInner {
    path: PathBuf,
    session_id: String,
    lock: Mutex<()>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_session(path, uuid::Uuid::new_v4().to_string())
    }

    pub fn with_session(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ActivityLogInner {
                path: path.into(),
                session_id: session_id.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn record(&self, kind: ActivityKind, payload: EventPayload) -> anyhow::Result<Value> {
        let mut event = Map::new();
        event.insert("type".to_string(), Value::String(kind.as_str().to_string()));
        event.insert(
            "session_id".to_string(),
            Value::String(self.inner.session_id.clone()),
        );
        event.insert("ts".to_string(), Value::String(now_utc_iso()));
        for (key, value) in payload {
            if event.contains_key(&key) {
                continue;
            }
            event.insert(key, value);
        }

        if let Some(parent) = self.inner.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(&event)?;
        let _guard = self
            .inner
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("activity log lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;

        Ok(Value::Object(event))
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
