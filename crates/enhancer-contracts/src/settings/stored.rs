use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::sanitize::{
    sanitize_incoming_enhancer, sanitize_incoming_providers, sanitize_text_field, sanitize_textarea,
};
use crate::providers::ProviderCatalog;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderSettings {
    pub api_key: String,
    pub model: String,
}

impl ProviderSettings {
    fn from_row(row: &Map<String, Value>) -> Self {
        Self {
            api_key: row.get("api_key").map(value_as_text).unwrap_or_default(),
            model: row.get("model").map(value_as_text).unwrap_or_default(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PromptPreset {
    pub title: String,
    pub text: String,
    pub selected: bool,
}

impl PromptPreset {
    /// Sanitizes a submitted row. Rows with neither title nor text are dropped.
    pub fn sanitized(title: &str, text: &str, selected: bool) -> Option<Self> {
        let title = sanitize_text_field(title);
        let text = sanitize_textarea(text);
        if title.is_empty() && text.is_empty() {
            return None;
        }
        Some(Self {
            title,
            text,
            selected,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnhancerSettings {
    pub default_prompts: Vec<PromptPreset>,
    /// Keys under `enhancer` this build does not model; kept across saves.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnhancerSettings {
    fn from_value(value: &Value) -> Self {
        let Some(section) = value.as_object() else {
            return Self::default();
        };
        let default_prompts = section
            .get("default_prompts")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(Value::as_object)
                    .map(|row| PromptPreset {
                        title: row.get("title").map(value_as_text).unwrap_or_default(),
                        text: row.get("text").map(value_as_text).unwrap_or_default(),
                        selected: row.get("selected").map(value_as_flag).unwrap_or(false),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let extra = section
            .iter()
            .filter(|(key, _)| key.as_str() != "default_prompts")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Self {
            default_prompts,
            extra,
        }
    }
}

/// Admin tabs; each one owns exactly one section of [`StoredSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsTab {
    ApiConnection,
    Enhancer,
}

impl SettingsTab {
    pub const ALL: [SettingsTab; 2] = [SettingsTab::ApiConnection, SettingsTab::Enhancer];

    /// Unknown or empty slugs resolve to the API connection tab.
    pub fn from_slug(slug: &str) -> Self {
        match slug.trim().to_ascii_lowercase().as_str() {
            "enhancer" => Self::Enhancer,
            _ => Self::ApiConnection,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::ApiConnection => "api-connection",
            Self::Enhancer => "enhancer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ApiConnection => "API connection",
            Self::Enhancer => "Enhancer",
        }
    }
}

/// Parallel arrays as submitted by the prompt editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnhancerForm {
    #[serde(rename = "default_prompts_title", default)]
    pub titles: Vec<String>,
    #[serde(rename = "default_prompts_text", default)]
    pub texts: Vec<String>,
    #[serde(rename = "default_prompts_selected", default)]
    pub selected: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SettingsSubmission {
    #[serde(default)]
    pub providers: Map<String, Value>,
    #[serde(default)]
    pub enhancer: EnhancerForm,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SettingsDocument")]
pub struct StoredSettings {
    pub providers: BTreeMap<String, ProviderSettings>,
    pub enhancer: EnhancerSettings,
    /// Top-level keys owned by other features; written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredSettings {
    pub fn provider_settings(&self, code: &str) -> ProviderSettings {
        self.providers.get(code).cloned().unwrap_or_default()
    }

    /// Trimmed prompt rows, skipping rows with neither title nor text.
    pub fn default_prompts(&self) -> Vec<PromptPreset> {
        self.enhancer
            .default_prompts
            .iter()
            .map(|row| PromptPreset {
                title: row.title.trim().to_string(),
                text: row.text.trim().to_string(),
                selected: row.selected,
            })
            .filter(|row| !(row.title.is_empty() && row.text.is_empty()))
            .collect()
    }

    pub fn selected_prompt_texts(&self) -> Vec<String> {
        self.default_prompts()
            .into_iter()
            .filter(|row| row.selected && !row.text.is_empty())
            .map(|row| row.text)
            .collect()
    }

    pub fn update_providers(&mut self, providers: BTreeMap<String, ProviderSettings>) {
        self.providers = providers;
    }

    /// Replaces the prompt list; other enhancer keys survive.
    pub fn update_enhancer(&mut self, default_prompts: Vec<PromptPreset>) {
        self.enhancer.default_prompts = default_prompts;
    }

    /// Applies a submitted form to the section owned by `tab` only.
    pub fn apply_submission(
        &mut self,
        catalog: &ProviderCatalog,
        tab: SettingsTab,
        submission: &SettingsSubmission,
    ) {
        match tab {
            SettingsTab::ApiConnection => {
                self.update_providers(sanitize_incoming_providers(catalog, &submission.providers));
            }
            SettingsTab::Enhancer => {
                self.update_enhancer(sanitize_incoming_enhancer(&submission.enhancer));
            }
        }
    }

    pub fn push_prompt(&mut self, preset: PromptPreset) {
        self.enhancer.default_prompts.push(preset);
    }

    pub fn remove_prompt(&mut self, index: usize) -> Option<PromptPreset> {
        if index >= self.enhancer.default_prompts.len() {
            return None;
        }
        Some(self.enhancer.default_prompts.remove(index))
    }
}

/// On-disk shape. Besides `providers` and `enhancer`, older documents kept
/// credentials flat at the top level (`{"gemini": {"api_key": ...}}`); those
/// rows are folded into `providers` unless the nested location already has
/// the code. Any other top-level key is carried in `extra`.
#[derive(Debug, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    providers: Value,
    #[serde(default)]
    enhancer: Value,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl From<SettingsDocument> for StoredSettings {
    fn from(document: SettingsDocument) -> Self {
        let mut providers: BTreeMap<String, ProviderSettings> = document
            .providers
            .as_object()
            .map(|rows| {
                rows.iter()
                    .filter_map(|(code, row)| {
                        row.as_object()
                            .map(|row| (code.clone(), ProviderSettings::from_row(row)))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut extra = Map::new();
        for (code, value) in document.rest {
            match value {
                Value::Object(row) if is_legacy_provider_row(&row) => {
                    providers
                        .entry(code)
                        .or_insert_with(|| ProviderSettings::from_row(&row));
                }
                other => {
                    extra.insert(code, other);
                }
            }
        }

        Self {
            providers,
            enhancer: EnhancerSettings::from_value(&document.enhancer),
            extra,
        }
    }
}

fn is_legacy_provider_row(row: &Map<String, Value>) -> bool {
    row.contains_key("api_key") || row.contains_key("model")
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(true) => "1".to_string(),
        _ => String::new(),
    }
}

/// Loose truthiness for flags written by older forms (`1`, `"1"`, `true`).
fn value_as_flag(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(text) => !text.is_empty() && text != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
