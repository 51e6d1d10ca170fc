use std::fmt;
use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Provider client implementations known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    Gemini,
}

impl ClientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub code: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub client: ClientKind,
    #[serde(default)]
    pub models: IndexMap<String, ModelSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSummary {
    pub code: String,
    pub name: String,
}

/// Host-defined table of providers and the models each one declares.
///
/// Model order is significant: the first declared model is the default.
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    providers: IndexMap<String, ProviderConfig>,
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ProviderCatalog {
    pub fn new(providers: Option<IndexMap<String, ProviderConfig>>) -> Self {
        Self {
            providers: providers.unwrap_or_else(default_providers),
        }
    }

    /// Loads a catalog from a JSON object keyed by provider code.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading catalog {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("invalid catalog {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let rows: IndexMap<String, CatalogRow> = serde_json::from_str(raw)?;
        let providers = rows
            .into_iter()
            .map(|(code, row)| {
                let config = ProviderConfig {
                    display_name: row.name.unwrap_or_else(|| code.clone()),
                    code: code.clone(),
                    client: row.client,
                    models: row.models,
                };
                (code, config)
            })
            .collect();
        Ok(Self::new(Some(providers)))
    }

    pub fn get(&self, code: &str) -> Option<&ProviderConfig> {
        self.providers.get(code)
    }

    pub fn list(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.values()
    }

    pub fn codes(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn provider(&self, code: &str) -> Option<ProviderSummary> {
        let config = self.get(code)?;
        Some(ProviderSummary {
            code: config.code.clone(),
            name: config.display_name.clone(),
        })
    }

    pub fn client_for(&self, code: &str) -> Option<ClientKind> {
        self.get(code).map(|config| config.client)
    }

    pub fn models(&self, code: &str) -> Option<&IndexMap<String, ModelSpec>> {
        self.get(code).map(|config| &config.models)
    }

    pub fn model(&self, code: &str, model_key: &str) -> Option<&ModelSpec> {
        self.models(code)?.get(model_key)
    }

    pub fn has_model(&self, code: &str, model_key: &str) -> bool {
        self.model(code, model_key).is_some()
    }

    pub fn default_model(&self, code: &str) -> String {
        self.models(code)
            .and_then(|models| models.keys().next().cloned())
            .unwrap_or_default()
    }

    /// `model_key -> title`, optionally restricted to one model type.
    pub fn model_select_options(&self, code: &str, kind: Option<&str>) -> IndexMap<String, String> {
        let Some(models) = self.models(code) else {
            return IndexMap::new();
        };
        models
            .iter()
            .filter(|(_, spec)| kind.map(|wanted| spec.kind == wanted).unwrap_or(true))
            .map(|(key, spec)| {
                let title = if spec.title.is_empty() {
                    key.clone()
                } else {
                    spec.title.clone()
                };
                (key.clone(), title)
            })
            .collect()
    }

    pub fn model_descriptions(&self, code: &str) -> IndexMap<String, String> {
        self.models(code)
            .map(|models| {
                models
                    .iter()
                    .map(|(key, spec)| (key.clone(), spec.description.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    name: Option<String>,
    client: ClientKind,
    #[serde(default)]
    models: IndexMap<String, ModelSpec>,
}

fn default_providers() -> IndexMap<String, ProviderConfig> {
    let mut models = IndexMap::new();

    let mut insert = |key: &str, title: &str, kind: &str, description: &str| {
        models.insert(
            key.to_string(),
            ModelSpec {
                title: title.to_string(),
                kind: kind.to_string(),
                description: description.to_string(),
            },
        );
    };

    insert(
        "gemini-2.5-flash-image",
        "Gemini 2.5 Flash Image (Nano Banana)",
        "image",
        "Latest optimized model for image generation and editing. Best for background removal, repositioning, passport fixes, and 600x600 output.",
    );
    insert(
        "gemini-2.0-flash-image",
        "Gemini 2.0 Flash Image",
        "image",
        "Stable image generation and editing model. Slightly older and less advanced than 2.5 Flash Image.",
    );
    insert(
        "gemini-2.5-pro",
        "Gemini 2.5 Pro",
        "multimodal",
        "High reasoning multimodal model. Supports image input and complex analysis, but not optimized for direct image generation.",
    );
    insert(
        "gemini-2.5-flash",
        "Gemini 2.5 Flash",
        "multimodal",
        "Fast multimodal model with image understanding. Good for analysis and light transformations.",
    );
    insert(
        "gemini-2.0-pro",
        "Gemini 2.0 Pro",
        "multimodal",
        "Previous generation high-capability multimodal reasoning model.",
    );
    insert(
        "gemini-2.0-flash",
        "Gemini 2.0 Flash",
        "multimodal",
        "Balanced speed and reasoning. Supports image input but not specialized for editing.",
    );
    insert(
        "gemini-1.5-pro",
        "Gemini 1.5 Pro",
        "multimodal",
        "Earlier generation multimodal model with strong reasoning and image analysis support.",
    );
    insert(
        "gemini-1.5-flash",
        "Gemini 1.5 Flash",
        "multimodal",
        "Fast and lightweight multimodal model. Suitable for quick image analysis tasks.",
    );

    let mut providers = IndexMap::new();
    providers.insert(
        "gemini".to_string(),
        ProviderConfig {
            code: "gemini".to_string(),
            display_name: "Gemini".to_string(),
            client: ClientKind::Gemini,
            models,
        },
    );
    providers
}
