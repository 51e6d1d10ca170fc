use anyhow::Context;
use enhancer_contracts::events::{ActivityKind, ActivityLog};
use enhancer_contracts::providers::ProviderCatalog;
use enhancer_contracts::runs::{ErrorCode, ProcessOutcome, VerifyResponse};
use enhancer_contracts::settings::SettingsStore;
use serde_json::{json, Map, Value};

use crate::config::{EnhancerConfig, SiteLayout};
use crate::error::EnhanceError;
use crate::provider::{default_provider_registry, ImageProviderRegistry, ProcessOptions, ProcessRequest};
use crate::storage::OutputStorage;

/// Entry point used by hosts: resolves provider, credentials and model from
/// stored settings, then hands the work to the registered client.
pub struct ImageEnhancer {
    catalog: ProviderCatalog,
    registry: ImageProviderRegistry,
    store: SettingsStore,
    inputs: OutputStorage,
    activity: Option<ActivityLog>,
}

impl ImageEnhancer {
    pub fn new(
        catalog: ProviderCatalog,
        registry: ImageProviderRegistry,
        store: SettingsStore,
        site: SiteLayout,
    ) -> Self {
        Self {
            catalog,
            registry,
            store,
            inputs: OutputStorage::new(std::path::PathBuf::new(), site),
            activity: None,
        }
    }

    pub fn from_config(config: &EnhancerConfig) -> anyhow::Result<Self> {
        let catalog = match config.catalog_path.as_deref() {
            Some(path) => ProviderCatalog::from_json_file(path)
                .with_context(|| format!("failed to load provider catalog {}", path.display()))?,
            None => ProviderCatalog::default(),
        };
        let mut enhancer = Self::new(
            catalog,
            default_provider_registry(config),
            SettingsStore::new(config.settings_path.clone()),
            config.site.clone(),
        );
        if let Some(path) = config.events_path.as_ref() {
            enhancer = enhancer.with_activity_log(ActivityLog::new(path.clone()));
        }
        Ok(enhancer)
    }

    pub fn with_activity_log(mut self, activity: ActivityLog) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn process_image(
        &self,
        input: &str,
        prompts: &[String],
        provider_code: &str,
        options: ProcessOptions,
    ) -> ProcessOutcome {
        let input = input.trim();
        if input.is_empty() || !self.inputs.resolve_input_path(input).exists() {
            return self.fail(provider_code, ErrorCode::FileNotFound, "Input file not found");
        }

        let provider = self
            .catalog
            .client_for(provider_code)
            .and_then(|client| self.registry.get(client));
        let Some(provider) = provider else {
            let err = EnhanceError::Config(format!("Provider class not found: {provider_code}"));
            return self.fail(provider_code, err.code(), err.to_string());
        };

        let settings = self.store.load().provider_settings(provider_code);
        if !settings.has_api_key() {
            let err =
                EnhanceError::Config(format!("API key not configured for provider: {provider_code}"));
            return self.fail(provider_code, err.code(), err.to_string());
        }

        let model = match settings.model.trim() {
            "" => self.catalog.default_model(provider_code),
            chosen => chosen.to_string(),
        };
        let request = ProcessRequest {
            api_key: settings.api_key.trim().to_string(),
            model,
            input_path: input.to_string(),
            prompt: prompts.join(", "),
            options,
        };

        self.record(
            ActivityKind::ProcessStarted,
            json!({
                "provider": provider_code,
                "model": request.model,
                "input": request.input_path,
                "resize": options.resize,
                "size": options.size,
            }),
        );
        tracing::info!(provider = provider_code, model = %request.model, "processing image");

        match provider.process_image(&request) {
            Ok(result) => {
                self.record(
                    ActivityKind::ProcessSucceeded,
                    json!({
                        "provider": provider_code,
                        "model": request.model,
                        "final_path": result.data.final_path,
                        "tokens_spent": result.tokens_spent,
                        "approx_price_usd": result.approx_price_usd,
                    }),
                );
                ProcessOutcome::success(result)
            }
            Err(err) => self.fail(
                provider_code,
                err.code(),
                format!("Processing failed: {err}"),
            ),
        }
    }

    /// Connectivity check hook. No request is made; the answer is always ok.
    pub fn verify_provider(&self, provider_code: &str) -> VerifyResponse {
        self.record(
            ActivityKind::ProviderVerified,
            json!({ "provider": provider_code, "ok": true }),
        );
        VerifyResponse { ok: true }
    }

    /// Records a settings save on this enhancer's activity log. A failed
    /// append is logged and otherwise ignored; the save already happened.
    pub fn record_settings_saved(&self, section: &str) {
        self.record(
            ActivityKind::SettingsSaved,
            json!({
                "section": section,
                "settings": self.store.path().to_string_lossy(),
            }),
        );
    }

    fn fail(&self, provider_code: &str, code: ErrorCode, message: impl Into<String>) -> ProcessOutcome {
        let message = message.into();
        tracing::warn!(provider = provider_code, code = %code, "{message}");
        self.record(
            ActivityKind::ProcessFailed,
            json!({ "provider": provider_code, "code": code, "message": message }),
        );
        ProcessOutcome::failure(code, message)
    }

    fn record(&self, kind: ActivityKind, payload: Value) {
        let Some(activity) = self.activity.as_ref() else {
            return;
        };
        if let Err(err) = activity.record(kind, map_object(payload)) {
            tracing::warn!(event = kind.as_str(), error = %err, "failed to append activity event");
        }
    }
}

fn map_object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
