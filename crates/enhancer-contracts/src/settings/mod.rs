mod sanitize;
mod store;
mod stored;

pub use sanitize::{
    sanitize_incoming_enhancer, sanitize_incoming_providers, sanitize_text_field, sanitize_textarea,
};
pub use store::SettingsStore;
pub use stored::{
    EnhancerForm, EnhancerSettings, PromptPreset, ProviderSettings, SettingsSubmission,
    SettingsTab, StoredSettings,
};
