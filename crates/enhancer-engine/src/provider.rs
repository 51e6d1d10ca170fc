use std::collections::BTreeMap;

use enhancer_contracts::providers::ClientKind;
use enhancer_contracts::runs::ProcessResult;

use crate::config::EnhancerConfig;
use crate::error::Result;
use crate::gemini::GeminiProvider;

pub const DEFAULT_SQUARE_SIZE: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Contain-fit onto a transparent `size`x`size` canvas instead of keeping
    /// the natural dimensions.
    pub resize: bool,
    pub size: u32,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            resize: false,
            size: DEFAULT_SQUARE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub api_key: String,
    pub model: String,
    /// Filesystem path, or a public content URL that maps onto one.
    pub input_path: String,
    pub prompt: String,
    pub options: ProcessOptions,
}

pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;
    fn client(&self) -> ClientKind;
    fn process_image(&self, request: &ProcessRequest) -> Result<ProcessResult>;
}

#[derive(Default)]
pub struct ImageProviderRegistry {
    providers: BTreeMap<ClientKind, Box<dyn ImageProvider>>,
}

impl ImageProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: ImageProvider + 'static>(&mut self, provider: P) {
        self.providers.insert(provider.client(), Box::new(provider));
    }

    pub fn get(&self, client: ClientKind) -> Option<&dyn ImageProvider> {
        self.providers.get(&client).map(|provider| provider.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.providers
            .values()
            .map(|provider| provider.name().to_string())
            .collect()
    }
}

pub fn default_provider_registry(config: &EnhancerConfig) -> ImageProviderRegistry {
    let mut registry = ImageProviderRegistry::new();
    registry.register(GeminiProvider::from_config(config));
    registry
}
