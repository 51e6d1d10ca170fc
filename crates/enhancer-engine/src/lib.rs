pub mod config;
pub mod enhancer;
pub mod error;
pub mod gemini;
pub mod imaging;
pub mod provider;
pub mod storage;
pub mod usage;

pub use config::{EnhancerConfig, SiteLayout};
pub use enhancer::ImageEnhancer;
pub use error::{EnhanceError, Result};
pub use gemini::GeminiProvider;
pub use provider::{
    default_provider_registry, ImageProvider, ImageProviderRegistry, ProcessOptions,
    ProcessRequest, DEFAULT_SQUARE_SIZE,
};
