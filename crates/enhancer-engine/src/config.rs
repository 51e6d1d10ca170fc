use std::env;
use std::path::PathBuf;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_SETTINGS_FILE: &str = "enhancer_settings.json";
const OUTPUT_SUBDIR: &str = "uploads/tmp_gemini_ai/tmp";

/// A local directory published under a public base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMapping {
    pub base_dir: String,
    pub base_url: String,
}

/// Web server document root, used when no upload mapping applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRoot {
    pub root: String,
    pub host: String,
    pub https: bool,
}

/// Where site content lives on disk and how it is published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteLayout {
    pub content_dir: PathBuf,
    pub content_url: Option<String>,
    pub uploads: Option<UrlMapping>,
    pub document_root: Option<DocumentRoot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancerConfig {
    pub api_base: String,
    pub site: SiteLayout,
    pub output_dir: PathBuf,
    pub settings_path: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub events_path: Option<PathBuf>,
}

impl EnhancerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(non_empty_env)
    }

    /// Builds the configuration from a variable lookup; unset and blank
    /// values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let content_dir = get("ENHANCER_CONTENT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("content"));
        let content_url = get("ENHANCER_CONTENT_URL").map(|url| url.trim_end_matches('/').to_string());

        let uploads_dir = get("ENHANCER_UPLOADS_DIR")
            .unwrap_or_else(|| content_dir.join("uploads").to_string_lossy().into_owned());
        let uploads_url = get("ENHANCER_UPLOADS_URL").or_else(|| {
            content_url
                .as_ref()
                .map(|base| format!("{base}/uploads"))
        });
        let uploads = uploads_url.map(|base_url| UrlMapping {
            base_dir: uploads_dir,
            base_url,
        });

        let document_root = match (get("DOCUMENT_ROOT"), get("HTTP_HOST")) {
            (Some(root), Some(host)) => Some(DocumentRoot {
                root,
                host,
                https: lookup("HTTPS").as_deref().is_some_and(https_flag_set),
            }),
            _ => None,
        };

        let output_dir = get("ENHANCER_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| content_dir.join(OUTPUT_SUBDIR));

        Self {
            api_base: get("GEMINI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            site: SiteLayout {
                content_dir,
                content_url,
                uploads,
                document_root,
            },
            output_dir,
            settings_path: get("ENHANCER_SETTINGS")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE)),
            catalog_path: get("ENHANCER_CATALOG").map(PathBuf::from),
            events_path: get("ENHANCER_EVENTS").map(PathBuf::from),
        }
    }
}

/// Set unless empty, `"0"` or exactly `"off"`.
fn https_flag_set(flag: &str) -> bool {
    !flag.is_empty() && flag != "0" && flag != "off"
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> EnhancerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        EnhancerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.api_base, DEFAULT_GEMINI_API_BASE);
        assert_eq!(config.site.content_dir, PathBuf::from("content"));
        assert_eq!(
            config.output_dir,
            PathBuf::from("content").join("uploads/tmp_gemini_ai/tmp")
        );
        assert_eq!(config.settings_path, PathBuf::from(DEFAULT_SETTINGS_FILE));
        assert!(config.site.uploads.is_none());
        assert!(config.site.document_root.is_none());
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn uploads_mapping_derives_from_content_url() {
        let config = config_from(&[
            ("ENHANCER_CONTENT_DIR", "/var/www/wp-content"),
            ("ENHANCER_CONTENT_URL", "https://example.com/wp-content/"),
            ("GEMINI_API_BASE", "http://localhost:9000/v1beta/"),
        ]);
        assert_eq!(
            config.site.content_url.as_deref(),
            Some("https://example.com/wp-content")
        );
        assert_eq!(
            config.site.uploads,
            Some(UrlMapping {
                base_dir: "/var/www/wp-content/uploads".to_string(),
                base_url: "https://example.com/wp-content/uploads".to_string(),
            })
        );
        assert_eq!(config.api_base, "http://localhost:9000/v1beta");
    }

    #[test]
    fn document_root_needs_host_and_reads_https_flag() {
        let without_host = config_from(&[("DOCUMENT_ROOT", "/srv/www")]);
        assert!(without_host.site.document_root.is_none());

        let off = config_from(&[
            ("DOCUMENT_ROOT", "/srv/www"),
            ("HTTP_HOST", "example.com"),
            ("HTTPS", "off"),
        ]);
        assert_eq!(off.site.document_root.map(|root| root.https), Some(false));

        let zero = config_from(&[
            ("DOCUMENT_ROOT", "/srv/www"),
            ("HTTP_HOST", "example.com"),
            ("HTTPS", "0"),
        ]);
        assert_eq!(zero.site.document_root.map(|root| root.https), Some(false));

        let on = config_from(&[
            ("DOCUMENT_ROOT", "/srv/www"),
            ("HTTP_HOST", "example.com"),
            ("HTTPS", "on"),
            ("ENHANCER_OUTPUT_DIR", "/tmp/out"),
        ]);
        assert_eq!(on.site.document_root.map(|root| root.https), Some(true));
        assert_eq!(on.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn https_flag_matches_server_variable_semantics() {
        assert!(!https_flag_set(""));
        assert!(!https_flag_set("0"));
        assert!(!https_flag_set("off"));
        assert!(https_flag_set("OFF"));
        assert!(https_flag_set("on"));
        assert!(https_flag_set("1"));
    }
}
