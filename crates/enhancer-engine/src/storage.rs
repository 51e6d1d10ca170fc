use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SiteLayout;
use crate::error::{EnhanceError, Result};

/// Output directory for final images and the mappings used to publish them.
#[derive(Debug, Clone)]
pub struct OutputStorage {
    output_dir: PathBuf,
    site: SiteLayout,
}

impl OutputStorage {
    pub fn new(output_dir: impl Into<PathBuf>, site: SiteLayout) -> Self {
        Self {
            output_dir: output_dir.into(),
            site,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Maps a public content URL back onto the content directory. Anything
    /// else is taken as a filesystem path.
    pub fn resolve_input_path(&self, raw: &str) -> PathBuf {
        let raw = raw.trim();
        if let Some(content_url) = self.site.content_url.as_deref().filter(|url| !url.is_empty()) {
            if let Some(rest) = raw.strip_prefix(content_url) {
                let rest = rest.trim_start_matches('/');
                if rest.is_empty() {
                    return self.site.content_dir.clone();
                }
                return self.site.content_dir.join(rest);
            }
        }
        PathBuf::from(raw)
    }

    /// Writes `bytes` under `filename`, creating the directory on demand.
    pub fn write(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.ensure_output_dir()?;
        let path = self.output_dir.join(filename);
        fs::write(&path, bytes).map_err(|err| {
            EnhanceError::io(format!("Failed to write final file: {}", path.display()), err)
        })?;
        Ok(path)
    }

    /// Upload mapping first, then document root; `None` when neither covers
    /// the path.
    pub fn public_url(&self, path: &Path) -> Option<String> {
        let absolute = path.to_string_lossy().replace('\\', "/");

        if let Some(uploads) = self.site.uploads.as_ref() {
            if !uploads.base_dir.is_empty() && !uploads.base_url.is_empty() {
                let base_dir = uploads.base_dir.replace('\\', "/");
                let prefix = format!("{}/", base_dir.trim_end_matches('/'));
                if let Some(rel) = absolute.strip_prefix(&prefix) {
                    return Some(format!(
                        "{}/{}",
                        uploads.base_url.trim_end_matches('/'),
                        rel.trim_start_matches('/')
                    ));
                }
            }
        }

        if let Some(root) = self.site.document_root.as_ref() {
            if !root.root.is_empty() && !root.host.is_empty() {
                let doc_root = root.root.replace('\\', "/");
                let prefix = format!("{}/", doc_root.trim_end_matches('/'));
                if let Some(rel) = absolute.strip_prefix(&prefix) {
                    let scheme = if root.https { "https" } else { "http" };
                    return Some(format!("{scheme}://{}/{rel}", root.host));
                }
            }
        }

        None
    }

    fn ensure_output_dir(&self) -> Result<()> {
        if self.output_dir.is_dir() {
            return Ok(());
        }
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }
        builder.create(&self.output_dir).map_err(|err| {
            EnhanceError::io(
                format!("Failed to create output dir: {}", self.output_dir.display()),
                err,
            )
        })
    }
}

/// `{stem}_{timestamp}.{ext}` with the stem made filesystem-safe.
pub fn timestamped_filename(input: &Path, ext: &str, timestamp: i64) -> String {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}_{}.{}", sanitize_filename(&stem), timestamp, ext)
}

/// Collapses runs outside `[A-Za-z0-9_.-]` to `_` and trims `._-` from both
/// ends. Empty results become `image`.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.') {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    let trimmed = out.trim_matches(|ch| matches!(ch, '.' | '_' | '-'));
    if trimmed.is_empty() {
        "image".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}
