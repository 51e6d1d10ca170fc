use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::stored::{EnhancerForm, PromptPreset, ProviderSettings};
use crate::providers::ProviderCatalog;

/// Sanitizes submitted credentials against the authoritative catalog.
///
/// Only catalog providers are emitted, so a submission cannot introduce new
/// provider codes. A model the provider does not declare becomes `""`.
pub fn sanitize_incoming_providers(
    catalog: &ProviderCatalog,
    incoming: &Map<String, Value>,
) -> BTreeMap<String, ProviderSettings> {
    let mut out = BTreeMap::new();
    for config in catalog.list() {
        let row = incoming
            .get(&config.code)
            .and_then(Value::as_object);
        let field = |name: &str| -> String {
            row.and_then(|row| row.get(name))
                .and_then(Value::as_str)
                .map(sanitize_text_field)
                .unwrap_or_default()
        };

        let api_key = field("api_key");
        let mut model = field("model");
        if !model.is_empty() && !catalog.has_model(&config.code, &model) {
            model.clear();
        }

        out.insert(config.code.clone(), ProviderSettings { api_key, model });
    }
    out
}

/// Zips the three parallel arrays into prompt rows, padding to the longest.
pub fn sanitize_incoming_enhancer(form: &EnhancerForm) -> Vec<PromptPreset> {
    let rows = form
        .titles
        .len()
        .max(form.texts.len())
        .max(form.selected.len());

    (0..rows)
        .filter_map(|idx| {
            let title = form.titles.get(idx).map(String::as_str).unwrap_or("");
            let text = form.texts.get(idx).map(String::as_str).unwrap_or("");
            let selected = form
                .selected
                .get(idx)
                .map(|flag| !flag.is_empty() && flag != "0")
                .unwrap_or(false);
            PromptPreset::sanitized(title, text, selected)
        })
        .collect()
}

/// Single-line text: tags stripped, whitespace runs collapsed, trimmed.
pub fn sanitize_text_field(raw: &str) -> String {
    let stripped = strip_tags(raw);
    let mut out = String::with_capacity(stripped.len());
    let mut pending_space = false;
    for ch in stripped.chars() {
        if ch.is_whitespace() || ch.is_control() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }
    out
}

/// Multi-line text: markup is kept, control characters other than newlines
/// and tabs are dropped, line endings normalized, outer whitespace trimmed.
pub fn sanitize_textarea(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .chars()
        .filter(|ch| !ch.is_control() || *ch == '\n' || *ch == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}

fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        let opens_tag = ch == '<'
            && chars
                .peek()
                .map(|next| next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?'))
                .unwrap_or(false);
        if !opens_tag {
            out.push(ch);
            continue;
        }
        for inner in chars.by_ref() {
            if inner == '>' {
                break;
            }
        }
    }
    out
}
