mod catalog;

pub use catalog::{ClientKind, ModelSpec, ProviderCatalog, ProviderConfig, ProviderSummary};

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::{ClientKind, ModelSpec, ProviderCatalog, ProviderConfig};

    fn model(title: &str, kind: &str) -> ModelSpec {
        ModelSpec {
            title: title.to_string(),
            kind: kind.to_string(),
            description: format!("{title} description"),
        }
    }

    fn catalog_with(models: IndexMap<String, ModelSpec>) -> ProviderCatalog {
        let mut providers = IndexMap::new();
        providers.insert(
            "acme".to_string(),
            ProviderConfig {
                code: "acme".to_string(),
                display_name: "Acme".to_string(),
                client: ClientKind::Gemini,
                models,
            },
        );
        ProviderCatalog::new(Some(providers))
    }

    #[test]
    fn default_catalog_declares_gemini_with_image_model_first() {
        let catalog = ProviderCatalog::default();
        assert_eq!(catalog.codes(), vec!["gemini"]);
        assert_eq!(catalog.client_for("gemini"), Some(ClientKind::Gemini));
        assert_eq!(catalog.default_model("gemini"), "gemini-2.5-flash-image");
        assert_eq!(catalog.models("gemini").map(|models| models.len()), Some(8));

        let summary = catalog.provider("gemini").unwrap();
        assert_eq!(summary.name, "Gemini");
        assert_eq!(summary.code, "gemini");
    }

    #[test]
    fn default_model_is_empty_for_unknown_or_modelless_provider() {
        let catalog = catalog_with(IndexMap::new());
        assert_eq!(catalog.default_model("acme"), "");
        assert_eq!(catalog.default_model("missing"), "");
        assert!(catalog.provider("missing").is_none());
        assert!(catalog.client_for("missing").is_none());
    }

    #[test]
    fn select_options_filter_by_type_and_fall_back_to_key() {
        let mut models = IndexMap::new();
        models.insert("img-1".to_string(), model("Image One", "image"));
        models.insert("mm-1".to_string(), model("", "multimodal"));
        let catalog = catalog_with(models);

        let all = catalog.model_select_options("acme", None);
        assert_eq!(
            all.iter()
                .map(|(key, title)| (key.as_str(), title.as_str()))
                .collect::<Vec<_>>(),
            vec![("img-1", "Image One"), ("mm-1", "mm-1")]
        );

        let images = catalog.model_select_options("acme", Some("image"));
        assert_eq!(images.keys().collect::<Vec<_>>(), vec!["img-1"]);
        assert!(catalog.model_select_options("missing", None).is_empty());
    }

    #[test]
    fn model_descriptions_cover_every_model() {
        let catalog = ProviderCatalog::default();
        let descriptions = catalog.model_descriptions("gemini");
        assert_eq!(descriptions.len(), 8);
        assert!(descriptions["gemini-2.0-pro"].contains("Previous generation"));
        assert!(catalog.model_descriptions("missing").is_empty());
    }

    #[test]
    fn catalog_loads_from_json_and_keeps_model_order() -> anyhow::Result<()> {
        let catalog = ProviderCatalog::from_json_str(
            r#"{
                "gemini": {
                    "name": "Google",
                    "client": "gemini",
                    "models": {
                        "z-model": {"title": "Z", "type": "image", "description": "last letter"},
                        "a-model": {"title": "A", "type": "image"}
                    }
                },
                "other": {"client": "gemini"}
            }"#,
        )?;
        assert_eq!(catalog.default_model("gemini"), "z-model");
        assert!(catalog.has_model("gemini", "a-model"));
        assert_eq!(catalog.model("gemini", "a-model").map(|m| m.description.as_str()), Some(""));
        assert_eq!(catalog.provider("other").map(|p| p.name), Some("other".to_string()));
        Ok(())
    }

    #[test]
    fn catalog_rejects_unknown_client_kind() {
        let err = ProviderCatalog::from_json_str(r#"{"x": {"client": "dall-e"}}"#);
        assert!(err.is_err());
    }
}
