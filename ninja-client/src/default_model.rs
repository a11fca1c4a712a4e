//! Default model selection from the `model-settings` flag payload.

use crate::feature_flags::FeatureFlagProvider;
use serde_json::Value;
use std::sync::RwLock;

/// Used when the payload is absent, malformed or empty.
pub const FALLBACK_DEFAULT_MODEL_ID: &str = "zai:glm-4-6-cerebras";

/// Flag whose payload lists the selectable models.
pub const MODEL_SETTINGS_FLAG: &str = "model-settings";

/// One entry of the `model-settings` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOption {
    pub value: String,
    pub label: String,
    pub description: String,
    pub default: bool,
}

/// Parse the payload. Every element must carry string `value`, `label` and
/// `description`; `default` counts only when it is `true`.
pub fn parse_model_options(payload: &Value) -> Option<Vec<ModelOption>> {
    payload
        .as_array()?
        .iter()
        .map(|option| {
            let field = |name: &str| option.get(name)?.as_str().map(str::to_string);
            Some(ModelOption {
                value: field("value")?,
                label: field("label")?,
                description: field("description")?,
                default: option.get("default").and_then(Value::as_bool).unwrap_or(false),
            })
        })
        .collect()
}

/// Model marked default, else the first one, else the fallback.
/// Empty ids are skipped at each step.
pub fn select_default_model(options: &[ModelOption]) -> String {
    let marked = options.iter().find(|o| o.default).map(|o| o.value.as_str());
    let first = options.first().map(|o| o.value.as_str());
    marked
        .filter(|v| !v.is_empty())
        .or(first.filter(|v| !v.is_empty()))
        .unwrap_or(FALLBACK_DEFAULT_MODEL_ID)
        .to_string()
}

/// Resolves and memoizes the default model id.
pub struct DefaultModelResolver<P> {
    provider: P,
    cached: RwLock<Option<String>>,
}

impl<P: FeatureFlagProvider> DefaultModelResolver<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cached: RwLock::new(None),
        }
    }

    /// Cached id, or one lookup of the payload. The fallback is cached too.
    pub async fn resolve(&self) -> String {
        if let Some(id) = self.cached() {
            return id;
        }

        let resolved = match self.provider.payload(MODEL_SETTINGS_FLAG).await {
            Ok(Some(payload)) => match parse_model_options(&payload) {
                Some(options) => select_default_model(&options),
                None => {
                    tracing::warn!("Malformed model-settings payload, using fallback model");
                    FALLBACK_DEFAULT_MODEL_ID.to_string()
                }
            },
            Ok(None) => FALLBACK_DEFAULT_MODEL_ID.to_string(),
            Err(err) => {
                tracing::error!(error = %err, "Error fetching default model from feature flag");
                FALLBACK_DEFAULT_MODEL_ID.to_string()
            }
        };

        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(resolved.clone());
        resolved
    }

    /// Cached id without a lookup.
    pub fn cached_or_fallback(&self) -> String {
        self.cached()
            .unwrap_or_else(|| FALLBACK_DEFAULT_MODEL_ID.to_string())
    }

    /// Forget the cached id, e.g. after flags were updated.
    pub fn reset(&self) {
        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    fn cached(&self) -> Option<String> {
        self.cached
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_flags::StaticFeatureFlags;
    use serde_json::json;

    fn option(value: &str, default: bool) -> ModelOption {
        ModelOption {
            value: value.to_string(),
            label: value.to_uppercase(),
            description: String::new(),
            default,
        }
    }

    #[test]
    fn test_parse_requires_string_fields() {
        let good = json!([{"value": "a", "label": "A", "description": "d", "default": true}]);
        assert_eq!(parse_model_options(&good).unwrap().len(), 1);

        let missing_label = json!([{"value": "a", "description": "d"}]);
        assert!(parse_model_options(&missing_label).is_none());

        assert!(parse_model_options(&json!({"value": "a"})).is_none());
        assert_eq!(parse_model_options(&json!([])), Some(vec![]));
    }

    #[test]
    fn test_select_prefers_marked_default() {
        let options = vec![option("a", false), option("b", true)];
        assert_eq!(select_default_model(&options), "b");
    }

    #[test]
    fn test_select_falls_back_to_first_then_constant() {
        assert_eq!(select_default_model(&[option("a", false)]), "a");
        assert_eq!(select_default_model(&[]), FALLBACK_DEFAULT_MODEL_ID);
        assert_eq!(select_default_model(&[option("", true), option("z", false)]), FALLBACK_DEFAULT_MODEL_ID);
        assert_eq!(select_default_model(&[option("a", false), option("", true)]), "a");
    }

    #[tokio::test]
    async fn test_resolver_caches_result() {
        let flags = StaticFeatureFlags::new().with_payload(
            MODEL_SETTINGS_FLAG,
            json!([
                {"value": "m1", "label": "M1", "description": "first"},
                {"value": "m2", "label": "M2", "description": "second", "default": true}
            ]),
        );
        let resolver = DefaultModelResolver::new(flags);
        assert_eq!(resolver.cached_or_fallback(), FALLBACK_DEFAULT_MODEL_ID);
        assert_eq!(resolver.resolve().await, "m2");
        assert_eq!(resolver.cached_or_fallback(), "m2");

        resolver.reset();
        assert_eq!(resolver.cached_or_fallback(), FALLBACK_DEFAULT_MODEL_ID);
    }

    #[tokio::test]
    async fn test_resolver_malformed_payload_uses_fallback() {
        let flags = StaticFeatureFlags::new().with_payload(MODEL_SETTINGS_FLAG, json!("not-a-list"));
        let resolver = DefaultModelResolver::new(flags);
        assert_eq!(resolver.resolve().await, FALLBACK_DEFAULT_MODEL_ID);
    }
}
