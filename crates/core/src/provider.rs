//! Provider catalog
//!
//! A provider is an external vendor (LLM, transcription, speech synthesis or
//! telephony) together with the models it offers and their prices. The
//! catalog is fetched per request and never cached across requests.
//!
//! Lookups never fail: an unknown provider or model simply yields `None`,
//! which the cost calculator turns into a zero contribution.

use serde::{Deserialize, Serialize};

/// Name of the pseudo-provider that carries the flat platform fee
pub const PLATFORM_PROVIDER: &str = "Platform";

/// Provider category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderCategory {
    Llm,
    Transcriber,
    Synthesizer,
    Telephony,
}

impl ProviderCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Transcriber => "transcriber",
            Self::Synthesizer => "synthesizer",
            Self::Telephony => "telephony",
        }
    }
}

/// Model price: either a single rate or an input/output split
///
/// Units depend on the category: LLM prices are per million tokens,
/// transcriber prices per minute, synthesizer prices per character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelPrice {
    Flat(f64),
    Split { input: f64, output: f64 },
}

impl ModelPrice {
    /// Single per-unit figure (split prices are summed)
    pub fn per_unit(&self) -> f64 {
        match *self {
            ModelPrice::Flat(price) => price,
            ModelPrice::Split { input, output } => input + output,
        }
    }
}

/// A model offered by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderModel {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub price: ModelPrice,
}

/// A provider and its models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub category: ProviderCategory,
    #[serde(default)]
    pub models: Vec<ProviderModel>,
    /// Whether a credential is stored for this provider
    #[serde(default)]
    pub connected: bool,
}

impl Provider {
    /// Case-insensitive match on name or id
    pub fn matches(&self, key: &str) -> bool {
        self.name.eq_ignore_ascii_case(key) || self.id.eq_ignore_ascii_case(key)
    }

    /// Find a model by key
    ///
    /// Exact match first. Synthesizer models also match when the stored key is a
    /// prefix of the catalog id, since voice ids are appended to base model names.
    pub fn find_model(&self, model_key: &str) -> Option<&ProviderModel> {
        let exact = self.models.iter().find(|m| m.id == model_key);
        if exact.is_some() || self.category != ProviderCategory::Synthesizer || model_key.is_empty() {
            return exact;
        }
        self.models.iter().find(|m| m.id.starts_with(model_key))
    }
}

/// The full list of providers known to the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderCatalog {
    #[serde(default)]
    pub providers: Vec<Provider>,
}

impl ProviderCatalog {
    pub fn new(providers: Vec<Provider>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Providers of one category
    pub fn by_category(&self, category: ProviderCategory) -> impl Iterator<Item = &Provider> {
        self.providers.iter().filter(move |p| p.category == category)
    }

    /// Find a provider by category and key (case-insensitive)
    pub fn find_provider(&self, category: ProviderCategory, key: &str) -> Option<&Provider> {
        self.by_category(category).find(|p| p.matches(key))
    }

    /// Models of a provider, empty when the provider is unknown
    pub fn models(&self, category: ProviderCategory, key: &str) -> &[ProviderModel] {
        self.find_provider(category, key)
            .map(|p| p.models.as_slice())
            .unwrap_or(&[])
    }

    /// Find a model of a provider
    pub fn find_model(
        &self,
        category: ProviderCategory,
        provider_key: &str,
        model_key: &str,
    ) -> Option<&ProviderModel> {
        self.find_provider(category, provider_key)
            .and_then(|p| p.find_model(model_key))
    }

    /// Price entry of a provider's model
    pub fn price(
        &self,
        category: ProviderCategory,
        provider_key: &str,
        model_key: &str,
    ) -> Option<ModelPrice> {
        self.find_model(category, provider_key, model_key)
            .map(|m| m.price)
    }

    /// Flat platform fee: first model of the provider named "Platform"
    pub fn platform_price(&self) -> Option<f64> {
        self.providers
            .iter()
            .find(|p| p.name == PLATFORM_PROVIDER)
            .and_then(|p| p.models.first())
            .map(|m| m.price.per_unit())
    }

    /// Mark a provider as connected or disconnected
    ///
    /// Returns false when no provider matches.
    pub fn set_connected(&mut self, key: &str, connected: bool) -> bool {
        let mut found = false;
        for provider in self.providers.iter_mut().filter(|p| p.matches(key)) {
            provider.connected = connected;
            found = true;
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: &str, price: ModelPrice) -> ProviderModel {
        ProviderModel {
            id: id.to_string(),
            label: id.to_string(),
            price,
        }
    }

    fn catalog() -> ProviderCatalog {
        ProviderCatalog::new(vec![
            Provider {
                id: "openai".into(),
                name: "OpenAI".into(),
                category: ProviderCategory::Llm,
                models: vec![
                    model("gpt-4o-mini", ModelPrice::Flat(0.6)),
                    model("gpt-4o", ModelPrice::Split { input: 2.5, output: 10.0 }),
                ],
                connected: true,
            },
            Provider {
                id: "elevenlabs".into(),
                name: "ElevenLabs".into(),
                category: ProviderCategory::Synthesizer,
                models: vec![model("eleven_turbo_v2_5-rachel", ModelPrice::Flat(0.00003))],
                connected: false,
            },
            Provider {
                id: "platform".into(),
                name: "Platform".into(),
                category: ProviderCategory::Telephony,
                models: vec![model("standard", ModelPrice::Flat(0.02))],
                connected: false,
            },
        ])
    }

    #[test]
    fn test_provider_lookup_is_case_insensitive() {
        let c = catalog();
        assert!(c.find_provider(ProviderCategory::Llm, "openai").is_some());
        assert!(c.find_provider(ProviderCategory::Llm, "OPENAI").is_some());
        assert!(c.find_provider(ProviderCategory::Transcriber, "openai").is_none());
    }

    #[test]
    fn test_model_lookup_is_exact_for_llm() {
        let c = catalog();
        assert_eq!(
            c.price(ProviderCategory::Llm, "openai", "gpt-4o-mini"),
            Some(ModelPrice::Flat(0.6))
        );
        assert!(c.price(ProviderCategory::Llm, "openai", "gpt-4").is_none());
    }

    #[test]
    fn test_synthesizer_prefix_fallback() {
        let c = catalog();
        assert_eq!(
            c.price(ProviderCategory::Synthesizer, "elevenlabs", "eleven_turbo_v2_5"),
            Some(ModelPrice::Flat(0.00003))
        );
        assert!(c.price(ProviderCategory::Synthesizer, "elevenlabs", "").is_none());
    }

    #[test]
    fn test_unknown_provider_has_no_models() {
        let c = catalog();
        assert!(c.models(ProviderCategory::Llm, "anthropic").is_empty());
    }

    #[test]
    fn test_platform_price() {
        assert_eq!(catalog().platform_price(), Some(0.02));
        assert_eq!(ProviderCatalog::default().platform_price(), None);
    }

    #[test]
    fn test_price_shapes_deserialize() {
        let flat: ModelPrice = serde_json::from_str("5").unwrap();
        assert_eq!(flat, ModelPrice::Flat(5.0));
        let split: ModelPrice = serde_json::from_str(r#"{"input": 3, "output": 15}"#).unwrap();
        assert_eq!(split, ModelPrice::Split { input: 3.0, output: 15.0 });
    }

    #[test]
    fn test_set_connected() {
        let mut c = catalog();
        assert!(c.set_connected("ElevenLabs", true));
        assert!(c.find_provider(ProviderCategory::Synthesizer, "elevenlabs").unwrap().connected);
        assert!(!c.set_connected("nobody", true));
    }
}
