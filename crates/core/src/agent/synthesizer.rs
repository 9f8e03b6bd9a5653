//! Speech synthesizer configuration
//!
//! The wire shape is `{ provider, provider_config, stream, ... }` where the
//! shape of `provider_config` depends on `provider`. It is modelled as an
//! adjacently tagged enum flattened into the surrounding record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::selection::ModelSelection;

/// Default Azure neural voice family, used when no model is stored
pub const AZURE_DEFAULT_MODEL: &str = "neural";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizerConfig {
    #[serde(flatten)]
    pub voice: VoiceProvider,
    #[serde(default)]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caching: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SynthesizerConfig {
    pub fn new(voice: VoiceProvider) -> Self {
        Self {
            voice,
            stream: true,
            buffer_size: None,
            audio_format: None,
            caching: None,
            extra: Map::new(),
        }
    }

    pub fn provider_id(&self) -> &'static str {
        self.voice.provider_id()
    }

    pub fn to_cost_model(&self) -> ModelSelection {
        self.voice.to_cost_model()
    }
}

/// Per-provider voice settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", content = "provider_config", rename_all = "lowercase")]
pub enum VoiceProvider {
    Elevenlabs(ElevenLabsVoice),
    Openai(OpenAiVoice),
    Azuretts(AzureVoice),
    Polly(PollyVoice),
    Deepgram(DeepgramVoice),
    Cartesia(CartesiaVoice),
}

impl VoiceProvider {
    pub fn provider_id(&self) -> &'static str {
        match self {
            VoiceProvider::Elevenlabs(_) => "elevenlabs",
            VoiceProvider::Openai(_) => "openai",
            VoiceProvider::Azuretts(_) => "azuretts",
            VoiceProvider::Polly(_) => "polly",
            VoiceProvider::Deepgram(_) => "deepgram",
            VoiceProvider::Cartesia(_) => "cartesia",
        }
    }

    /// Catalog key used to price this voice
    pub fn to_cost_model(&self) -> ModelSelection {
        let model = match self {
            VoiceProvider::Elevenlabs(v) => v.model.as_str(),
            VoiceProvider::Openai(v) => v.model.as_str(),
            VoiceProvider::Azuretts(v) => v.model.as_deref().unwrap_or(AZURE_DEFAULT_MODEL),
            VoiceProvider::Polly(v) => v.engine.as_str(),
            VoiceProvider::Deepgram(v) => v.model.as_str(),
            VoiceProvider::Cartesia(v) => v.model.as_str(),
        };
        ModelSelection::new(self.provider_id(), model)
    }

    /// Display name of the voice
    pub fn voice_name(&self) -> &str {
        match self {
            VoiceProvider::Elevenlabs(v) => &v.voice,
            VoiceProvider::Openai(v) => &v.voice,
            VoiceProvider::Azuretts(v) => &v.voice,
            VoiceProvider::Polly(v) => &v.voice,
            VoiceProvider::Deepgram(v) => &v.voice,
            VoiceProvider::Cartesia(v) => &v.voice,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevenLabsVoice {
    pub voice: String,
    pub voice_id: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiVoice {
    pub voice: String,
    pub model: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzureVoice {
    pub voice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollyVoice {
    pub voice: String,
    pub engine: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepgramVoice {
    pub voice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    pub model: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesiaVoice {
    pub voice: String,
    pub voice_id: String,
    pub model: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_elevenlabs_roundtrip() {
        let raw = json!({
            "provider": "elevenlabs",
            "provider_config": {
                "voice": "Rachel",
                "voice_id": "21m00Tcm4TlvDq8ikWAM",
                "model": "eleven_turbo_v2_5"
            },
            "stream": true,
            "buffer_size": 250,
            "audio_format": "wav",
            "use_ssml": false
        });
        let config: SynthesizerConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(config.provider_id(), "elevenlabs");
        assert_eq!(config.voice.voice_name(), "Rachel");
        assert_eq!(config.extra.get("use_ssml"), Some(&json!(false)));
        assert_eq!(serde_json::to_value(&config).unwrap(), raw);
    }

    #[test]
    fn test_cost_model_per_provider() {
        let polly: SynthesizerConfig = serde_json::from_value(json!({
            "provider": "polly",
            "provider_config": {"voice": "Joanna", "engine": "neural", "language": "en-US"},
            "stream": false
        }))
        .unwrap();
        assert_eq!(polly.to_cost_model(), ModelSelection::new("polly", "neural"));

        let azure: SynthesizerConfig = serde_json::from_value(json!({
            "provider": "azuretts",
            "provider_config": {"voice": "Jenny"}
        }))
        .unwrap();
        assert_eq!(
            azure.to_cost_model(),
            ModelSelection::new("azuretts", AZURE_DEFAULT_MODEL)
        );
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let raw = json!({
            "provider": "acme",
            "provider_config": {"voice": "x", "model": "y"}
        });
        assert!(serde_json::from_value::<SynthesizerConfig>(raw).is_err());
    }
}
