//! Per-task tool configuration

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::functions::ApiTools;
use super::llm_agent::LlmAgent;
use super::synthesizer::SynthesizerConfig;

/// The independently editable sub-configs of a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_agent: Option<LlmAgent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcriber: Option<TranscriberConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesizer: Option<SynthesizerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<TelephonyIo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<TelephonyIo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_tools: Option<ApiTools>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Speech-to-text settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriberConfig {
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Comma separated boost words
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpointing: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_rate: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TranscriberConfig {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            language: None,
            stream: true,
            encoding: None,
            keywords: None,
            endpointing: None,
            sampling_rate: None,
            extra: Map::new(),
        }
    }
}

/// Telephony input or output binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelephonyIo {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl TelephonyIo {
    pub fn new(provider: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            format: Some(format.into()),
        }
    }
}
