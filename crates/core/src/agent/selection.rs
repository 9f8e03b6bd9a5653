//! Provider/model selections used for cost estimation

use serde::{Deserialize, Serialize};

use super::{AgentConfig, Task};

/// A `{provider, model}` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSelection {
    pub provider: String,
    pub model: String,
}

impl ModelSelection {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

/// The three priced stages of a conversation pipeline
///
/// Seeded from the conversation task when an edit session opens and updated
/// by every section patch applied to the session's draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<ModelSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcriber: Option<ModelSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesizer: Option<ModelSelection>,
}

impl Selection {
    pub fn from_task(task: &Task) -> Self {
        let tools = &task.tools_config;
        Self {
            llm: tools.llm_agent.as_ref().and_then(|a| a.model_selection()),
            transcriber: tools
                .transcriber
                .as_ref()
                .map(|t| ModelSelection::new(&t.provider, &t.model)),
            synthesizer: tools.synthesizer.as_ref().map(|s| s.to_cost_model()),
        }
    }

    /// Selection of the conversation task, empty when the agent has no tasks
    pub fn from_config(config: &AgentConfig) -> Self {
        config
            .conversation_task()
            .map(Self::from_task)
            .unwrap_or_default()
    }
}
