//! Agent configuration model
//!
//! An agent is a named list of tasks plus per-task system prompts. Index 0 is
//! the conversation task; summarization and extraction tasks, when present,
//! follow it and are addressed by `task_type`.
//!
//! Every record keeps the JSON fields it does not name in an `extra` map, so
//! a load/save cycle never drops data written by newer backends.

mod defaults;
mod functions;
mod llm_agent;
mod routes;
mod selection;
mod synthesizer;
mod task;
mod task_config;
mod tools_config;

pub use defaults::{
    default_agent, default_prompts, extraction_task, summarization_task, DEFAULT_AGENT_NAME,
    DEFAULT_SYSTEM_PROMPT, DEFAULT_WELCOME_MESSAGE,
};
pub use functions::{ApiParams, ApiTools, ToolFunction, ToolKind};
pub use llm_agent::{
    AgentRoute, AssistantConfig, GraphAgent, GraphEdge, GraphLlmConfig, GraphNode,
    KnowledgebaseAgent, KnowledgebaseLlmConfig, LlmAgent, LlmConfig, MultiAgent,
    OpenAiAssistant, RagConfig, SimpleLlmAgent, VectorStore, VectorStoreConfig,
    DEFAULT_FLOW_TYPE,
};
pub use routes::{RouteResponse, RouteRule, Routes, DEFAULT_EMBEDDING_MODEL};
pub use selection::{ModelSelection, Selection};
pub use synthesizer::{
    AzureVoice, CartesiaVoice, DeepgramVoice, ElevenLabsVoice, OpenAiVoice, PollyVoice,
    SynthesizerConfig, VoiceProvider, AZURE_DEFAULT_MODEL,
};
pub use task::{Execution, Task, TaskType, Toolchain};
pub use task_config::{TaskConfig, DEFAULT_CALL_TERMINATE_SECS};
pub use tools_config::{TelephonyIo, ToolsConfig, TranscriberConfig};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// System prompts keyed by task key (`task_1`, `task_2`, ...)
pub type AgentPrompts = BTreeMap<String, TaskPrompt>;

/// Prompt key of the task at `index`
pub fn prompt_key(index: usize) -> String {
    format!("task_{}", index + 1)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPrompt {
    #[serde(default)]
    pub system_prompt: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskPrompt {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            extra: Map::new(),
        }
    }
}

/// `agent_config` of a create/update payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub agent_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_welcome_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentConfig {
    /// The conversation task (index 0)
    pub fn conversation_task(&self) -> Option<&Task> {
        self.tasks.first()
    }

    pub fn conversation_task_mut(&mut self) -> Option<&mut Task> {
        self.tasks.first_mut()
    }

    /// Position of the first task of a type
    pub fn task_index(&self, task_type: TaskType) -> Option<usize> {
        self.tasks.iter().position(|t| t.task_type == task_type)
    }

    pub fn task_by_type(&self, task_type: TaskType) -> Option<&Task> {
        self.tasks.iter().find(|t| t.task_type == task_type)
    }

    pub fn task_by_type_mut(&mut self, task_type: TaskType) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.task_type == task_type)
    }
}

/// Full agent payload, used for both create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAgentPayload {
    pub agent_config: AgentConfig,
    #[serde(default)]
    pub agent_prompts: AgentPrompts,
}

impl CreateAgentPayload {
    /// System prompt of the task at `index`
    pub fn system_prompt(&self, index: usize) -> Option<&str> {
        self.agent_prompts
            .get(&prompt_key(index))
            .map(|p| p.system_prompt.as_str())
    }

    pub fn set_system_prompt(&mut self, index: usize, prompt: impl Into<String>) {
        self.agent_prompts
            .entry(prompt_key(index))
            .or_default()
            .system_prompt = prompt.into();
    }

    pub fn selection(&self) -> Selection {
        Selection::from_config(&self.agent_config)
    }
}

/// Update payload; `version` enables the optimistic concurrency check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAgentRequest {
    #[serde(flatten)]
    pub payload: CreateAgentPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

/// A stored agent as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: Uuid,
    /// Incremented on every successful update
    #[serde(default)]
    pub version: u64,
    pub agent_config: AgentConfig,
    #[serde(default)]
    pub agent_prompts: AgentPrompts,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentRecord {
    pub fn name(&self) -> &str {
        &self.agent_config.agent_name
    }

    /// Editable payload of this record
    pub fn payload(&self) -> CreateAgentPayload {
        CreateAgentPayload {
            agent_config: self.agent_config.clone(),
            agent_prompts: self.agent_prompts.clone(),
        }
    }
}
