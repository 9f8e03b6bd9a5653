//! LLM agent variants
//!
//! `llm_agent` is a sum type discriminated by an explicit `agent_type` field.
//! Each variant carries its own `llm_config` shape. Accessors are total: a
//! question that does not apply to a variant answers `None` instead of
//! probing for nested fields that may not exist.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::routes::Routes;
use super::selection::ModelSelection;

/// Default streaming flow for conversational agents
pub const DEFAULT_FLOW_TYPE: &str = "streaming";

fn default_flow_type() -> String {
    DEFAULT_FLOW_TYPE.to_string()
}

fn default_openai() -> String {
    "openai".to_string()
}

/// Agent flow variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "agent_type", rename_all = "snake_case")]
pub enum LlmAgent {
    SimpleLlmAgent(SimpleLlmAgent),
    GraphAgent(GraphAgent),
    KnowledgebaseAgent(KnowledgebaseAgent),
    MultiAgent(MultiAgent),
    OpenaiAssistant(OpenAiAssistant),
}

impl LlmAgent {
    /// Simple streaming agent over one model
    pub fn simple(provider: impl Into<String>, model: impl Into<String>) -> Self {
        LlmAgent::SimpleLlmAgent(SimpleLlmAgent {
            agent_flow_type: default_flow_type(),
            llm_config: LlmConfig::new(provider, model),
            routes: None,
            extra: Map::new(),
        })
    }

    /// Wire discriminant
    pub fn agent_type(&self) -> &'static str {
        match self {
            LlmAgent::SimpleLlmAgent(_) => "simple_llm_agent",
            LlmAgent::GraphAgent(_) => "graph_agent",
            LlmAgent::KnowledgebaseAgent(_) => "knowledgebase_agent",
            LlmAgent::MultiAgent(_) => "multi_agent",
            LlmAgent::OpenaiAssistant(_) => "openai_assistant",
        }
    }

    /// Provider/model used for cost estimation
    ///
    /// Multi-agent setups are priced by their default agent.
    pub fn model_selection(&self) -> Option<ModelSelection> {
        match self {
            LlmAgent::SimpleLlmAgent(a) => Some(a.llm_config.selection()),
            LlmAgent::GraphAgent(a) => Some(ModelSelection::new(
                &a.llm_config.provider,
                &a.llm_config.model,
            )),
            LlmAgent::KnowledgebaseAgent(a) => Some(ModelSelection::new(
                &a.llm_config.provider,
                &a.llm_config.model,
            )),
            LlmAgent::MultiAgent(a) => a.agent_map.get(&a.default_agent).map(LlmConfig::selection),
            LlmAgent::OpenaiAssistant(a) => Some(ModelSelection::new(
                &a.llm_config.provider,
                &a.llm_config.model,
            )),
        }
    }

    /// Knowledge base retrieval settings
    ///
    /// Graph agents expose the retrieval config of their entry node.
    pub fn rag_config(&self) -> Option<&RagConfig> {
        match self {
            LlmAgent::KnowledgebaseAgent(a) => Some(&a.llm_config.rag_config),
            LlmAgent::GraphAgent(a) => a
                .llm_config
                .nodes
                .first()
                .and_then(|node| node.rag_config.as_ref()),
            LlmAgent::SimpleLlmAgent(_) | LlmAgent::MultiAgent(_) | LlmAgent::OpenaiAssistant(_) => {
                None
            }
        }
    }

    /// FAQ routes, for the variants that support them
    pub fn routes(&self) -> Option<&Routes> {
        match self {
            LlmAgent::SimpleLlmAgent(a) => a.routes.as_ref(),
            LlmAgent::KnowledgebaseAgent(a) => a.routes.as_ref(),
            LlmAgent::GraphAgent(_) | LlmAgent::MultiAgent(_) | LlmAgent::OpenaiAssistant(_) => None,
        }
    }

    /// Replace the FAQ routes
    ///
    /// Returns false (and leaves the agent unchanged) for variants without routes.
    pub fn set_routes(&mut self, routes: Option<Routes>) -> bool {
        match self {
            LlmAgent::SimpleLlmAgent(a) => {
                a.routes = routes;
                true
            }
            LlmAgent::KnowledgebaseAgent(a) => {
                a.routes = routes;
                true
            }
            LlmAgent::GraphAgent(_) | LlmAgent::MultiAgent(_) | LlmAgent::OpenaiAssistant(_) => {
                false
            }
        }
    }

    /// Generation limits `(max_tokens, temperature)` for the primary model
    pub fn limits(&self) -> (Option<u32>, Option<f64>) {
        match self {
            LlmAgent::SimpleLlmAgent(a) => (a.llm_config.max_tokens, a.llm_config.temperature),
            LlmAgent::GraphAgent(a) => (a.llm_config.max_tokens, a.llm_config.temperature),
            LlmAgent::KnowledgebaseAgent(a) => (a.llm_config.max_tokens, a.llm_config.temperature),
            LlmAgent::MultiAgent(a) => a
                .agent_map
                .get(&a.default_agent)
                .map(|c| (c.max_tokens, c.temperature))
                .unwrap_or((None, None)),
            LlmAgent::OpenaiAssistant(a) => (a.llm_config.max_tokens, a.llm_config.temperature),
        }
    }
}

/// Model configuration shared by simple agents and multi-agent members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_json: Option<bool>,
    /// Instructions for the summarization task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarization_details: Option<String>,
    /// Extraction prompt for the extraction task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_details: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LlmConfig {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            family: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            base_url: None,
            request_json: None,
            summarization_details: None,
            extraction_details: None,
            extra: Map::new(),
        }
    }

    pub fn selection(&self) -> ModelSelection {
        ModelSelection::new(&self.provider, &self.model)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleLlmAgent {
    #[serde(default = "default_flow_type")]
    pub agent_flow_type: String,
    pub llm_config: LlmConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Routes>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphAgent {
    #[serde(default = "default_flow_type")]
    pub agent_flow_type: String,
    pub llm_config: GraphLlmConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Conversation graph: nodes with prompts and conditional edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLlmConfig {
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_information: Option<String>,
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_node_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_config: Option<RagConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub to_node_id: String,
    #[serde(default)]
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgebaseAgent {
    #[serde(default = "default_flow_type")]
    pub agent_flow_type: String,
    pub llm_config: KnowledgebaseLlmConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Routes>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgebaseLlmConfig {
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub rag_config: RagConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Retrieval settings pointing at a knowledge base's vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagConfig {
    pub vector_store: VectorStore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_top_k: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RagConfig {
    pub fn for_vector(provider: impl Into<String>, vector_id: impl Into<String>) -> Self {
        Self {
            vector_store: VectorStore {
                provider: provider.into(),
                provider_config: VectorStoreConfig {
                    vector_id: vector_id.into(),
                },
            },
            similarity_top_k: None,
            extra: Map::new(),
        }
    }

    pub fn vector_id(&self) -> &str {
        &self.vector_store.provider_config.vector_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorStore {
    pub provider: String,
    pub provider_config: VectorStoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    pub vector_id: String,
}

/// Several named agents with utterance-based routing between them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiAgent {
    #[serde(default = "default_flow_type")]
    pub agent_flow_type: String,
    pub agent_map: BTreeMap<String, LlmConfig>,
    #[serde(default)]
    pub agent_routing_config: BTreeMap<String, AgentRoute>,
    pub default_agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRoute {
    #[serde(default)]
    pub utterances: Vec<String>,
    pub threshold: f64,
}

/// Hosted OpenAI assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiAssistant {
    #[serde(default = "default_flow_type")]
    pub agent_flow_type: String,
    pub llm_config: AssistantConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub assistant_id: String,
    #[serde(default = "default_openai")]
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
