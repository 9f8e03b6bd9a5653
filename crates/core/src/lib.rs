//! Core types for the voice agent console
//!
//! This crate provides the foundational types used by all other crates:
//! - Agent configuration model (tasks, tool configs, tagged LLM agents)
//! - Provider catalog and per-minute cost estimation
//! - Response envelope and error taxonomy
//! - Backend resources (executions, knowledge bases, keys, ...)

pub mod agent;
pub mod envelope;
pub mod error;
pub mod provider;
pub mod resources;
pub mod traits;

pub use agent::{
    AgentConfig, AgentPrompts, AgentRecord, CreateAgentPayload, LlmAgent, ModelSelection,
    Selection, SynthesizerConfig, Task, TaskType, ToolsConfig, UpdateAgentRequest,
    VoiceProvider,
};
pub use envelope::{ApiErrorBody, ApiResponse};
pub use error::{Error, ErrorKind, FieldError, Result};
pub use provider::{
    ModelPrice, Provider, ProviderCatalog, ProviderCategory, ProviderModel, PLATFORM_PROVIDER,
};
pub use traits::{AgentGateway, CostBreakdown, CostCalculator};
