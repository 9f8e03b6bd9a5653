//! Form validation contracts
//!
//! Validation collects every issue instead of stopping at the first, so a
//! form can mark all offending fields at once.

use url::Url;

use voice_console_core::agent::{
    CreateAgentPayload, LlmAgent, SynthesizerConfig, TaskConfig, TaskType, TranscriberConfig,
};
use voice_console_core::FieldError;

use crate::routes::validate_routes;
use crate::section::SectionPatch;
use crate::tools::validate_api_tools;
use crate::{EditorError, Result};

fn into_result(issues: Vec<FieldError>) -> Result<()> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(EditorError::Validation(issues))
    }
}

/// Validate a full agent payload before create/update
pub fn validate_payload(payload: &CreateAgentPayload) -> Result<()> {
    let config = &payload.agent_config;
    let mut issues = Vec::new();

    if config.agent_name.trim().is_empty() {
        issues.push(FieldError::new("agent_config.agent_name", "Agent name is required"));
    }

    match config.tasks.first() {
        None => issues.push(FieldError::new(
            "agent_config.tasks",
            "At least one task is required",
        )),
        Some(task) if task.task_type != TaskType::Conversation => issues.push(FieldError::new(
            "agent_config.tasks[0].task_type",
            "The first task must be the conversation task",
        )),
        Some(_) => {}
    }

    if let Some(url) = config.webhook_url.as_deref() {
        issues.extend(check_url("agent_config.webhook_url", url));
    }

    for (i, task) in config.tasks.iter().enumerate() {
        let prefix = format!("agent_config.tasks[{}]", i);
        if i > 0 && task.task_type == TaskType::Conversation {
            issues.push(FieldError::new(
                format!("{}.task_type", prefix),
                "Only the first task can be a conversation task",
            ));
        }
        let tools = &task.tools_config;
        let tools_prefix = format!("{}.tools_config", prefix);
        if let Some(agent) = &tools.llm_agent {
            issues.extend(llm_agent_issues(agent, &format!("{}.llm_agent", tools_prefix)));
        }
        if let Some(transcriber) = &tools.transcriber {
            issues.extend(transcriber_issues(
                transcriber,
                &format!("{}.transcriber", tools_prefix),
            ));
        }
        if let Some(synthesizer) = &tools.synthesizer {
            issues.extend(synthesizer_issues(
                synthesizer,
                &format!("{}.synthesizer", tools_prefix),
            ));
        }
        if let Some(api_tools) = &tools.api_tools {
            issues.extend(validate_api_tools(
                api_tools,
                &format!("{}.api_tools", tools_prefix),
            ));
        }
        issues.extend(task_config_issues(
            &task.task_config,
            &format!("{}.task_config", prefix),
        ));
    }

    into_result(issues)
}

/// Validate the values submitted by one section form
///
/// Field paths are relative to the form.
pub fn validate_patch(patch: &SectionPatch) -> Result<()> {
    let issues = match patch {
        SectionPatch::Llm(p) => llm_agent_issues(&p.llm_agent, "llm_agent"),
        SectionPatch::Transcriber(p) => transcriber_issues(&p.transcriber, "transcriber"),
        SectionPatch::Voice(p) => synthesizer_issues(&p.synthesizer, "synthesizer"),
        SectionPatch::Call(p) => task_config_issues(&p.task_config, "task_config"),
        SectionPatch::Functions(p) => p
            .api_tools
            .as_ref()
            .map(|t| validate_api_tools(t, "api_tools"))
            .unwrap_or_default(),
        SectionPatch::Analytics(p) => p
            .webhook_url
            .as_deref()
            .map(|url| check_url("webhook_url", url))
            .unwrap_or_default(),
    };
    into_result(issues)
}

fn check_url(field: &str, value: &str) -> Vec<FieldError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Vec::new(),
        _ => vec![FieldError::new(field, "Must be an http(s) URL")],
    }
}

fn required(field: String, value: &str, label: &str) -> Option<FieldError> {
    value
        .trim()
        .is_empty()
        .then(|| FieldError::new(field, format!("{} is required", label)))
}

fn llm_agent_issues(agent: &LlmAgent, prefix: &str) -> Vec<FieldError> {
    let mut issues = Vec::new();

    match agent {
        LlmAgent::MultiAgent(multi) => {
            if !multi.agent_map.contains_key(&multi.default_agent) {
                issues.push(FieldError::new(
                    format!("{}.default_agent", prefix),
                    format!("'{}' is not in agent_map", multi.default_agent),
                ));
            }
        }
        LlmAgent::OpenaiAssistant(assistant) => {
            issues.extend(required(
                format!("{}.llm_config.assistant_id", prefix),
                &assistant.llm_config.assistant_id,
                "Assistant id",
            ));
        }
        LlmAgent::GraphAgent(graph) => {
            if graph.llm_config.nodes.is_empty() {
                issues.push(FieldError::new(
                    format!("{}.llm_config.nodes", prefix),
                    "A graph agent needs at least one node",
                ));
            }
        }
        LlmAgent::SimpleLlmAgent(_) | LlmAgent::KnowledgebaseAgent(_) => {}
    }

    if let Some(selection) = agent.model_selection() {
        issues.extend(required(
            format!("{}.llm_config.provider", prefix),
            &selection.provider,
            "Provider",
        ));
        issues.extend(required(
            format!("{}.llm_config.model", prefix),
            &selection.model,
            "Model",
        ));
    }

    let (max_tokens, temperature) = agent.limits();
    if max_tokens == Some(0) {
        issues.push(FieldError::new(
            format!("{}.llm_config.max_tokens", prefix),
            "Must be at least 1",
        ));
    }
    if let Some(t) = temperature {
        if !(0.0..=2.0).contains(&t) {
            issues.push(FieldError::new(
                format!("{}.llm_config.temperature", prefix),
                format!("Must be between 0 and 2, got {}", t),
            ));
        }
    }

    if let Some(rag) = agent.rag_config() {
        issues.extend(required(
            format!("{}.llm_config.rag_config.vector_store.provider_config.vector_id", prefix),
            rag.vector_id(),
            "Knowledge base",
        ));
    }

    if let Some(routes) = agent.routes() {
        issues.extend(validate_routes(routes, &format!("{}.routes", prefix)));
    }

    issues
}

fn transcriber_issues(transcriber: &TranscriberConfig, prefix: &str) -> Vec<FieldError> {
    let mut issues = Vec::new();
    issues.extend(required(
        format!("{}.provider", prefix),
        &transcriber.provider,
        "Provider",
    ));
    issues.extend(required(format!("{}.model", prefix), &transcriber.model, "Model"));
    if transcriber.endpointing == Some(0) {
        issues.push(FieldError::new(
            format!("{}.endpointing", prefix),
            "Must be at least 1 ms",
        ));
    }
    issues
}

fn synthesizer_issues(synthesizer: &SynthesizerConfig, prefix: &str) -> Vec<FieldError> {
    let mut issues = Vec::new();
    issues.extend(required(
        format!("{}.provider_config.voice", prefix),
        synthesizer.voice.voice_name(),
        "Voice",
    ));
    issues.extend(required(
        format!("{}.provider_config.model", prefix),
        &synthesizer.to_cost_model().model,
        "Model",
    ));
    if synthesizer.buffer_size == Some(0) {
        issues.push(FieldError::new(
            format!("{}.buffer_size", prefix),
            "Must be at least 1",
        ));
    }
    issues
}

fn task_config_issues(task_config: &TaskConfig, prefix: &str) -> Vec<FieldError> {
    let mut issues = Vec::new();
    if task_config.call_terminate == Some(0) {
        issues.push(FieldError::new(
            format!("{}.call_terminate", prefix),
            "Call duration limit must be at least 1 second",
        ));
    }
    if task_config.hangup_after_silence == Some(0) {
        issues.push(FieldError::new(
            format!("{}.hangup_after_silence", prefix),
            "Must be at least 1 second",
        ));
    }
    issues
}
