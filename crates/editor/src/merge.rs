//! Merging section patches into a full agent payload
//!
//! A patch replaces exactly the slice its section owns (see [`crate::section`])
//! and leaves every other field of the payload untouched, including fields the
//! model only carries in `extra`.

use voice_console_core::agent::{
    extraction_task, prompt_key, summarization_task, CreateAgentPayload, LlmAgent, Task, TaskType,
};

use crate::section::{AnalyticsPatch, SectionPatch};
use crate::{EditorError, Result};

/// Merge a patch into a copy of `payload`
pub fn apply_patch(payload: &CreateAgentPayload, patch: &SectionPatch) -> Result<CreateAgentPayload> {
    let mut merged = payload.clone();
    apply_patch_in_place(&mut merged, patch)?;
    Ok(merged)
}

/// Merge a patch into `payload`
///
/// On error the payload is left unchanged.
pub fn apply_patch_in_place(payload: &mut CreateAgentPayload, patch: &SectionPatch) -> Result<()> {
    if let SectionPatch::Analytics(analytics) = patch {
        apply_analytics(payload, analytics);
        return Ok(());
    }

    let task = payload
        .agent_config
        .conversation_task_mut()
        .ok_or(EditorError::MissingTask(TaskType::Conversation))?;
    let tools = &mut task.tools_config;

    match patch {
        SectionPatch::Llm(p) => {
            tools.llm_agent = Some(p.llm_agent.clone());
            if let Some(prompt) = &p.system_prompt {
                payload.set_system_prompt(0, prompt.clone());
            }
        }
        SectionPatch::Transcriber(p) => {
            tools.transcriber = Some(p.transcriber.clone());
        }
        SectionPatch::Voice(p) => {
            tools.synthesizer = Some(p.synthesizer.clone());
            payload.agent_config.agent_welcome_message = p.welcome_message.clone();
        }
        SectionPatch::Call(p) => {
            tools.input = p.input.clone();
            tools.output = p.output.clone();
            task.task_config = p.task_config.clone();
        }
        SectionPatch::Functions(p) => {
            tools.api_tools = p.api_tools.clone().filter(|t| !t.is_empty());
        }
        SectionPatch::Analytics(_) => {}
    }

    tracing::debug!(section = %patch.section(), "Merged section patch");
    Ok(())
}

fn apply_analytics(payload: &mut CreateAgentPayload, patch: &AnalyticsPatch) {
    set_post_call_task(payload, TaskType::Summarization, patch.summarization.as_deref());
    set_post_call_task(payload, TaskType::Extraction, patch.extraction.as_deref());
    payload.agent_config.webhook_url = patch.webhook_url.clone();
}

fn set_post_call_task(payload: &mut CreateAgentPayload, task_type: TaskType, details: Option<&str>) {
    let index = payload.agent_config.task_index(task_type);
    match (index, details) {
        (Some(i), Some(details)) => {
            let task = &mut payload.agent_config.tasks[i];
            if !set_details(task, task_type, details) {
                // Not a simple agent: replace the llm agent, keep the rest of the task
                let fresh = new_post_call_task(task_type, details);
                task.tools_config.llm_agent = fresh.tools_config.llm_agent;
            }
        }
        (None, Some(details)) => {
            payload
                .agent_config
                .tasks
                .push(new_post_call_task(task_type, details));
        }
        (Some(i), None) => remove_task(payload, i),
        (None, None) => {}
    }
}

fn new_post_call_task(task_type: TaskType, details: &str) -> Task {
    match task_type {
        TaskType::Extraction => extraction_task(details),
        _ => summarization_task(details),
    }
}

fn set_details(task: &mut Task, task_type: TaskType, details: &str) -> bool {
    match task.tools_config.llm_agent.as_mut() {
        Some(LlmAgent::SimpleLlmAgent(agent)) => {
            let slot = match task_type {
                TaskType::Extraction => &mut agent.llm_config.extraction_details,
                _ => &mut agent.llm_config.summarization_details,
            };
            *slot = Some(details.to_string());
            true
        }
        _ => false,
    }
}

/// Remove a task and shift the prompts of later tasks down by one
fn remove_task(payload: &mut CreateAgentPayload, index: usize) {
    let count = payload.agent_config.tasks.len();
    payload.agent_config.tasks.remove(index);
    payload.agent_prompts.remove(&prompt_key(index));
    for i in (index + 1)..count {
        if let Some(prompt) = payload.agent_prompts.remove(&prompt_key(i)) {
            payload.agent_prompts.insert(prompt_key(i - 1), prompt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::{CallPatch, FunctionsPatch, LlmPatch, TranscriberPatch, VoicePatch};
    use serde_json::{json, Value};
    use voice_console_core::agent::{
        default_agent, ApiTools, OpenAiVoice, SynthesizerConfig, TaskPrompt, VoiceProvider,
    };

    fn payload_json(payload: &CreateAgentPayload) -> Value {
        serde_json::to_value(payload).unwrap()
    }

    /// Everything except the listed tools_config keys of task 0
    fn without(mut value: Value, keys: &[&str]) -> Value {
        let tools = value["agent_config"]["tasks"][0]["tools_config"]
            .as_object_mut()
            .unwrap();
        for key in keys {
            tools.remove(*key);
        }
        value
    }

    #[test]
    fn test_transcriber_keywords_leave_siblings_untouched() {
        let mut before = payload_json(&default_agent("Support"));
        before["agent_config"]["tasks"][0]["tools_config"]["custom_stage"] = json!({"k": 1});
        let payload: CreateAgentPayload = serde_json::from_value(before.clone()).unwrap();

        let mut transcriber = payload.agent_config.tasks[0]
            .tools_config
            .transcriber
            .clone()
            .unwrap();
        transcriber.keywords = Some("refund,invoice".to_string());
        let merged = apply_patch(
            &payload,
            &SectionPatch::Transcriber(TranscriberPatch { transcriber }),
        )
        .unwrap();

        let after = payload_json(&merged);
        assert_eq!(
            after["agent_config"]["tasks"][0]["tools_config"]["transcriber"]["keywords"],
            "refund,invoice"
        );
        assert_eq!(without(after, &["transcriber"]), without(before, &["transcriber"]));
    }

    #[test]
    fn test_voice_patch_sets_welcome_message() {
        let payload = default_agent("Support");
        let synthesizer = SynthesizerConfig::new(VoiceProvider::Openai(OpenAiVoice {
            voice: "alloy".into(),
            model: "tts-1".into(),
            extra: Default::default(),
        }));
        let merged = apply_patch(
            &payload,
            &SectionPatch::Voice(VoicePatch {
                synthesizer,
                welcome_message: Some("Hi there".into()),
            }),
        )
        .unwrap();
        assert_eq!(merged.agent_config.agent_welcome_message.as_deref(), Some("Hi there"));
        assert_eq!(
            merged.agent_config.tasks[0].tools_config.synthesizer.as_ref().unwrap().provider_id(),
            "openai"
        );
        assert_eq!(
            without(payload_json(&merged), &["synthesizer"])["agent_config"]["tasks"],
            without(payload_json(&payload), &["synthesizer"])["agent_config"]["tasks"]
        );
    }

    #[test]
    fn test_llm_patch_updates_prompt_only_when_given() {
        let payload = default_agent("Support");
        let merged = apply_patch(
            &payload,
            &SectionPatch::Llm(LlmPatch {
                llm_agent: LlmAgent::simple("groq", "llama-3.1-8b-instant"),
                system_prompt: None,
            }),
        )
        .unwrap();
        assert_eq!(merged.agent_prompts, payload.agent_prompts);

        let merged = apply_patch(
            &merged,
            &SectionPatch::Llm(LlmPatch {
                llm_agent: LlmAgent::simple("groq", "llama-3.1-8b-instant"),
                system_prompt: Some("Be brief".into()),
            }),
        )
        .unwrap();
        assert_eq!(merged.system_prompt(0), Some("Be brief"));
    }

    #[test]
    fn test_call_patch_replaces_task_config() {
        let payload = default_agent("Support");
        let mut task_config = payload.agent_config.tasks[0].task_config.clone();
        task_config.call_terminate = Some(600);
        let merged = apply_patch(
            &payload,
            &SectionPatch::Call(CallPatch {
                input: payload.agent_config.tasks[0].tools_config.input.clone(),
                output: payload.agent_config.tasks[0].tools_config.output.clone(),
                task_config,
            }),
        )
        .unwrap();
        assert_eq!(merged.agent_config.tasks[0].task_config.call_terminate, Some(600));
        assert_eq!(
            merged.agent_config.tasks[0].tools_config,
            payload.agent_config.tasks[0].tools_config
        );
    }

    #[test]
    fn test_empty_functions_clear_api_tools() {
        let payload = default_agent("Support");
        let merged = apply_patch(
            &payload,
            &SectionPatch::Functions(FunctionsPatch {
                api_tools: Some(ApiTools::default()),
            }),
        )
        .unwrap();
        assert!(merged.agent_config.tasks[0].tools_config.api_tools.is_none());
    }

    #[test]
    fn test_analytics_adds_updates_and_removes_tasks() {
        let payload = default_agent("Support");
        let patch = SectionPatch::Analytics(AnalyticsPatch {
            summarization: Some("Summarize".into()),
            extraction: Some("Extract name".into()),
            webhook_url: Some("https://hooks.example.com".into()),
        });
        let mut merged = apply_patch(&payload, &patch).unwrap();
        assert_eq!(merged.agent_config.tasks.len(), 3);
        assert_eq!(merged.agent_config.tasks[1].task_type, TaskType::Summarization);
        assert_eq!(merged.agent_config.tasks[2].task_type, TaskType::Extraction);
        assert_eq!(merged.agent_config.tasks[0], payload.agent_config.tasks[0]);

        merged
            .agent_prompts
            .insert(prompt_key(2), TaskPrompt::new("extraction prompt"));

        let merged = apply_patch(
            &merged,
            &SectionPatch::Analytics(AnalyticsPatch {
                summarization: None,
                extraction: Some("Extract email".into()),
                webhook_url: None,
            }),
        )
        .unwrap();
        assert_eq!(merged.agent_config.tasks.len(), 2);
        assert_eq!(merged.agent_config.tasks[1].task_type, TaskType::Extraction);
        assert_eq!(merged.system_prompt(1), Some("extraction prompt"));
        assert!(merged.agent_config.webhook_url.is_none());
        match &merged.agent_config.tasks[1].tools_config.llm_agent {
            Some(LlmAgent::SimpleLlmAgent(a)) => {
                assert_eq!(a.llm_config.extraction_details.as_deref(), Some("Extract email"))
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_conversation_task() {
        let mut payload = default_agent("Support");
        payload.agent_config.tasks.clear();
        let err = apply_patch(
            &payload,
            &SectionPatch::Functions(FunctionsPatch { api_tools: None }),
        )
        .unwrap_err();
        assert!(matches!(err, EditorError::MissingTask(TaskType::Conversation)));
    }
}
