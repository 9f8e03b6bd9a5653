//! Starting configuration for new agents

use serde_json::Map;

use super::llm_agent::{LlmAgent, LlmConfig, SimpleLlmAgent, DEFAULT_FLOW_TYPE};
use super::synthesizer::{ElevenLabsVoice, SynthesizerConfig, VoiceProvider};
use super::task::{Task, TaskType, Toolchain};
use super::task_config::TaskConfig;
use super::tools_config::{TelephonyIo, ToolsConfig, TranscriberConfig};
use super::{prompt_key, AgentConfig, AgentPrompts, CreateAgentPayload, TaskPrompt};

pub const DEFAULT_AGENT_NAME: &str = "My Voice Agent";
pub const DEFAULT_WELCOME_MESSAGE: &str = "Hello, how can I help you today?";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful voice assistant. Keep answers short.";

const DEFAULT_LLM_PROVIDER: &str = "openai";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Payload for a new agent: deepgram -> gpt-4o-mini -> elevenlabs over twilio
pub fn default_agent(name: &str) -> CreateAgentPayload {
    let mut llm_config = LlmConfig::new(DEFAULT_LLM_PROVIDER, DEFAULT_LLM_MODEL);
    llm_config.family = Some("openai".to_string());
    llm_config.max_tokens = Some(150);
    llm_config.temperature = Some(0.1);

    let mut transcriber = TranscriberConfig::new("deepgram", "nova-2");
    transcriber.language = Some("en".to_string());
    transcriber.encoding = Some("linear16".to_string());
    transcriber.endpointing = Some(100);
    transcriber.sampling_rate = Some(16000);

    let mut synthesizer = SynthesizerConfig::new(VoiceProvider::Elevenlabs(ElevenLabsVoice {
        voice: "Rachel".to_string(),
        voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
        model: "eleven_turbo_v2_5".to_string(),
        temperature: None,
        similarity_boost: None,
        extra: Map::new(),
    }));
    synthesizer.buffer_size = Some(250);
    synthesizer.audio_format = Some("wav".to_string());

    let tools_config = ToolsConfig {
        llm_agent: Some(LlmAgent::SimpleLlmAgent(SimpleLlmAgent {
            agent_flow_type: DEFAULT_FLOW_TYPE.to_string(),
            llm_config,
            routes: None,
            extra: Map::new(),
        })),
        transcriber: Some(transcriber),
        synthesizer: Some(synthesizer),
        input: Some(TelephonyIo::new("twilio", "wav")),
        output: Some(TelephonyIo::new("twilio", "wav")),
        api_tools: None,
        extra: Map::new(),
    };

    let mut conversation = Task::new(
        TaskType::Conversation,
        tools_config,
        Toolchain::sequential(["transcriber", "llm", "synthesizer"]),
    );
    conversation.task_config = TaskConfig::conversation_defaults();

    CreateAgentPayload {
        agent_config: AgentConfig {
            agent_name: name.to_string(),
            agent_welcome_message: Some(DEFAULT_WELCOME_MESSAGE.to_string()),
            agent_type: Some("other".to_string()),
            webhook_url: None,
            tasks: vec![conversation],
            extra: Map::new(),
        },
        agent_prompts: default_prompts(),
    }
}

/// Prompts of a new agent (conversation task only)
pub fn default_prompts() -> AgentPrompts {
    let mut prompts = AgentPrompts::new();
    prompts.insert(prompt_key(0), TaskPrompt::new(DEFAULT_SYSTEM_PROMPT));
    prompts
}

fn post_call_task(task_type: TaskType, configure: impl FnOnce(&mut LlmConfig)) -> Task {
    let mut llm_config = LlmConfig::new(DEFAULT_LLM_PROVIDER, DEFAULT_LLM_MODEL);
    configure(&mut llm_config);
    let tools_config = ToolsConfig {
        llm_agent: Some(LlmAgent::SimpleLlmAgent(SimpleLlmAgent {
            agent_flow_type: DEFAULT_FLOW_TYPE.to_string(),
            llm_config,
            routes: None,
            extra: Map::new(),
        })),
        ..Default::default()
    };
    Task::new(task_type, tools_config, Toolchain::sequential(["llm"]))
}

/// Post-call summarization task
pub fn summarization_task(details: &str) -> Task {
    post_call_task(TaskType::Summarization, |c| {
        c.summarization_details = Some(details.to_string())
    })
}

/// Post-call structured extraction task
pub fn extraction_task(details: &str) -> Task {
    post_call_task(TaskType::Extraction, |c| {
        c.extraction_details = Some(details.to_string())
    })
}
