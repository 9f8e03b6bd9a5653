//! Section forms and the slices of the configuration they own
//!
//! | section     | owned slice                                                   |
//! |-------------|---------------------------------------------------------------|
//! | llm         | conversation `tools_config.llm_agent`, `agent_prompts.task_1` |
//! | transcriber | conversation `tools_config.transcriber`                       |
//! | voice       | conversation `tools_config.synthesizer`, welcome message      |
//! | call        | conversation `input`, `output`, `task_config`                 |
//! | functions   | conversation `tools_config.api_tools`                         |
//! | analytics   | summarization/extraction tasks, `webhook_url`                 |

use serde::{Deserialize, Serialize};
use std::fmt;

use voice_console_core::agent::{
    ApiTools, CreateAgentPayload, LlmAgent, LlmConfig, SynthesizerConfig, TaskConfig, TaskType,
    TelephonyIo, TranscriberConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Llm,
    Transcriber,
    Voice,
    Call,
    Functions,
    Analytics,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Llm,
        Section::Transcriber,
        Section::Voice,
        Section::Call,
        Section::Functions,
        Section::Analytics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Llm => "llm",
            Section::Transcriber => "transcriber",
            Section::Voice => "voice",
            Section::Call => "call",
            Section::Functions => "functions",
            Section::Analytics => "analytics",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submitted values of one section form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum SectionPatch {
    Llm(LlmPatch),
    Transcriber(TranscriberPatch),
    Voice(VoicePatch),
    Call(CallPatch),
    Functions(FunctionsPatch),
    Analytics(AnalyticsPatch),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmPatch {
    pub llm_agent: LlmAgent,
    /// Conversation system prompt; `None` leaves the prompt unchanged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriberPatch {
    pub transcriber: TranscriberConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicePatch {
    pub synthesizer: SynthesizerConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<TelephonyIo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<TelephonyIo>,
    #[serde(default)]
    pub task_config: TaskConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionsPatch {
    /// `None` (or empty) removes all tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_tools: Option<ApiTools>,
}

/// Post-call analytics; a `None` task setting removes that task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl SectionPatch {
    pub fn section(&self) -> Section {
        match self {
            SectionPatch::Llm(_) => Section::Llm,
            SectionPatch::Transcriber(_) => Section::Transcriber,
            SectionPatch::Voice(_) => Section::Voice,
            SectionPatch::Call(_) => Section::Call,
            SectionPatch::Functions(_) => Section::Functions,
            SectionPatch::Analytics(_) => Section::Analytics,
        }
    }

    /// Current values of a section, used to seed its form
    ///
    /// `None` when the slice the section needs is not configured yet.
    pub fn read(section: Section, payload: &CreateAgentPayload) -> Option<SectionPatch> {
        let config = &payload.agent_config;
        let tools = config.conversation_task().map(|t| &t.tools_config);
        match section {
            Section::Llm => tools.and_then(|t| t.llm_agent.clone()).map(|llm_agent| {
                SectionPatch::Llm(LlmPatch {
                    llm_agent,
                    system_prompt: payload.system_prompt(0).map(str::to_string),
                })
            }),
            Section::Transcriber => tools
                .and_then(|t| t.transcriber.clone())
                .map(|transcriber| SectionPatch::Transcriber(TranscriberPatch { transcriber })),
            Section::Voice => tools.and_then(|t| t.synthesizer.clone()).map(|synthesizer| {
                SectionPatch::Voice(VoicePatch {
                    synthesizer,
                    welcome_message: config.agent_welcome_message.clone(),
                })
            }),
            Section::Call => config.conversation_task().map(|task| {
                SectionPatch::Call(CallPatch {
                    input: task.tools_config.input.clone(),
                    output: task.tools_config.output.clone(),
                    task_config: task.task_config.clone(),
                })
            }),
            Section::Functions => tools.map(|t| {
                SectionPatch::Functions(FunctionsPatch {
                    api_tools: t.api_tools.clone(),
                })
            }),
            Section::Analytics => Some(SectionPatch::Analytics(AnalyticsPatch {
                summarization: post_call_details(payload, TaskType::Summarization),
                extraction: post_call_details(payload, TaskType::Extraction),
                webhook_url: config.webhook_url.clone(),
            })),
        }
    }
}

fn post_call_details(payload: &CreateAgentPayload, task_type: TaskType) -> Option<String> {
    let task = payload.agent_config.task_by_type(task_type)?;
    let details = |c: &LlmConfig| match task_type {
        TaskType::Summarization => c.summarization_details.clone(),
        TaskType::Extraction => c.extraction_details.clone(),
        TaskType::Conversation => None,
    };
    match task.tools_config.llm_agent.as_ref() {
        Some(LlmAgent::SimpleLlmAgent(agent)) => Some(details(&agent.llm_config).unwrap_or_default()),
        _ => Some(String::new()),
    }
}
