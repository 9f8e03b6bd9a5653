//! Conversation behaviour settings of a task

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default maximum call length in seconds
pub const DEFAULT_CALL_TERMINATE_SECS: u32 = 300;

/// Call handling settings (`task_config`)
///
/// Every field is optional on the wire; absent and `null` are the same.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hangup_after_silence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incremental_delay: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_words_for_interruption: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interruption_backoff_period: Option<u32>,
    #[serde(
        rename = "hangup_after_LLMCall",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub hangup_after_llm_call: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_cancellation_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backchanneling: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backchanneling_message_gap: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backchanneling_start_delay: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_noise: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_noise_track: Option<String>,
    /// Hard limit on call duration, seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_terminate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voicemail: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_fillers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimize_latency: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_user_online_message_after: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_user_online_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_if_user_online: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskConfig {
    /// Settings of a freshly created conversation task
    pub fn conversation_defaults() -> Self {
        Self {
            hangup_after_silence: Some(10),
            incremental_delay: Some(400),
            number_of_words_for_interruption: Some(2),
            hangup_after_llm_call: Some(false),
            backchanneling: Some(false),
            ambient_noise: Some(false),
            call_terminate: Some(DEFAULT_CALL_TERMINATE_SECS),
            voicemail: Some(false),
            optimize_latency: Some(true),
            ..Default::default()
        }
    }

    pub fn call_terminate_secs(&self) -> u32 {
        self.call_terminate.unwrap_or(DEFAULT_CALL_TERMINATE_SECS)
    }
}
