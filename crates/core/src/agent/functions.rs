//! Callable tools attached to a conversation task
//!
//! `tools` and `tools_params` are parallel collections keyed by function
//! name: every descriptor in `tools` has exactly one entry in `tools_params`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiTools {
    #[serde(default)]
    pub tools: Vec<ToolFunction>,
    #[serde(default)]
    pub tools_params: BTreeMap<String, ApiParams>,
}

impl ApiTools {
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty() && self.tools_params.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&ToolFunction> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }
}

/// Tool templates offered by the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    CheckAvailabilityOfSlots,
    BookAppointment,
    TransferCall,
    #[serde(rename = "custom_task")]
    Custom,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::CheckAvailabilityOfSlots,
        ToolKind::BookAppointment,
        ToolKind::TransferCall,
        ToolKind::Custom,
    ];

    /// Value stored in `ToolFunction::key`
    pub fn key(&self) -> &'static str {
        match self {
            ToolKind::CheckAvailabilityOfSlots => "check_availability_of_slots",
            ToolKind::BookAppointment => "book_appointment",
            ToolKind::TransferCall => "transfer_call",
            ToolKind::Custom => "custom_task",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }
}

/// Descriptor the LLM sees for one callable function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFunction {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Template key, see [`ToolKind::key`]
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_call_message: Option<String>,
    /// JSON schema of the function arguments
    #[serde(default)]
    pub parameters: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolFunction {
    pub fn kind(&self) -> Option<ToolKind> {
        ToolKind::from_key(&self.key)
    }
}

/// How a function call is executed against the operator's API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Request body template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
