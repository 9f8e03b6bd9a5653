//! Custom function / tool builder
//!
//! Tools live in two parallel collections: the descriptors in `tools` and the
//! execution parameters in `tools_params`, keyed by function name. The
//! builder only exposes operations that change both together.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use url::Url;

use voice_console_config::constants::tools as limits;
use voice_console_core::agent::{ApiParams, ApiTools, ToolFunction, ToolKind};
use voice_console_core::FieldError;

use crate::{EditorError, Result};

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(limits::NAME_PATTERN).expect("tool name pattern is a valid regex")
});

const HTTP_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Descriptor and params for a new tool of a template
///
/// `name` defaults to the template key.
pub fn tool_template(kind: ToolKind, name: Option<&str>) -> (ToolFunction, ApiParams) {
    let name = name.unwrap_or(kind.key()).to_string();
    let (description, parameters, pre_call_message, params) = match kind {
        ToolKind::CheckAvailabilityOfSlots => (
            "Fetch the available free slots before booking an appointment",
            json!({
                "type": "object",
                "properties": {
                    "startTime": {"type": "string", "description": "ISO 8601 start of the window"},
                    "endTime": {"type": "string", "description": "ISO 8601 end of the window"}
                },
                "required": ["startTime", "endTime"]
            }),
            Some("Just a moment, let me check the available slots."),
            ApiParams {
                url: Some("https://api.cal.com/v1/slots?apiKey=%(api_key)s&eventTypeId=%(event_type_id)s&startTime=%(startTime)s&endTime=%(endTime)s".to_string()),
                method: Some("GET".to_string()),
                ..Default::default()
            },
        ),
        ToolKind::BookAppointment => (
            "Book an appointment once the caller has picked a free slot",
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Caller's full name"},
                    "email": {"type": "string", "description": "Caller's email address"},
                    "start": {"type": "string", "description": "ISO 8601 start time of the slot"},
                    "timeZone": {"type": "string", "description": "IANA time zone of the caller"}
                },
                "required": ["name", "email", "start", "timeZone"]
            }),
            Some("Give me a moment while I book that for you."),
            ApiParams {
                url: Some("https://api.cal.com/v1/bookings?apiKey=%(api_key)s".to_string()),
                method: Some("POST".to_string()),
                param: Some(json!({
                    "eventTypeId": "%(event_type_id)s",
                    "start": "%(start)s",
                    "timeZone": "%(timeZone)s",
                    "responses": {"name": "%(name)s", "email": "%(email)s"}
                })),
                ..Default::default()
            },
        ),
        ToolKind::TransferCall => (
            "Transfer the call to a human agent when the caller asks for one",
            json!({
                "type": "object",
                "properties": {
                    "call_sid": {"type": "string", "description": "Unique identifier of the ongoing call"}
                },
                "required": ["call_sid"]
            }),
            Some("Sure, let me transfer you now."),
            ApiParams {
                method: Some("POST".to_string()),
                param: Some(json!({
                    "call_transfer_number": "",
                    "call_sid": "%(call_sid)s"
                })),
                ..Default::default()
            },
        ),
        ToolKind::Custom => (
            "",
            json!({"type": "object", "properties": {}, "required": []}),
            None,
            ApiParams {
                method: Some(limits::DEFAULT_HTTP_METHOD.to_string()),
                ..Default::default()
            },
        ),
    };

    let tool = ToolFunction {
        name,
        description: description.to_string(),
        key: kind.key().to_string(),
        pre_call_message: pre_call_message.map(str::to_string),
        parameters,
        extra: Map::new(),
    };
    (tool, params)
}

/// Edits the tools of a conversation task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolBuilder {
    tools: Vec<ToolFunction>,
    params: BTreeMap<String, ApiParams>,
}

impl ToolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_api_tools(api_tools: Option<&ApiTools>) -> Self {
        match api_tools {
            Some(t) => Self {
                tools: t.tools.clone(),
                params: t.tools_params.clone(),
            },
            None => Self::default(),
        }
    }

    pub fn tools(&self) -> &[ToolFunction] {
        &self.tools
    }

    pub fn params(&self, name: &str) -> Option<&ApiParams> {
        self.params.get(name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tools.iter().position(|t| t.name == name)
    }

    /// Add a tool and its params
    pub fn add(&mut self, tool: ToolFunction, params: ApiParams) -> Result<()> {
        check_name(&tool.name)?;
        if self.position(&tool.name).is_some() {
            return Err(EditorError::DuplicateTool(tool.name));
        }
        self.params.insert(tool.name.clone(), params);
        self.tools.push(tool);
        Ok(())
    }

    /// Replace the tool named `name`; the new descriptor may rename it
    pub fn edit(&mut self, name: &str, tool: ToolFunction, params: ApiParams) -> Result<()> {
        let index = self
            .position(name)
            .ok_or_else(|| EditorError::UnknownTool(name.to_string()))?;
        check_name(&tool.name)?;
        if tool.name != name && self.position(&tool.name).is_some() {
            return Err(EditorError::DuplicateTool(tool.name));
        }
        self.params.remove(name);
        self.params.insert(tool.name.clone(), params);
        self.tools[index] = tool;
        Ok(())
    }

    /// Remove a tool and its params together
    pub fn delete(&mut self, name: &str) -> Result<(ToolFunction, Option<ApiParams>)> {
        let index = self
            .position(name)
            .ok_or_else(|| EditorError::UnknownTool(name.to_string()))?;
        let tool = self.tools.remove(index);
        let params = self.params.remove(name);
        tracing::debug!(tool = %name, "Deleted function");
        Ok((tool, params))
    }

    /// Collections to store; `None` when there are no tools
    pub fn build(&self) -> Option<ApiTools> {
        if self.tools.is_empty() && self.params.is_empty() {
            None
        } else {
            Some(ApiTools {
                tools: self.tools.clone(),
                tools_params: self.params.clone(),
            })
        }
    }
}

fn check_name(name: &str) -> Result<()> {
    match name_issue(name) {
        Some(message) => Err(EditorError::invalid("name", message)),
        None => Ok(()),
    }
}

fn name_issue(name: &str) -> Option<String> {
    if name.is_empty() {
        Some("Function name is required".to_string())
    } else if name.len() > limits::MAX_NAME_LEN {
        Some(format!("At most {} characters", limits::MAX_NAME_LEN))
    } else if !NAME_RE.is_match(name) {
        Some("Use letters, digits and underscores, not starting with a digit".to_string())
    } else {
        None
    }
}

/// Field issues of a tool set
pub fn validate_api_tools(api_tools: &ApiTools, prefix: &str) -> Vec<FieldError> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for (i, tool) in api_tools.tools.iter().enumerate() {
        let at = format!("{}.tools[{}]", prefix, i);
        if let Some(message) = name_issue(&tool.name) {
            issues.push(FieldError::new(format!("{}.name", at), message));
        }
        if !seen.insert(tool.name.as_str()) {
            issues.push(FieldError::new(
                format!("{}.name", at),
                format!("Duplicate function name '{}'", tool.name),
            ));
        }
        if !tool.parameters.is_null() && !tool.parameters.is_object() {
            issues.push(FieldError::new(
                format!("{}.parameters", at),
                "Parameters must be a JSON schema object",
            ));
        }
        if !api_tools.tools_params.contains_key(&tool.name) {
            issues.push(FieldError::new(
                format!("{}.tools_params", prefix),
                format!("Missing params for '{}'", tool.name),
            ));
        }
    }

    for (name, params) in &api_tools.tools_params {
        let at = format!("{}.tools_params.{}", prefix, name);
        if !seen.contains(name.as_str()) {
            issues.push(FieldError::new(at.clone(), "Params without a function"));
        }
        if let Some(url) = params.url.as_deref().filter(|u| !u.is_empty()) {
            if Url::parse(url).is_err() {
                issues.push(FieldError::new(format!("{}.url", at), "Invalid URL"));
            }
        }
        if let Some(method) = params.method.as_deref() {
            if !HTTP_METHODS.contains(&method.to_ascii_uppercase().as_str()) {
                issues.push(FieldError::new(
                    format!("{}.method", at),
                    format!("Unsupported HTTP method '{}'", method),
                ));
            }
        }
    }

    issues
}

/// Parameter names declared by a tool's JSON schema
pub fn parameter_names(tool: &ToolFunction) -> Vec<String> {
    tool.parameters
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default()
}
