//! Agent configuration editing
//!
//! Each configuration section (LLM, transcriber, voice, call, functions,
//! analytics) is edited through its own form. A [`ConfigDraft`] owns the
//! in-progress configuration of one edit session: every section patch is
//! merged into the draft, and saving sends the whole draft with the version
//! it was based on, so sibling sections never overwrite each other with
//! stale copies.

pub mod draft;
pub mod merge;
pub mod routes;
pub mod search;
pub mod section;
pub mod tools;
pub mod validation;

pub use draft::ConfigDraft;
pub use merge::{apply_patch, apply_patch_in_place};
pub use routes::{RouteRuleForm, RoutesEditor};
pub use search::{FilterState, SearchController};
pub use section::{
    AnalyticsPatch, CallPatch, FunctionsPatch, LlmPatch, Section, SectionPatch, TranscriberPatch,
    VoicePatch,
};
pub use tools::{tool_template, ToolBuilder};
pub use validation::{validate_patch, validate_payload};

use thiserror::Error;
use voice_console_core::agent::TaskType;
use voice_console_core::{Error as CoreError, FieldError};

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Validation failed: {}", join_issues(.0))]
    Validation(Vec<FieldError>),

    #[error("Agent has no {0} task")]
    MissingTask(TaskType),

    #[error("Unknown function: {0}")]
    UnknownTool(String),

    #[error("Function already exists: {0}")]
    DuplicateTool(String),

    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Route already exists: {0}")]
    DuplicateRoute(String),

    #[error("At most {max} utterances per route")]
    UtteranceLimit { max: usize },

    #[error("Utterance index {0} out of range")]
    UtteranceIndex(usize),

    #[error("{0} agents do not support routes")]
    RoutesUnsupported(&'static str),

    #[error(transparent)]
    Backend(#[from] CoreError),
}

fn join_issues(issues: &[FieldError]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl EditorError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        EditorError::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<EditorError> for CoreError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::Validation(issues) => CoreError::Validation(issues),
            EditorError::Backend(inner) => inner,
            EditorError::UnknownTool(_) | EditorError::UnknownRoute(_) => {
                CoreError::NotFound(err.to_string())
            }
            other => CoreError::invalid("(root)", other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;
