//! Agent tasks

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::task_config::TaskConfig;
use super::tools_config::ToolsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Conversation,
    Summarization,
    Extraction,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Conversation => "conversation",
            TaskType::Summarization => "summarization",
            TaskType::Extraction => "extraction",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Execution {
    Parallel,
    #[default]
    Sequential,
}

/// Declared execution order of a task's sub-tools
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
    #[serde(default)]
    pub execution: Execution,
    #[serde(default)]
    pub pipelines: Vec<Vec<String>>,
}

impl Toolchain {
    pub fn sequential<I, S>(pipeline: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            execution: Execution::Sequential,
            pipelines: vec![pipeline.into_iter().map(Into::into).collect()],
        }
    }
}

/// One stage of an agent's behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_type: TaskType,
    #[serde(default)]
    pub tools_config: ToolsConfig,
    #[serde(default)]
    pub task_config: TaskConfig,
    #[serde(default)]
    pub toolchain: Toolchain,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn new(task_type: TaskType, tools_config: ToolsConfig, toolchain: Toolchain) -> Self {
        Self {
            task_type,
            tools_config,
            task_config: TaskConfig::default(),
            toolchain,
            extra: Map::new(),
        }
    }
}
