//! FAQ / route rules attached to an LLM agent

use serde::{Deserialize, Serialize};

/// Default embedding model used to score utterance similarity
pub const DEFAULT_EMBEDDING_MODEL: &str = "snowflake/snowflake-arctic-embed-m";

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

/// Route rules of an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routes {
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub routes: Vec<RouteRule>,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            embedding_model: default_embedding_model(),
            routes: Vec::new(),
        }
    }
}

impl Routes {
    pub fn find(&self, route_name: &str) -> Option<&RouteRule> {
        self.routes.iter().find(|r| r.route_name == route_name)
    }
}

/// A shortcut response triggered when the caller says something close to
/// one of the utterances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRule {
    pub route_name: String,
    #[serde(default)]
    pub utterances: Vec<String>,
    pub response: RouteResponse,
    pub score_threshold: f64,
}

/// Either one response or a list to pick from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteResponse {
    Single(String),
    Many(Vec<String>),
}

impl RouteResponse {
    /// True when there is no usable response text
    pub fn is_empty(&self) -> bool {
        match self {
            RouteResponse::Single(text) => text.trim().is_empty(),
            RouteResponse::Many(items) => {
                items.is_empty() || items.iter().any(|t| t.trim().is_empty())
            }
        }
    }
}

impl Default for RouteResponse {
    fn default() -> Self {
        RouteResponse::Single(String::new())
    }
}

impl From<&str> for RouteResponse {
    fn from(text: &str) -> Self {
        RouteResponse::Single(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shapes() {
        let single: RouteResponse = serde_json::from_str("\"We open at 9\"").unwrap();
        assert_eq!(single, RouteResponse::Single("We open at 9".into()));
        let many: RouteResponse = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(many, RouteResponse::Many(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn test_response_emptiness() {
        assert!(RouteResponse::Single("  ".into()).is_empty());
        assert!(RouteResponse::Many(vec![]).is_empty());
        assert!(RouteResponse::Many(vec!["ok".into(), "".into()]).is_empty());
        assert!(!RouteResponse::Many(vec!["ok".into()]).is_empty());
    }
}
