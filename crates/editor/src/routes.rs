//! FAQ / route rule editor
//!
//! A route answers directly when the caller says something close enough to
//! one of its utterances. Rules hold 1 to 20 utterances and a similarity
//! threshold in `[0.7, 1.0]`; route names are unique within an agent.

use std::collections::HashSet;

use voice_console_config::constants::routes as limits;
use voice_console_core::agent::{LlmAgent, RouteResponse, RouteRule, Routes, DEFAULT_EMBEDDING_MODEL};
use voice_console_core::FieldError;

use crate::{EditorError, Result};

/// Editable state of one rule
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRuleForm {
    pub route_name: String,
    pub response: RouteResponse,
    pub score_threshold: f64,
    pub utterances: Vec<String>,
}

impl RouteRuleForm {
    pub fn new(route_name: impl Into<String>) -> Self {
        Self {
            route_name: route_name.into(),
            response: RouteResponse::default(),
            score_threshold: limits::DEFAULT_SCORE_THRESHOLD,
            utterances: Vec::new(),
        }
    }

    pub fn from_rule(rule: &RouteRule) -> Self {
        Self {
            route_name: rule.route_name.clone(),
            response: rule.response.clone(),
            score_threshold: rule.score_threshold,
            utterances: rule.utterances.clone(),
        }
    }

    pub fn add_utterance(&mut self, text: impl Into<String>) -> Result<()> {
        if self.utterances.len() >= limits::MAX_UTTERANCES {
            return Err(EditorError::UtteranceLimit {
                max: limits::MAX_UTTERANCES,
            });
        }
        self.utterances.push(text.into());
        Ok(())
    }

    pub fn edit_utterance(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        let slot = self
            .utterances
            .get_mut(index)
            .ok_or(EditorError::UtteranceIndex(index))?;
        *slot = text.into();
        Ok(())
    }

    pub fn remove_utterance(&mut self, index: usize) -> Result<String> {
        if index >= self.utterances.len() {
            return Err(EditorError::UtteranceIndex(index));
        }
        Ok(self.utterances.remove(index))
    }

    /// Validate and produce the rule
    pub fn build(&self) -> Result<RouteRule> {
        let rule = RouteRule {
            route_name: self.route_name.trim().to_string(),
            utterances: self.utterances.iter().map(|u| u.trim().to_string()).collect(),
            response: self.response.clone(),
            score_threshold: self.score_threshold,
        };
        let issues = validate_rule(&rule, "");
        if issues.is_empty() {
            Ok(rule)
        } else {
            Err(EditorError::Validation(issues))
        }
    }
}

fn field(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Field issues of one rule; `prefix` is prepended to field paths
pub fn validate_rule(rule: &RouteRule, prefix: &str) -> Vec<FieldError> {
    let mut issues = Vec::new();

    if rule.route_name.trim().is_empty() {
        issues.push(FieldError::new(field(prefix, "route_name"), "Route name is required"));
    }

    let threshold = rule.score_threshold;
    if !(limits::MIN_SCORE_THRESHOLD..=limits::MAX_SCORE_THRESHOLD).contains(&threshold) {
        issues.push(FieldError::new(
            field(prefix, "score_threshold"),
            format!(
                "Must be between {} and {}, got {}",
                limits::MIN_SCORE_THRESHOLD,
                limits::MAX_SCORE_THRESHOLD,
                threshold
            ),
        ));
    }

    let count = rule.utterances.len();
    if count < limits::MIN_UTTERANCES {
        issues.push(FieldError::new(
            field(prefix, "utterances"),
            "At least one utterance is required",
        ));
    } else if count > limits::MAX_UTTERANCES {
        issues.push(FieldError::new(
            field(prefix, "utterances"),
            format!("At most {} utterances, got {}", limits::MAX_UTTERANCES, count),
        ));
    }
    for (i, utterance) in rule.utterances.iter().enumerate() {
        if utterance.trim().is_empty() {
            issues.push(FieldError::new(
                field(prefix, &format!("utterances[{}]", i)),
                "Utterance must not be empty",
            ));
        }
    }

    if rule.response.is_empty() {
        issues.push(FieldError::new(
            field(prefix, "response"),
            "Response must be a non-empty text or a list of non-empty texts",
        ));
    }

    issues
}

/// Field issues of a rule set, including duplicate names
pub fn validate_routes(routes: &Routes, prefix: &str) -> Vec<FieldError> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    for (i, rule) in routes.routes.iter().enumerate() {
        let rule_prefix = field(prefix, &format!("routes[{}]", i));
        issues.extend(validate_rule(rule, &rule_prefix));
        let name = rule.route_name.trim();
        if !name.is_empty() && !seen.insert(name) {
            issues.push(FieldError::new(
                field(&rule_prefix, "route_name"),
                format!("Duplicate route name '{}'", name),
            ));
        }
    }
    issues
}

/// All route rules of an agent
#[derive(Debug, Clone, PartialEq)]
pub struct RoutesEditor {
    pub embedding_model: String,
    rules: Vec<RouteRule>,
}

impl Default for RoutesEditor {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            rules: Vec::new(),
        }
    }
}

impl RoutesEditor {
    pub fn from_agent(agent: &LlmAgent) -> Self {
        match agent.routes() {
            Some(routes) => Self {
                embedding_model: routes.embedding_model.clone(),
                rules: routes.routes.clone(),
            },
            None => Self::default(),
        }
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn add(&mut self, form: &RouteRuleForm) -> Result<()> {
        let rule = form.build()?;
        if self.rules.iter().any(|r| r.route_name == rule.route_name) {
            return Err(EditorError::DuplicateRoute(rule.route_name));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Replace the rule named `route_name`; the form may rename it
    pub fn update(&mut self, route_name: &str, form: &RouteRuleForm) -> Result<()> {
        let index = self
            .rules
            .iter()
            .position(|r| r.route_name == route_name)
            .ok_or_else(|| EditorError::UnknownRoute(route_name.to_string()))?;
        let rule = form.build()?;
        let clash = self
            .rules
            .iter()
            .enumerate()
            .any(|(i, r)| i != index && r.route_name == rule.route_name);
        if clash {
            return Err(EditorError::DuplicateRoute(rule.route_name));
        }
        self.rules[index] = rule;
        Ok(())
    }

    pub fn remove(&mut self, route_name: &str) -> Result<RouteRule> {
        let index = self
            .rules
            .iter()
            .position(|r| r.route_name == route_name)
            .ok_or_else(|| EditorError::UnknownRoute(route_name.to_string()))?;
        Ok(self.rules.remove(index))
    }

    /// Rule set to store; `None` when there are no rules
    pub fn build(&self) -> Option<Routes> {
        if self.rules.is_empty() {
            None
        } else {
            Some(Routes {
                embedding_model: self.embedding_model.clone(),
                routes: self.rules.clone(),
            })
        }
    }

    /// Store the rules on an agent
    pub fn apply_to(&self, agent: &mut LlmAgent) -> Result<()> {
        let routes = self.build();
        if routes.is_none() && agent.routes().is_none() {
            return Ok(());
        }
        if agent.set_routes(routes) {
            Ok(())
        } else {
            Err(EditorError::RoutesUnsupported(agent.agent_type()))
        }
    }
}
