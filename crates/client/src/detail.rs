//! Agent detail page loading
//!
//! The detail view needs the agent plus a few secondary resources. They
//! are fetched concurrently; only the agent is mandatory.

use uuid::Uuid;

use voice_console_core::agent::AgentRecord;
use voice_console_core::resources::{KnowledgeBase, Organization};
use voice_console_core::{Error as CoreError, ErrorKind, Provider};

use crate::client::ConsoleClient;
use crate::{ClientError, Result};

/// Everything the agent detail view renders
#[derive(Debug, Clone)]
pub struct AgentDetail {
    pub agent: AgentRecord,
    pub knowledge_bases: Vec<KnowledgeBase>,
    pub organization: Option<Organization>,
    pub providers: Vec<Provider>,
}

/// Fetch an agent and its secondary resources in parallel
///
/// Secondary failures are logged and replaced by empty values. A failed
/// agent fetch is reported as `NOT_FOUND`, except authentication failures
/// which are passed through so the caller can send the user to log in.
pub async fn load_agent_detail(client: &ConsoleClient, id: Uuid) -> Result<AgentDetail> {
    let (agent, knowledge_bases, organization, providers) = tokio::join!(
        client.get_agent(id),
        client.list_knowledge_bases(),
        client.active_organization(),
        client.providers(None),
    );

    let agent = agent.map_err(|err| match err {
        ClientError::Api(inner) if inner.kind() == ErrorKind::Auth => ClientError::Api(inner),
        other => {
            tracing::error!(agent_id = %id, error = %other, "Failed to load agent");
            ClientError::Api(CoreError::NotFound(format!("agent {}: {}", id, other)))
        }
    })?;

    Ok(AgentDetail {
        agent,
        knowledge_bases: or_default(knowledge_bases, "knowledge bases", id),
        organization: or_default(organization.map(Some), "organization", id),
        providers: or_default(providers, "providers", id),
    })
}

fn or_default<T: Default>(result: Result<T>, what: &str, agent_id: Uuid) -> T {
    result.unwrap_or_else(|err| {
        tracing::warn!(agent_id = %agent_id, error = %err, "Failed to load {}; continuing without", what);
        T::default()
    })
}
