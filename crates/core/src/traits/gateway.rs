//! Agent persistence interface

use async_trait::async_trait;
use uuid::Uuid;

use crate::agent::{AgentRecord, CreateAgentPayload};
use crate::Result;

/// Backend operations an edit session needs to load and save an agent
///
/// Implementations:
/// - `ConsoleClient` - REST client against a remote backend
/// - in-memory stores in tests
///
/// # Example
///
/// ```ignore
/// let record = gateway.get_agent(id).await?;
/// let saved = gateway
///     .update_agent(id, &payload, Some(record.version))
///     .await?;
/// ```
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Create a new agent
    async fn create_agent(&self, payload: &CreateAgentPayload) -> Result<AgentRecord>;

    /// Replace an agent's configuration
    ///
    /// With `expected_version` set, the write is rejected with
    /// `Error::Conflict` when the stored version differs. Without it the
    /// write is unconditional.
    async fn update_agent(
        &self,
        id: Uuid,
        payload: &CreateAgentPayload,
        expected_version: Option<u64>,
    ) -> Result<AgentRecord>;

    /// Fetch one agent
    async fn get_agent(&self, id: Uuid) -> Result<AgentRecord>;
}
