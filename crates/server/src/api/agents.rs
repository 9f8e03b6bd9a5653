//! Agent CRUD and cost endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, RawQuery, State};
use axum::Json;
use uuid::Uuid;

use voice_console_core::agent::{AgentRecord, CreateAgentPayload, Selection, UpdateAgentRequest};
use voice_console_core::resources::Page;
use voice_console_core::{CostBreakdown, CostCalculator, Error as CoreError};
use voice_console_editor::validate_payload;

use super::{body, list_query, ok, ok_with_message, ApiResult};
use crate::metrics::{record_agent_save, record_save_conflict};
use crate::state::AppState;

/// GET /agent/all
pub async fn list_agents(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Page<AgentRecord>> {
    let (filter, _) = list_query(query.as_deref(), state.list_defaults())?;
    ok(state.store.list_agents(&filter))
}

/// GET /agent/:id
pub async fn get_agent(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<AgentRecord> {
    ok(state.store.agent(id)?)
}

/// POST /agent
pub async fn create_agent(
    State(state): State<AppState>,
    payload: Result<Json<CreateAgentPayload>, JsonRejection>,
) -> ApiResult<AgentRecord> {
    let payload = body(payload)?;
    validate_payload(&payload)?;
    let record = state.store.insert_agent(&payload);
    record_agent_save("create");
    ok_with_message(record, "Agent created")
}

/// PUT /agent/:id
///
/// With `version` in the body the update is rejected with `CONFLICT` when
/// the agent was saved in the meantime.
pub async fn update_agent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Result<Json<UpdateAgentRequest>, JsonRejection>,
) -> ApiResult<AgentRecord> {
    let request = body(request)?;
    validate_payload(&request.payload)?;
    match state.store.replace_agent(id, &request.payload, request.version) {
        Ok(record) => {
            record_agent_save("update");
            ok_with_message(record, "Agent updated")
        }
        Err(err @ CoreError::Conflict(_)) => {
            record_save_conflict();
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

/// DELETE /agent/:id
pub async fn delete_agent(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Uuid> {
    state.store.delete_agent(id)?;
    ok_with_message(id, "Agent deleted")
}

/// POST /agent/:id/cost
pub async fn agent_cost(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<CostBreakdown> {
    let selection = state.store.agent(id)?.payload().selection();
    ok(state.catalog.read().estimate(&selection))
}

/// POST /cost/estimate
pub async fn estimate_cost(
    State(state): State<AppState>,
    selection: Result<Json<Selection>, JsonRejection>,
) -> ApiResult<CostBreakdown> {
    let selection = body(selection)?;
    ok(state.catalog.read().estimate(&selection))
}
