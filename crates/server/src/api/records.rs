//! Executions, knowledge bases and phone numbers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, RawQuery, State};
use axum::Json;
use uuid::Uuid;

use voice_console_core::resources::{
    AssignPhoneNumberRequest, CreateKnowledgeBaseRequest, CreatePhoneNumberRequest, Execution,
    KnowledgeBase, Page, PhoneNumber, RecordExecutionRequest,
};
use voice_console_core::CostCalculator;

use super::{body, list_query, ok, ok_with_message, ApiResult};
use crate::state::AppState;

/// GET /execution/all
///
/// Accepts the list filters plus `agent_id`.
pub async fn list_executions(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Page<Execution>> {
    let (filter, agent_id) = list_query(query.as_deref(), state.list_defaults())?;
    ok(state.store.list_executions(agent_id, &filter))
}

/// GET /execution/:id
pub async fn get_execution(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Execution> {
    ok(state.store.execution(id)?)
}

/// POST /execution
///
/// Called when a call ends. The cost is priced from the agent's current
/// selection.
pub async fn record_execution(
    State(state): State<AppState>,
    request: Result<Json<RecordExecutionRequest>, JsonRejection>,
) -> ApiResult<Execution> {
    let request = body(request)?;
    let selection = state.store.agent(request.agent_id)?.payload().selection();
    let per_minute = state.catalog.read().estimate(&selection);
    let execution = state.store.record_execution(&request, &per_minute)?;
    tracing::info!(
        execution_id = %execution.id,
        agent_id = %execution.agent_id,
        status = %execution.status,
        "Execution recorded"
    );
    ok(execution)
}

/// GET /knowledge-base/all
pub async fn list_knowledge_bases(State(state): State<AppState>) -> ApiResult<Vec<KnowledgeBase>> {
    ok(state.store.knowledge_bases())
}

/// POST /knowledge-base
pub async fn create_knowledge_base(
    State(state): State<AppState>,
    request: Result<Json<CreateKnowledgeBaseRequest>, JsonRejection>,
) -> ApiResult<KnowledgeBase> {
    let request = body(request)?;
    let kb = state.store.create_knowledge_base(&request.file_name)?;
    tracing::info!(rag_id = %kb.rag_id, file = %kb.file_name, "Knowledge base registered");
    ok_with_message(kb, "Knowledge base is processing")
}

/// DELETE /knowledge-base/:rag_id
pub async fn delete_knowledge_base(
    State(state): State<AppState>,
    Path(rag_id): Path<String>,
) -> ApiResult<String> {
    state.store.delete_knowledge_base(&rag_id)?;
    ok_with_message(rag_id, "Knowledge base deleted")
}

/// GET /phone-numbers/all
pub async fn list_phone_numbers(State(state): State<AppState>) -> ApiResult<Vec<PhoneNumber>> {
    ok(state.store.phone_numbers())
}

/// POST /phone-numbers
pub async fn create_phone_number(
    State(state): State<AppState>,
    request: Result<Json<CreatePhoneNumberRequest>, JsonRejection>,
) -> ApiResult<PhoneNumber> {
    let request = body(request)?;
    ok_with_message(state.store.create_phone_number(&request)?, "Phone number added")
}

/// PUT /phone-numbers/:id/agent
///
/// A null `agent_id` detaches the number.
pub async fn assign_phone_number(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Result<Json<AssignPhoneNumberRequest>, JsonRejection>,
) -> ApiResult<PhoneNumber> {
    let request = body(request)?;
    ok(state.store.assign_phone_number(id, request.agent_id)?)
}

/// DELETE /phone-numbers/:id
pub async fn delete_phone_number(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Uuid> {
    state.store.delete_phone_number(id)?;
    ok_with_message(id, "Phone number deleted")
}
