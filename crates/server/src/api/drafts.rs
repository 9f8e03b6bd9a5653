//! Edit-session drafts
//!
//! A draft holds the in-progress configuration of one edit session on the
//! server. Section forms patch it, and saving writes the whole draft to
//! the agent with the version the draft was based on.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use voice_console_core::agent::DEFAULT_AGENT_NAME;
use voice_console_core::{CostBreakdown, CostCalculator, Error as CoreError, TaskType};
use voice_console_editor::{ConfigDraft, EditorError, Section, SectionPatch};

use super::{body, ok, ok_with_message, optional_body, ApiResult};
use crate::metrics::{record_agent_save, record_save_conflict};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateDraftRequest {
    /// Edit an existing agent; otherwise start from the default agent
    #[serde(default)]
    pub agent_id: Option<Uuid>,
    #[serde(default)]
    pub agent_name: Option<String>,
}

/// Draft plus its current cost estimate
#[derive(Debug, Serialize)]
pub struct DraftView {
    #[serde(flatten)]
    pub draft: ConfigDraft,
    pub cost: CostBreakdown,
}

fn view(state: &AppState, draft: ConfigDraft) -> DraftView {
    let cost = draft.cost(&*state.catalog.read());
    DraftView { draft, cost }
}

/// POST /drafts
///
/// An empty body opens a draft of a new default agent.
pub async fn create_draft(State(state): State<AppState>, raw: Bytes) -> ApiResult<DraftView> {
    let request: CreateDraftRequest = optional_body(&raw)?;
    let draft = match request.agent_id {
        Some(agent_id) => ConfigDraft::from_record(&state.store.agent(agent_id)?),
        None => {
            let name = request
                .agent_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(DEFAULT_AGENT_NAME);
            ConfigDraft::with_defaults(name)
        }
    };
    tracing::info!(draft_id = %draft.id, agent_id = ?draft.agent_id, "Opened draft");
    ok(view(&state, state.store.insert_draft(draft)))
}

/// GET /drafts/:id
pub async fn get_draft(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<DraftView> {
    let draft = state.store.draft(id)?;
    ok(view(&state, draft))
}

/// GET /drafts/:id/sections/:section
///
/// Current values of one section, used to seed its form.
pub async fn get_section(
    State(state): State<AppState>,
    Path((id, section)): Path<(Uuid, String)>,
) -> ApiResult<SectionPatch> {
    let section = Section::parse(&section)
        .ok_or_else(|| CoreError::NotFound(format!("unknown section '{}'", section)))?;
    let draft = state.store.draft(id)?;
    ok(section_values(&draft, section)?)
}

fn section_values(draft: &ConfigDraft, section: Section) -> Result<SectionPatch, CoreError> {
    draft.section(section).ok_or_else(|| {
        if draft.payload.agent_config.conversation_task().is_none() {
            EditorError::MissingTask(TaskType::Conversation).into()
        } else {
            CoreError::NotFound(format!("{} is not configured on this draft", section))
        }
    })
}

/// PATCH /drafts/:id
pub async fn patch_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    patch: Result<Json<SectionPatch>, JsonRejection>,
) -> ApiResult<DraftView> {
    let patch = body(patch)?;
    let draft = state.store.modify_draft(id, |draft| {
        draft.apply(&patch).map_err(CoreError::from)?;
        Ok(draft.clone())
    })?;
    tracing::debug!(draft_id = %id, section = %patch.section(), "Applied section patch");
    ok(view(&state, draft))
}

/// POST /drafts/:id/save
pub async fn save_draft(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<DraftView> {
    let mut draft = state.store.draft(id)?;
    let revision = draft.revision;
    let created = draft.agent_id.is_none();

    match draft.save(state.store.as_ref()).await {
        Ok(_) => record_agent_save(if created { "create" } else { "update" }),
        Err(EditorError::Backend(err @ CoreError::Conflict(_))) => {
            record_save_conflict();
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    }

    let draft = state.store.finish_draft_save(draft, revision)?;
    ok_with_message(view(&state, draft), "Agent saved")
}

/// DELETE /drafts/:id
pub async fn discard_draft(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Uuid> {
    state.store.remove_draft(id)?;
    ok_with_message(id, "Draft discarded")
}
