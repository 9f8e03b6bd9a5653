//! Owned configuration draft of one edit session
//!
//! The draft is the single source of truth while an agent is being edited.
//! Section forms read their seed values from it and merge their patches into
//! it. Saving sends the whole draft together with the version it was based
//! on; the backend rejects the write with a conflict if someone else saved
//! in between. A successful save rebases the draft on the stored record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use voice_console_core::agent::{default_agent, AgentRecord, CreateAgentPayload, Selection};
use voice_console_core::{AgentGateway, CostBreakdown, CostCalculator};

use crate::merge::apply_patch_in_place;
use crate::section::{Section, SectionPatch};
use crate::validation::{validate_patch, validate_payload};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDraft {
    /// Draft id, distinct from the agent id
    pub id: Uuid,
    /// Agent being edited; `None` until a new agent is first saved
    pub agent_id: Option<Uuid>,
    /// Version of the record the draft is based on
    pub base_version: Option<u64>,
    pub payload: CreateAgentPayload,
    /// Priced selection, kept in step with `payload`
    pub selection: Selection,
    /// Sections changed since the last save
    pub dirty: BTreeSet<Section>,
    /// Bumped by every applied patch
    #[serde(default)]
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
}

impl ConfigDraft {
    /// Draft for a new agent
    pub fn new(payload: CreateAgentPayload) -> Self {
        let selection = payload.selection();
        Self {
            id: Uuid::new_v4(),
            agent_id: None,
            base_version: None,
            payload,
            selection,
            dirty: BTreeSet::new(),
            revision: 0,
            updated_at: Utc::now(),
        }
    }

    /// Draft for a new agent with the default pipeline
    pub fn with_defaults(name: &str) -> Self {
        Self::new(default_agent(name))
    }

    /// Draft editing an existing agent
    pub fn from_record(record: &AgentRecord) -> Self {
        let mut draft = Self::new(record.payload());
        draft.agent_id = Some(record.id);
        draft.base_version = Some(record.version);
        draft
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Current values of a section
    pub fn section(&self, section: Section) -> Option<SectionPatch> {
        SectionPatch::read(section, &self.payload)
    }

    /// Validate and merge a section patch
    pub fn apply(&mut self, patch: &SectionPatch) -> Result<()> {
        validate_patch(patch)?;
        apply_patch_in_place(&mut self.payload, patch)?;
        self.selection = self.payload.selection();
        self.dirty.insert(patch.section());
        self.revision += 1;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Per-minute cost of the current selection
    pub fn cost<C: CostCalculator + ?Sized>(&self, calculator: &C) -> CostBreakdown {
        calculator.estimate(&self.selection)
    }

    /// Persist the whole draft
    ///
    /// Creates the agent on first save, otherwise updates it with the
    /// draft's base version. On success the draft is rebased on the stored
    /// record; on failure (including a version conflict) it is unchanged.
    pub async fn save<G: AgentGateway + ?Sized>(&mut self, gateway: &G) -> Result<AgentRecord> {
        validate_payload(&self.payload)?;

        let record = match self.agent_id {
            Some(id) => {
                gateway
                    .update_agent(id, &self.payload, self.base_version)
                    .await?
            }
            None => gateway.create_agent(&self.payload).await?,
        };

        tracing::info!(
            draft_id = %self.id,
            agent_id = %record.id,
            version = record.version,
            sections = ?self.dirty,
            "Saved agent draft"
        );

        self.rebase(&record);
        Ok(record)
    }

    /// Take over the result of saving a copy of this draft
    ///
    /// `revision` is the revision the copy was taken at. If no patch landed
    /// since, the saved copy replaces the draft. Otherwise the later patches
    /// stay in the payload and stay dirty; only the agent id and base
    /// version move to the stored record.
    pub fn absorb_save(&mut self, saved: ConfigDraft, revision: u64) {
        if self.revision == revision {
            *self = saved;
            return;
        }
        tracing::debug!(
            draft_id = %self.id,
            saved_at = revision,
            current = self.revision,
            "Draft changed while saving; keeping newer patches"
        );
        self.agent_id = saved.agent_id;
        self.base_version = saved.base_version;
        self.updated_at = Utc::now();
    }

    /// Replace the draft contents with a stored record
    pub fn rebase(&mut self, record: &AgentRecord) {
        self.agent_id = Some(record.id);
        self.base_version = Some(record.version);
        self.payload = record.payload();
        self.selection = self.payload.selection();
        self.dirty.clear();
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::{TranscriberPatch, VoicePatch};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use voice_console_core::agent::{
        CartesiaVoice, ModelSelection, SynthesizerConfig, TranscriberConfig, VoiceProvider,
    };
    use voice_console_core::{Error as CoreError, ProviderCatalog};

    #[derive(Default)]
    struct MemoryGateway {
        agents: Mutex<HashMap<Uuid, AgentRecord>>,
    }

    #[async_trait]
    impl AgentGateway for MemoryGateway {
        async fn create_agent(
            &self,
            payload: &CreateAgentPayload,
        ) -> voice_console_core::Result<AgentRecord> {
            let now = Utc::now();
            let record = AgentRecord {
                id: Uuid::new_v4(),
                version: 1,
                agent_config: payload.agent_config.clone(),
                agent_prompts: payload.agent_prompts.clone(),
                created_at: now,
                updated_at: now,
            };
            self.agents.lock().insert(record.id, record.clone());
            Ok(record)
        }

        async fn update_agent(
            &self,
            id: Uuid,
            payload: &CreateAgentPayload,
            expected_version: Option<u64>,
        ) -> voice_console_core::Result<AgentRecord> {
            let mut agents = self.agents.lock();
            let record = agents
                .get_mut(&id)
                .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
            if let Some(expected) = expected_version {
                if expected != record.version {
                    return Err(CoreError::Conflict(format!(
                        "expected version {}, stored {}",
                        expected, record.version
                    )));
                }
            }
            record.version += 1;
            record.agent_config = payload.agent_config.clone();
            record.agent_prompts = payload.agent_prompts.clone();
            record.updated_at = Utc::now();
            Ok(record.clone())
        }

        async fn get_agent(&self, id: Uuid) -> voice_console_core::Result<AgentRecord> {
            self.agents
                .lock()
                .get(&id)
                .cloned()
                .ok_or_else(|| CoreError::NotFound(id.to_string()))
        }
    }

    fn transcriber_patch(keywords: &str) -> SectionPatch {
        let mut transcriber = TranscriberConfig::new("deepgram", "nova-2");
        transcriber.keywords = Some(keywords.to_string());
        SectionPatch::Transcriber(TranscriberPatch { transcriber })
    }

    fn voice_patch() -> SectionPatch {
        SectionPatch::Voice(VoicePatch {
            synthesizer: SynthesizerConfig::new(VoiceProvider::Cartesia(CartesiaVoice {
                voice: "Barbershop Man".into(),
                voice_id: "a0e99841".into(),
                model: "sonic-english".into(),
                extra: Default::default(),
            })),
            welcome_message: Some("Hey!".into()),
        })
    }

    #[tokio::test]
    async fn test_create_then_update() {
        let gateway = MemoryGateway::default();
        let mut draft = ConfigDraft::with_defaults("Support");

        let created = draft.save(&gateway).await.unwrap();
        assert_eq!(draft.agent_id, Some(created.id));
        assert_eq!(draft.base_version, Some(1));

        draft.apply(&transcriber_patch("refund")).unwrap();
        assert!(draft.is_dirty());
        let updated = draft.save(&gateway).await.unwrap();
        assert_eq!(updated.version, 2);
        assert!(!draft.is_dirty());
    }

    #[tokio::test]
    async fn test_sibling_sections_share_one_draft() {
        let gateway = MemoryGateway::default();
        let record = gateway
            .create_agent(&default_agent("Support"))
            .await
            .unwrap();

        let mut draft = ConfigDraft::from_record(&record);
        draft.apply(&transcriber_patch("refund")).unwrap();
        draft.save(&gateway).await.unwrap();
        draft.apply(&voice_patch()).unwrap();
        draft.save(&gateway).await.unwrap();

        let stored = gateway.get_agent(record.id).await.unwrap();
        let tools = &stored.agent_config.tasks[0].tools_config;
        assert_eq!(
            tools.transcriber.as_ref().unwrap().keywords.as_deref(),
            Some("refund")
        );
        assert_eq!(tools.synthesizer.as_ref().unwrap().provider_id(), "cartesia");
        assert_eq!(stored.version, 3);
    }

    #[tokio::test]
    async fn test_stale_draft_conflicts() {
        let gateway = MemoryGateway::default();
        let record = gateway
            .create_agent(&default_agent("Support"))
            .await
            .unwrap();

        let mut first = ConfigDraft::from_record(&record);
        let mut second = ConfigDraft::from_record(&record);

        first.apply(&transcriber_patch("refund")).unwrap();
        first.save(&gateway).await.unwrap();

        second.apply(&voice_patch()).unwrap();
        let before = second.clone();
        let err = second.save(&gateway).await.unwrap_err();
        assert!(matches!(
            err,
            crate::EditorError::Backend(CoreError::Conflict(_))
        ));
        assert_eq!(second, before);

        let stored = gateway.get_agent(record.id).await.unwrap();
        second.rebase(&stored);
        second.apply(&voice_patch()).unwrap();
        second.save(&gateway).await.unwrap();
        let stored = gateway.get_agent(record.id).await.unwrap();
        let tools = &stored.agent_config.tasks[0].tools_config;
        assert_eq!(
            tools.transcriber.as_ref().unwrap().keywords.as_deref(),
            Some("refund")
        );
        assert_eq!(tools.synthesizer.as_ref().unwrap().provider_id(), "cartesia");
    }

    #[tokio::test]
    async fn test_patch_during_save_is_kept() {
        let gateway = MemoryGateway::default();
        let mut shared = ConfigDraft::with_defaults("Support");
        shared.apply(&voice_patch()).unwrap();

        let mut copy = shared.clone();
        let revision = copy.revision;
        let record = copy.save(&gateway).await.unwrap();

        // Lands between taking the copy and writing it back.
        shared.apply(&transcriber_patch("refund")).unwrap();
        shared.absorb_save(copy, revision);

        assert_eq!(shared.agent_id, Some(record.id));
        assert_eq!(shared.base_version, Some(record.version));
        assert!(shared.dirty.contains(&Section::Transcriber));
        let tools = &shared.payload.agent_config.tasks[0].tools_config;
        assert_eq!(
            tools.transcriber.as_ref().unwrap().keywords.as_deref(),
            Some("refund")
        );

        // The next save carries the patch with the new base version.
        let updated = shared.save(&gateway).await.unwrap();
        assert_eq!(updated.version, record.version + 1);
    }

    #[test]
    fn test_absorb_save_without_new_patches_takes_copy() {
        let mut shared = ConfigDraft::with_defaults("Support");
        shared.apply(&voice_patch()).unwrap();
        let mut copy = shared.clone();
        copy.dirty.clear();
        copy.base_version = Some(1);

        shared.absorb_save(copy.clone(), 1);
        assert_eq!(shared, copy);
    }

    #[test]
    fn test_selection_follows_patches() {
        let mut draft = ConfigDraft::with_defaults("Support");
        draft.apply(&voice_patch()).unwrap();
        assert_eq!(
            draft.selection.synthesizer,
            Some(ModelSelection::new("cartesia", "sonic-english"))
        );
        assert_eq!(draft.cost(&ProviderCatalog::default()), CostBreakdown::zero());
    }

    #[test]
    fn test_invalid_patch_leaves_draft_unchanged() {
        let mut draft = ConfigDraft::with_defaults("Support");
        let before = draft.clone();
        let transcriber = TranscriberConfig::new("", "nova-2");
        assert!(draft
            .apply(&SectionPatch::Transcriber(TranscriberPatch { transcriber }))
            .is_err());
        assert_eq!(draft, before);
    }
}
