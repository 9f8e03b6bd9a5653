//! In-memory backend store
//!
//! Holds every console resource behind `parking_lot` locks. Locks are only
//! taken inside synchronous methods, so no guard ever lives across an
//! `.await` in a handler.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use voice_console_core::agent::{AgentRecord, CreateAgentPayload};
use voice_console_core::resources::{
    mask_secret, ApiKey, CreatePhoneNumberRequest, CreatedApiKey, Execution, KnowledgeBase,
    LoginRequest, Organization, Page, PhoneNumber, ProviderCredential, RecordExecutionRequest,
    SignupRequest, User, Voice,
};
use voice_console_core::{AgentGateway, CostBreakdown, Error, FieldError, ProviderCatalog, Result};
use voice_console_editor::{ConfigDraft, FilterState};

use voice_console_config::constants::auth::SESSION_TTL_HOURS;

use crate::credentials::{hash_secret, new_api_key, new_salt, new_session_token, verify_secret};

const MIN_PASSWORD_LEN: usize = 8;

struct Session {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

struct StoredUser {
    user: User,
    salt: String,
    password_hash: String,
}

struct StoredApiKey {
    key: ApiKey,
    salt: String,
    secret_hash: String,
}

#[derive(Default)]
struct Organizations {
    all: Vec<Organization>,
    active: Option<Uuid>,
}

/// All console resources
pub struct ConsoleStore {
    agents: RwLock<HashMap<Uuid, AgentRecord>>,
    drafts: RwLock<HashMap<Uuid, ConfigDraft>>,
    executions: RwLock<HashMap<Uuid, Execution>>,
    knowledge_bases: RwLock<Vec<KnowledgeBase>>,
    phone_numbers: RwLock<HashMap<Uuid, PhoneNumber>>,
    credentials: RwLock<HashMap<String, ProviderCredential>>,
    api_keys: RwLock<HashMap<Uuid, StoredApiKey>>,
    organizations: RwLock<Organizations>,
    users: RwLock<HashMap<String, StoredUser>>,
    sessions: RwLock<HashMap<String, Session>>,
    session_ttl: chrono::Duration,
    voices: Vec<Voice>,
}

impl Default for ConsoleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleStore {
    pub fn new() -> Self {
        Self::with_voices(default_voices())
    }

    pub fn with_voices(voices: Vec<Voice>) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            drafts: RwLock::new(HashMap::new()),
            executions: RwLock::new(HashMap::new()),
            knowledge_bases: RwLock::new(Vec::new()),
            phone_numbers: RwLock::new(HashMap::new()),
            credentials: RwLock::new(HashMap::new()),
            api_keys: RwLock::new(HashMap::new()),
            organizations: RwLock::new(Organizations::default()),
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            session_ttl: chrono::Duration::hours(SESSION_TTL_HOURS as i64),
            voices,
        }
    }

    /// How long a login session stays valid
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        if let Ok(ttl) = chrono::Duration::from_std(ttl) {
            self.session_ttl = ttl;
        }
        self
    }

    // ---- agents ----

    pub fn list_agents(&self, filter: &FilterState) -> Page<AgentRecord> {
        let mut agents: Vec<AgentRecord> = self
            .agents
            .read()
            .values()
            .filter(|a| {
                let id = a.id.to_string();
                filter.matches(&[a.name(), id.as_str()], None)
            })
            .cloned()
            .collect();
        agents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Page::paginate(agents, filter.page, filter.effective_page_size())
    }

    pub fn agent(&self, id: Uuid) -> Result<AgentRecord> {
        self.agents
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("agent {}", id)))
    }

    pub fn insert_agent(&self, payload: &CreateAgentPayload) -> AgentRecord {
        let now = Utc::now();
        let record = AgentRecord {
            id: Uuid::new_v4(),
            version: 1,
            agent_config: payload.agent_config.clone(),
            agent_prompts: payload.agent_prompts.clone(),
            created_at: now,
            updated_at: now,
        };
        self.agents.write().insert(record.id, record.clone());
        tracing::info!(agent_id = %record.id, name = %record.name(), "Created agent");
        record
    }

    /// Replace an agent, checking the expected version when given
    pub fn replace_agent(
        &self,
        id: Uuid,
        payload: &CreateAgentPayload,
        expected_version: Option<u64>,
    ) -> Result<AgentRecord> {
        let mut agents = self.agents.write();
        let record = agents
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("agent {}", id)))?;
        if let Some(expected) = expected_version {
            if expected != record.version {
                tracing::warn!(
                    agent_id = %id,
                    expected,
                    stored = record.version,
                    "Rejected stale agent update"
                );
                return Err(Error::Conflict(format!(
                    "agent {} was saved by someone else (your version {}, current {})",
                    id, expected, record.version
                )));
            }
        }
        record.version += 1;
        record.agent_config = payload.agent_config.clone();
        record.agent_prompts = payload.agent_prompts.clone();
        record.updated_at = Utc::now();
        tracing::info!(agent_id = %id, version = record.version, "Updated agent");
        Ok(record.clone())
    }

    /// Delete an agent and unassign its phone numbers
    pub fn delete_agent(&self, id: Uuid) -> Result<()> {
        self.agents
            .write()
            .remove(&id)
            .ok_or_else(|| Error::NotFound(format!("agent {}", id)))?;
        for number in self.phone_numbers.write().values_mut() {
            if number.agent_id == Some(id) {
                number.agent_id = None;
            }
        }
        tracing::info!(agent_id = %id, "Deleted agent");
        Ok(())
    }

    // ---- drafts ----

    pub fn insert_draft(&self, draft: ConfigDraft) -> ConfigDraft {
        self.drafts.write().insert(draft.id, draft.clone());
        draft
    }

    pub fn draft(&self, id: Uuid) -> Result<ConfigDraft> {
        self.drafts
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("draft {}", id)))
    }

    /// Mutate a draft in place under the lock
    pub fn modify_draft<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut ConfigDraft) -> Result<T>,
    ) -> Result<T> {
        let mut drafts = self.drafts.write();
        let draft = drafts
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("draft {}", id)))?;
        f(draft)
    }

    /// Write back a saved copy of a draft
    ///
    /// `revision` is the draft revision the copy was taken at; patches that
    /// landed while the copy was being saved are kept. Fails if the draft
    /// was discarded meanwhile.
    pub fn finish_draft_save(&self, saved: ConfigDraft, revision: u64) -> Result<ConfigDraft> {
        let id = saved.id;
        self.modify_draft(id, |draft| {
            draft.absorb_save(saved, revision);
            Ok(draft.clone())
        })
    }

    pub fn remove_draft(&self, id: Uuid) -> Result<()> {
        self.drafts
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("draft {}", id)))
    }

    // ---- executions ----

    /// Record a finished call against an agent
    ///
    /// `per_minute` is the agent's current cost estimate; the stored total
    /// scales it by the call duration.
    pub fn record_execution(
        &self,
        request: &RecordExecutionRequest,
        per_minute: &CostBreakdown,
    ) -> Result<Execution> {
        let status = request.status.trim();
        let mut issues = Vec::new();
        if status.is_empty() {
            issues.push(FieldError::new("status", "Status is required"));
        }
        if !request.conversation_time.is_finite() || request.conversation_time < 0.0 {
            issues.push(FieldError::new("conversation_time", "Must be zero or more seconds"));
        }
        if !issues.is_empty() {
            return Err(Error::Validation(issues));
        }
        self.agent(request.agent_id)?;

        let execution = Execution {
            id: Uuid::new_v4(),
            agent_id: request.agent_id,
            status: status.to_lowercase(),
            conversation_time: request.conversation_time,
            total_cost: per_minute.total * request.conversation_time / 60.0,
            transcript: request.transcript.clone(),
            cost_breakdown: serde_json::to_value(per_minute).ok(),
            telephony_data: request.telephony_data.clone(),
            created_at: Utc::now(),
            extra: Default::default(),
        };
        self.executions.write().insert(execution.id, execution.clone());
        Ok(execution)
    }

    pub fn list_executions(&self, agent_id: Option<Uuid>, filter: &FilterState) -> Page<Execution> {
        let mut executions: Vec<Execution> = self
            .executions
            .read()
            .values()
            .filter(|e| agent_id.map_or(true, |id| e.agent_id == id))
            .filter(|e| {
                let id = e.id.to_string();
                let transcript = e.transcript.as_deref().unwrap_or_default();
                filter.matches(&[id.as_str(), transcript], Some(&e.status))
            })
            .cloned()
            .collect();
        executions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Page::paginate(executions, filter.page, filter.effective_page_size())
    }

    pub fn execution(&self, id: Uuid) -> Result<Execution> {
        self.executions
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("execution {}", id)))
    }

    // ---- knowledge bases ----

    pub fn knowledge_bases(&self) -> Vec<KnowledgeBase> {
        self.knowledge_bases.read().clone()
    }

    /// Register an uploaded document; indexing happens elsewhere
    pub fn create_knowledge_base(&self, file_name: &str) -> Result<KnowledgeBase> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(Error::invalid("file_name", "File name is required"));
        }
        let kb = KnowledgeBase {
            rag_id: Uuid::new_v4().to_string(),
            file_name: file_name.to_string(),
            status: "processing".to_string(),
            vector_id: Some(Uuid::new_v4().to_string()),
            created_at: Utc::now(),
            extra: Default::default(),
        };
        self.knowledge_bases.write().push(kb.clone());
        Ok(kb)
    }

    pub fn delete_knowledge_base(&self, rag_id: &str) -> Result<()> {
        let mut kbs = self.knowledge_bases.write();
        let before = kbs.len();
        kbs.retain(|kb| kb.rag_id != rag_id);
        if kbs.len() == before {
            return Err(Error::NotFound(format!("knowledge base {}", rag_id)));
        }
        Ok(())
    }

    // ---- phone numbers ----

    pub fn phone_numbers(&self) -> Vec<PhoneNumber> {
        let mut numbers: Vec<_> = self.phone_numbers.read().values().cloned().collect();
        numbers.sort_by(|a, b| a.phone_number.cmp(&b.phone_number));
        numbers
    }

    pub fn create_phone_number(&self, request: &CreatePhoneNumberRequest) -> Result<PhoneNumber> {
        let number = request.phone_number.trim();
        if !number.starts_with('+') || number.len() < 8 {
            return Err(Error::invalid(
                "phone_number",
                "Use E.164 format, e.g. +14155550123",
            ));
        }
        if let Some(agent_id) = request.agent_id {
            self.agent(agent_id)?;
        }
        let mut numbers = self.phone_numbers.write();
        if numbers.values().any(|n| n.phone_number == number) {
            return Err(Error::Conflict(format!("{} is already registered", number)));
        }
        let phone = PhoneNumber {
            id: Uuid::new_v4(),
            phone_number: number.to_string(),
            telephony_provider: request.telephony_provider.clone(),
            agent_id: request.agent_id,
            created_at: Utc::now(),
        };
        numbers.insert(phone.id, phone.clone());
        Ok(phone)
    }

    pub fn assign_phone_number(&self, id: Uuid, agent_id: Option<Uuid>) -> Result<PhoneNumber> {
        if let Some(agent_id) = agent_id {
            self.agent(agent_id)?;
        }
        let mut numbers = self.phone_numbers.write();
        let phone = numbers
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("phone number {}", id)))?;
        phone.agent_id = agent_id;
        Ok(phone.clone())
    }

    pub fn delete_phone_number(&self, id: Uuid) -> Result<()> {
        self.phone_numbers
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("phone number {}", id)))
    }

    // ---- provider credentials ----

    pub fn credentials(&self) -> Vec<ProviderCredential> {
        let mut creds: Vec<_> = self
            .credentials
            .read()
            .values()
            .cloned()
            .collect();
        creds.sort_by(|a, b| a.provider_name.cmp(&b.provider_name));
        creds
    }

    /// Store (or replace) the credential of a provider
    pub fn connect_provider(&self, provider_name: &str, value: &str) -> Result<ProviderCredential> {
        let mut issues = Vec::new();
        if provider_name.trim().is_empty() {
            issues.push(FieldError::new("provider_name", "Provider is required"));
        }
        if value.trim().is_empty() {
            issues.push(FieldError::new("provider_value", "Credential is required"));
        }
        if !issues.is_empty() {
            return Err(Error::Validation(issues));
        }
        let credential = ProviderCredential {
            id: Uuid::new_v4(),
            provider_name: provider_name.trim().to_string(),
            masked_value: mask_secret(value),
            created_at: Utc::now(),
        };
        self.credentials
            .write()
            .insert(credential.provider_name.to_lowercase(), credential.clone());
        tracing::info!(provider = %credential.provider_name, "Connected provider");
        Ok(credential)
    }

    pub fn disconnect_provider(&self, provider_name: &str) -> Result<()> {
        self.credentials
            .write()
            .remove(&provider_name.to_lowercase())
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("no credential for {}", provider_name)))
    }

    /// Catalog with `connected` set from stored credentials
    pub fn with_connections(&self, catalog: &ProviderCatalog) -> ProviderCatalog {
        let mut catalog = catalog.clone();
        for credential in self.credentials.read().values() {
            catalog.set_connected(&credential.provider_name, true);
        }
        catalog
    }

    // ---- voices ----

    pub fn voices(&self, provider: Option<&str>) -> Vec<Voice> {
        self.voices
            .iter()
            .filter(|v| provider.map_or(true, |p| v.provider.eq_ignore_ascii_case(p)))
            .cloned()
            .collect()
    }

    // ---- api keys ----

    pub fn api_keys(&self) -> Vec<ApiKey> {
        let mut keys: Vec<_> = self.api_keys.read().values().map(|k| k.key.clone()).collect();
        keys.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        keys
    }

    /// Create a key; the secret is only returned here
    pub fn create_api_key(&self, name: &str) -> Result<CreatedApiKey> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid("name", "Key name is required"));
        }
        let secret = new_api_key();
        let salt = new_salt();
        let key = ApiKey {
            id: Uuid::new_v4(),
            name: name.to_string(),
            masked_key: mask_secret(&secret),
            created_at: Utc::now(),
        };
        self.api_keys.write().insert(
            key.id,
            StoredApiKey {
                key: key.clone(),
                secret_hash: hash_secret(&salt, &secret),
                salt,
            },
        );
        tracing::info!(key_id = %key.id, name = %key.name, "Created API key");
        Ok(CreatedApiKey { key, secret })
    }

    pub fn delete_api_key(&self, id: Uuid) -> Result<()> {
        self.api_keys
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("api key {}", id)))
    }

    pub fn is_valid_api_key(&self, secret: &str) -> bool {
        self.api_keys
            .read()
            .values()
            .any(|k| verify_secret(&k.salt, secret, &k.secret_hash))
    }

    // ---- organizations ----

    pub fn organizations(&self) -> Vec<Organization> {
        self.organizations.read().all.clone()
    }

    /// Create an organization; the first one becomes active
    pub fn create_organization(&self, name: &str) -> Result<Organization> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid("name", "Organization name is required"));
        }
        let mut orgs = self.organizations.write();
        let is_first = orgs.active.is_none();
        let org = Organization {
            id: Uuid::new_v4(),
            name: name.to_string(),
            is_active: is_first,
            created_at: Utc::now(),
        };
        if is_first {
            orgs.active = Some(org.id);
        }
        orgs.all.push(org.clone());
        Ok(org)
    }

    pub fn active_organization(&self) -> Result<Organization> {
        let orgs = self.organizations.read();
        orgs.active
            .and_then(|id| orgs.all.iter().find(|o| o.id == id))
            .cloned()
            .ok_or_else(|| Error::NotFound("no active organization".to_string()))
    }

    pub fn activate_organization(&self, id: Uuid) -> Result<Organization> {
        let mut orgs = self.organizations.write();
        if !orgs.all.iter().any(|o| o.id == id) {
            return Err(Error::NotFound(format!("organization {}", id)));
        }
        orgs.active = Some(id);
        let mut activated = None;
        for org in orgs.all.iter_mut() {
            org.is_active = org.id == id;
            if org.is_active {
                activated = Some(org.clone());
            }
        }
        activated.ok_or_else(|| Error::NotFound(format!("organization {}", id)))
    }

    // ---- users and sessions ----

    /// Register a user and open a session
    pub fn signup(&self, request: &SignupRequest) -> Result<(String, User)> {
        let email = request.email.trim().to_lowercase();
        let mut issues = Vec::new();
        if !email.contains('@') {
            issues.push(FieldError::new("email", "Enter a valid email address"));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            issues.push(FieldError::new(
                "password",
                format!("Must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        if !issues.is_empty() {
            return Err(Error::Validation(issues));
        }

        let organization_id = self.active_organization().ok().map(|o| o.id);
        let user = {
            let mut users = self.users.write();
            if users.contains_key(&email) {
                return Err(Error::Conflict(format!("{} is already registered", email)));
            }
            let salt = new_salt();
            let user = User {
                id: Uuid::new_v4(),
                email: email.clone(),
                name: request.name.trim().to_string(),
                organization_id,
                created_at: Utc::now(),
            };
            users.insert(
                email,
                StoredUser {
                    user: user.clone(),
                    password_hash: hash_secret(&salt, &request.password),
                    salt,
                },
            );
            user
        };
        tracing::info!(user_id = %user.id, "User signed up");
        Ok((self.open_session(user.id), user))
    }

    pub fn login(&self, request: &LoginRequest) -> Result<(String, User)> {
        let email = request.email.trim().to_lowercase();
        let user = {
            let users = self.users.read();
            users
                .get(&email)
                .filter(|u| verify_secret(&u.salt, &request.password, &u.password_hash))
                .map(|u| u.user.clone())
        };
        match user {
            Some(user) => Ok((self.open_session(user.id), user)),
            None => {
                tracing::warn!("Failed login attempt");
                Err(Error::Auth("invalid email or password".to_string()))
            }
        }
    }

    fn open_session(&self, user_id: Uuid) -> String {
        let token = new_session_token();
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        if sessions.len() < before {
            tracing::debug!(expired = before - sessions.len(), "Swept expired sessions");
        }
        sessions.insert(
            token.clone(),
            Session {
                user_id,
                expires_at: now + self.session_ttl,
            },
        );
        token
    }

    /// End a session; false if the token had none
    pub fn logout(&self, token: &str) -> bool {
        self.sessions.write().remove(token).is_some()
    }

    /// User owning an unexpired session token
    pub fn session_user(&self, token: &str) -> Option<User> {
        let user_id = self
            .sessions
            .read()
            .get(token)
            .filter(|s| s.expires_at > Utc::now())
            .map(|s| s.user_id)?;
        self.users
            .read()
            .values()
            .find(|u| u.user.id == user_id)
            .map(|u| u.user.clone())
    }
}

#[async_trait]
impl AgentGateway for ConsoleStore {
    async fn create_agent(&self, payload: &CreateAgentPayload) -> Result<AgentRecord> {
        Ok(self.insert_agent(payload))
    }

    async fn update_agent(
        &self,
        id: Uuid,
        payload: &CreateAgentPayload,
        expected_version: Option<u64>,
    ) -> Result<AgentRecord> {
        self.replace_agent(id, payload, expected_version)
    }

    async fn get_agent(&self, id: Uuid) -> Result<AgentRecord> {
        self.agent(id)
    }
}

/// Voices offered out of the box
pub fn default_voices() -> Vec<Voice> {
    let voice = |name: &str, provider: &str, voice_id: &str, model: &str, accent: &str, gender: &str| Voice {
        id: format!("{}-{}", provider, voice_id),
        name: name.to_string(),
        provider: provider.to_string(),
        voice_id: voice_id.to_string(),
        model: model.to_string(),
        accent: Some(accent.to_string()),
        gender: Some(gender.to_string()),
    };
    vec![
        voice("Rachel", "elevenlabs", "21m00Tcm4TlvDq8ikWAM", "eleven_turbo_v2_5", "american", "female"),
        voice("Adam", "elevenlabs", "pNInz6obpgDQGcFmaJgB", "eleven_turbo_v2_5", "american", "male"),
        voice("alloy", "openai", "alloy", "tts-1", "neutral", "neutral"),
        voice("Joanna", "polly", "Joanna", "generative", "american", "female"),
        voice("en-US-JennyNeural", "azuretts", "en-US-JennyNeural", "neural", "american", "female"),
        voice("Asteria", "deepgram", "aura-asteria-en", "aura-asteria-en", "american", "female"),
        voice("Barbershop Man", "cartesia", "a0e99841-438c-4a64-b679-ae501e7d6091", "sonic-english", "american", "male"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_console_core::agent::{default_agent, TranscriberConfig};
    use voice_console_editor::{SectionPatch, TranscriberPatch};

    #[test]
    fn test_replace_checks_version() {
        let store = ConsoleStore::new();
        let record = store.insert_agent(&default_agent("Support"));

        let updated = store
            .replace_agent(record.id, &record.payload(), Some(1))
            .unwrap();
        assert_eq!(updated.version, 2);

        let err = store
            .replace_agent(record.id, &record.payload(), Some(1))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // Without a version the write is unconditional.
        assert_eq!(
            store.replace_agent(record.id, &record.payload(), None).unwrap().version,
            3
        );
    }

    #[tokio::test]
    async fn test_patch_while_saving_survives_write_back() {
        let store = ConsoleStore::new();
        let draft = store.insert_draft(ConfigDraft::with_defaults("Support"));

        let mut copy = store.draft(draft.id).unwrap();
        let revision = copy.revision;
        let record = copy.save(&store).await.unwrap();

        let mut transcriber = TranscriberConfig::new("deepgram", "nova-2");
        transcriber.keywords = Some("refund".into());
        let patch = SectionPatch::Transcriber(TranscriberPatch { transcriber });
        store
            .modify_draft(draft.id, |d| d.apply(&patch).map_err(Error::from))
            .unwrap();

        let stored = store.finish_draft_save(copy, revision).unwrap();
        assert_eq!(stored.agent_id, Some(record.id));
        assert_eq!(stored.base_version, Some(record.version));
        let task = stored.payload.agent_config.conversation_task().unwrap();
        let transcriber = task.tools_config.transcriber.as_ref().unwrap();
        assert_eq!(transcriber.keywords.as_deref(), Some("refund"));
        assert!(stored.is_dirty());

        // Discarded while saving.
        store.remove_draft(draft.id).unwrap();
        assert!(matches!(
            store.finish_draft_save(stored, revision),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_list_agents_filters_and_pages() {
        let store = ConsoleStore::new();
        for i in 0..25 {
            store.insert_agent(&default_agent(&format!("Sales {}", i)));
        }
        store.insert_agent(&default_agent("Support"));

        let page = store.list_agents(&FilterState::from_query_string("search=sales&page=2"));
        assert_eq!(page.total, 25);
        assert_eq!(page.items.len(), 5);

        let page = store.list_agents(&FilterState::from_query_string("search=support"));
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_delete_agent_unassigns_numbers() {
        let store = ConsoleStore::new();
        let agent = store.insert_agent(&default_agent("Support"));
        let number = store
            .create_phone_number(&CreatePhoneNumberRequest {
                phone_number: "+14155550123".into(),
                telephony_provider: "twilio".into(),
                agent_id: Some(agent.id),
            })
            .unwrap();
        store.delete_agent(agent.id).unwrap();
        assert_eq!(store.phone_numbers()[0].agent_id, None);
        assert!(store.assign_phone_number(number.id, Some(agent.id)).is_err());
    }

    #[test]
    fn test_users_and_sessions() {
        let store = ConsoleStore::new();
        let signup = SignupRequest {
            email: "Ada@Example.com".into(),
            password: "correct horse".into(),
            name: "Ada".into(),
        };
        let (token, user) = store.signup(&signup).unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(store.session_user(&token).unwrap().id, user.id);
        assert!(matches!(store.signup(&signup), Err(Error::Conflict(_))));

        let bad = LoginRequest {
            email: "ada@example.com".into(),
            password: "wrong password".into(),
        };
        assert!(matches!(store.login(&bad), Err(Error::Auth(_))));
        let good = LoginRequest {
            email: "ada@example.com".into(),
            password: "correct horse".into(),
        };
        let (second, _) = store.login(&good).unwrap();
        assert_ne!(second, token);

        assert!(store.logout(&token));
        assert!(store.session_user(&token).is_none());
        assert!(!store.logout(&token));
        assert!(store.session_user(&second).is_some());
    }

    #[test]
    fn test_sessions_expire() {
        let store = ConsoleStore::new().with_session_ttl(Duration::ZERO);
        let signup = SignupRequest {
            email: "grace@example.com".into(),
            password: "long enough".into(),
            name: "Grace".into(),
        };
        let (token, _) = store.signup(&signup).unwrap();
        assert!(store.session_user(&token).is_none());

        // Opening another session sweeps the expired one.
        store
            .login(&LoginRequest {
                email: "grace@example.com".into(),
                password: "long enough".into(),
            })
            .unwrap();
        assert!(!store.logout(&token));
    }

    #[test]
    fn test_api_keys_are_hashed() {
        let store = ConsoleStore::new();
        let created = store.create_api_key("ci").unwrap();
        assert!(store.is_valid_api_key(&created.secret));
        assert!(!store.is_valid_api_key("vc_nope"));
        assert!(!store.api_keys()[0].masked_key.contains(&created.secret[..8]));
        store.delete_api_key(created.key.id).unwrap();
        assert!(!store.is_valid_api_key(&created.secret));
    }

    #[test]
    fn test_first_organization_is_active() {
        let store = ConsoleStore::new();
        assert!(store.active_organization().is_err());
        let first = store.create_organization("Acme").unwrap();
        let second = store.create_organization("Globex").unwrap();
        assert!(first.is_active && !second.is_active);
        store.activate_organization(second.id).unwrap();
        assert_eq!(store.active_organization().unwrap().id, second.id);
        assert_eq!(store.organizations().iter().filter(|o| o.is_active).count(), 1);
    }
}
