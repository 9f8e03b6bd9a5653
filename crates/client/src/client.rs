//! REST client
//!
//! Thin typed wrapper over the backend's REST surface. Every response is
//! unwrapped from the `{success, data, message, error}` envelope and
//! failures are classified into the console's error taxonomy. No request
//! is retried.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use voice_console_config::BackendConfig;
use voice_console_core::agent::{AgentRecord, CreateAgentPayload, Selection, UpdateAgentRequest};
use voice_console_core::resources::{
    ApiKey, AssignPhoneNumberRequest, AuthSession, ConnectProviderRequest, CreateApiKeyRequest,
    CreateKnowledgeBaseRequest, CreateOrganizationRequest, CreatePhoneNumberRequest,
    CreatedApiKey, Execution, KnowledgeBase, LoginRequest, Organization, Page, PhoneNumber,
    ProviderCredential, RecordExecutionRequest, SignupRequest, User, Voice,
};
use voice_console_core::{
    AgentGateway, ApiResponse, CostBreakdown, Error as CoreError, ErrorKind, Provider,
    ProviderCategory,
};
use voice_console_editor::FilterState;

use crate::{ClientError, Result};

/// Whether a request carries the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Public,
    Bearer,
}

/// REST client for the voice agent backend
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ConsoleClient {
    http: Client,
    base_url: Url,
    ws_url: String,
    access_token: Option<String>,
}

impl ConsoleClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            ws_url: config.ws_url.clone(),
            access_token: config.access_token.clone(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.access_token = token;
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Chat channel URL for an agent on the configured realtime host
    pub fn chat_url(&self, agent_id: Uuid, user_id: &str, org_id: &str) -> Result<Url> {
        crate::chat::chat_url(&self.ws_url, agent_id, user_id, org_id)
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn headers(&self, auth: Auth) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        // Without a token the header is left out and the server decides.
        if let (Auth::Bearer, Some(token)) = (auth, self.access_token.as_deref()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ClientError::Configuration(format!("Invalid access token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn request(&self, method: Method, url: Url, auth: Auth) -> Result<RequestBuilder> {
        Ok(self.http.request(method, url).headers(self.headers(auth)?))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let (status, envelope) = self.exchange::<T>(request).await?;
        Ok(envelope.into_result(status)?)
    }

    async fn send_unit(&self, request: RequestBuilder) -> Result<()> {
        let (status, envelope) = self.exchange::<serde_json::Value>(request).await?;
        Ok(envelope.into_unit(status)?)
    }

    async fn exchange<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<(u16, ApiResponse<T>)> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        match serde_json::from_slice::<ApiResponse<T>>(&body) {
            Ok(envelope) => Ok((status, envelope)),
            Err(e) if (200..300).contains(&status) => {
                Err(ClientError::InvalidResponse(format!("malformed envelope: {}", e)))
            }
            Err(_) => {
                let text = String::from_utf8_lossy(&body);
                let message = if text.trim().is_empty() {
                    format!("request failed with status {}", status)
                } else {
                    text.into_owned()
                };
                tracing::debug!(status, "Non-envelope error response");
                Err(CoreError::from_kind(ErrorKind::from_status(status), message, Vec::new()).into())
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.send(self.request(Method::GET, url, Auth::Bearer)?).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
        auth: Auth,
    ) -> Result<T> {
        self.send(self.request(Method::POST, url, auth)?.json(body)).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, url: Url, body: &B) -> Result<T> {
        self.send(self.request(Method::PUT, url, Auth::Bearer)?.json(body)).await
    }

    async fn delete(&self, url: Url) -> Result<()> {
        self.send_unit(self.request(Method::DELETE, url, Auth::Bearer)?).await
    }

    fn list_url(&self, path: &str, filter: &FilterState) -> Result<Url> {
        let mut url = self.url(path)?;
        let query = filter.to_query_string();
        if !query.is_empty() {
            url.set_query(Some(&query));
        }
        Ok(url)
    }

    // ---- users ----

    /// Log in and keep the issued token for later requests
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthSession> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let session: AuthSession = self.post(self.url("user/login")?, &body, Auth::Public).await?;
        self.access_token = Some(session.access_token.clone());
        tracing::info!(user = %session.user.email, "Logged in");
        Ok(session)
    }

    pub async fn signup(&mut self, request: &SignupRequest) -> Result<AuthSession> {
        let session: AuthSession = self.post(self.url("user/signup")?, request, Auth::Public).await?;
        self.access_token = Some(session.access_token.clone());
        Ok(session)
    }

    pub async fn me(&self) -> Result<User> {
        self.get(self.url("user/me")?).await
    }

    /// End the session on the server and forget the token
    pub async fn logout(&mut self) -> Result<()> {
        let _: Uuid = self.post(self.url("user/logout")?, &(), Auth::Bearer).await?;
        self.access_token = None;
        Ok(())
    }

    // ---- agents ----

    pub async fn list_agents(&self, filter: &FilterState) -> Result<Page<AgentRecord>> {
        self.get(self.list_url("agent/all", filter)?).await
    }

    pub async fn get_agent(&self, id: Uuid) -> Result<AgentRecord> {
        self.get(self.url(&format!("agent/{}", id))?).await
    }

    pub async fn create_agent(&self, payload: &CreateAgentPayload) -> Result<AgentRecord> {
        self.post(self.url("agent")?, payload, Auth::Bearer).await
    }

    pub async fn update_agent(
        &self,
        id: Uuid,
        payload: &CreateAgentPayload,
        version: Option<u64>,
    ) -> Result<AgentRecord> {
        let body = UpdateAgentRequest {
            payload: payload.clone(),
            version,
        };
        self.put(self.url(&format!("agent/{}", id))?, &body).await
    }

    pub async fn delete_agent(&self, id: Uuid) -> Result<()> {
        self.delete(self.url(&format!("agent/{}", id))?).await
    }

    /// Per-minute cost of a stored agent
    pub async fn agent_cost(&self, id: Uuid) -> Result<CostBreakdown> {
        self.post(self.url(&format!("agent/{}/cost", id))?, &(), Auth::Bearer)
            .await
    }

    /// Per-minute cost of an arbitrary selection
    pub async fn estimate_cost(&self, selection: &Selection) -> Result<CostBreakdown> {
        self.post(self.url("cost/estimate")?, selection, Auth::Bearer).await
    }

    // ---- executions ----

    pub async fn list_executions(
        &self,
        agent_id: Option<Uuid>,
        filter: &FilterState,
    ) -> Result<Page<Execution>> {
        let mut url = self.list_url("execution/all", filter)?;
        if let Some(agent_id) = agent_id {
            url.query_pairs_mut()
                .append_pair("agent_id", &agent_id.to_string());
        }
        self.get(url).await
    }

    pub async fn get_execution(&self, id: Uuid) -> Result<Execution> {
        self.get(self.url(&format!("execution/{}", id))?).await
    }

    pub async fn record_execution(&self, request: &RecordExecutionRequest) -> Result<Execution> {
        self.post(self.url("execution")?, request, Auth::Bearer).await
    }

    // ---- knowledge bases ----

    pub async fn list_knowledge_bases(&self) -> Result<Vec<KnowledgeBase>> {
        self.get(self.url("knowledge-base/all")?).await
    }

    pub async fn create_knowledge_base(&self, file_name: &str) -> Result<KnowledgeBase> {
        let body = CreateKnowledgeBaseRequest {
            file_name: file_name.to_string(),
        };
        self.post(self.url("knowledge-base")?, &body, Auth::Bearer).await
    }

    pub async fn delete_knowledge_base(&self, rag_id: &str) -> Result<()> {
        self.delete(self.url(&format!("knowledge-base/{}", rag_id))?)
            .await
    }

    // ---- phone numbers ----

    pub async fn list_phone_numbers(&self) -> Result<Vec<PhoneNumber>> {
        self.get(self.url("phone-numbers/all")?).await
    }

    pub async fn create_phone_number(&self, request: &CreatePhoneNumberRequest) -> Result<PhoneNumber> {
        self.post(self.url("phone-numbers")?, request, Auth::Bearer).await
    }

    pub async fn assign_phone_number(&self, id: Uuid, agent_id: Option<Uuid>) -> Result<PhoneNumber> {
        let body = AssignPhoneNumberRequest { agent_id };
        self.put(self.url(&format!("phone-numbers/{}/agent", id))?, &body)
            .await
    }

    pub async fn delete_phone_number(&self, id: Uuid) -> Result<()> {
        self.delete(self.url(&format!("phone-numbers/{}", id))?).await
    }

    // ---- providers and voices ----

    /// Provider catalog, optionally narrowed to a category
    ///
    /// Fetched on every call; the catalog is never cached client-side.
    pub async fn providers(&self, category: Option<ProviderCategory>) -> Result<Vec<Provider>> {
        let mut url = self.url("providers")?;
        if let Some(category) = category {
            url.query_pairs_mut().append_pair("category", category.as_str());
        }
        self.get(url).await
    }

    pub async fn provider_credentials(&self) -> Result<Vec<ProviderCredential>> {
        self.get(self.url("providers/credentials")?).await
    }

    pub async fn connect_provider(
        &self,
        provider_name: &str,
        provider_value: &str,
    ) -> Result<ProviderCredential> {
        let body = ConnectProviderRequest {
            provider_name: provider_name.to_string(),
            provider_value: provider_value.to_string(),
        };
        self.post(self.url("providers/credentials")?, &body, Auth::Bearer)
            .await
    }

    pub async fn disconnect_provider(&self, provider_name: &str) -> Result<()> {
        self.delete(self.url(&format!("providers/credentials/{}", provider_name))?)
            .await
    }

    pub async fn voices(&self, provider: Option<&str>) -> Result<Vec<Voice>> {
        let mut url = self.url("voices")?;
        if let Some(provider) = provider {
            url.query_pairs_mut().append_pair("provider", provider);
        }
        self.get(url).await
    }

    // ---- api keys ----

    pub async fn api_keys(&self) -> Result<Vec<ApiKey>> {
        self.get(self.url("api-keys")?).await
    }

    /// Create a key; the returned secret is not retrievable later
    pub async fn create_api_key(&self, name: &str) -> Result<CreatedApiKey> {
        let body = CreateApiKeyRequest {
            name: name.to_string(),
        };
        self.post(self.url("api-keys")?, &body, Auth::Bearer).await
    }

    pub async fn delete_api_key(&self, id: Uuid) -> Result<()> {
        self.delete(self.url(&format!("api-keys/{}", id))?).await
    }

    // ---- organizations ----

    pub async fn organizations(&self) -> Result<Vec<Organization>> {
        self.get(self.url("organizations/all")?).await
    }

    pub async fn active_organization(&self) -> Result<Organization> {
        self.get(self.url("organizations/active")?).await
    }

    pub async fn create_organization(&self, name: &str) -> Result<Organization> {
        let body = CreateOrganizationRequest {
            name: name.to_string(),
        };
        self.post(self.url("organizations")?, &body, Auth::Bearer).await
    }

    pub async fn activate_organization(&self, id: Uuid) -> Result<Organization> {
        self.post(
            self.url(&format!("organizations/{}/activate", id))?,
            &(),
            Auth::Bearer,
        )
        .await
    }
}

#[async_trait]
impl AgentGateway for ConsoleClient {
    async fn create_agent(&self, payload: &CreateAgentPayload) -> voice_console_core::Result<AgentRecord> {
        Ok(ConsoleClient::create_agent(self, payload).await?)
    }

    async fn update_agent(
        &self,
        id: Uuid,
        payload: &CreateAgentPayload,
        expected_version: Option<u64>,
    ) -> voice_console_core::Result<AgentRecord> {
        Ok(ConsoleClient::update_agent(self, id, payload, expected_version).await?)
    }

    async fn get_agent(&self, id: Uuid) -> voice_console_core::Result<AgentRecord> {
        Ok(ConsoleClient::get_agent(self, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ConsoleClient {
        let config = BackendConfig {
            base_url: base.to_string(),
            ..Default::default()
        };
        ConsoleClient::new(&config).unwrap()
    }

    #[test]
    fn test_urls_keep_base_path() {
        let c = client("https://api.example.com/v2");
        assert_eq!(
            c.url("/agent/all").unwrap().as_str(),
            "https://api.example.com/v2/agent/all"
        );
        let c = client("http://localhost:8080");
        assert_eq!(c.url("user/me").unwrap().as_str(), "http://localhost:8080/user/me");
    }

    #[test]
    fn test_list_url_carries_filters() {
        let c = client("http://localhost:8080");
        let filter = FilterState {
            search: "sales".into(),
            page: 2,
            ..Default::default()
        };
        assert_eq!(
            c.list_url("agent/all", &filter).unwrap().as_str(),
            "http://localhost:8080/agent/all?search=sales&page=2"
        );
        assert_eq!(
            c.list_url("agent/all", &FilterState::default()).unwrap().as_str(),
            "http://localhost:8080/agent/all"
        );
    }

    #[test]
    fn test_chat_url_uses_configured_host() {
        let config = BackendConfig {
            base_url: "https://api.example.com".into(),
            ws_url: "wss://rt.example.com/realtime".into(),
            ..Default::default()
        };
        let c = ConsoleClient::new(&config).unwrap();
        let id = Uuid::new_v4();
        let url = c.chat_url(id, "u1", "org-1").unwrap();
        assert_eq!(url.host_str(), Some("rt.example.com"));
        assert!(url.path().starts_with("/realtime/"));
        assert!(url.path().ends_with(&id.to_string()));
    }

    #[test]
    fn test_bearer_header_only_with_token() {
        let c = client("http://localhost:8080");
        assert!(c.headers(Auth::Public).unwrap().is_empty());
        assert!(c.headers(Auth::Bearer).unwrap().is_empty());

        let c = c.with_token("abc123");
        assert!(c.headers(Auth::Public).unwrap().is_empty());
        let headers = c.headers(Auth::Bearer).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc123");
    }
}
