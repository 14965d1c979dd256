//! PING API client.
//!
//! Holds the agent identity (id plus signing key) and talks JSON over HTTP.
//! Every operation that acts on behalf of the agent checks its preconditions
//! before a request is sent.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use ping_crypto::{GeneratedIdentity, SignedEnvelope, Signer};

use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::models::{
    AddContactRequest, Agent, Contact, ErrorBody, Message, MessageKind, RegisterOptions,
    RegisterRequest, SearchOptions, SendResult,
};

/// Page size used by [`PingClient::history`] when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Async client for one agent.
///
/// Mutating the identity takes `&mut self`; share a client between tasks by
/// wrapping it in a lock.
#[derive(Debug, Clone)]
pub struct PingClient {
    base_url: Url,
    http: reqwest::Client,
    signer: Signer,
    agent_id: Option<String>,
}

impl PingClient {
    /// Client for `base_url` with default settings.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_config(&ClientConfig::new(base_url))
    }

    pub fn with_config(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "base url '{}' cannot carry a path",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            base_url,
            http,
            signer: Signer::new(),
            agent_id: None,
        })
    }

    /// Load a private key (hex) into the client.
    pub fn with_private_key(mut self, private_key_hex: &str) -> Result<Self, ClientError> {
        self.signer = Signer::from_private_key(private_key_hex)?;
        debug!(
            fingerprint = %self.signer.fingerprint().unwrap_or_default(),
            "loaded signing key"
        );
        Ok(self)
    }

    /// Act as an already registered agent.
    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    pub fn set_agent_id(&mut self, agent_id: Option<String>) {
        self.agent_id = agent_id;
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    // ── Keys ────────────────────────────────────────────────────────────────

    /// Generate a new keypair, replacing any held key.
    pub fn generate_keys(&mut self) -> GeneratedIdentity {
        let identity = self.signer.generate_identity();
        info!(
            fingerprint = %self.signer.fingerprint().unwrap_or_default(),
            "generated signing key"
        );
        identity
    }

    /// Load a hex private key; returns the hex public key.
    pub fn set_keys(&mut self, private_key_hex: &str) -> Result<String, ClientError> {
        let public_key = self.signer.load_identity(private_key_hex)?;
        debug!(
            fingerprint = %self.signer.fingerprint().unwrap_or_default(),
            "loaded signing key"
        );
        Ok(public_key)
    }

    pub fn public_key(&self) -> Option<String> {
        self.signer.public_key()
    }

    // ── Agents ──────────────────────────────────────────────────────────────

    /// Register a new agent and remember its id.
    ///
    /// Generates a keypair first when none is held. Call
    /// [`PingClient::generate_keys`] beforehand to keep the private key.
    pub async fn register(
        &mut self,
        name: &str,
        options: RegisterOptions,
    ) -> Result<Agent, ClientError> {
        if !self.signer.is_configured() {
            warn!("no signing key held, generating an ephemeral one for registration");
            self.signer.generate_identity();
        }
        let public_key = self.signer.public_key().ok_or(ClientError::KeysRequired)?;

        let body = RegisterRequest {
            public_key: &public_key,
            name,
            provider: &options.provider,
            capabilities: &options.capabilities,
            webhook_url: options.webhook_url.as_deref(),
            is_public: options.is_public,
        };
        let url = self.endpoint(&["agents"])?;
        let agent: Agent = self.post_json(url, &body).await?;

        info!(agent_id = %agent.id, name, "registered agent");
        self.agent_id = Some(agent.id.clone());
        Ok(agent)
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent, ClientError> {
        let url = self.endpoint(&["agents", agent_id])?;
        self.get_json(url).await
    }

    /// Delete the registered agent and forget its id.
    pub async fn delete_agent(&mut self) -> Result<(), ClientError> {
        let agent_id = self.require_agent()?.to_string();
        let url = self.endpoint(&["agents", &agent_id])?;
        self.call(Method::DELETE, url, None).await?;

        info!(agent_id = %agent_id, "deleted agent");
        self.agent_id = None;
        Ok(())
    }

    // ── Directory ───────────────────────────────────────────────────────────

    pub async fn directory(&self) -> Result<Vec<Agent>, ClientError> {
        let url = self.endpoint(&["directory"])?;
        self.get_json(url).await
    }

    pub async fn search(&self, options: &SearchOptions) -> Result<Vec<Agent>, ClientError> {
        let mut url = self.endpoint(&["directory", "search"])?;
        let pairs = options.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        self.get_json(url).await
    }

    // ── Contacts ────────────────────────────────────────────────────────────

    pub async fn contacts(&self) -> Result<Vec<Contact>, ClientError> {
        let agent_id = self.require_agent()?;
        let url = self.endpoint(&["agents", agent_id, "contacts"])?;
        self.get_json(url).await
    }

    pub async fn add_contact(
        &self,
        contact_id: &str,
        alias: Option<&str>,
        notes: Option<&str>,
    ) -> Result<(), ClientError> {
        let agent_id = self.require_agent()?;
        let url = self.endpoint(&["agents", agent_id, "contacts"])?;
        let body = AddContactRequest {
            contact_id,
            alias,
            notes,
        };
        self.call(Method::POST, url, Some(serde_json::to_value(&body)?))
            .await?;
        Ok(())
    }

    pub async fn remove_contact(&self, contact_id: &str) -> Result<(), ClientError> {
        let agent_id = self.require_agent()?;
        let url = self.endpoint(&["agents", agent_id, "contacts", contact_id])?;
        self.call(Method::DELETE, url, None).await?;
        Ok(())
    }

    // ── Messages ────────────────────────────────────────────────────────────

    /// Build, sign and submit a message stamped with the current time.
    pub async fn send<P: Serialize + ?Sized>(
        &self,
        to: &str,
        message_type: &str,
        payload: &P,
        reply_to: Option<&str>,
    ) -> Result<SendResult, ClientError> {
        let envelope = self.sign_message(to, message_type, payload, reply_to, None)?;
        self.submit(&envelope).await
    }

    /// Sign a message as this agent without sending it.
    ///
    /// `timestamp` defaults to now in milliseconds.
    pub fn sign_message<P: Serialize + ?Sized>(
        &self,
        to: &str,
        message_type: &str,
        payload: &P,
        reply_to: Option<&str>,
        timestamp: Option<i64>,
    ) -> Result<SignedEnvelope, ClientError> {
        let from = self.require_agent()?;
        if !self.signer.is_configured() {
            return Err(ClientError::KeysRequired);
        }
        let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        Ok(self
            .signer
            .build_and_sign(message_type, from, to, payload, reply_to, timestamp)?)
    }

    /// Submit an already signed envelope.
    pub async fn submit(&self, envelope: &SignedEnvelope) -> Result<SendResult, ClientError> {
        let url = self.endpoint(&["messages"])?;
        let result: SendResult = self.post_json(url, envelope).await?;
        info!(
            message_id = %result.id,
            to = %envelope.envelope.to,
            message_type = %envelope.envelope.message_type,
            delivered = result.delivered,
            "sent message"
        );
        Ok(result)
    }

    /// Pending messages, or every stored message when `include_all` is set.
    pub async fn inbox(&self, include_all: bool) -> Result<Vec<Message>, ClientError> {
        let agent_id = self.require_agent()?;
        let mut url = self.endpoint(&["agents", agent_id, "inbox"])?;
        if include_all {
            url.query_pairs_mut().append_pair("all", "true");
        }
        self.get_json(url).await
    }

    /// Conversation with another agent. A `limit` of 0 uses the default.
    pub async fn history(&self, other_id: &str, limit: u32) -> Result<Vec<Message>, ClientError> {
        let agent_id = self.require_agent()?;
        let limit = if limit == 0 {
            DEFAULT_HISTORY_LIMIT
        } else {
            limit
        };
        let mut url = self.endpoint(&["agents", agent_id, "messages", other_id])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        self.get_json(url).await
    }

    pub async fn ack(&self, message_id: &str) -> Result<(), ClientError> {
        let url = self.endpoint(&["messages", message_id, "ack"])?;
        self.call(Method::POST, url, None).await?;
        debug!(message_id, "acknowledged message");
        Ok(())
    }

    /// Check a received message against its sender's registered key.
    pub async fn verify_message(&self, message: &Message) -> Result<(), ClientError> {
        let envelope = message.signed_envelope().ok_or_else(|| {
            ClientError::Decode(format!(
                "message {} has no millisecond timestamp to verify",
                message.id
            ))
        })?;
        let sender = self.get_agent(&message.from).await?;
        envelope.verify(&sender.public_key)?;
        Ok(())
    }

    // ── Convenience senders ─────────────────────────────────────────────────

    pub async fn text(&self, to: &str, text: &str) -> Result<SendResult, ClientError> {
        self.send(to, MessageKind::Text.as_str(), &json!({ "text": text }), None)
            .await
    }

    pub async fn ping(&self, to: &str) -> Result<SendResult, ClientError> {
        self.send(to, MessageKind::Ping.as_str(), &json!({}), None)
            .await
    }

    pub async fn pong(&self, to: &str, reply_to: Option<&str>) -> Result<SendResult, ClientError> {
        self.send(to, MessageKind::Pong.as_str(), &json!({}), reply_to)
            .await
    }

    pub async fn request<D: Serialize + ?Sized>(
        &self,
        to: &str,
        action: &str,
        data: &D,
    ) -> Result<SendResult, ClientError> {
        let data = serde_json::to_value(data)?;
        let payload = json!({ "action": action, "data": data });
        self.send(to, MessageKind::Request.as_str(), &payload, None)
            .await
    }

    pub async fn respond<R: Serialize + ?Sized>(
        &self,
        to: &str,
        result: &R,
        reply_to: Option<&str>,
    ) -> Result<SendResult, ClientError> {
        let result = serde_json::to_value(result)?;
        let payload = json!({ "result": result });
        self.send(to, MessageKind::Response.as_str(), &payload, reply_to)
            .await
    }

    pub async fn propose<P: Serialize + ?Sized>(
        &self,
        to: &str,
        proposal: &P,
    ) -> Result<SendResult, ClientError> {
        self.send(to, MessageKind::Proposal.as_str(), proposal, None)
            .await
    }

    pub async fn signature(
        &self,
        to: &str,
        signature: &str,
        reply_to: Option<&str>,
    ) -> Result<SendResult, ClientError> {
        let payload = json!({ "signature": signature });
        self.send(to, MessageKind::Signature.as_str(), &payload, reply_to)
            .await
    }

    // ── HTTP plumbing ───────────────────────────────────────────────────────

    fn require_agent(&self) -> Result<&str, ClientError> {
        self.agent_id.as_deref().ok_or(ClientError::NotRegistered)
    }

    /// Base URL with percent-encoded path segments appended.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ClientError::Config(format!("base url '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let body = self.call(Method::GET, url, None).await?;
        decode(&body)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ClientError> {
        let value = serde_json::to_value(body)?;
        let response = self.call(Method::POST, url, Some(value)).await?;
        decode(&response)
    }

    /// Send one request and return the body of a 2xx response.
    async fn call(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<String, ClientError> {
        debug!(method = %method, path = url.path(), "ping api request");

        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = &body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        debug!(
            method = %method,
            path = url.path(),
            status = status.as_u16(),
            "ping api response"
        );

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
                });
            warn!(
                method = %method,
                path = url.path(),
                status = status.as_u16(),
                error = %message,
                "ping api error"
            );
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> PingClient {
        PingClient::new(base).unwrap()
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let c = client("http://localhost:3100/");
        assert_eq!(c.base_url(), "http://localhost:3100");
        assert_eq!(
            c.endpoint(&["agents"]).unwrap().as_str(),
            "http://localhost:3100/agents"
        );
    }

    #[test]
    fn test_base_path_prefix_kept() {
        let c = client("https://ping.example.com/api/");
        assert_eq!(
            c.endpoint(&["messages", "m1", "ack"]).unwrap().as_str(),
            "https://ping.example.com/api/messages/m1/ack"
        );
    }

    #[test]
    fn test_path_segments_are_encoded() {
        let c = client("http://localhost:3100");
        let url = c.endpoint(&["agents", "a/b c?d"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3100/agents/a%2Fb%20c%3Fd");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            PingClient::new("localhost:3100"),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            PingClient::new("http://[::1"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_sign_message_requires_registration_then_keys() {
        let mut c = client("http://localhost:3100");
        assert!(matches!(
            c.sign_message("b", "ping", &json!({}), None, Some(1)),
            Err(ClientError::NotRegistered)
        ));

        c.set_agent_id(Some("agent-A".into()));
        assert!(matches!(
            c.sign_message("b", "ping", &json!({}), None, Some(1)),
            Err(ClientError::KeysRequired)
        ));

        let identity = c.generate_keys();
        let signed = c
            .sign_message("agent-B", "ping", &json!({}), None, Some(1))
            .unwrap();
        assert_eq!(signed.envelope.from, "agent-A");
        assert!(signed.verify(&identity.public_key).is_ok());
    }

    #[test]
    fn test_sign_message_defaults_timestamp_to_now() {
        let mut c = client("http://localhost:3100").with_agent_id("agent-A");
        c.generate_keys();
        let before = chrono::Utc::now().timestamp_millis();
        let signed = c.sign_message("b", "ping", &json!({}), None, None).unwrap();
        let after = chrono::Utc::now().timestamp_millis();
        assert!(signed.envelope.timestamp >= before && signed.envelope.timestamp <= after);
    }

    #[test]
    fn test_set_keys_rejects_bad_hex() {
        let mut c = client("http://localhost:3100");
        assert!(matches!(
            c.set_keys("zz"),
            Err(ClientError::Signer(ping_crypto::SignerError::InvalidKeyFormat(_)))
        ));
        assert!(c.public_key().is_none());
    }

    #[test]
    fn test_with_private_key() {
        let mut source = client("http://localhost:3100");
        let identity = source.generate_keys();

        let c = client("http://localhost:3100")
            .with_private_key(&identity.private_key)
            .unwrap();
        assert_eq!(c.public_key().unwrap(), identity.public_key);

        assert!(matches!(
            client("http://localhost:3100").with_private_key("00"),
            Err(ClientError::Signer(ping_crypto::SignerError::InvalidKeyFormat(_)))
        ));
    }
}
